//! ZenIRCBot service runner.
//!
//! Binary name: `zenbot`
//!
//! Parses CLI arguments, sets up logging, resolves the service config and
//! dispatches to the requested command.

mod cli;
mod state;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use zenircbot_observe::{LogOptions, init_tracing, shutdown_tracing};

use cli::send::SendKind;
use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut log_options = LogOptions::for_verbosity(cli.verbose, cli.quiet);
    log_options.json = cli.json_logs;
    log_options.otel = cli.otel;
    init_tracing(&log_options).map_err(|e| anyhow::anyhow!(e))?;

    let result = dispatch(cli).await;
    shutdown_tracing();
    result
}

async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let state = AppState::init(&cli).await?;

    match cli.command {
        Commands::Run => {
            let shutdown = CancellationToken::new();
            let trigger = shutdown.clone();
            tokio::spawn(async move {
                shutdown_signal().await;
                tracing::info!("shutdown signal received");
                trigger.cancel();
            });
            cli::run::run_service(&state, shutdown, cli.quiet).await?;
        }

        Commands::Send { to, message } => {
            cli::send::run_send(&state, SendKind::Message, to, &message, cli.quiet).await?;
        }

        Commands::Action { to, message } => {
            cli::send::run_send(&state, SendKind::Action, to, &message, cli.quiet).await?;
        }

        Commands::Admin { message } => {
            cli::send::run_send(&state, SendKind::Admin, Vec::new(), &message, cli.quiet).await?;
        }
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
///
/// If a handler cannot be installed, that source never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
