//! `zenbot run` -- a small example service.
//!
//! Registers `ping` (answers `pong`) and `echo` (repeats the rest of the
//! message), then listens until shutdown.

use anyhow::Result;
use console::style;
use tokio_util::sync::CancellationToken;
use zenircbot_core::ZenBot;
use zenircbot_core::message::bus::BusConnection;
use zenircbot_core::message::{CommandHandler, handler_fn};

use crate::state::AppState;

/// Repeats whatever follows the `echo` token.
#[derive(Debug, Default)]
pub struct EchoHandler;

impl CommandHandler for EchoHandler {
    fn handle(&self, text: &str) -> anyhow::Result<String> {
        let rest = text.strip_prefix("echo").unwrap_or(text).trim();
        if rest.is_empty() {
            return Ok("usage: echo <text>".to_string());
        }
        Ok(rest.to_string())
    }

    fn name(&self) -> &str {
        "echo"
    }
}

/// Build the example bot on `conn`.
pub fn example_bot<C: BusConnection>(conn: C, name: &str) -> Result<ZenBot<C>> {
    let mut bot = ZenBot::new(conn, name);
    bot.register_with_description(
        "ping",
        "play ping-pong",
        handler_fn("ping", |_| Ok("pong".to_string())),
    )?;
    bot.register_with_description("echo", "repeat what you say", EchoHandler)?;
    Ok(bot)
}

/// Run the example service until `shutdown` is cancelled.
pub async fn run_service(state: &AppState, shutdown: CancellationToken, quiet: bool) -> Result<()> {
    let mut bot = example_bot(state.bus.clone(), &state.config.name)?;

    if !quiet {
        println!();
        println!(
            "  {} {} listening on {}",
            style("●").green().bold(),
            style(bot.service_name()).cyan(),
            style(state.config.bus.url()).dim()
        );
        for command in bot.registry().announced() {
            println!(
                "    {} {:<8} {}",
                style("•").dim(),
                command.name,
                style(&command.description).dim()
            );
        }
        println!();
    }

    bot.listen_until(shutdown).await?;

    if !quiet {
        println!("\n  Service stopped.");
    }
    Ok(())
}
