//! Application state: resolved service config and the concrete bus.

use zenircbot_infra::config::load_service_config;
use zenircbot_infra::redis::RedisBus;
use zenircbot_types::config::ServiceConfig;

use crate::cli::Cli;

/// Shared state for every subcommand.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: ServiceConfig,
    pub bus: RedisBus,
}

impl AppState {
    /// Load the config file (if any), apply CLI overrides and build the bus.
    pub async fn init(cli: &Cli) -> anyhow::Result<Self> {
        let config = match &cli.config {
            Some(path) => load_service_config(path).await,
            None => ServiceConfig::default(),
        };
        let config = apply_overrides(config, cli);
        tracing::debug!(
            service = %config.name,
            url = %config.bus.url(),
            "resolved service config"
        );

        let bus = RedisBus::new(config.bus.clone())?;
        Ok(Self { config, bus })
    }
}

/// Flags given on the command line (or through the environment) win over
/// the config file.
fn apply_overrides(mut config: ServiceConfig, cli: &Cli) -> ServiceConfig {
    if let Some(name) = &cli.name {
        config.name = name.clone();
    }
    if let Some(host) = &cli.host {
        config.bus.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.bus.port = port;
    }
    if let Some(db) = cli.db {
        config.bus.db = db;
    }
    config
}
