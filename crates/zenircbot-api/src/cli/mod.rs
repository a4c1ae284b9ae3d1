//! CLI command definitions for the `zenbot` binary.
//!
//! Connection flags are global and read `ZENIRCBOT_*` environment variables,
//! so `zenbot send` and `zenbot run` share one way of finding the bus.

pub mod run;
pub mod send;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Run and poke ZenIRCBot services over the pub/sub bus.
#[derive(Parser, Debug)]
#[command(name = "zenbot", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Service config file (TOML, or JSON when it ends in `.json`).
    #[arg(short, long, global = true, env = "ZENIRCBOT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Bus host, overriding the config file.
    #[arg(long, global = true, env = "ZENIRCBOT_HOST")]
    pub host: Option<String>,

    /// Bus port, overriding the config file.
    #[arg(long, global = true, env = "ZENIRCBOT_PORT")]
    pub port: Option<u16>,

    /// Bus database index, overriding the config file.
    #[arg(long, global = true, env = "ZENIRCBOT_DB")]
    pub db: Option<i64>,

    /// Service name, overriding the config file.
    #[arg(long, global = true, env = "ZENIRCBOT_NAME")]
    pub name: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Export spans to stdout through OpenTelemetry.
    #[arg(long, global = true)]
    pub otel: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the example service (`ping` and `echo` commands) until Ctrl+C.
    Run,

    /// Send a chat message.
    Send {
        /// Recipient channel or nick; repeat for several.
        #[arg(short, long = "to", required = true)]
        to: Vec<String>,

        /// Message text.
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },

    /// Send a chat action (`/me`).
    Action {
        /// Recipient channel or nick; repeat for several.
        #[arg(short, long = "to", required = true)]
        to: Vec<String>,

        /// Action text.
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },

    /// Send a message to the admin channels.
    Admin {
        /// Message text.
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_send_with_many_recipients() {
        let cli = Cli::try_parse_from([
            "zenbot", "--port", "6380", "send", "--to", "#a", "-t", "#b", "hello", "there",
        ])
        .unwrap();
        assert_eq!(cli.port, Some(6380));
        match cli.command {
            Commands::Send { to, message } => {
                assert_eq!(to, vec!["#a", "#b"]);
                assert_eq!(message.join(" "), "hello there");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn send_requires_recipient() {
        assert!(Cli::try_parse_from(["zenbot", "send", "hello"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["zenbot", "run", "-vv", "--name", "pinger"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.name.as_deref(), Some("pinger"));
        assert!(matches!(cli.command, Commands::Run));
    }
}
