//! CLI command definitions and dispatch for the `chatrelay` binary.
//!
//! Uses clap derive macros for argument parsing. Every flag that changes
//! where the server listens can also come from the environment.

pub mod check;
pub mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use chatrelay_infra::config::DEFAULT_CONFIG_FILE;
use chatrelay_observe::tracing_setup::LogOptions;
use chatrelay_types::config::RelayConfig;

/// Real-time chat relay between WebSocket clients and an LLM provider.
#[derive(Parser)]
#[command(name = "chatrelay", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, global = true, env = "CHATRELAY_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Suppress all output except warnings and errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Export spans to stdout through OpenTelemetry.
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Start the relay server.
    Serve {
        /// Interface to bind (overrides `[server] host`).
        #[arg(long, env = "CHATRELAY_HOST")]
        host: Option<String>,

        /// Port to bind (overrides `[server] port`).
        #[arg(short, long, env = "CHATRELAY_PORT")]
        port: Option<u16>,
    },

    /// Send a minimal completion to verify the provider is reachable.
    Check,

    /// Generate shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

impl Cli {
    /// Logging options derived from the global flags.
    pub fn log_options(&self) -> LogOptions {
        LogOptions {
            default_filter: LogOptions::filter_for(self.verbose, self.quiet),
            json: self.log_json,
            enable_otel: self.otel,
        }
    }
}

/// Apply `serve` flag overrides on top of the file configuration.
pub fn apply_serve_overrides(config: &mut RelayConfig, host: Option<String>, port: Option<u16>) {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
}
