//! Chatrelay server entry point.
//!
//! Binary name: `chatrelay`
//!
//! Parses CLI arguments, sets up tracing, loads the TOML configuration,
//! then dispatches to the selected command.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use chatrelay_infra::config::load_relay_config;
use chatrelay_observe::tracing_setup::{init_tracing, shutdown_tracing};
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need tracing or config
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "chatrelay", &mut std::io::stdout());
        return Ok(());
    }

    init_tracing(&cli.log_options()).map_err(|err| anyhow::anyhow!("{err}"))?;

    let mut config = load_relay_config(&cli.config).await;

    let result = match cli.command {
        Commands::Serve { host, port } => {
            cli::apply_serve_overrides(&mut config, host, port);
            cli::serve::serve(config, cli.quiet).await
        }
        Commands::Check => cli::check::check(&config).await,
        Commands::Completions { .. } => unreachable!("handled above"),
    };

    shutdown_tracing();
    result
}
