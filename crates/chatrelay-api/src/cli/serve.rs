//! `chatrelay serve`: run the relay server until Ctrl+C or SIGTERM.

use anyhow::Context;
use console::style;

use chatrelay_infra::config::resolve_api_key;
use chatrelay_infra::llm::create_provider;
use chatrelay_types::config::RelayConfig;

use crate::http;
use crate::state::AppState;

/// Build the provider and application state, bind, and serve.
pub async fn serve(config: RelayConfig, quiet: bool) -> anyhow::Result<()> {
    let api_key = resolve_api_key(&config.provider)?;
    let provider = create_provider(&config.provider, api_key)
        .context("failed to create completion provider")?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let provider_name = config.provider.name.clone();
    let model = config.provider.model.clone();
    let state = AppState::new(config, provider);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    let local_addr = listener.local_addr()?;

    if !quiet {
        println!();
        println!(
            "  {} chatrelay listening on {}",
            style("⚡").bold(),
            style(format!("http://{local_addr}")).cyan()
        );
        println!(
            "  {} {} ({})",
            style("↔").dim(),
            style(&provider_name).green(),
            style(&model).dim()
        );
        println!("  {}", style("Press Ctrl+C to stop").dim());
        println!();
    }

    tracing::info!(%local_addr, provider = %provider_name, %model, "Relay server started");

    let router = http::router::build_router(state);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Relay server stopped");
    if !quiet {
        println!("\n  Server stopped.");
    }
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {err}");
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
