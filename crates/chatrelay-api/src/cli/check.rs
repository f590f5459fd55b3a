//! `chatrelay check`: verify the configured provider answers.

use std::time::Duration;

use console::style;

use chatrelay_infra::config::resolve_api_key;
use chatrelay_infra::llm::{create_provider, test_provider_connection};
use chatrelay_types::config::RelayConfig;
use chatrelay_types::llm::LlmError;

/// Send a minimal completion and report the outcome.
///
/// Fails (non-zero exit) when the key is missing or the provider errors.
pub async fn check(config: &RelayConfig) -> anyhow::Result<()> {
    let settings = &config.provider;
    let api_key = resolve_api_key(settings)?;
    let provider = create_provider(settings, api_key)?;

    let timeout = Duration::from_secs(settings.request_timeout_secs);
    let result = match tokio::time::timeout(timeout, test_provider_connection(&provider)).await {
        Ok(result) => result,
        Err(_) => Err(LlmError::Timeout(timeout)),
    };

    println!();
    match result {
        Ok(()) => {
            println!(
                "  {} {} connected ({})",
                style("✓").green().bold(),
                style(&settings.name).cyan(),
                style(&settings.model).dim()
            );
            println!();
            Ok(())
        }
        Err(err) => {
            println!(
                "  {} {} FAILED: {}",
                style("✗").red().bold(),
                style(&settings.name).cyan(),
                err
            );
            println!();
            tracing::debug!(provider = %settings.name, error = %err, "Provider check failed");
            Err(err.into())
        }
    }
}
