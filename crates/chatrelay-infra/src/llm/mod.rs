//! Completion provider implementations.
//!
//! Provides a provider factory ([`create_provider`]) that constructs the
//! right provider from [`ProviderSettings`], and a connection test
//! ([`test_provider_connection`]) used by `chatrelay check`.

pub mod openai_compat;

use secrecy::{ExposeSecret, SecretString};

use chatrelay_core::llm::box_provider::BoxLlmProvider;
use chatrelay_types::config::ProviderSettings;
use chatrelay_types::llm::{CompletionRequest, LlmError, Message};

use self::openai_compat::OpenAiCompatibleProvider;
use self::openai_compat::config::OpenAiCompatConfig;

/// Create a [`BoxLlmProvider`] from the `[provider]` settings.
///
/// `base_url` wins when set; otherwise well-known provider names select
/// their endpoint and anything else falls back to the OpenAI base URL.
///
/// # Errors
///
/// Returns [`LlmError::AuthenticationFailed`] if the API key is empty.
pub fn create_provider(
    settings: &ProviderSettings,
    api_key: SecretString,
) -> Result<BoxLlmProvider, LlmError> {
    if api_key.expose_secret().is_empty() {
        return Err(LlmError::AuthenticationFailed);
    }

    let config = OpenAiCompatConfig::from_settings(settings, api_key);
    tracing::debug!(
        provider = %config.provider_name,
        base_url = %config.base_url,
        model = %config.model,
        "Creating provider"
    );

    let provider = OpenAiCompatibleProvider::new(config);
    Ok(BoxLlmProvider::new(provider))
}

/// Test provider connectivity by sending a minimal completion request.
///
/// Sends a tiny "Hello" message with a minimal token budget.
///
/// # Errors
///
/// Returns the provider error if the provider fails to respond.
pub async fn test_provider_connection(provider: &BoxLlmProvider) -> Result<(), LlmError> {
    let request = CompletionRequest {
        // Provider uses its configured default
        model: String::new(),
        messages: vec![Message::user("Hello")],
        system: None,
        max_tokens: 10,
        temperature: Some(0.0),
        stream: false,
    };
    provider.complete(&request).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> SecretString {
        SecretString::from("sk-test".to_string())
    }

    #[test]
    fn test_create_provider_openai() {
        let provider = create_provider(&ProviderSettings::default(), key()).unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn test_create_provider_known_name() {
        let settings = ProviderSettings {
            name: "mistral".to_string(),
            model: "mistral-small-latest".to_string(),
            ..ProviderSettings::default()
        };
        let provider = create_provider(&settings, key()).unwrap();
        assert_eq!(provider.name(), "mistral");
    }

    #[test]
    fn test_create_provider_custom_base_url() {
        let settings = ProviderSettings {
            name: "local".to_string(),
            base_url: Some("http://localhost:11434/v1".to_string()),
            model: "llama3".to_string(),
            ..ProviderSettings::default()
        };
        let provider = create_provider(&settings, key()).unwrap();
        assert_eq!(provider.name(), "local");
    }

    #[test]
    fn test_create_provider_rejects_empty_key() {
        let result = create_provider(&ProviderSettings::default(), SecretString::from(String::new()));
        assert!(matches!(result, Err(LlmError::AuthenticationFailed)));
    }
}
