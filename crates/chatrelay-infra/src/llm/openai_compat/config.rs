//! Connection settings for OpenAI-compatible APIs.
//!
//! Providers that speak the chat completions protocol differ only in base
//! URL; well-known names resolve to theirs, anything else needs
//! `provider.base_url` or falls back to OpenAI.

use secrecy::SecretString;

use chatrelay_types::config::ProviderSettings;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const MISTRAL_BASE_URL: &str = "https://api.mistral.ai/v1";

/// Base URL for a well-known provider name.
pub fn known_base_url(provider_name: &str) -> Option<&'static str> {
    match provider_name {
        "openai" => Some(OPENAI_BASE_URL),
        "gemini" => Some(GEMINI_BASE_URL),
        "mistral" => Some(MISTRAL_BASE_URL),
        _ => None,
    }
}

/// Everything needed to build an `OpenAiCompatibleProvider`.
///
/// Not `Debug`: holds the API key.
pub struct OpenAiCompatConfig {
    pub provider_name: String,
    pub base_url: String,
    pub api_key: SecretString,
    /// Used when a request leaves the model empty.
    pub model: String,
}

impl OpenAiCompatConfig {
    /// Resolve the endpoint for `[provider]` settings.
    ///
    /// An explicit `base_url` wins, then the provider's well-known URL, then
    /// the OpenAI endpoint (logged as a warning).
    pub fn from_settings(settings: &ProviderSettings, api_key: SecretString) -> Self {
        let base_url = settings
            .base_url
            .clone()
            .or_else(|| known_base_url(&settings.name).map(str::to_string))
            .unwrap_or_else(|| {
                tracing::warn!(
                    provider = %settings.name,
                    "Unknown provider without base_url, using the OpenAI endpoint"
                );
                OPENAI_BASE_URL.to_string()
            });

        Self {
            provider_name: settings.name.clone(),
            base_url,
            api_key,
            model: settings.model.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn key() -> SecretString {
        SecretString::from("sk-test".to_string())
    }

    fn settings(name: &str, base_url: Option<&str>) -> ProviderSettings {
        ProviderSettings {
            name: name.to_string(),
            base_url: base_url.map(str::to_string),
            ..ProviderSettings::default()
        }
    }

    #[test]
    fn test_default_settings_target_openai() {
        let config = OpenAiCompatConfig::from_settings(&ProviderSettings::default(), key());
        assert_eq!(config.provider_name, "openai");
        assert_eq!(config.base_url, OPENAI_BASE_URL);
        assert_eq!(config.api_key.expose_secret(), "sk-test");
        assert_eq!(config.model, "gpt-3.5-turbo");
    }

    #[test]
    fn test_known_names_resolve_their_endpoint() {
        let gemini = OpenAiCompatConfig::from_settings(&settings("gemini", None), key());
        assert!(gemini.base_url.contains("generativelanguage.googleapis.com"));

        let mistral = OpenAiCompatConfig::from_settings(&settings("mistral", None), key());
        assert_eq!(mistral.base_url, MISTRAL_BASE_URL);
    }

    #[test]
    fn test_explicit_base_url_wins() {
        let config = OpenAiCompatConfig::from_settings(
            &settings("mistral", Some("http://localhost:11434/v1")),
            key(),
        );
        assert_eq!(config.base_url, "http://localhost:11434/v1");
        assert_eq!(config.provider_name, "mistral");
    }

    #[test]
    fn test_unknown_name_falls_back_to_openai() {
        assert_eq!(known_base_url("local-llama"), None);
        let config = OpenAiCompatConfig::from_settings(&settings("local-llama", None), key());
        assert_eq!(config.base_url, OPENAI_BASE_URL);
    }
}
