//! Configuration loader for chatrelay.
//!
//! Reads a TOML file into [`RelayConfig`], falling back to defaults when
//! the file is missing or malformed, and resolves the provider API key
//! from the environment.

use std::path::Path;

use secrecy::SecretString;

use chatrelay_types::config::{ProviderSettings, RelayConfig};

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "chatrelay.toml";

/// Errors raised while resolving configuration at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("API key not found: set the {env} environment variable")]
    MissingApiKey { env: String },
}

/// Load the relay configuration from `path`.
///
/// - If the file does not exist, returns [`RelayConfig::default()`].
/// - If the file exists but fails to read or parse, logs a warning and
///   returns the default.
pub async fn load_relay_config(path: &Path) -> RelayConfig {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return RelayConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return RelayConfig::default();
        }
    };

    match toml::from_str::<RelayConfig>(&content) {
        Ok(config) => {
            tracing::debug!("Loaded configuration from {}", path.display());
            config
        }
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            RelayConfig::default()
        }
    }
}

/// Read the provider API key from the environment variable named by
/// `api_key_env`.
pub fn resolve_api_key(settings: &ProviderSettings) -> Result<SecretString, ConfigError> {
    resolve_api_key_with(settings, |name| std::env::var(name).ok())
}

/// [`resolve_api_key`] with an injectable variable lookup.
///
/// An empty value counts as missing.
pub fn resolve_api_key_with<F>(settings: &ProviderSettings, lookup: F) -> Result<SecretString, ConfigError>
where
    F: FnOnce(&str) -> Option<String>,
{
    match lookup(&settings.api_key_env) {
        Some(value) if !value.trim().is_empty() => Ok(SecretString::from(value)),
        _ => Err(ConfigError::MissingApiKey {
            env: settings.api_key_env.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_relay_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_relay_config(&tmp.path().join(DEFAULT_CONFIG_FILE)).await;
        assert_eq!(config, RelayConfig::default());
    }

    #[tokio::test]
    async fn load_relay_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join(DEFAULT_CONFIG_FILE);
        tokio::fs::write(
            &config_path,
            r#"
[server]
host = "0.0.0.0"
port = 9000

[provider]
model = "gpt-4o-mini"
max_tokens = 500
system_prompt = "You are a helpful assistant."

[relay]
outbound_buffer = 8
"#,
        )
        .await
        .unwrap();

        let config = load_relay_config(&config_path).await;
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.provider.model, "gpt-4o-mini");
        assert_eq!(config.provider.max_tokens, 500);
        assert_eq!(
            config.provider.system_prompt.as_deref(),
            Some("You are a helpful assistant.")
        );
        assert_eq!(config.relay.outbound_buffer, 8);
        assert_eq!(config.relay.inbound_buffer, 16);
    }

    #[tokio::test]
    async fn load_relay_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join(DEFAULT_CONFIG_FILE);
        tokio::fs::write(&config_path, "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_relay_config(&config_path).await;
        assert_eq!(config, RelayConfig::default());
    }

    #[test]
    fn resolve_api_key_reads_named_variable() {
        let settings = ProviderSettings {
            api_key_env: "MISTRAL_API_KEY".to_string(),
            ..ProviderSettings::default()
        };
        let key = resolve_api_key_with(&settings, |name| {
            assert_eq!(name, "MISTRAL_API_KEY");
            Some("mk-123".to_string())
        })
        .unwrap();
        assert_eq!(key.expose_secret(), "mk-123");
    }

    #[test]
    fn resolve_api_key_missing_or_blank_fails() {
        let settings = ProviderSettings::default();

        let err = resolve_api_key_with(&settings, |_| None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "API key not found: set the OPENAI_API_KEY environment variable"
        );

        assert!(resolve_api_key_with(&settings, |_| Some("  ".to_string())).is_err());
    }
}
