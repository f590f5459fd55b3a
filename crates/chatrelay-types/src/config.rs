//! Configuration types for chatrelay.
//!
//! `RelayConfig` represents the top-level `chatrelay.toml`. Every field has a
//! default, so an empty or missing file yields a working configuration
//! pointed at the OpenAI chat completions API.

use serde::{Deserialize, Serialize};

/// Top-level configuration for the relay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub provider: ProviderSettings,

    #[serde(default)]
    pub relay: RelaySettings,
}

/// Listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Completion provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Provider name; well-known names ("openai", "gemini", "mistral")
    /// select a default base URL.
    #[serde(default = "default_provider_name")]
    pub name: String,

    /// Override the provider's base URL.
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum output tokens per completion.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default)]
    pub temperature: Option<f64>,

    /// Upper bound on a single provider call, streaming included.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Sent ahead of the conversation on every request; never stored in
    /// the session history.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

fn default_provider_name() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            name: default_provider_name(),
            base_url: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: None,
            request_timeout_secs: default_request_timeout_secs(),
            api_key_env: default_api_key_env(),
            system_prompt: None,
        }
    }
}

/// Per-connection channel sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelaySettings {
    /// Capacity of each connection's outbound frame queue.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,

    /// Inbound frames buffered while a response is in flight.
    #[serde(default = "default_inbound_buffer")]
    pub inbound_buffer: usize,
}

fn default_outbound_buffer() -> usize {
    64
}

fn default_inbound_buffer() -> usize {
    16
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            outbound_buffer: default_outbound_buffer(),
            inbound_buffer: default_inbound_buffer(),
        }
    }
}
