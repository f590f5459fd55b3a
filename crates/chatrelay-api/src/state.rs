//! Application state wiring the relay services together.
//!
//! One session store and one connection registry are shared by the relay
//! engine (WebSocket side) and the history/broadcast handlers (HTTP side).

use std::sync::Arc;

use chatrelay_core::connection::ConnectionRegistry;
use chatrelay_core::history::HistoryService;
use chatrelay_core::llm::box_provider::BoxLlmProvider;
use chatrelay_core::llm::gateway::{CompletionGateway, GatewaySettings};
use chatrelay_core::relay::RelayEngine;
use chatrelay_core::session::SessionStore;
use chatrelay_types::config::RelayConfig;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RelayEngine>,
    pub sessions: Arc<SessionStore>,
    pub connections: Arc<ConnectionRegistry>,
    pub history: HistoryService,
    pub config: Arc<RelayConfig>,
}

impl AppState {
    /// Wire the services around an already constructed provider.
    pub fn new(config: RelayConfig, provider: BoxLlmProvider) -> Self {
        let sessions = Arc::new(SessionStore::new());
        let connections = Arc::new(ConnectionRegistry::new());

        let gateway = CompletionGateway::new(provider, GatewaySettings::from(&config.provider));
        let engine = RelayEngine::new(
            Arc::clone(&sessions),
            Arc::clone(&connections),
            Arc::new(gateway),
        )
        .with_inbound_buffer(config.relay.inbound_buffer);

        Self {
            engine: Arc::new(engine),
            history: HistoryService::new(Arc::clone(&sessions)),
            sessions,
            connections,
            config: Arc::new(config),
        }
    }

    /// Capacity of each connection's outbound frame queue.
    pub fn outbound_buffer(&self) -> usize {
        self.config.relay.outbound_buffer.max(1)
    }
}
