//! In-memory conversation history, one [`ChatSession`] per client id.
//!
//! [`ChatSession`]: chatrelay_types::chat::ChatSession

pub mod store;

pub use store::SessionStore;
