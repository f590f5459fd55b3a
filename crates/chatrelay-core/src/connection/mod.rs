//! Live client connections keyed by client id.

pub mod registry;

pub use registry::{ConnectionRegistry, OutboundSender};
