//! Conversation engine orchestration.

/// Engine core and backend wiring.
pub mod core;

pub use core::{ChatBackends, ChatEngine};
