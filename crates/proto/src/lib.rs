//! Shared protocol types for the session controller and its front ends.
//!
//! This crate defines serializable model/turn/event structures, the
//! classified provider reply, and strongly-typed error enums shared across
//! the workspace.

pub mod error;
pub mod event;
pub mod message;
pub mod model;
pub mod reply;

/// Re-export of all protocol error types.
pub use error::*;
/// Re-export of lifecycle and notification types.
pub use event::{DispatchState, SessionEvent};
/// Re-export of conversation identity and transcript types.
pub use message::{Role, SessionId, Turn};
/// Re-export of the model directory entry.
pub use model::Model;
/// Re-export of the classified provider reply.
pub use reply::ProviderReply;
