use serde::{Deserialize, Serialize};

use crate::message::Turn;
use crate::model::Model;

/// Lifecycle state of the request dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchState {
    /// No request in flight.
    #[default]
    Idle,
    /// A provider call is awaiting its reply.
    Pending,
}

impl DispatchState {
    /// Returns `true` while a request is in flight.
    pub fn is_pending(self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Notifications published by the session controller to the view layer.
///
/// These events are sent via `tokio::sync::mpsc` by `ChannelObserver` so
/// that a renderer can follow the session without touching its state.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A catalog load completed.
    CatalogLoaded { models: Vec<Model> },
    /// The active model changed.
    ModelChanged { model: Model },
    /// A turn was appended to history.
    TurnAppended { turn: Turn },
    /// The pending indicator toggled.
    PendingChanged { pending: bool },
    /// History was emptied.
    HistoryCleared,
    /// The in-flight request failed; the notice turn follows separately.
    RequestFailed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_state_defaults_to_idle() {
        let state = DispatchState::default();
        assert_eq!(state, DispatchState::Idle);
        assert!(!state.is_pending());
        assert!(DispatchState::Pending.is_pending());
    }

    #[test]
    fn dispatch_state_serializes_lowercase() {
        let json = serde_json::to_string(&DispatchState::Pending).expect("serialize");
        assert_eq!(json, "\"pending\"");
    }

    #[test]
    fn turn_appended_carries_the_turn() {
        let turn = Turn::user("hello");
        let event = SessionEvent::TurnAppended { turn: turn.clone() };
        let SessionEvent::TurnAppended { turn: carried } = event else {
            panic!("expected turn event");
        };
        assert_eq!(carried, turn);
    }
}
