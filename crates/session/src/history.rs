use std::sync::Arc;

use proto::Turn;
use tracing::debug;

use crate::observer::SessionObserver;

/// Append-only conversation transcript.
pub struct SessionHistory {
    turns: Vec<Turn>,
    observer: Arc<dyn SessionObserver>,
}

impl SessionHistory {
    /// Creates an empty history.
    pub fn new(observer: Arc<dyn SessionObserver>) -> Self {
        Self {
            turns: Vec::new(),
            observer,
        }
    }

    /// Appends `turn` at the end.
    pub fn append(&mut self, turn: Turn) {
        debug!(role = %turn.role, bytes = turn.content.len(), "Turn appended");
        self.turns.push(turn);
        if let Some(turn) = self.turns.last() {
            self.observer.turn_appended(turn);
        }
    }

    /// Removes every turn.
    pub fn clear(&mut self) {
        debug!(turns = self.turns.len(), "History cleared");
        self.turns.clear();
        self.observer.history_cleared();
    }

    /// Read-only view of the full transcript in append order.
    pub fn snapshot(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
