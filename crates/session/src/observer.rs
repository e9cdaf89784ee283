//! View notification surface.

use proto::{Model, SessionEvent, Turn};
use tokio::sync::mpsc;

/// Receives synchronous notifications about session changes.
///
/// Callbacks run inside the dispatcher's transition boundary, so
/// implementations must not call back into the session.
pub trait SessionObserver: Send + Sync {
    /// A catalog load completed with the given models, in fetch order.
    fn catalog_loaded(&self, _models: &[Model]) {}

    /// The active model changed.
    fn model_changed(&self, _model: &Model) {}

    /// A turn was appended to history.
    fn turn_appended(&self, _turn: &Turn) {}

    /// The pending indicator toggled.
    fn pending_changed(&self, _pending: bool) {}

    /// History was emptied.
    fn history_cleared(&self) {}

    /// The in-flight request failed.
    fn request_failed(&self) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// Forwards notifications as [`SessionEvent`]s over an unbounded channel.
///
/// Events are dropped silently once the receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelObserver {
    /// Creates an observer together with the receiving end.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Wraps an existing sender.
    pub fn new(tx: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self { tx }
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.tx.send(event);
    }
}

impl SessionObserver for ChannelObserver {
    fn catalog_loaded(&self, models: &[Model]) {
        self.emit(SessionEvent::CatalogLoaded {
            models: models.to_vec(),
        });
    }

    fn model_changed(&self, model: &Model) {
        self.emit(SessionEvent::ModelChanged {
            model: model.clone(),
        });
    }

    fn turn_appended(&self, turn: &Turn) {
        self.emit(SessionEvent::TurnAppended { turn: turn.clone() });
    }

    fn pending_changed(&self, pending: bool) {
        self.emit(SessionEvent::PendingChanged { pending });
    }

    fn history_cleared(&self) {
        self.emit(SessionEvent::HistoryCleared);
    }

    fn request_failed(&self) {
        self.emit(SessionEvent::RequestFailed);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use parking_lot::Mutex;

    use super::*;

    /// Records every notification as a [`SessionEvent`].
    #[derive(Default)]
    pub(crate) struct RecordingObserver {
        events: Mutex<Vec<SessionEvent>>,
    }

    impl RecordingObserver {
        pub(crate) fn events(&self) -> Vec<SessionEvent> {
            self.events.lock().clone()
        }
    }

    impl SessionObserver for RecordingObserver {
        fn catalog_loaded(&self, models: &[Model]) {
            self.events.lock().push(SessionEvent::CatalogLoaded {
                models: models.to_vec(),
            });
        }

        fn model_changed(&self, model: &Model) {
            self.events.lock().push(SessionEvent::ModelChanged {
                model: model.clone(),
            });
        }

        fn turn_appended(&self, turn: &Turn) {
            self.events
                .lock()
                .push(SessionEvent::TurnAppended { turn: turn.clone() });
        }

        fn pending_changed(&self, pending: bool) {
            self.events
                .lock()
                .push(SessionEvent::PendingChanged { pending });
        }

        fn history_cleared(&self) {
            self.events.lock().push(SessionEvent::HistoryCleared);
        }

        fn request_failed(&self) {
            self.events.lock().push(SessionEvent::RequestFailed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_observer_forwards_events_in_order() {
        let (observer, mut rx) = ChannelObserver::channel();
        let model = Model::new("m1", "Alpha", "a");

        observer.model_changed(&model);
        observer.pending_changed(true);
        observer.history_cleared();

        assert_eq!(
            rx.try_recv().expect("first"),
            SessionEvent::ModelChanged { model }
        );
        assert_eq!(
            rx.try_recv().expect("second"),
            SessionEvent::PendingChanged { pending: true }
        );
        assert_eq!(rx.try_recv().expect("third"), SessionEvent::HistoryCleared);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn channel_observer_ignores_closed_receiver() {
        let (observer, rx) = ChannelObserver::channel();
        drop(rx);
        observer.request_failed();
    }

    #[test]
    fn noop_observer_accepts_everything() {
        let observer = NoopObserver;
        observer.catalog_loaded(&[]);
        observer.turn_appended(&Turn::user("hi"));
        observer.pending_changed(false);
    }
}
