use std::sync::Arc;

use proto::Model;
use tracing::debug;

use crate::observer::SessionObserver;

/// Holds the single active model.
pub struct ModelSelector {
    active: Option<Model>,
    observer: Arc<dyn SessionObserver>,
}

impl ModelSelector {
    /// Creates a selector with no active model.
    pub fn new(observer: Arc<dyn SessionObserver>) -> Self {
        Self {
            active: None,
            observer,
        }
    }

    /// Makes `model` the active model, replacing any previous one.
    ///
    /// Membership in the current catalog is not checked.
    pub fn select(&mut self, model: Model) {
        debug!(
            previous = ?self.active.as_ref().map(|m| m.id.as_str()),
            model = %model.id,
            "Active model changed"
        );
        let active = self.active.insert(model);
        self.observer.model_changed(active);
    }

    /// The active model, if any has been selected.
    pub fn current(&self) -> Option<&Model> {
        self.active.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use proto::SessionEvent;

    use super::*;
    use crate::observer::testing::RecordingObserver;

    #[test]
    fn starts_without_active_model() {
        let selector = ModelSelector::new(Arc::new(RecordingObserver::default()));
        assert!(selector.current().is_none());
    }

    #[test]
    fn selecting_b_after_a_leaves_only_b() {
        let observer = Arc::new(RecordingObserver::default());
        let mut selector = ModelSelector::new(observer.clone());
        let a = Model::new("m1", "Alpha", "a");
        let b = Model::new("m2", "Beta", "b");

        selector.select(a.clone());
        selector.select(b.clone());

        assert_eq!(selector.current(), Some(&b));
        assert_eq!(
            observer.events(),
            vec![
                SessionEvent::ModelChanged { model: a },
                SessionEvent::ModelChanged { model: b },
            ]
        );
    }

    #[test]
    fn reselecting_same_model_still_notifies() {
        let observer = Arc::new(RecordingObserver::default());
        let mut selector = ModelSelector::new(observer.clone());
        let a = Model::new("m1", "Alpha", "a");

        selector.select(a.clone());
        selector.select(a);

        assert_eq!(observer.events().len(), 2);
    }
}
