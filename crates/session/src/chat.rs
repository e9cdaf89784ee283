//! Session facade tying the model directory to the dispatcher.

use std::sync::Arc;

use parking_lot::RwLock;
use proto::{CatalogError, DispatchState, Model, SessionId, Turn};
use tracing::{debug, info, warn};

use crate::catalog::{CatalogSource, ModelCatalog};
use crate::dispatcher::{DispatcherConfig, RequestDispatcher, SendOutcome};
use crate::llm::InferenceProvider;
use crate::observer::SessionObserver;

/// Options for a [`ChatSession`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Select the first catalog entry after a load when nothing is active.
    pub auto_select_first: bool,
    /// Model id to prefer over the first entry when it is in the catalog.
    pub preferred_model: Option<String>,
    /// Dispatcher tuning.
    pub dispatcher: DispatcherConfig,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            auto_select_first: true,
            preferred_model: None,
            dispatcher: DispatcherConfig::default(),
        }
    }
}

/// One interactive conversation: catalog, active model, transcript.
pub struct ChatSession {
    id: SessionId,
    source: Arc<dyn CatalogSource>,
    catalog: RwLock<ModelCatalog>,
    dispatcher: RequestDispatcher,
    observer: Arc<dyn SessionObserver>,
    options: SessionOptions,
}

impl ChatSession {
    /// Creates a session with an empty catalog and no active model.
    pub fn new(
        source: Arc<dyn CatalogSource>,
        provider: Arc<dyn InferenceProvider>,
        observer: Arc<dyn SessionObserver>,
        options: SessionOptions,
    ) -> Self {
        let dispatcher = RequestDispatcher::with_config(
            provider,
            Arc::clone(&observer),
            options.dispatcher.clone(),
        );
        Self {
            id: SessionId::new(),
            source,
            catalog: RwLock::new(ModelCatalog::default()),
            dispatcher,
            observer,
            options,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Fetches the directory and replaces the catalog.
    ///
    /// On failure the previous catalog stays in place and the error is
    /// returned for the caller to render. No retry is attempted.
    pub async fn load_catalog(&self) -> Result<Vec<Model>, CatalogError> {
        let catalog = match ModelCatalog::load(self.source.as_ref()).await {
            Ok(catalog) => catalog,
            Err(err) => {
                warn!(
                    session = %self.id,
                    source = %self.source.describe(),
                    error = %err,
                    "Model catalog load failed"
                );
                return Err(err);
            }
        };

        let models = catalog.list().to_vec();
        *self.catalog.write() = catalog;
        self.observer.catalog_loaded(&models);

        if let Some(model) = self.default_model(&models) {
            let id = model.id.clone();
            if self.dispatcher.select_default(model) {
                info!(session = %self.id, model = %id, "Default model selected");
            }
        }
        Ok(models)
    }

    fn default_model(&self, models: &[Model]) -> Option<Model> {
        if let Some(id) = self.options.preferred_model.as_deref() {
            if let Some(model) = models.iter().find(|model| model.id == id) {
                return Some(model.clone());
            }
            warn!(model = %id, "Preferred model is not in the catalog");
        }
        if self.options.auto_select_first {
            models.first().cloned()
        } else {
            None
        }
    }

    /// Models from the last successful load, in fetch order.
    pub fn models(&self) -> Vec<Model> {
        self.catalog.read().list().to_vec()
    }

    /// Selects a catalog entry by id. Unknown ids change nothing.
    pub fn select_model_by_id(&self, id: &str) -> Option<Model> {
        let model = self.catalog.read().get(id).cloned();
        match model {
            Some(model) => {
                self.dispatcher.select_model(model.clone());
                Some(model)
            }
            None => {
                debug!(model = %id, "Unknown model id");
                None
            }
        }
    }

    /// Selects `model` without checking the catalog.
    pub fn select_model(&self, model: Model) {
        self.dispatcher.select_model(model);
    }

    pub fn current_model(&self) -> Option<Model> {
        self.dispatcher.current_model()
    }

    pub fn history(&self) -> Vec<Turn> {
        self.dispatcher.history()
    }

    pub fn clear(&self) {
        self.dispatcher.clear();
    }

    pub fn state(&self) -> DispatchState {
        self.dispatcher.state()
    }

    /// Sends a prompt to the active model. See [`RequestDispatcher::send`].
    pub async fn send(&self, prompt: &str) -> SendOutcome {
        self.dispatcher.send(prompt).await
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use proto::{LlmError, ProviderReply, SessionEvent};

    use super::*;
    use crate::catalog::StaticCatalogSource;
    use crate::llm::ChatOptions;
    use crate::observer::NoopObserver;
    use crate::observer::testing::RecordingObserver;

    struct EchoProvider;

    #[async_trait]
    impl InferenceProvider for EchoProvider {
        async fn chat(
            &self,
            prompt: &str,
            options: &ChatOptions,
        ) -> Result<ProviderReply, LlmError> {
            Ok(ProviderReply::Text(format!("{}:{prompt}", options.model)))
        }
    }

    struct FailingSource;

    #[async_trait]
    impl CatalogSource for FailingSource {
        async fn fetch(&self) -> Result<Vec<Model>, CatalogError> {
            Err(CatalogError::Decode("expected array".to_string()))
        }

        fn describe(&self) -> String {
            "failing".to_string()
        }
    }

    fn alpha_beta() -> Vec<Model> {
        vec![
            Model::new("m1", "Alpha", "a"),
            Model::new("m2", "Beta", "b"),
        ]
    }

    fn session(source: Arc<dyn CatalogSource>, options: SessionOptions) -> ChatSession {
        ChatSession::new(source, Arc::new(EchoProvider), Arc::new(NoopObserver), options)
    }

    #[tokio::test]
    async fn load_selects_first_entry_by_default() {
        let session = session(
            Arc::new(StaticCatalogSource::new(alpha_beta())),
            SessionOptions::default(),
        );

        let models = session.load_catalog().await.expect("load");

        assert_eq!(models.len(), 2);
        assert_eq!(session.current_model().map(|m| m.id), Some("m1".to_string()));
    }

    #[tokio::test]
    async fn load_prefers_configured_model() {
        let session = session(
            Arc::new(StaticCatalogSource::new(alpha_beta())),
            SessionOptions {
                preferred_model: Some("m2".to_string()),
                ..SessionOptions::default()
            },
        );

        session.load_catalog().await.expect("load");

        assert_eq!(session.current_model().map(|m| m.id), Some("m2".to_string()));
    }

    #[tokio::test]
    async fn load_without_auto_select_leaves_no_model() {
        let session = session(
            Arc::new(StaticCatalogSource::new(alpha_beta())),
            SessionOptions {
                auto_select_first: false,
                preferred_model: Some("missing".to_string()),
                ..SessionOptions::default()
            },
        );

        session.load_catalog().await.expect("load");

        assert!(session.current_model().is_none());
        assert_eq!(
            session.send("Hello").await,
            SendOutcome::Skipped(crate::dispatcher::SkipReason::NoActiveModel)
        );
    }

    #[tokio::test]
    async fn reload_keeps_explicit_selection() {
        let session = session(
            Arc::new(StaticCatalogSource::new(alpha_beta())),
            SessionOptions::default(),
        );
        session.load_catalog().await.expect("load");
        session.select_model_by_id("m2").expect("known id");

        session.load_catalog().await.expect("reload");

        assert_eq!(session.current_model().map(|m| m.id), Some("m2".to_string()));
    }

    #[tokio::test]
    async fn empty_catalog_selects_nothing() {
        let session = session(
            Arc::new(StaticCatalogSource::new(Vec::new())),
            SessionOptions::default(),
        );

        let models = session.load_catalog().await.expect("load");

        assert!(models.is_empty());
        assert!(session.current_model().is_none());
    }

    #[tokio::test]
    async fn failed_load_propagates_and_keeps_state() {
        let observer = Arc::new(RecordingObserver::default());
        let session = ChatSession::new(
            Arc::new(FailingSource),
            Arc::new(EchoProvider),
            observer.clone(),
            SessionOptions::default(),
        );

        let err = session.load_catalog().await.expect_err("should fail");

        assert!(matches!(err, CatalogError::Decode(_)));
        assert!(session.models().is_empty());
        assert!(session.current_model().is_none());
        assert!(observer.events().is_empty());
    }

    #[tokio::test]
    async fn unknown_id_leaves_selection_unchanged() {
        let session = session(
            Arc::new(StaticCatalogSource::new(alpha_beta())),
            SessionOptions::default(),
        );
        session.load_catalog().await.expect("load");

        assert!(session.select_model_by_id("m9").is_none());
        assert_eq!(session.current_model().map(|m| m.id), Some("m1".to_string()));
    }

    #[tokio::test]
    async fn select_model_accepts_models_outside_catalog() {
        let session = session(
            Arc::new(StaticCatalogSource::new(alpha_beta())),
            SessionOptions::default(),
        );
        let outsider = Model::new("x1", "Outsider", "x");

        session.select_model(outsider.clone());

        assert_eq!(session.current_model(), Some(outsider));
    }

    #[tokio::test]
    async fn send_uses_active_model_and_clear_keeps_it() {
        let observer = Arc::new(RecordingObserver::default());
        let session = ChatSession::new(
            Arc::new(StaticCatalogSource::new(alpha_beta())),
            Arc::new(EchoProvider),
            observer.clone(),
            SessionOptions::default(),
        );
        session.load_catalog().await.expect("load");
        session.select_model_by_id("m2");

        let outcome = session.send("Hello").await;
        assert_eq!(outcome.turn().map(|t| t.content.as_str()), Some("m2:Hello"));
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.state(), DispatchState::Idle);

        session.clear();
        assert!(session.history().is_empty());
        assert_eq!(session.current_model().map(|m| m.id), Some("m2".to_string()));

        let events = observer.events();
        assert!(matches!(events[0], SessionEvent::CatalogLoaded { ref models } if models.len() == 2));
        assert_eq!(events.last(), Some(&SessionEvent::HistoryCleared));
    }
}
