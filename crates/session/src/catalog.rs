//! Model directory loading.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use proto::{CatalogError, Model};
use tracing::{debug, info, warn};

const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 20;

/// External directory of available models.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetches the model list in server-determined order.
    async fn fetch(&self) -> Result<Vec<Model>, CatalogError>;

    /// Short label for logs.
    fn describe(&self) -> String;
}

/// Directory served over HTTP as a JSON array of models.
pub struct HttpCatalogSource {
    client: reqwest::Client,
    url: String,
}

impl HttpCatalogSource {
    /// Creates a source for `url` with the default request timeout.
    pub fn new(url: impl Into<String>) -> Result<Self, CatalogError> {
        Self::with_timeout(url, Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS))
    }

    /// Creates a source for `url` with an explicit request timeout.
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| CatalogError::Request(format!("build client: {err}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn fetch(&self) -> Result<Vec<Model>, CatalogError> {
        debug!(url = %self.url, "Fetching model directory");
        self.client
            .get(&self.url)
            .send()
            .await
            .map_err(|err| CatalogError::Request(err.to_string()))?
            .error_for_status()
            .map_err(|err| CatalogError::Status(err.to_string()))?
            .json::<Vec<Model>>()
            .await
            .map_err(|err| CatalogError::Decode(err.to_string()))
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// In-memory directory.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalogSource {
    models: Vec<Model>,
}

impl StaticCatalogSource {
    /// Serves exactly `models`.
    pub fn new(models: Vec<Model>) -> Self {
        Self { models }
    }

    /// Serves the embedded default directory.
    pub fn builtin() -> Self {
        Self::new(builtin_models())
    }
}

#[async_trait]
impl CatalogSource for StaticCatalogSource {
    async fn fetch(&self) -> Result<Vec<Model>, CatalogError> {
        Ok(self.models.clone())
    }

    fn describe(&self) -> String {
        "builtin".to_string()
    }
}

/// Embedded default directory, used when no directory URL is configured.
pub fn builtin_models() -> Vec<Model> {
    vec![
        Model::new("gpt-4o", "GPT-4o", "⚡").with_provider("OpenAI"),
        Model::new("gpt-4o-mini", "GPT-4o Mini", "🚀").with_provider("OpenAI"),
        Model::new("claude-sonnet-4.5", "Claude Sonnet 4.5", "🧠").with_provider("Anthropic"),
        Model::new("gemini-1.5-pro", "Gemini 1.5 Pro", "💎").with_provider("Google"),
        Model::new("meta-llama/llama-3.1-70b-instruct", "Llama 3.1 70B", "🦙")
            .with_provider("Meta"),
        Model::new("mistral-large-latest", "Mistral Large", "🌪️").with_provider("Mistral"),
    ]
}

/// One-shot snapshot of the model directory.
///
/// Keeps fetch order. There are no mutation methods; reloading builds a new
/// catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelCatalog {
    models: Vec<Model>,
}

impl ModelCatalog {
    /// Fetches the directory from `source`.
    pub async fn load(source: &dyn CatalogSource) -> Result<Self, CatalogError> {
        let fetched = source.fetch().await?;
        let catalog = Self::from_models(fetched);
        info!(
            source = %source.describe(),
            models = catalog.len(),
            "Model catalog loaded"
        );
        Ok(catalog)
    }

    /// Builds a catalog, dropping blank ids and repeated ids.
    ///
    /// Ids are kept exactly as the directory advertised them.
    pub fn from_models(models: Vec<Model>) -> Self {
        let mut seen = HashSet::new();
        let models = models
            .into_iter()
            .filter_map(|model| {
                if model.id.trim().is_empty() {
                    warn!(name = %model.name, "Dropping model without id");
                    return None;
                }
                if !seen.insert(model.id.clone()) {
                    warn!(id = %model.id, "Dropping duplicate model id");
                    return None;
                }
                Some(model)
            })
            .collect();
        Self { models }
    }

    /// Models in fetch order.
    pub fn list(&self) -> &[Model] {
        &self.models
    }

    /// Looks up a model by identifier.
    pub fn get(&self, id: &str) -> Option<&Model> {
        self.models.iter().find(|model| model.id == id)
    }

    /// First model in fetch order.
    pub fn first(&self) -> Option<&Model> {
        self.models.first()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
