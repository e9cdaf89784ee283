//! Session controller: model catalog, active model, transcript, and the
//! request dispatcher that talks to inference providers.

pub mod catalog;
pub mod chat;
pub mod dispatcher;
pub mod history;
pub mod llm;
pub mod normalize;
pub mod observer;
pub mod selector;

/// Model directory sources and the loaded catalog.
pub use catalog::{CatalogSource, HttpCatalogSource, ModelCatalog, StaticCatalogSource};
/// Session facade used by front ends.
pub use chat::{ChatSession, SessionOptions};
/// Request lifecycle state machine.
pub use dispatcher::{
    DEFAULT_ERROR_NOTICE, DispatcherConfig, RequestDispatcher, SendOutcome, SkipReason,
};
/// Append-only transcript.
pub use history::SessionHistory;
/// Inference provider interface and implementations.
pub use llm::{ChatOptions, HttpInferenceProvider, InferenceProvider, OpenAiProvider};
/// Reply-to-text conversion.
pub use normalize::normalize;
/// View notification surface.
pub use observer::{ChannelObserver, NoopObserver, SessionObserver};
/// Active model holder.
pub use selector::ModelSelector;
