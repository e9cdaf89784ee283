//! Request lifecycle state machine.
//!
//! The dispatcher owns the session context (active model, history, lifecycle
//! state) behind one mutex, which is the only place those are mutated. The
//! lock is released for the provider call, the single suspension point.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use proto::{DispatchState, LlmError, Model, ProviderReply, Turn};
use tracing::{debug, error, info, warn};

use crate::history::SessionHistory;
use crate::llm::{ChatOptions, InferenceProvider};
use crate::normalize::normalize;
use crate::observer::SessionObserver;
use crate::selector::ModelSelector;

/// Notice injected into the transcript when a provider call fails.
pub const DEFAULT_ERROR_NOTICE: &str = "System Error: Failed to connect to backend.";

/// Dispatcher tuning.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Text of the `system-error` turn appended on provider failure.
    pub error_notice: String,
    /// Deadline for a single provider call. `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            error_notice: DEFAULT_ERROR_NOTICE.to_string(),
            request_timeout: None,
        }
    }
}

/// Why a `send` was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The prompt was empty after trimming.
    EmptyPrompt,
    /// No model has been selected yet.
    NoActiveModel,
}

/// Result of a `send` call.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// A precondition failed; nothing changed.
    Skipped(SkipReason),
    /// Another request is still pending; nothing changed.
    Busy,
    /// The provider replied; carries the appended assistant turn.
    Replied(Turn),
    /// The provider failed; carries the appended system-error turn.
    Failed(Turn),
}

impl SendOutcome {
    /// The turn appended after resolution, if the send was accepted.
    pub fn turn(&self) -> Option<&Turn> {
        match self {
            Self::Replied(turn) | Self::Failed(turn) => Some(turn),
            Self::Skipped(_) | Self::Busy => None,
        }
    }

    /// Returns `true` if the prompt reached the provider.
    pub fn is_accepted(&self) -> bool {
        self.turn().is_some()
    }
}

struct SessionContext {
    selector: ModelSelector,
    history: SessionHistory,
    state: DispatchState,
}

/// Drives one request at a time through `Idle -> Pending -> Idle`.
pub struct RequestDispatcher {
    provider: Arc<dyn InferenceProvider>,
    observer: Arc<dyn SessionObserver>,
    context: Mutex<SessionContext>,
    config: DispatcherConfig,
}

impl RequestDispatcher {
    /// Creates a dispatcher with default configuration.
    pub fn new(provider: Arc<dyn InferenceProvider>, observer: Arc<dyn SessionObserver>) -> Self {
        Self::with_config(provider, observer, DispatcherConfig::default())
    }

    /// Creates a dispatcher with explicit configuration.
    pub fn with_config(
        provider: Arc<dyn InferenceProvider>,
        observer: Arc<dyn SessionObserver>,
        config: DispatcherConfig,
    ) -> Self {
        let context = SessionContext {
            selector: ModelSelector::new(Arc::clone(&observer)),
            history: SessionHistory::new(Arc::clone(&observer)),
            state: DispatchState::Idle,
        };
        Self {
            provider,
            observer,
            context: Mutex::new(context),
            config,
        }
    }

    pub fn state(&self) -> DispatchState {
        self.context.lock().state
    }

    pub fn current_model(&self) -> Option<Model> {
        self.context.lock().selector.current().cloned()
    }

    /// Makes `model` the active model.
    pub fn select_model(&self, model: Model) {
        self.context.lock().selector.select(model);
    }

    /// Selects `model` only when no model is active yet.
    ///
    /// Returns `true` if the selection happened.
    pub fn select_default(&self, model: Model) -> bool {
        let mut ctx = self.context.lock();
        if ctx.selector.current().is_some() {
            return false;
        }
        ctx.selector.select(model);
        true
    }

    /// Copy of the transcript in append order.
    pub fn history(&self) -> Vec<Turn> {
        self.context.lock().history.snapshot().to_vec()
    }

    /// Empties the transcript; the active model is kept.
    pub fn clear(&self) {
        self.context.lock().history.clear();
    }

    /// Sends `prompt` to the active model.
    ///
    /// Never returns an error: failures become a `system-error` turn and
    /// precondition misses are silent.
    pub async fn send(&self, prompt: &str) -> SendOutcome {
        let prompt = prompt.trim();

        let options = {
            let mut ctx = self.context.lock();
            if prompt.is_empty() {
                debug!("Ignoring empty prompt");
                return SendOutcome::Skipped(SkipReason::EmptyPrompt);
            }
            let Some(model) = ctx.selector.current() else {
                debug!("Ignoring prompt: no active model");
                return SendOutcome::Skipped(SkipReason::NoActiveModel);
            };
            let options = ChatOptions::new(model.id.clone());
            if ctx.state.is_pending() {
                warn!(model = %options.model, "Rejecting prompt while a request is pending");
                return SendOutcome::Busy;
            }

            ctx.history.append(Turn::user(prompt));
            ctx.state = DispatchState::Pending;
            self.observer.pending_changed(true);
            options
        };

        let mut guard = PendingGuard::new(self);
        info!(model = %options.model, bytes = prompt.len(), "Dispatching prompt");
        let result = self.call_provider(prompt, &options).await;
        guard.disarm();

        let mut ctx = self.context.lock();
        let outcome = match result {
            Ok(reply) => {
                let turn = Turn::assistant(normalize(&reply));
                ctx.history.append(turn.clone());
                SendOutcome::Replied(turn)
            }
            Err(err) => {
                error!(model = %options.model, error = %err, "Inference request failed");
                self.observer.request_failed();
                let turn = Turn::system_error(self.config.error_notice.clone());
                ctx.history.append(turn.clone());
                SendOutcome::Failed(turn)
            }
        };
        ctx.state = DispatchState::Idle;
        self.observer.pending_changed(false);
        outcome
    }

    async fn call_provider(
        &self,
        prompt: &str,
        options: &ChatOptions,
    ) -> Result<ProviderReply, LlmError> {
        let call = self.provider.chat(prompt, options);
        match self.config.request_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| LlmError::Timeout(limit))?,
            None => call.await,
        }
    }
}

/// Returns the dispatcher to `Idle` if a `send` future is dropped while
/// awaiting the provider.
struct PendingGuard<'a> {
    dispatcher: &'a RequestDispatcher,
    armed: bool,
}

impl<'a> PendingGuard<'a> {
    fn new(dispatcher: &'a RequestDispatcher) -> Self {
        Self {
            dispatcher,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut ctx = self.dispatcher.context.lock();
        if ctx.state.is_pending() {
            warn!("Request abandoned before the provider replied");
            ctx.state = DispatchState::Idle;
            self.dispatcher.observer.pending_changed(false);
        }
    }
}
