//! Inference provider abstraction and its HTTP implementations.

use std::time::Duration;

use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use proto::{LlmError, ProviderReply};
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Per-call provider options
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatOptions {
    /// Target model id.
    pub model: String,
}

impl ChatOptions {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }
}

/// Inference provider trait
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Sends a single prompt to the given model and returns the raw reply.
    async fn chat(&self, prompt: &str, options: &ChatOptions) -> Result<ProviderReply, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatBody<'a> {
    prompt: &'a str,
    options: &'a ChatOptions,
}

/// Generic JSON endpoint taking `{"prompt", "options": {"model"}}`.
///
/// The body may be any JSON value or plain text; it is classified with
/// [`ProviderReply::from_value`].
pub struct HttpInferenceProvider {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl HttpInferenceProvider {
    /// Creates a provider posting to `url` with the default timeout.
    pub fn new(url: impl Into<String>) -> Result<Self, LlmError> {
        Self::with_timeout(url, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    /// Creates a provider posting to `url` with an explicit timeout.
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Api(format!("build client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
            api_key: None,
        })
    }

    /// Sends `Authorization: Bearer <key>` with every request.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let key = api_key.into();
        self.api_key = (!key.is_empty()).then_some(key);
        self
    }
}

#[async_trait]
impl InferenceProvider for HttpInferenceProvider {
    async fn chat(&self, prompt: &str, options: &ChatOptions) -> Result<ProviderReply, LlmError> {
        debug!(
            url = %self.url,
            model = %options.model,
            bytes = prompt.len(),
            "Sending prompt to inference endpoint"
        );

        let mut request = self
            .client
            .post(&self.url)
            .json(&ChatBody { prompt, options });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| LlmError::Api(format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimit);
        }
        if !status.is_success() {
            return Err(LlmError::Api(format!("{status}: {}", body.trim())));
        }

        Ok(classify_body(body))
    }
}

/// Parses a reply body as JSON, keeping non-JSON bodies as plain text.
fn classify_body(body: String) -> ProviderReply {
    match serde_json::from_str::<Value>(&body) {
        Ok(value) => ProviderReply::from_value(value),
        Err(_) => ProviderReply::Text(body),
    }
}

/// OpenAI-compatible provider (works with OpenAI, together.ai, Ollama, etc.)
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
}

impl OpenAiProvider {
    /// Creates an OpenAI provider using the default API base URL.
    pub fn new(api_key: impl Into<String>) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        let client = Client::with_config(config);
        Self { client }
    }

    /// Creates an OpenAI provider with a custom API base URL.
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(base_url);
        let client = Client::with_config(config);
        Self { client }
    }
}

#[async_trait]
impl InferenceProvider for OpenAiProvider {
    async fn chat(&self, prompt: &str, options: &ChatOptions) -> Result<ProviderReply, LlmError> {
        let message = user_message(prompt)?;
        let request = CreateChatCompletionRequestArgs::default()
            .model(&options.model)
            .messages(vec![message])
            .build()
            .map_err(|e| LlmError::Serialization(e.to_string()))?;

        debug!(model = %options.model, "Sending request to OpenAI");

        let response = self.client.chat().create(request).await.map_err(|e| {
            let msg = e.to_string();
            debug!(error = %msg, "OpenAI API error");
            let hint = if msg.contains("does not exist") || msg.contains("model_not_found") {
                " Try /model to select a different model."
            } else {
                ""
            };
            LlmError::Api(format!("{msg}{hint}"))
        })?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("No choices in response".into()))?;

        Ok(match choice.message.content.clone() {
            Some(text) => ProviderReply::Text(text),
            None => ProviderReply::Opaque(serde_json::to_value(&choice.message).unwrap_or_default()),
        })
    }
}

/// Converts a prompt into an OpenAI user message.
fn user_message(prompt: &str) -> Result<ChatCompletionRequestMessage, LlmError> {
    Ok(ChatCompletionRequestMessage::User(
        ChatCompletionRequestUserMessageArgs::default()
            .content(prompt.to_string())
            .build()
            .map_err(|e| LlmError::Serialization(e.to_string()))?,
    ))
}
