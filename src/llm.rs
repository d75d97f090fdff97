//! HTTP client for the configured model backend.
//!
//! Two wire shapes exist: the chat-completion shape used by remote
//! (OpenAI-compatible) endpoints and by the analysis pipeline, and the simpler
//! `{model, prompt, stream}` shape used by local backends.

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::config::{ApiConfig, ApiMode};

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API request failed: {status}")]
    Status { status: u16 },

    #[error("API request could not be completed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API response itself was not the expected JSON envelope.
    #[error("malformed API response: {0}")]
    Envelope(String),

    /// The envelope parsed, but the model's reply text was not the JSON it
    /// was instructed to produce.
    #[error("model reply is not the instructed JSON: {0}")]
    Content(String),
}

/// The object the analysis prompt instructs the model to return.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisReply {
    #[serde(default)]
    pub routes: Vec<String>,

    #[serde(default)]
    pub vulnerabilities: Vec<String>,
}

/// Bearer keys always carry the `sk-` prefix: prefixed when missing, never
/// duplicated.
pub fn normalize_api_key(key: &str) -> String {
    if key.starts_with("sk-") {
        key.to_string()
    } else {
        format!("sk-{key}")
    }
}

pub struct LlmClient {
    client: reqwest::Client,
    api: ApiConfig,
}

impl LlmClient {
    pub fn new(api: ApiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api,
        }
    }

    /// Run one analysis request. Always uses the chat-completion shape,
    /// whatever the configured mode.
    pub async fn analyze(&self, prompt: &str) -> Result<AnalysisReply, LlmError> {
        let reply = self.chat_completion(prompt).await?;

        serde_json::from_str(&reply).map_err(|error| LlmError::Content(error.to_string()))
    }

    /// Free-form chat turn, in the shape the configured mode expects.
    pub async fn chat(&self, message: &str) -> Result<String, LlmError> {
        match self.api.mode {
            ApiMode::Local => self.generate(message).await,
            ApiMode::Remote => self.chat_completion(message).await,
        }
    }

    /// Model listing from the backend's `/v1/models` endpoint.
    pub async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        let url = format!("{}/v1/models", self.api.base_url());

        let mut request = self.client.get(&url);
        if let Some(key) = self.bearer_key() {
            request = request.bearer_auth(key);
        }

        let envelope = self.read_envelope(request).await?;

        let ids = envelope
            .get("data")
            .and_then(Value::as_array)
            .ok_or_else(|| LlmError::Envelope("missing `data` array".to_string()))?
            .iter()
            .filter_map(|model| model.get("id").and_then(Value::as_str))
            .map(str::to_string)
            .collect();

        Ok(ids)
    }

    async fn chat_completion(&self, content: &str) -> Result<String, LlmError> {
        let payload = json!({
            "model": self.api.model,
            "messages": [
                {
                    "role": "user",
                    "content": content,
                }
            ],
            "stream": false,
        });

        let mut request = self.client.post(&self.api.url).json(&payload);
        if let Some(key) = self.bearer_key() {
            request = request.bearer_auth(key);
        }

        let envelope = self.read_envelope(request).await?;

        envelope
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| LlmError::Envelope("missing `choices[0].message.content`".to_string()))
    }

    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let payload = json!({
            "model": self.api.model,
            "prompt": prompt,
            "stream": false,
        });

        let request = self.client.post(&self.api.url).json(&payload);
        let envelope = self.read_envelope(request).await?;

        envelope
            .get("response")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| LlmError::Envelope("missing `response` field".to_string()))
    }

    async fn read_envelope(&self, request: reqwest::RequestBuilder) -> Result<Value, LlmError> {
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            debug!(%status, "backend rejected request");
            return Err(LlmError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|error| LlmError::Envelope(error.to_string()))
    }

    fn bearer_key(&self) -> Option<String> {
        self.api
            .key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .map(normalize_api_key)
    }
}
