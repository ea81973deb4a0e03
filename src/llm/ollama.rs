//! Ollama client.
//!
//! Talks to `POST {endpoint}/api/generate` with `stream = false` and
//! `format = "json"`, returning the `response` field of the reply.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::BackendConfig;
use crate::llm::backend::{BackendError, GenerateRequest, InferenceBackend};

/// Longest slice of an error body kept for diagnostics.
const SNIPPET_CHARS: usize = 200;

#[derive(Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Thin client for a local Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    client: reqwest::Client,
    model: String,
    url_generate: String,
    timeout: Duration,
}

impl OllamaBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let timeout = Duration::from_millis(config.request_timeout_ms);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            model: config.model.clone(),
            url_generate: format!("{}/api/generate", config.endpoint.trim_end_matches('/')),
            timeout,
        })
    }

    fn classify(&self, e: reqwest::Error) -> BackendError {
        if e.is_timeout() {
            BackendError::Timeout(self.timeout)
        } else if e.is_connect() {
            BackendError::Connect(e.to_string())
        } else if e.is_decode() {
            BackendError::Decode(e.to_string())
        } else {
            BackendError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl InferenceBackend for OllamaBackend {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: GenerateRequest<'_>) -> Result<String, BackendError> {
        let body = GenerateBody {
            model: &self.model,
            prompt: request.prompt,
            stream: false,
            format: request.json_format.then_some("json"),
            options: GenerateOptions {
                temperature: request.temperature,
            },
        };

        debug!(
            model = %self.model,
            url = %self.url_generate,
            prompt_chars = request.prompt.len(),
            "Sending prompt"
        );
        let resp = self
            .client
            .post(&self.url_generate)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                snippet: text.chars().take(SNIPPET_CHARS).collect(),
            });
        }

        let reply: GenerateResponse = resp.json().await.map_err(|e| self.classify(e))?;
        Ok(reply.response)
    }
}
