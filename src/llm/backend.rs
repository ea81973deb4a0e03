//! Inference backend abstraction.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::resilience::{Retryable, TimeoutError};

/// One prompt submission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerateRequest<'a> {
    pub prompt: &'a str,
    pub temperature: f32,
    /// Ask the backend to constrain its output to JSON.
    pub json_format: bool,
}

/// Failures talking to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("cannot reach inference backend: {0}")]
    Connect(String),

    #[error("inference backend timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("inference backend returned HTTP {status}: {snippet}")]
    Status { status: u16, snippet: String },

    #[error("failed to decode backend response: {0}")]
    Decode(String),

    #[error("backend transport error: {0}")]
    Transport(String),
}

impl Retryable for BackendError {
    fn is_transient(&self) -> bool {
        match self {
            BackendError::Connect(_) | BackendError::Timeout(_) => true,
            BackendError::Status { status, .. } => matches!(status, 502 | 503 | 504),
            BackendError::Decode(_) | BackendError::Transport(_) => false,
        }
    }
}

impl From<TimeoutError> for BackendError {
    fn from(e: TimeoutError) -> Self {
        BackendError::Timeout(e.limit)
    }
}

/// A service that accepts a prompt and returns generated text.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Model identifier prompts are sent to.
    fn model(&self) -> &str;

    /// Submit a prompt and wait for the complete (non-streamed) response.
    async fn generate(&self, request: GenerateRequest<'_>) -> Result<String, BackendError>;
}
