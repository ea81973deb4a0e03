//! Request pipeline.
//!
//! ```text
//! Received → Validated → Sanitized → RateChecked → Invoking → Responded
//!     └────────┴───────────┴─────────────┴────────────┴──→ Rejected / Failed
//! ```

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ExplainerConfig;
use crate::explain::request::{validate, CodeRequest, SupportedLanguages, ValidationError};
use crate::llm::{InferenceBackend, InvocationError, ModelInvoker};
use crate::observability::metrics;
use crate::schema::CodeExplanation;
use crate::security::{sanitize, RateDecision, RateLimiter};

/// Returned as `detail` for every backend failure.
pub const BACKEND_FAILURE_DETAIL: &str = "Error communicating with the AI model. Please try again.";

/// Everything the pipeline can refuse or fail with.
#[derive(Debug, Error)]
pub enum ExplainError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Request body exceeds {limit} bytes.")]
    PayloadTooLarge { limit: usize },

    #[error("Rate limit exceeded: {limit}")]
    RateLimited { retry_after: Duration, limit: String },

    /// Display is the generic client-facing message; the cause stays in the source.
    #[error("{}", BACKEND_FAILURE_DETAIL)]
    Invocation(#[source] InvocationError),
}

impl From<InvocationError> for ExplainError {
    fn from(e: InvocationError) -> Self {
        ExplainError::Invocation(e)
    }
}

/// Pipeline position, recorded in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Validated,
    Sanitized,
    RateChecked,
    Invoking,
    Responded,
    Rejected,
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Received => "received",
            Stage::Validated => "validated",
            Stage::Sanitized => "sanitized",
            Stage::RateChecked => "rate_checked",
            Stage::Invoking => "invoking",
            Stage::Responded => "responded",
            Stage::Rejected => "rejected",
            Stage::Failed => "failed",
        }
    }
}

/// Owns the limiter and invoker; shared by all handlers through axum state.
pub struct ExplainService {
    languages: SupportedLanguages,
    max_code_chars: usize,
    limiter: Arc<RateLimiter>,
    invoker: ModelInvoker,
}

impl ExplainService {
    pub fn new(
        languages: SupportedLanguages,
        max_code_chars: usize,
        limiter: Arc<RateLimiter>,
        invoker: ModelInvoker,
    ) -> Self {
        Self {
            languages,
            max_code_chars,
            limiter,
            invoker,
        }
    }

    pub fn from_config(config: &ExplainerConfig, backend: Arc<dyn InferenceBackend>) -> Self {
        Self::new(
            SupportedLanguages::new(&config.request.supported_languages),
            config.request.max_code_chars,
            Arc::new(RateLimiter::from_config(&config.rate_limit)),
            ModelInvoker::from_config(backend, config),
        )
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Run one request through the pipeline for `client_key`.
    pub async fn handle(
        &self,
        client_key: &str,
        request: CodeRequest,
    ) -> Result<CodeExplanation, ExplainError> {
        debug!(
            stage = Stage::Received.as_str(),
            language = %request.language,
            code_chars = request.code.len()
        );

        let validated = match validate(request, &self.languages, self.max_code_chars) {
            Ok(v) => v,
            Err(e) => {
                info!(stage = Stage::Rejected.as_str(), reason = %e, "Invalid request");
                metrics::record_rejection("validation");
                return Err(e.into());
            }
        };
        debug!(stage = Stage::Validated.as_str(), language = %validated.language);

        let code = sanitize(&validated.code);
        debug!(
            stage = Stage::Sanitized.as_str(),
            removed_chars = validated.code.len().saturating_sub(code.len())
        );

        if let RateDecision::Limited { retry_after } = self.limiter.check(client_key) {
            warn!(
                stage = Stage::Rejected.as_str(),
                client = %client_key,
                retry_after = ?retry_after,
                "Rate limit exceeded"
            );
            metrics::record_rejection("rate_limit");
            return Err(ExplainError::RateLimited {
                retry_after,
                limit: self.limiter.describe(),
            });
        }
        debug!(stage = Stage::RateChecked.as_str());

        debug!(stage = Stage::Invoking.as_str(), model = %self.invoker.model());
        match self.invoker.explain(&validated.language, &code).await {
            Ok(explanation) => {
                info!(
                    stage = Stage::Responded.as_str(),
                    lines = explanation.line_by_line.len(),
                    "Explanation ready"
                );
                Ok(explanation)
            }
            Err(e) => {
                warn!(
                    stage = Stage::Failed.as_str(),
                    cause = e.cause_label(),
                    error = %e,
                    "Model invocation failed"
                );
                Err(e.into())
            }
        }
    }
}
