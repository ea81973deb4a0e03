//! Model invocation: prompt → backend → validated explanation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ExplainerConfig;
use crate::llm::backend::{BackendError, GenerateRequest, InferenceBackend};
use crate::llm::prompt::PromptBuilder;
use crate::observability::metrics;
use crate::resilience::{enforce, retry, RetryPolicy};
use crate::schema::{CodeExplanation, ParseError, SchemaValidator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationErrorKind {
    /// Unreachable, timed out, or produced output failing validation.
    BackendFailure,
}

/// Underlying reason for an [`InvocationError`]. Logged, never shown to clients.
#[derive(Debug, Error)]
pub enum FailureCause {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("model output failed schema validation: {0}")]
    Schema(#[from] ParseError),
}

#[derive(Debug, Error)]
#[error("backend failure after {attempts} attempt(s): {cause}")]
pub struct InvocationError {
    pub kind: InvocationErrorKind,
    pub cause: FailureCause,
    pub attempts: u32,
}

impl InvocationError {
    fn new(cause: impl Into<FailureCause>, attempts: u32) -> Self {
        Self {
            kind: InvocationErrorKind::BackendFailure,
            cause: cause.into(),
            attempts,
        }
    }

    /// Short label for metrics.
    pub fn cause_label(&self) -> &'static str {
        match &self.cause {
            FailureCause::Backend(BackendError::Timeout(_)) => "timeout",
            FailureCause::Backend(BackendError::Connect(_)) => "connect",
            FailureCause::Backend(BackendError::Status { .. }) => "status",
            FailureCause::Backend(_) => "transport",
            FailureCause::Schema(_) => "schema",
        }
    }
}

/// Sends prompts to the inference backend and validates what comes back.
pub struct ModelInvoker {
    backend: Arc<dyn InferenceBackend>,
    prompts: PromptBuilder,
    validator: SchemaValidator,
    retry: RetryPolicy,
    attempt_timeout: Duration,
    temperature: f32,
}

impl ModelInvoker {
    /// Single-attempt invoker; see [`ModelInvoker::with_retry`].
    pub fn new(
        backend: Arc<dyn InferenceBackend>,
        temperature: f32,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            prompts: PromptBuilder::new(),
            validator: SchemaValidator::for_explanations(),
            retry: RetryPolicy::none(),
            attempt_timeout,
            temperature,
        }
    }

    pub fn from_config(backend: Arc<dyn InferenceBackend>, config: &ExplainerConfig) -> Self {
        Self::new(
            backend,
            config.backend.temperature,
            Duration::from_millis(config.backend.request_timeout_ms),
        )
        .with_retry(RetryPolicy::from_config(&config.retries))
    }

    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    pub fn model(&self) -> &str {
        self.backend.model()
    }

    /// Explain `code` using the invoker's own retry policy.
    pub async fn explain(
        &self,
        language: &str,
        code: &str,
    ) -> Result<CodeExplanation, InvocationError> {
        self.explain_with(language, code, &self.retry).await
    }

    /// Explain `code` with a caller-supplied retry policy.
    pub async fn explain_with(
        &self,
        language: &str,
        code: &str,
        policy: &RetryPolicy,
    ) -> Result<CodeExplanation, InvocationError> {
        let prompt = self.prompts.build(language, code, self.validator.schema());
        let request = GenerateRequest {
            prompt: &prompt,
            temperature: self.temperature,
            json_format: true,
        };

        let mut attempts = 0;
        let raw = retry(policy, |attempt| {
            attempts = attempt;
            async move {
                let started = Instant::now();
                let result = enforce(self.attempt_timeout, self.backend.generate(request))
                    .await
                    .map_err(BackendError::from)
                    .and_then(|r| r);
                match &result {
                    Ok(_) => metrics::record_backend_attempt("ok", started),
                    Err(e) => {
                        warn!(attempt, error = %e, "Backend attempt failed");
                        metrics::record_backend_attempt("error", started);
                    }
                }
                result
            }
        })
        .await
        .map_err(|e| InvocationError::new(e, attempts))?;

        debug!(attempts, response_chars = raw.len(), "Backend responded");
        self.validator
            .parse(&raw)
            .map_err(|e| InvocationError::new(e, attempts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    const VALID: &str = r#"{"summary":"s","line_by_line":[{"line":1,"explanation":"e"}],"suggested_tests":[],"potential_refactors":[]}"#;

    /// Backend that replays a script of responses, then repeats the last one.
    struct ScriptedBackend {
        script: Mutex<Vec<Result<String, BackendError>>>,
        calls: AtomicU32,
        last_prompt: Mutex<Option<(String, f32, bool)>>,
        delay: Duration,
    }

    impl ScriptedBackend {
        fn new(script: Vec<Result<String, BackendError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script),
                calls: AtomicU32::new(0),
                last_prompt: Mutex::new(None),
                delay: Duration::ZERO,
            })
        }

        fn slow(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(vec![Ok(VALID.to_string())]),
                calls: AtomicU32::new(0),
                last_prompt: Mutex::new(None),
                delay,
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl InferenceBackend for ScriptedBackend {
        fn model(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, request: GenerateRequest<'_>) -> Result<String, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock().unwrap() = Some((
                request.prompt.to_string(),
                request.temperature,
                request.json_format,
            ));
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.remove(0)
            } else {
                script[0].clone()
            }
        }
    }

    fn fast_retries(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::exponential(max_attempts, Duration::from_millis(1), Duration::from_millis(2))
    }

    #[tokio::test]
    async fn test_success_sends_json_prompt_at_configured_temperature() {
        let backend = ScriptedBackend::new(vec![Ok(VALID.to_string())]);
        let invoker = ModelInvoker::new(backend.clone(), 0.2, Duration::from_secs(5));

        let explanation = invoker.explain("python", "print('hello')").await.unwrap();
        assert_eq!(explanation.summary, "s");

        let (prompt, temperature, json_format) =
            backend.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("print('hello')"));
        assert!((temperature - 0.2).abs() < f32::EPSILON);
        assert!(json_format);
    }

    #[tokio::test]
    async fn test_no_retry_by_default() {
        let backend = ScriptedBackend::new(vec![
            Err(BackendError::Connect("refused".into())),
            Ok(VALID.to_string()),
        ]);
        let invoker = ModelInvoker::new(backend.clone(), 0.2, Duration::from_secs(5));

        let err = invoker.explain("python", "x = 1").await.unwrap_err();
        assert_eq!(err.kind, InvocationErrorKind::BackendFailure);
        assert_eq!(err.attempts, 1);
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_transient_failures_retried() {
        let backend = ScriptedBackend::new(vec![
            Err(BackendError::Connect("refused".into())),
            Err(BackendError::Status { status: 503, snippet: "loading model".into() }),
            Ok(VALID.to_string()),
        ]);
        let invoker = ModelInvoker::new(backend.clone(), 0.2, Duration::from_secs(5))
            .with_retry(fast_retries(3));

        assert!(invoker.explain("python", "x = 1").await.is_ok());
        assert_eq!(backend.calls(), 3);
    }

    #[tokio::test]
    async fn test_schema_failure_not_retried() {
        let backend = ScriptedBackend::new(vec![
            Ok(r#"{"summary": "missing the rest"}"#.to_string()),
            Ok(VALID.to_string()),
        ]);
        let invoker = ModelInvoker::new(backend.clone(), 0.2, Duration::from_secs(5))
            .with_retry(fast_retries(3));

        let err = invoker.explain("python", "x = 1").await.unwrap_err();
        assert!(matches!(err.cause, FailureCause::Schema(ParseError::SchemaMismatch { .. })));
        assert_eq!(err.cause_label(), "schema");
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_attempt_timeout_surfaces_as_backend_failure() {
        let backend = ScriptedBackend::slow(Duration::from_secs(10));
        let invoker = ModelInvoker::new(backend.clone(), 0.2, Duration::from_millis(50))
            .with_retry(fast_retries(2));

        let started = Instant::now();
        let err = invoker.explain("java", "class A {}").await.unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(matches!(err.cause, FailureCause::Backend(BackendError::Timeout(_))));
        assert_eq!(err.cause_label(), "timeout");
        assert_eq!(err.attempts, 2);
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn test_caller_supplied_policy_overrides_default() {
        let backend = ScriptedBackend::new(vec![
            Err(BackendError::Timeout(Duration::from_millis(1))),
            Ok(VALID.to_string()),
        ]);
        let invoker = ModelInvoker::new(backend.clone(), 0.2, Duration::from_secs(5));

        let result = invoker
            .explain_with("python", "x = 1", &fast_retries(2))
            .await;
        assert!(result.is_ok());
        assert_eq!(backend.calls(), 2);
    }
}
