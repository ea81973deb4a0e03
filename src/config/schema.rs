//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the code explainer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ExplainerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Inference backend the prompts are sent to.
    pub backend: BackendConfig,

    /// Per-client rate limiting.
    pub rate_limit: RateLimitConfig,

    /// Retry policy for transient backend failures.
    pub retries: RetryConfig,

    /// Whole-request timeout.
    pub timeouts: TimeoutConfig,

    /// Cross-origin allow-list.
    pub cors: CorsConfig,

    /// Request validation limits and supported languages.
    pub request: RequestConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Inference backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the backend (e.g., "http://localhost:11434").
    pub endpoint: String,

    /// Model identifier passed with every prompt.
    pub model: String,

    /// Decoding temperature.
    pub temperature: f32,

    /// Upper bound for a single backend attempt, in milliseconds.
    pub request_timeout_ms: u64,

    /// Connection establishment timeout in milliseconds.
    pub connect_timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3:latest".to_string(),
            temperature: 0.2,
            request_timeout_ms: 60_000,
            connect_timeout_ms: 5_000,
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Requests admitted per client within one window.
    pub requests_per_window: u32,

    /// Window length in seconds.
    pub window_secs: u64,

    /// How often idle client entries are dropped, in seconds.
    pub prune_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_window: 10,
            window_secs: 60,
            prune_interval_secs: 60,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Enable retries.
    pub enabled: bool,

    /// Maximum number of attempts, including the first one.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 3,
            base_delay_ms: 250,
            max_delay_ms: 2000,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 200 }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins allowed to issue cross-origin requests with credentials.
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
            ],
        }
    }
}

/// Request validation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RequestConfig {
    /// Languages accepted in `POST /explain` (matched case-insensitively).
    pub supported_languages: Vec<String>,

    /// Maximum length of the `code` field in characters.
    pub max_code_chars: usize,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            supported_languages: vec![
                "python".to_string(),
                "javascript".to_string(),
                "java".to_string(),
            ],
            max_code_chars: 10_000,
            max_body_bytes: 256 * 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ExplainerConfig = toml::from_str(
            r#"
            [backend]
            model = "codellama:7b"

            [rate_limit]
            requests_per_window = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.backend.model, "codellama:7b");
        assert_eq!(config.backend.endpoint, "http://localhost:11434");
        assert!((config.backend.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.rate_limit.requests_per_window, 3);
        assert_eq!(config.rate_limit.window_secs, 60);
        assert_eq!(config.request.max_code_chars, 10_000);
        assert_eq!(config.listener.bind_address, "0.0.0.0:8000");
    }

    #[test]
    fn test_default_languages() {
        let config = ExplainerConfig::default();
        assert_eq!(
            config.request.supported_languages,
            vec!["python", "javascript", "java"]
        );
    }
}
