//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limits > 0, temperature bounds)
//! - Check that the outer request timeout covers every backend attempt
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ExplainerConfig → Result<(), Vec<ConfigViolation>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use axum::http::HeaderValue;
use url::Url;

use crate::config::schema::ExplainerConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigViolation {
    /// Dotted path of the offending field (e.g. "backend.endpoint").
    pub field: &'static str,
    pub message: String,
}

impl ConfigViolation {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every violation.
pub fn validate_config(config: &ExplainerConfig) -> Result<(), Vec<ConfigViolation>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ConfigViolation::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    let backend = &config.backend;
    match Url::parse(&backend.endpoint) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ConfigViolation::new(
            "backend.endpoint",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ConfigViolation::new(
            "backend.endpoint",
            format!("'{}' is not a URL: {}", backend.endpoint, e),
        )),
    }
    if backend.model.trim().is_empty() {
        errors.push(ConfigViolation::new("backend.model", "must not be empty"));
    }
    if !(0.0..=2.0).contains(&backend.temperature) {
        errors.push(ConfigViolation::new(
            "backend.temperature",
            format!("{} is outside 0.0..=2.0", backend.temperature),
        ));
    }
    if backend.request_timeout_ms == 0 {
        errors.push(ConfigViolation::new("backend.request_timeout_ms", "must be > 0"));
    }
    if backend.connect_timeout_ms == 0 {
        errors.push(ConfigViolation::new("backend.connect_timeout_ms", "must be > 0"));
    }

    let rate_limit = &config.rate_limit;
    if rate_limit.enabled {
        if rate_limit.requests_per_window == 0 {
            errors.push(ConfigViolation::new(
                "rate_limit.requests_per_window",
                "must be > 0 when rate limiting is enabled",
            ));
        }
        if rate_limit.window_secs == 0 {
            errors.push(ConfigViolation::new("rate_limit.window_secs", "must be > 0"));
        }
        if rate_limit.prune_interval_secs == 0 {
            errors.push(ConfigViolation::new(
                "rate_limit.prune_interval_secs",
                "must be > 0",
            ));
        }
    }

    let retries = &config.retries;
    if retries.max_attempts == 0 {
        errors.push(ConfigViolation::new("retries.max_attempts", "must be >= 1"));
    }
    if retries.base_delay_ms > retries.max_delay_ms {
        errors.push(ConfigViolation::new(
            "retries.base_delay_ms",
            "must not exceed retries.max_delay_ms",
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ConfigViolation::new("timeouts.request_secs", "must be > 0"));
    } else {
        let worst_case_ms = worst_case_invocation_ms(config);
        if config.timeouts.request_secs.saturating_mul(1000) <= worst_case_ms {
            errors.push(ConfigViolation::new(
                "timeouts.request_secs",
                format!(
                    "must exceed the worst-case backend time of {}ms (attempts x timeout + backoff)",
                    worst_case_ms
                ),
            ));
        }
    }

    for origin in &config.cors.allowed_origins {
        if HeaderValue::from_str(origin).is_err() || Url::parse(origin).is_err() {
            errors.push(ConfigViolation::new(
                "cors.allowed_origins",
                format!("'{}' is not a valid origin", origin),
            ));
        }
    }

    let request = &config.request;
    if request.supported_languages.iter().all(|l| l.trim().is_empty()) {
        errors.push(ConfigViolation::new(
            "request.supported_languages",
            "at least one language is required",
        ));
    }
    if request.max_code_chars == 0 {
        errors.push(ConfigViolation::new("request.max_code_chars", "must be > 0"));
    }
    if request.max_body_bytes < request.max_code_chars {
        errors.push(ConfigViolation::new(
            "request.max_body_bytes",
            "must be at least request.max_code_chars",
        ));
    }

    let observability = &config.observability;
    if !matches!(observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ConfigViolation::new(
            "observability.log_format",
            format!("unknown format '{}'", observability.log_format),
        ));
    }
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ConfigViolation::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Longest time a single invocation can take with the configured retries.
fn worst_case_invocation_ms(config: &ExplainerConfig) -> u64 {
    let attempts = if config.retries.enabled {
        u64::from(config.retries.max_attempts.max(1))
    } else {
        1
    };
    let per_attempt = config.backend.request_timeout_ms;
    let backoff = config.retries.max_delay_ms + config.retries.max_delay_ms / 10;
    per_attempt
        .saturating_mul(attempts)
        .saturating_add(backoff.saturating_mul(attempts - 1))
}
