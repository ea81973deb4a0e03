//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, EXPLAINER_* env overrides)
//!     → validation.rs (semantic checks)
//!     → ExplainerConfig (validated, immutable)
//!     → handed to HttpServer, which builds the service object from it
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    BackendConfig, CorsConfig, ExplainerConfig, ListenerConfig, ObservabilityConfig,
    RateLimitConfig, RequestConfig, RetryConfig, TimeoutConfig,
};
pub use validation::{validate_config, ConfigViolation};
