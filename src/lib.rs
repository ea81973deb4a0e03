//! Code explainer service library.
//!
//! Takes a code snippet, sanitizes it, asks a local language model for a
//! structured explanation and returns it only after validating the model's
//! JSON against the `CodeExplanation` schema.

pub mod config;
pub mod explain;
pub mod http;
pub mod lifecycle;
pub mod llm;
pub mod observability;
pub mod resilience;
pub mod schema;
pub mod security;

pub use config::ExplainerConfig;
pub use explain::ExplainService;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use schema::CodeExplanation;
