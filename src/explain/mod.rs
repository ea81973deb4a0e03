//! The explain pipeline: input checks, sanitization, rate limiting and
//! model invocation for one `POST /explain` request.

pub mod request;
pub mod service;

pub use request::{validate, CodeRequest, SupportedLanguages, ValidatedRequest, ValidationError};
pub use service::{ExplainError, ExplainService, Stage, BACKEND_FAILURE_DETAIL};
