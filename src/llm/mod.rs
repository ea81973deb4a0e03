//! Language-model invocation.
//!
//! # Data Flow
//! ```text
//! (language, sanitized code)
//!     → prompt.rs (template + JSON schema instructions)
//!     → backend.rs / ollama.rs (one non-streamed generation per attempt)
//!     → invoker.rs (per-attempt timeout, retry policy, schema validation)
//!     → CodeExplanation
//! ```

pub mod backend;
pub mod invoker;
pub mod ollama;
pub mod prompt;

pub use backend::{BackendError, GenerateRequest, InferenceBackend};
pub use invoker::{FailureCause, InvocationError, InvocationErrorKind, ModelInvoker};
pub use ollama::OllamaBackend;
pub use prompt::PromptBuilder;
