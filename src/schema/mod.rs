//! Structured-output contract.
//!
//! # Data Flow
//! ```text
//! types.rs (CodeExplanation) ──schema()──▶ descriptor.rs (SchemaDescriptor)
//!                                             │                 │
//!                                   prompt format          validator.rs
//!                                   instructions           (raw text → CodeExplanation)
//! ```
//!
//! # Design Decisions
//! - Backend output is never trusted structurally; it is always re-validated
//! - Fail closed: malformed-but-present fields are rejected, never coerced
//! - Unknown extra fields are ignored and dropped

pub mod descriptor;
pub mod types;
pub mod validator;

pub use descriptor::{FieldDescriptor, FieldKind, SchemaDescriptor};
pub use types::{CodeExplanation, LineExplanation, RefactorSuggestion, TestSuggestion};
pub use validator::{ParseError, SchemaValidator};
