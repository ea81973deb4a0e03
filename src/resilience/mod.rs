//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to inference backend:
//!     → timeouts.rs (enforce per-attempt deadline)
//!     → On transient failure: retries.rs (retry with backoff.rs delay)
//!     → Permanent failure or attempts exhausted: error surfaces to caller
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Retries only for transient failures, never for bad model output
//! - Policies are plain values so callers can swap them per invocation

pub mod backoff;
pub mod retries;
pub mod timeouts;

pub use retries::{retry, RetryPolicy, Retryable};
pub use timeouts::{enforce, TimeoutError};
