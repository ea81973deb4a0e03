//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Validated request:
//!     → sanitize.rs (strip markup from the submitted code)
//!     → rate_limit.rs (check per-client window)
//!     → Pass to model invocation
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - No trust in client input
//! - The limiter only reports allow/deny; callers choose the response

pub mod rate_limit;
pub mod sanitize;

pub use rate_limit::{RateDecision, RateLimiter};
pub use sanitize::sanitize;
