//! Observability subsystem.
//!
//! ```text
//! handlers, pipeline, invoker
//!     → logging.rs (structured log events, request id in the trace span)
//!     → metrics.rs (counters and histograms, Prometheus scrape endpoint)
//! ```

pub mod logging;
pub mod metrics;
