//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware: request id, trace, CORS, body limit, timeout)
//!     → handlers.rs (decode body, client key from peer address)
//!     → explain pipeline
//!     → error.rs (pipeline errors → status + {"detail": ...})
//!     → Send to client
//! ```

pub mod error;
pub mod handlers;
pub mod request;
pub mod server;

pub use error::ErrorBody;
pub use request::{client_key, UuidRequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
