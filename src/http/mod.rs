//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum::serve, middleware stack)
//!     → request.rs (request ID, request log line)
//!     → Application router (routes → controller → action)
//!     → default headers applied on the way out
//!     → Send to client
//! ```

pub mod request;
pub mod server;

pub use request::{RequestIdExt, X_REQUEST_ID};
pub use server::HttpServer;
