//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at boot):
//!     config/routes.toml
//!     → RoutesConfig ([[route]], [[redirect]])
//!     → pattern.rs (parse /books/:id)
//!     → endpoint.rs (parse books#show)
//!     → router.rs (validate, freeze as immutable Routes)
//!
//! Serving:
//!     Routes + ActionRegistry + ControllerFramework
//!     → axum::Router (dispatch delegated to axum)
//! ```
//!
//! # Design Decisions
//! - Routes compiled at boot, immutable at runtime
//! - Deterministic: the same table always builds the same router
//! - Static segments beat parameters, matching the router library

use thiserror::Error;

pub mod endpoint;
pub mod pattern;
pub mod router;

pub use endpoint::Endpoint;
pub use pattern::RoutePattern;
pub use router::{Recognized, Redirect, Route, Routes};

/// Errors raised while compiling or using the route table.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("Unsupported HTTP method '{0}'")]
    InvalidMethod(String),

    #[error("Invalid route path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Invalid endpoint '{0}', expected 'controller#action'")]
    InvalidEndpoint(String),

    #[error("Duplicate route {method} {path}")]
    Duplicate { method: String, path: String },

    #[error("Duplicate route name '{0}'")]
    DuplicateName(String),

    #[error("Routes '{first}' and '{second}' differ only in parameter names")]
    Conflict { first: String, second: String },

    #[error("Invalid redirect from '{from}': {reason}")]
    InvalidRedirect { from: String, reason: String },

    #[error("No route named '{0}'")]
    UnknownRoute(String),

    #[error("Missing parameter '{param}' for '{pattern}'")]
    MissingParam { pattern: String, param: String },

    #[error("No action registered for {endpoint} ({action})")]
    UnknownEndpoint { endpoint: String, action: String },
}
