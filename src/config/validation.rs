//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check names and header values are usable at boot
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - Routes are validated separately, when the routing file is compiled

use std::fmt;
use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue};

use crate::config::schema::AppConfig;
use crate::frameworks::controller::mime_for;
use crate::observability::logging::parse_level;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending setting.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration, collecting every error.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let name = &config.application.name;
    if name.is_empty() {
        errors.push(ValidationError::new("application.name", "must not be empty"));
    } else if !name.starts_with(|c: char| c.is_ascii_alphabetic())
        || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        errors.push(ValidationError::new(
            "application.name",
            format!("'{}' must start with a letter and contain only letters, digits and '_'", name),
        ));
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than zero"));
    }

    let controller = &config.controller;
    for (field, format) in [
        ("controller.default_request_format", &controller.default_request_format),
        ("controller.default_response_format", &controller.default_response_format),
    ] {
        if mime_for(format).is_none() {
            errors.push(ValidationError::new(field, format!("unknown format '{}'", format)));
        }
    }

    for (name, value) in &controller.default_headers {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError::new(
                "controller.default_headers",
                format!("invalid header name '{}'", name),
            ));
        }
        if HeaderValue::from_str(value).is_err() {
            errors.push(ValidationError::new(
                "controller.default_headers",
                format!("invalid value for header '{}'", name),
            ));
        }
    }

    if let Some(level) = &config.logger.level {
        if let Err(e) = parse_level(level) {
            errors.push(ValidationError::new("logger.level", e.to_string()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
