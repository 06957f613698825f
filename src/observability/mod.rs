//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! [logger] section of app.toml
//!     → logging.rs (LoggerConfig: read/write accessors)
//!     → LoggerConfig::build()
//!         engine set?  → return the engine as-is
//!         otherwise    → layer.rs (AppLogLayer)
//!                          → formatter.rs (plain / JSON / custom line)
//!                          → stream.rs (stdout, stderr, file, buffer)
//!     → tracing::Dispatch owned by the Application
//! ```
//!
//! # Design Decisions
//! - The application logger is a `tracing::Dispatch`, so any subscriber
//!   can be plugged in as a custom engine
//! - The framework's own diagnostics go through the global subscriber;
//!   the application logger is scoped with `tracing::dispatcher::with_default`
//! - Formatters render one record to one line, no buffering across events

pub mod formatter;
pub mod layer;
pub mod logging;
pub mod stream;

pub use formatter::{DefaultFormatter, FormatSpec, JsonFormatter, LogFormatter, LogRecord};
pub use layer::AppLogLayer;
pub use logging::{LoggerConfig, LoggerError};
pub use stream::{LogStream, SharedBuffer};
