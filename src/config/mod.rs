//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! app.toml
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → consumed once by the boot loader
//!
//! config/routes.toml
//!     → loader.rs (parse & deserialize)
//!     → routing::Routes::compile (semantic checks)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a new boot
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_routes, parse_config, ConfigError};
pub use schema::AppConfig;
pub use schema::ApplicationConfig;
pub use schema::ControllerSettings;
pub use schema::ListenerConfig;
pub use schema::LoggerSettings;
pub use schema::RedirectConfig;
pub use schema::RouteConfig;
pub use schema::RoutesConfig;
pub use schema::TimeoutConfig;
pub use schema::ViewSettings;
