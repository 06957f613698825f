//! Trellis: boot loader for axum web applications.
//!
//! Boots an application from a declarative configuration: registers the
//! controller and view frameworks under the application namespace, loads
//! the routing file, and builds the application logger.
//!
//! ```no_run
//! use trellis::frameworks::{ActionError, ActionRegistry};
//! use trellis::lifecycle::Loader;
//!
//! let actions = ActionRegistry::new()
//!     .with("home#index", |_req: axum::extract::Request| async {
//!         Ok::<_, ActionError>("Welcome")
//!     });
//!
//! let app = Loader::new("app.toml", actions).load()?;
//! # Ok::<(), trellis::lifecycle::BootError>(())
//! ```

pub mod application;
pub mod config;
pub mod frameworks;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use application::Application;
pub use config::schema::AppConfig;
pub use http::HttpServer;
pub use lifecycle::{BootError, Loader, Shutdown};
pub use observability::LoggerConfig;
