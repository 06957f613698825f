//! Controller and view frameworks, registered per application.
//!
//! # Data Flow
//! ```text
//! [application] name
//!     → namespace.rs (Web)
//! [controller] section + ActionRegistry
//!     → controller.rs (Web::Controllers, action dispatch)
//! [view] section + resolved load paths
//!     → view.rs (Web::Views, template lookup and rendering)
//! ```
//!
//! # Design Decisions
//! - Each application gets its own framework values; nothing is global
//! - Frameworks are built once at boot and shared read-only afterwards

pub mod controller;
pub mod namespace;
pub mod view;

pub use controller::{
    Action, ActionError, ActionRegistry, ActionRequestExt, ActionResult, ControllerFramework,
    Params, RequestFormat,
};
pub use namespace::Namespace;
pub use view::{ViewError, ViewFramework};
