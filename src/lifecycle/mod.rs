//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Boot (startup.rs):
//!     Lock → Load config → Register frameworks → Load paths → Routes → Logger → Unlock
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Trigger (sticky) → Server stops accepting → Drain → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered boot: config first, then frameworks, then routes, logger last
//! - One boot per loader; later calls share the booted application
//! - Ordered shutdown: stop accept, drain, close

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownSignal};
pub use startup::{BootError, Loader};
