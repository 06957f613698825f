//! A booted application.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use tracing::instrument::WithSubscriber;
use tracing::Dispatch;

use crate::config::AppConfig;
use crate::frameworks::{ControllerFramework, Namespace, ViewFramework};
use crate::routing::Routes;

/// Everything the boot sequence produced, frozen.
///
/// Built by [`Loader`](crate::lifecycle::Loader) and shared through an `Arc`.
#[derive(Debug)]
pub struct Application {
    pub(crate) config: AppConfig,
    pub(crate) root: PathBuf,
    pub(crate) namespace: Namespace,
    pub(crate) load_paths: Vec<PathBuf>,
    pub(crate) controller: Arc<ControllerFramework>,
    pub(crate) view: ViewFramework,
    pub(crate) routes: Routes,
    pub(crate) router: Router,
    pub(crate) logger: Dispatch,
}

impl Application {
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Resolved application root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Load paths that exist on disk, resolved against the root.
    pub fn load_paths(&self) -> &[PathBuf] {
        &self.load_paths
    }

    pub fn controller(&self) -> &ControllerFramework {
        &self.controller
    }

    pub fn view(&self) -> &ViewFramework {
        &self.view
    }

    pub fn routes(&self) -> &Routes {
        &self.routes
    }

    /// The router serving the application's routes, without middleware.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// The application logger.
    pub fn logger(&self) -> &Dispatch {
        &self.logger
    }

    /// Run `f` with the application logger as the default subscriber.
    pub fn with_logger<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.logger, f)
    }

    /// Attach the application logger to a future.
    pub fn logged<F: Future>(&self, future: F) -> impl Future<Output = F::Output> {
        future.with_subscriber(self.logger.clone())
    }
}
