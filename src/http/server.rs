//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Wrap the application router with the middleware stack
//! - Wire up middleware (tracing, timeout, request ID, default headers)
//! - Trim trailing slashes before routing, so `/books/` is served as `/books`
//! - Bind server to listener
//! - Stop when shutdown is requested

use std::sync::Arc;
use std::time::Duration;

use axum::extract::Request;
use axum::middleware;
use axum::{Router, ServiceExt};
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    normalize_path::NormalizePath,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::application::Application;
use crate::http::request::{log_requests, x_request_id};
use crate::lifecycle::shutdown::ShutdownSignal;

/// HTTP server for a booted application.
pub struct HttpServer {
    service: NormalizePath<Router>,
    app: Arc<Application>,
}

impl HttpServer {
    /// Create a new HTTP server for the given application.
    pub fn new(app: Arc<Application>) -> Self {
        // Path normalization has to wrap the router; as a router layer it
        // would only run after a route already matched.
        let service = NormalizePath::trim_trailing_slash(Self::build_router(&app));
        Self { service, app }
    }

    /// Build the axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(app: &Application) -> Router {
        let mut router = app
            .router()
            .layer(middleware::from_fn_with_state(app.logger().clone(), log_requests));

        for (name, value) in app.controller().default_headers() {
            router = router.layer(SetResponseHeaderLayer::if_not_present(name.clone(), value.clone()));
        }

        if app.controller().handle_exceptions() {
            router = router.layer(CatchPanicLayer::new());
        }

        router
            .layer(TimeoutLayer::new(Duration::from_secs(app.config().timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::new(x_request_id()))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(x_request_id(), MakeRequestUuid))
    }

    /// The fully layered service, e.g. for driving with `tower::ServiceExt::oneshot`.
    pub fn service(&self) -> NormalizePath<Router> {
        self.service.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            application = %self.app.namespace(),
            routes = self.app.routes().len(),
            "HTTP server starting"
        );

        axum::serve(listener, ServiceExt::<Request>::into_make_service(self.service))
            .with_graceful_shutdown(async move {
                shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the application.
    pub fn app(&self) -> &Arc<Application> {
        &self.app
    }
}
