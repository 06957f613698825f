//! Request identification and request logging.
//!
//! # Responsibilities
//! - Name the request ID header
//! - Read the request ID assigned by the request-id middleware
//! - Log one line per request through the application logger
//!
//! # Design Decisions
//! - Request ID added as early as possible, before tracing spans open
//! - The request line goes to the application logger, not the global subscriber

use std::time::Instant;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::HeaderName;
use axum::middleware::Next;
use axum::response::Response;
use tracing::instrument::WithSubscriber;
use tracing::Dispatch;

pub const X_REQUEST_ID: &str = "x-request-id";

pub fn x_request_id() -> HeaderName {
    HeaderName::from_static(X_REQUEST_ID)
}

/// Access to the request ID header.
pub trait RequestIdExt {
    fn request_id(&self) -> Option<&str>;
}

impl<B> RequestIdExt for axum::http::Request<B> {
    fn request_id(&self) -> Option<&str> {
        self.headers().get(X_REQUEST_ID).and_then(|v| v.to_str().ok())
    }
}

/// Run the request under the application logger and log its outcome.
pub async fn log_requests(
    State(logger): State<Dispatch>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request.request_id().unwrap_or("unknown").to_string();

    let response = next.run(request).with_subscriber(logger.clone()).await;

    let status = response.status().as_u16();
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    tracing::dispatcher::with_default(&logger, || {
        tracing::info!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = status,
            elapsed_ms = elapsed_ms,
            "{} {} {}",
            method,
            status,
            path
        );
    });

    response
}
