//! Controller framework.
//!
//! # Responsibilities
//! - Hold the per-application controller settings
//! - Keep the registry of actions addressed by endpoint (`books#index`)
//! - Run an action for a request: params, request format, default
//!   content type, error rendering
//!
//! # Design Decisions
//! - Actions are async functions from a request to a response or an `ActionError`
//! - With `handle_exceptions` on, errors render as a bare status page;
//!   with it off, the error message is sent to the client
//! - Default headers are applied by the HTTP layer, not per action

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderName, HeaderValue, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::config::schema::ControllerSettings;
use crate::frameworks::namespace::Namespace;

/// Result of running an action.
pub type ActionResult = Result<Response, ActionError>;

/// Error returned by an action.
#[derive(Debug, Clone, Error)]
#[error("{status}: {message}")]
pub struct ActionError {
    status: StatusCode,
    message: String,
}

impl ActionError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A request handler addressed by an endpoint.
pub trait Action: Send + Sync + 'static {
    fn call(&self, request: Request<Body>) -> BoxFuture<'static, ActionResult>;
}

impl<F, Fut, R> Action for F
where
    F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, ActionError>> + Send + 'static,
    R: IntoResponse,
{
    fn call(&self, request: Request<Body>) -> BoxFuture<'static, ActionResult> {
        let fut = (self)(request);
        Box::pin(async move { fut.await.map(IntoResponse::into_response) })
    }
}

/// Path parameters captured by the matched route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(pub HashMap<String, String>);

impl Params {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

/// Format negotiated for the request (`html`, `json`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFormat(pub String);

/// Access to the values the controller framework attaches to a request.
pub trait ActionRequestExt {
    fn params(&self) -> Params;
    fn param(&self, name: &str) -> Option<&str>;
    fn format(&self) -> Option<&str>;
}

impl<B> ActionRequestExt for Request<B> {
    fn params(&self) -> Params {
        self.extensions().get::<Params>().cloned().unwrap_or_default()
    }

    fn param(&self, name: &str) -> Option<&str> {
        self.extensions().get::<Params>().and_then(|p| p.get(name))
    }

    fn format(&self) -> Option<&str> {
        self.extensions().get::<RequestFormat>().map(|f| f.0.as_str())
    }
}

const FORMATS: &[(&str, &str)] = &[
    ("html", "text/html; charset=utf-8"),
    ("json", "application/json"),
    ("xml", "application/xml"),
    ("text", "text/plain; charset=utf-8"),
    ("js", "application/javascript"),
    ("css", "text/css"),
];

/// Content type for a format name.
pub fn mime_for(format: &str) -> Option<&'static str> {
    FORMATS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(format))
        .map(|(_, mime)| *mime)
}

/// Format name for an `Accept` header, using the first recognized media type.
pub fn format_for_accept(accept: &str) -> Option<&'static str> {
    accept
        .split(',')
        .map(|part| part.split(';').next().unwrap_or("").trim())
        .find_map(|media| {
            FORMATS
                .iter()
                .find(|(_, mime)| mime.split(';').next() == Some(media))
                .map(|(name, _)| *name)
        })
}

/// Actions registered by the application, addressed by endpoint.
#[derive(Clone, Default)]
pub struct ActionRegistry {
    actions: HashMap<String, Arc<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `action` for `endpoint` (`controller#action`). Replaces any previous action.
    pub fn register(&mut self, endpoint: impl Into<String>, action: impl Action) -> &mut Self {
        self.actions.insert(endpoint.into(), Arc::new(action));
        self
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, endpoint: impl Into<String>, action: impl Action) -> Self {
        self.register(endpoint, action);
        self
    }

    pub fn get(&self, endpoint: &str) -> Option<Arc<dyn Action>> {
        self.actions.get(endpoint).cloned()
    }

    pub fn contains(&self, endpoint: &str) -> bool {
        self.actions.contains_key(endpoint)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut endpoints: Vec<&String> = self.actions.keys().collect();
        endpoints.sort();
        f.debug_struct("ActionRegistry").field("endpoints", &endpoints).finish()
    }
}

/// Controller configuration registered for one application.
#[derive(Debug, Clone)]
pub struct ControllerFramework {
    action_namespace: String,
    handle_exceptions: bool,
    default_request_format: String,
    default_response_format: String,
    default_headers: Vec<(HeaderName, HeaderValue)>,
}

impl ControllerFramework {
    pub fn new(namespace: &Namespace, settings: &ControllerSettings) -> Self {
        let mut default_headers = Vec::with_capacity(settings.default_headers.len());
        for (name, value) in &settings.default_headers {
            match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
                (Ok(name), Ok(value)) => default_headers.push((name, value)),
                _ => tracing::warn!(header = %name, "Skipping invalid default header"),
            }
        }

        Self {
            action_namespace: namespace.qualify("Controllers"),
            handle_exceptions: settings.handle_exceptions,
            default_request_format: settings.default_request_format.to_ascii_lowercase(),
            default_response_format: settings.default_response_format.to_ascii_lowercase(),
            default_headers,
        }
    }

    /// Namespace actions are qualified under, e.g. `Web::Controllers`.
    pub fn action_namespace(&self) -> &str {
        &self.action_namespace
    }

    pub fn handle_exceptions(&self) -> bool {
        self.handle_exceptions
    }

    pub fn default_request_format(&self) -> &str {
        &self.default_request_format
    }

    pub fn default_response_format(&self) -> &str {
        &self.default_response_format
    }

    pub fn default_headers(&self) -> &[(HeaderName, HeaderValue)] {
        &self.default_headers
    }

    /// Run `action` for `request` with the given path params.
    pub async fn dispatch(
        &self,
        action: Arc<dyn Action>,
        endpoint: &str,
        params: Params,
        mut request: Request<Body>,
    ) -> Response {
        let format = request
            .headers()
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .and_then(format_for_accept)
            .map(str::to_string)
            .unwrap_or_else(|| self.default_request_format.clone());

        request.extensions_mut().insert(params);
        request.extensions_mut().insert(RequestFormat(format));

        match action.call(request).await {
            Ok(mut response) => {
                if !response.headers().contains_key(header::CONTENT_TYPE) {
                    if let Some(mime) = mime_for(&self.default_response_format) {
                        response
                            .headers_mut()
                            .insert(header::CONTENT_TYPE, HeaderValue::from_static(mime));
                    }
                }
                response
            }
            Err(err) => self.render_error(endpoint, err),
        }
    }

    fn render_error(&self, endpoint: &str, err: ActionError) -> Response {
        let status = err.status();
        if status.is_server_error() {
            tracing::error!(endpoint = %endpoint, status = %status, error = %err.message(), "Action failed");
        } else {
            tracing::debug!(endpoint = %endpoint, status = %status, error = %err.message(), "Action returned error");
        }

        if self.handle_exceptions {
            let reason = status.canonical_reason().unwrap_or("Error");
            (status, reason.to_string()).into_response()
        } else {
            (status, err.message().to_string()).into_response()
        }
    }
}
