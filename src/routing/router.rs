//! Route table and handoff to the router library.
//!
//! # Responsibilities
//! - Compile the routing file into an immutable route table
//! - Generate paths for named routes and recognize request paths
//! - Build the axum router that serves the table
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Dispatch itself is left to axum; the table only validates and translates
//! - Unresolved endpoints fail the build in strict mode and answer
//!   501 Not Implemented otherwise

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::Path;
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{any, MethodFilter, MethodRouter};
use axum::{RequestExt, Router};

use crate::config::schema::RoutesConfig;
use crate::frameworks::controller::{ActionRegistry, ControllerFramework, Params};
use crate::routing::endpoint::Endpoint;
use crate::routing::pattern::RoutePattern;
use crate::routing::RouteError;

const METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS", "TRACE"];

/// A compiled route.
#[derive(Debug, Clone)]
pub struct Route {
    pub method: Method,
    pub pattern: RoutePattern,
    pub endpoint: Endpoint,
    pub name: Option<String>,
}

/// A compiled redirect.
#[derive(Debug, Clone)]
pub struct Redirect {
    pub from: RoutePattern,
    pub to: String,
    pub status: StatusCode,
}

/// A route matched by [`Routes::recognize`].
#[derive(Debug, Clone)]
pub struct Recognized<'a> {
    pub route: &'a Route,
    pub params: HashMap<String, String>,
}

/// The application's route table.
#[derive(Debug, Clone, Default)]
pub struct Routes {
    routes: Vec<Route>,
    redirects: Vec<Redirect>,
    names: HashMap<String, usize>,
}

fn parse_method(raw: &str) -> Result<Method, RouteError> {
    let upper = raw.trim().to_ascii_uppercase();
    if !METHODS.contains(&upper.as_str()) {
        return Err(RouteError::InvalidMethod(raw.to_string()));
    }
    Method::from_bytes(upper.as_bytes()).map_err(|_| RouteError::InvalidMethod(raw.to_string()))
}

impl Routes {
    /// Validate and compile a routing file.
    pub fn compile(config: &RoutesConfig) -> Result<Self, RouteError> {
        let mut routes = Vec::with_capacity(config.routes.len());
        let mut names = HashMap::new();
        let mut seen = HashSet::new();
        let mut shapes: HashMap<String, RoutePattern> = HashMap::new();
        let mut matcher = PathMatcher::default();

        for rc in &config.routes {
            let method = parse_method(&rc.method)?;
            let pattern = RoutePattern::parse(&rc.path)?;
            let endpoint: Endpoint = rc.to.parse()?;

            if !seen.insert((method.clone(), pattern.to_router_path())) {
                return Err(RouteError::Duplicate {
                    method: method.to_string(),
                    path: rc.path.clone(),
                });
            }
            check_shape(&mut shapes, &pattern)?;
            matcher.insert(&pattern)?;

            if let Some(name) = &rc.name {
                if names.insert(name.clone(), routes.len()).is_some() {
                    return Err(RouteError::DuplicateName(name.clone()));
                }
            }

            routes.push(Route {
                method,
                pattern,
                endpoint,
                name: rc.name.clone(),
            });
        }

        let mut redirects = Vec::with_capacity(config.redirects.len());
        let route_paths: HashSet<String> = routes.iter().map(|r| r.pattern.to_router_path()).collect();
        for rc in &config.redirects {
            let invalid = |reason: &str| RouteError::InvalidRedirect {
                from: rc.from.clone(),
                reason: reason.to_string(),
            };

            let from = RoutePattern::parse(&rc.from)?;
            if !from.param_names().is_empty() {
                return Err(invalid("redirect sources cannot have parameters"));
            }
            if route_paths.contains(&from.to_router_path()) {
                return Err(invalid("path is already routed"));
            }
            if !seen.insert((Method::GET, from.to_router_path())) {
                return Err(invalid("duplicate redirect"));
            }
            let status = StatusCode::from_u16(rc.status)
                .ok()
                .filter(StatusCode::is_redirection)
                .ok_or_else(|| invalid("status must be 3xx"))?;
            if HeaderValue::from_str(&rc.to).is_err() {
                return Err(invalid("target is not a valid location"));
            }
            matcher.insert(&from)?;

            redirects.push(Redirect {
                from,
                to: rc.to.clone(),
                status,
            });
        }

        Ok(Self {
            routes,
            redirects,
            names,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    pub fn redirects(&self) -> &[Redirect] {
        &self.redirects
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Distinct endpoints, in declaration order.
    pub fn endpoints(&self) -> Vec<&Endpoint> {
        let mut seen = HashSet::new();
        self.routes
            .iter()
            .map(|r| &r.endpoint)
            .filter(|e| seen.insert(*e))
            .collect()
    }

    /// Path for a named route.
    pub fn path(&self, name: &str, params: &[(&str, &str)]) -> Result<String, RouteError> {
        let index = self
            .names
            .get(name)
            .ok_or_else(|| RouteError::UnknownRoute(name.to_string()))?;
        self.routes[*index].pattern.expand(params)
    }

    /// Find the route serving `method` and `path`. A GET route also answers HEAD.
    /// The most specific pattern wins; ties go to the route declared first.
    pub fn recognize(&self, method: &Method, path: &str) -> Option<Recognized<'_>> {
        let mut best: Option<Recognized<'_>> = None;
        for route in &self.routes {
            let method_matches =
                route.method == *method || (route.method == Method::GET && *method == Method::HEAD);
            if !method_matches {
                continue;
            }
            let Some(params) = route.pattern.recognize(path) else {
                continue;
            };
            let better = match &best {
                Some(current) => route.pattern.specificity() > current.route.pattern.specificity(),
                None => true,
            };
            if better {
                best = Some(Recognized { route, params });
            }
        }
        best
    }

    /// Build the axum router serving this table.
    ///
    /// Every endpoint must have an action in `actions` unless `strict` is off.
    pub fn to_router(
        &self,
        controller: Arc<ControllerFramework>,
        actions: &ActionRegistry,
        strict: bool,
    ) -> Result<Router, RouteError> {
        let mut by_path: BTreeMap<String, MethodRouter> = BTreeMap::new();

        for route in &self.routes {
            let endpoint = route.endpoint.to_string();
            let qualified = route.endpoint.qualify(controller.action_namespace());
            let filter = MethodFilter::try_from(route.method.clone())
                .map_err(|_| RouteError::InvalidMethod(route.method.to_string()))?;
            let path = route.pattern.to_router_path();

            let method_router = match actions.get(&endpoint) {
                Some(action) => {
                    let controller = controller.clone();
                    let has_params = !route.pattern.param_names().is_empty();
                    let handler = move |mut request: Request<Body>| {
                        let controller = controller.clone();
                        let action = action.clone();
                        let endpoint = endpoint.clone();
                        async move {
                            let params = if has_params {
                                match request.extract_parts::<Path<HashMap<String, String>>>().await {
                                    Ok(Path(params)) => params,
                                    Err(rejection) => return rejection.into_response(),
                                }
                            } else {
                                HashMap::new()
                            };
                            controller.dispatch(action, &endpoint, Params(params), request).await
                        }
                    };
                    match by_path.remove(&path) {
                        Some(existing) => existing.on(filter, handler),
                        None => axum::routing::on(filter, handler),
                    }
                }
                None if strict => {
                    return Err(RouteError::UnknownEndpoint {
                        endpoint,
                        action: qualified,
                    });
                }
                None => {
                    tracing::warn!(endpoint = %endpoint, action = %qualified, "No action registered for endpoint");
                    let message = format!("{} is not implemented", qualified);
                    let handler = move || {
                        let message = message.clone();
                        async move { (StatusCode::NOT_IMPLEMENTED, message) }
                    };
                    match by_path.remove(&path) {
                        Some(existing) => existing.on(filter, handler),
                        None => axum::routing::on(filter, handler),
                    }
                }
            };
            by_path.insert(path, method_router);
        }

        let mut router = Router::new();
        for (path, method_router) in by_path {
            router = router.route(&path, method_router);
        }

        for redirect in &self.redirects {
            let status = redirect.status;
            let location = redirect.to.clone();
            router = router.route(
                &redirect.from.to_router_path(),
                any(move || {
                    let location = location.clone();
                    async move { (status, [(header::LOCATION, location)]).into_response() }
                }),
            );
        }

        Ok(router.fallback(not_found))
    }
}

fn check_shape(shapes: &mut HashMap<String, RoutePattern>, pattern: &RoutePattern) -> Result<(), RouteError> {
    match shapes.get(&pattern.shape()) {
        Some(existing) if existing.to_router_path() != pattern.to_router_path() => {
            Err(RouteError::Conflict {
                first: existing.to_string(),
                second: pattern.to_string(),
            })
        }
        Some(_) => Ok(()),
        None => {
            shapes.insert(pattern.shape(), pattern.clone());
            Ok(())
        }
    }
}

/// Mirror of the router library's matcher, used to reject tables it would
/// refuse at build time (e.g. a parameter and a catch-all in one segment).
#[derive(Default)]
struct PathMatcher {
    inner: matchit::Router<()>,
    patterns: HashMap<String, String>,
}

impl PathMatcher {
    fn insert(&mut self, pattern: &RoutePattern) -> Result<(), RouteError> {
        let path = pattern.to_router_path();
        if self.patterns.contains_key(&path) {
            return Ok(());
        }
        match self.inner.insert(path.clone(), ()) {
            Ok(()) => {
                self.patterns.insert(path, pattern.to_string());
                Ok(())
            }
            Err(matchit::InsertError::Conflict { with }) => Err(RouteError::Conflict {
                first: self.patterns.get(&with).cloned().unwrap_or(with),
                second: pattern.to_string(),
            }),
            Err(other) => Err(RouteError::InvalidPath {
                path: pattern.to_string(),
                reason: other.to_string(),
            }),
        }
    }
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}
