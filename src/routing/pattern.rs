//! Route path patterns.
//!
//! # Responsibilities
//! - Parse `/books/:id` and `/files/*path` style patterns
//! - Translate them to the router library's syntax (`/books/{id}`)
//! - Recognize concrete paths and expand patterns back into paths
//!
//! # Design Decisions
//! - Static segments match case-sensitively
//! - A trailing slash is not significant (`/books/` == `/books`)
//! - A glob must be the last segment and matches at least one segment

use std::collections::HashMap;
use std::fmt;

use crate::routing::RouteError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param(String),
    Glob(String),
}

/// A compiled path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    source: String,
    segments: Vec<Segment>,
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

impl RoutePattern {
    pub fn parse(path: &str) -> Result<Self, RouteError> {
        let invalid = |reason: &str| RouteError::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        };

        if !path.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }

        let mut segments = Vec::new();
        for raw in split(path) {
            if matches!(segments.last(), Some(Segment::Glob(_))) {
                return Err(invalid("a glob must be the last segment"));
            }
            let segment = if let Some(name) = raw.strip_prefix(':') {
                Segment::Param(name.to_string())
            } else if let Some(name) = raw.strip_prefix('*') {
                Segment::Glob(name.to_string())
            } else {
                if raw.contains(['{', '}', ':', '*']) {
                    return Err(invalid("static segments cannot contain '{', '}', ':' or '*'"));
                }
                Segment::Static(raw.to_string())
            };

            if let Segment::Param(name) | Segment::Glob(name) = &segment {
                if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                    return Err(invalid("parameter names must be non-empty and alphanumeric"));
                }
                let duplicate = segments.iter().any(|s| match s {
                    Segment::Param(n) | Segment::Glob(n) => n == name,
                    Segment::Static(_) => false,
                });
                if duplicate {
                    return Err(invalid("duplicate parameter name"));
                }
            }
            segments.push(segment);
        }

        Ok(Self {
            source: path.to_string(),
            segments,
        })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn param_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Param(n) | Segment::Glob(n) => Some(n.as_str()),
                Segment::Static(_) => None,
            })
            .collect()
    }

    /// The pattern in the router library's syntax.
    pub fn to_router_path(&self) -> String {
        self.render(|segment| match segment {
            Segment::Static(s) => s.clone(),
            Segment::Param(n) => format!("{{{}}}", n),
            Segment::Glob(n) => format!("{{*{}}}", n),
        })
    }

    /// The pattern with parameter names erased. Two patterns with the same
    /// shape but different names cannot coexist in one router.
    pub fn shape(&self) -> String {
        self.render(|segment| match segment {
            Segment::Static(s) => s.clone(),
            Segment::Param(_) => ":".to_string(),
            Segment::Glob(_) => "*".to_string(),
        })
    }

    /// Number of static segments; higher is more specific.
    pub fn specificity(&self) -> (usize, usize) {
        let statics = self.segments.iter().filter(|s| matches!(s, Segment::Static(_))).count();
        let params = self.segments.iter().filter(|s| matches!(s, Segment::Param(_))).count();
        (statics, params)
    }

    fn render(&self, f: impl Fn(&Segment) -> String) -> String {
        if self.segments.is_empty() {
            return "/".to_string();
        }
        self.segments.iter().map(|s| format!("/{}", f(s))).collect()
    }

    /// Match a concrete request path, returning the captured parameters.
    pub fn recognize(&self, path: &str) -> Option<HashMap<String, String>> {
        let parts: Vec<&str> = split(path).collect();
        let mut params = HashMap::new();

        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Static(expected) => {
                    if parts.get(i) != Some(&expected.as_str()) {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    params.insert(name.clone(), (*parts.get(i)?).to_string());
                }
                Segment::Glob(name) => {
                    if i >= parts.len() {
                        return None;
                    }
                    params.insert(name.clone(), parts[i..].join("/"));
                    return Some(params);
                }
            }
        }

        if parts.len() == self.segments.len() {
            Some(params)
        } else {
            None
        }
    }

    /// Build a path from parameters. Parameters not used by the pattern are
    /// appended as a query string, in the order given.
    pub fn expand(&self, params: &[(&str, &str)]) -> Result<String, RouteError> {
        let lookup = |name: &str| params.iter().find(|(k, _)| *k == name).map(|(_, v)| *v);

        let mut path = String::new();
        for segment in &self.segments {
            path.push('/');
            match segment {
                Segment::Static(s) => path.push_str(s),
                Segment::Param(n) | Segment::Glob(n) => {
                    let value = lookup(n).ok_or_else(|| RouteError::MissingParam {
                        pattern: self.source.clone(),
                        param: n.clone(),
                    })?;
                    path.push_str(value);
                }
            }
        }
        if path.is_empty() {
            path.push('/');
        }

        let names = self.param_names();
        let extra: Vec<String> = params
            .iter()
            .filter(|(k, _)| !names.contains(k))
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        if !extra.is_empty() {
            path.push('?');
            path.push_str(&extra.join("&"));
        }
        Ok(path)
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
