//! Route endpoints (`controller#action`).

use std::fmt;
use std::str::FromStr;

use crate::frameworks::namespace::camelize;
use crate::routing::RouteError;

/// Target of a route: a controller and one of its actions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    controller: String,
    action: String,
}

fn valid_part(part: &str, allow_slash: bool) -> bool {
    !part.is_empty()
        && part
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || (allow_slash && c == '/'))
        && !part.starts_with('/')
        && !part.ends_with('/')
}

impl Endpoint {
    pub fn controller(&self) -> &str {
        &self.controller
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    /// Fully qualified action name under `action_namespace`:
    /// `admin/users#show` in `Web::Controllers` → `Web::Controllers::Admin::Users::Show`.
    pub fn qualify(&self, action_namespace: &str) -> String {
        format!(
            "{}::{}::{}",
            action_namespace,
            camelize(&self.controller),
            camelize(&self.action)
        )
    }
}

impl FromStr for Endpoint {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (controller, action) = s
            .split_once('#')
            .ok_or_else(|| RouteError::InvalidEndpoint(s.to_string()))?;

        if !valid_part(controller, true) || !valid_part(action, false) {
            return Err(RouteError::InvalidEndpoint(s.to_string()));
        }

        Ok(Self {
            controller: controller.to_string(),
            action: action.to_string(),
        })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.controller, self.action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let endpoint: Endpoint = "books#index".parse().unwrap();
        assert_eq!(endpoint.controller(), "books");
        assert_eq!(endpoint.action(), "index");
        assert_eq!(endpoint.to_string(), "books#index");

        let nested: Endpoint = "admin/user_sessions#new".parse().unwrap();
        assert_eq!(nested.controller(), "admin/user_sessions");
    }

    #[test]
    fn test_invalid_endpoints() {
        for bad in ["books", "#index", "books#", "Books#index", "books#in/dex", "/books#index", "books#a#b"] {
            assert!(bad.parse::<Endpoint>().is_err(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_qualify() {
        let endpoint: Endpoint = "admin/user_sessions#new".parse().unwrap();
        assert_eq!(
            endpoint.qualify("Web::Controllers"),
            "Web::Controllers::Admin::UserSessions::New"
        );
    }
}
