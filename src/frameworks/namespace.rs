//! Application namespace.

use std::fmt;

/// The namespace an application registers its frameworks under.
///
/// Derived from the application name: `web` becomes `Web`,
/// `admin_panel` becomes `AdminPanel`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    name: String,
}

impl Namespace {
    pub fn new(app_name: &str) -> Self {
        Self {
            name: camelize(app_name),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `Web` + `Controllers::Books` → `Web::Controllers::Books`.
    pub fn qualify(&self, path: &str) -> String {
        if path.is_empty() {
            self.name.clone()
        } else {
            format!("{}::{}", self.name, path)
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// `user_sessions` → `UserSessions`, `admin/users` → `Admin::Users`.
pub fn camelize(value: &str) -> String {
    value
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            segment
                .split(['_', '-'])
                .filter(|word| !word.is_empty())
                .map(|word| {
                    let mut chars = word.chars();
                    match chars.next() {
                        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                        None => String::new(),
                    }
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("::")
}
