//! Configuration schema definitions.
//!
//! This module defines the application configuration (`app.toml`) and the
//! routing file it points to (`config/routes.toml` by default).
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for an application.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Name, root directory and paths of the application.
    pub application: ApplicationConfig,

    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Controller framework settings.
    pub controller: ControllerSettings,

    /// View framework settings.
    pub view: ViewSettings,

    /// Application logger settings.
    pub logger: LoggerSettings,
}

/// Application identity and layout on disk.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Application name; the namespace is derived from it (`web` → `Web`).
    pub name: String,

    /// Root directory, relative to the directory holding the config file.
    pub root: PathBuf,

    /// Directories (relative to root) searched for application files.
    pub load_paths: Vec<PathBuf>,

    /// Routing file, relative to root.
    pub routes: PathBuf,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: "web".to_string(),
            root: PathBuf::from("."),
            load_paths: vec![PathBuf::from("controllers"), PathBuf::from("views")],
            routes: PathBuf::from("config/routes.toml"),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:2300").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:2300".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Controller framework settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ControllerSettings {
    /// Render action errors as generic error pages instead of exposing them.
    pub handle_exceptions: bool,

    /// Format assumed when a request does not state one.
    pub default_request_format: String,

    /// Content type applied to responses that do not set one.
    pub default_response_format: String,

    /// Headers added to every response that does not already carry them.
    pub default_headers: BTreeMap<String, String>,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        let mut default_headers = BTreeMap::new();
        default_headers.insert("X-Frame-Options".to_string(), "DENY".to_string());
        default_headers.insert("X-Content-Type-Options".to_string(), "nosniff".to_string());
        default_headers.insert("X-XSS-Protection".to_string(), "1; mode=block".to_string());

        Self {
            handle_exceptions: true,
            default_request_format: "html".to_string(),
            default_response_format: "html".to_string(),
            default_headers,
        }
    }
}

/// View framework settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ViewSettings {
    /// Templates directory, relative to root.
    pub root: PathBuf,

    /// Layout template wrapped around every view.
    pub layout: Option<String>,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("templates"),
            layout: Some("application".to_string()),
        }
    }
}

/// Application logger settings. Unset fields keep the logger defaults.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LoggerSettings {
    /// `stdout`, `stderr` or a file path relative to root.
    pub stream: Option<String>,

    /// Severity threshold (trace, debug, info, warn, error, fatal).
    pub level: Option<String>,

    /// `json` or `default`.
    pub format: Option<String>,

    /// Tag written on every line; defaults to the application namespace.
    pub app_name: Option<String>,

    /// Field names masked in log output.
    pub filters: Vec<String>,
}

/// Routing file contents.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RoutesConfig {
    /// Routes to actions.
    #[serde(rename = "route")]
    pub routes: Vec<RouteConfig>,

    /// Path redirects.
    #[serde(rename = "redirect")]
    pub redirects: Vec<RedirectConfig>,
}

/// A route from a method and path pattern to an endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// HTTP method (GET, POST, ...).
    pub method: String,

    /// Path pattern, e.g. `/books/:id`.
    pub path: String,

    /// Endpoint in `controller#action` form.
    pub to: String,

    /// Optional route name used for path generation.
    #[serde(default)]
    pub name: Option<String>,
}

/// A permanent or temporary redirect.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedirectConfig {
    /// Path to redirect from.
    pub from: String,

    /// Location to redirect to.
    pub to: String,

    /// Redirect status code (default: 301).
    #[serde(default = "default_redirect_status")]
    pub status: u16,
}

fn default_redirect_status() -> u16 {
    301
}
