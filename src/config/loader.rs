//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::{AppConfig, RoutesConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Validation(_) => None,
        }
    }
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = toml::from_str(content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

/// Load a routing file. Route semantics are checked when the routes are compiled.
pub fn load_routes(path: &Path) -> Result<RoutesConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.application.name, "web");
        assert_eq!(config.application.routes, PathBuf::from("config/routes.toml"));
        assert_eq!(config.listener.bind_address, "0.0.0.0:2300");
        assert!(config.controller.handle_exceptions);
        assert_eq!(config.view.layout.as_deref(), Some("application"));
        assert!(config.logger.level.is_none());
    }

    #[test]
    fn test_full_config() {
        let config = parse_config(
            r#"
            [application]
            name = "admin"
            root = "apps/admin"
            load_paths = ["controllers"]
            routes = "routes.toml"

            [listener]
            bind_address = "127.0.0.1:4000"

            [controller]
            handle_exceptions = false
            default_response_format = "json"

            [controller.default_headers]
            "X-Frame-Options" = "SAMEORIGIN"

            [view]
            root = "views/templates"

            [logger]
            level = "info"
            format = "json"
            filters = ["password"]
            "#,
        )
        .unwrap();

        assert_eq!(config.application.name, "admin");
        assert_eq!(config.application.root, PathBuf::from("apps/admin"));
        assert_eq!(config.application.load_paths, vec![PathBuf::from("controllers")]);
        assert!(!config.controller.handle_exceptions);
        assert_eq!(config.controller.default_request_format, "html");
        assert_eq!(config.controller.default_response_format, "json");
        assert_eq!(config.controller.default_headers.len(), 1);
        assert_eq!(config.view.root, PathBuf::from("views/templates"));
        assert_eq!(config.logger.format.as_deref(), Some("json"));
        assert_eq!(config.logger.filters, vec!["password".to_string()]);
    }

    #[test]
    fn test_parse_error() {
        let err = parse_config("[application\nname = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation_error_message() {
        let err = parse_config("[timeouts]\nrequest_secs = 0").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: timeouts.request_secs: must be greater than zero"
        );
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/trellis/app.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
