//! Boot orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Register the controller and view frameworks under the application namespace
//! - Resolve load paths
//! - Compile routes and hand them to the router library
//! - Build the application logger
//!
//! # Design Decisions
//! - Fail fast: any boot error is returned to the caller, nothing is retried
//! - Steps run in order under one mutex; concurrent callers wait and then
//!   share the first successful boot
//! - A failed boot is not cached, the next call starts over

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::application::Application;
use crate::config::validation::validate_config;
use crate::config::{load_config, load_routes, AppConfig, ConfigError};
use crate::frameworks::{ActionRegistry, ControllerFramework, Namespace, ViewFramework};
use crate::observability::{LoggerConfig, LoggerError};
use crate::routing::{RouteError, Routes};

/// Errors that abort the boot sequence.
#[derive(Debug, Error)]
pub enum BootError {
    #[error("Cannot load {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },

    #[error("Invalid routes in {}: {source}", path.display())]
    Routes {
        path: PathBuf,
        #[source]
        source: RouteError,
    },

    #[error("Cannot build logger: {0}")]
    Logger(#[from] LoggerError),

    #[error("Boot lock poisoned by a panicking boot")]
    LockPoisoned,
}

enum ConfigSource {
    File(PathBuf),
    Inline { config: AppConfig, base_dir: PathBuf },
}

type LoggerCustomizer = Box<dyn Fn(&mut LoggerConfig) + Send + Sync>;

/// Boots an application once.
pub struct Loader {
    source: ConfigSource,
    actions: ActionRegistry,
    strict: bool,
    customize_logger: Option<LoggerCustomizer>,
    booted: Mutex<Option<Arc<Application>>>,
}

impl Loader {
    /// Boot from a configuration file. The application root is resolved
    /// against the file's directory.
    pub fn new(config_path: impl Into<PathBuf>, actions: ActionRegistry) -> Self {
        Self::with_source(ConfigSource::File(config_path.into()), actions)
    }

    /// Boot from an already parsed configuration. The application root is
    /// resolved against `base_dir`.
    pub fn from_config(config: AppConfig, base_dir: impl Into<PathBuf>, actions: ActionRegistry) -> Self {
        Self::with_source(
            ConfigSource::Inline {
                config,
                base_dir: base_dir.into(),
            },
            actions,
        )
    }

    fn with_source(source: ConfigSource, actions: ActionRegistry) -> Self {
        Self {
            source,
            actions,
            strict: true,
            customize_logger: None,
            booted: Mutex::new(None),
        }
    }

    /// Accept endpoints without a registered action; they answer 501.
    pub fn lenient(mut self) -> Self {
        self.strict = false;
        self
    }

    /// Adjust the logger configuration after the `[logger]` section is applied.
    pub fn configure_logger(mut self, f: impl Fn(&mut LoggerConfig) + Send + Sync + 'static) -> Self {
        self.customize_logger = Some(Box::new(f));
        self
    }

    pub fn is_loaded(&self) -> bool {
        self.booted.lock().map(|b| b.is_some()).unwrap_or(false)
    }

    /// Run the boot sequence, or return the application booted earlier.
    pub fn load(&self) -> Result<Arc<Application>, BootError> {
        let mut booted = self.booted.lock().map_err(|_| BootError::LockPoisoned)?;
        if let Some(app) = booted.as_ref() {
            return Ok(app.clone());
        }

        let app = Arc::new(self.boot()?);
        *booted = Some(app.clone());
        Ok(app)
    }

    fn boot(&self) -> Result<Application, BootError> {
        // 1. Configuration
        let (config, base_dir) = self.load_configuration()?;
        let root = base_dir.join(&config.application.root);
        tracing::info!(
            application = %config.application.name,
            root = %root.display(),
            "Configuration loaded"
        );

        // 2. Frameworks
        let namespace = Namespace::new(&config.application.name);
        let controller = Arc::new(ControllerFramework::new(&namespace, &config.controller));

        // 3. Load paths
        let load_paths = resolve_load_paths(&root, &config.application.load_paths);
        let view = ViewFramework::new(&namespace, &config.view, &root, &load_paths);
        tracing::info!(
            namespace = %namespace,
            controllers = %controller.action_namespace(),
            views = %view.view_namespace(),
            load_paths = load_paths.len(),
            "Frameworks registered"
        );

        // 4. Routes
        let routes_path = root.join(&config.application.routes);
        let routes_config = load_routes(&routes_path).map_err(|source| BootError::Config {
            path: routes_path.clone(),
            source,
        })?;
        let routes_error = |source| BootError::Routes {
            path: routes_path.clone(),
            source,
        };
        let routes = Routes::compile(&routes_config).map_err(routes_error)?;
        let router = routes
            .to_router(controller.clone(), &self.actions, self.strict)
            .map_err(routes_error)?;
        tracing::info!(
            routes = routes.len(),
            redirects = routes.redirects().len(),
            "Routes loaded"
        );

        // 5. Logger
        let mut logger_config = LoggerConfig::from_settings(&config.logger, &root)?;
        if logger_config.app_name().is_none() {
            logger_config.set_app_name(namespace.name());
        }
        if let Some(customize) = &self.customize_logger {
            customize(&mut logger_config);
        }
        let logger = logger_config.build()?;
        tracing::info!(
            stream = %logger_config.stream(),
            level = %logger_config.level(),
            custom_engine = logger_config.engine().is_some(),
            "Logger built"
        );

        Ok(Application {
            config,
            root,
            namespace,
            load_paths,
            controller,
            view,
            routes,
            router,
            logger,
        })
    }

    fn load_configuration(&self) -> Result<(AppConfig, PathBuf), BootError> {
        match &self.source {
            ConfigSource::File(path) => {
                let config = load_config(path).map_err(|source| BootError::Config {
                    path: path.clone(),
                    source,
                })?;
                let base_dir = path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."));
                Ok((config, base_dir))
            }
            ConfigSource::Inline { config, base_dir } => {
                validate_config(config).map_err(|errors| BootError::Config {
                    path: base_dir.clone(),
                    source: ConfigError::Validation(errors),
                })?;
                Ok((config.clone(), base_dir.clone()))
            }
        }
    }
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match &self.source {
            ConfigSource::File(path) => path.display().to_string(),
            ConfigSource::Inline { base_dir, .. } => format!("inline ({})", base_dir.display()),
        };
        f.debug_struct("Loader")
            .field("source", &source)
            .field("actions", &self.actions)
            .field("strict", &self.strict)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

/// Resolve load paths against `root`, keeping the directories that exist.
fn resolve_load_paths(root: &Path, load_paths: &[PathBuf]) -> Vec<PathBuf> {
    load_paths
        .iter()
        .map(|p| root.join(p))
        .filter(|p| {
            let exists = p.is_dir();
            if !exists {
                tracing::warn!(path = %p.display(), "Load path does not exist, skipping");
            }
            exists
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use tempfile::TempDir;

    fn temp_app(routes: &str) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("config")).unwrap();
        fs::create_dir_all(dir.path().join("controllers")).unwrap();
        fs::write(dir.path().join("config/routes.toml"), routes).unwrap();
        dir
    }

    #[test]
    fn test_resolve_load_paths_skips_missing() {
        let tmp = temp_app("");
        let dir = tmp.path();
        let resolved = resolve_load_paths(dir, &[PathBuf::from("controllers"), PathBuf::from("views")]);
        assert_eq!(resolved, vec![dir.join("controllers")]);
    }

    #[test]
    fn test_boot_from_inline_config() {
        let tmp = temp_app("[[route]]\nmethod = \"GET\"\npath = \"/\"\nto = \"home#index\"\n");
        let dir = tmp.path();
        let loader = Loader::from_config(AppConfig::default(), dir, ActionRegistry::new())
            .lenient()
            .configure_logger(|logger| {
                logger.set_stream(crate::observability::LogStream::Buffer(Default::default()));
            });

        assert!(!loader.is_loaded());
        let app = loader.load().unwrap();
        assert!(loader.is_loaded());

        assert_eq!(app.namespace().name(), "Web");
        assert_eq!(app.root(), dir.join(".").as_path());
        assert_eq!(app.load_paths().len(), 1);
        assert_eq!(app.routes().len(), 1);
        assert_eq!(app.controller().action_namespace(), "Web::Controllers");

        let again = loader.load().unwrap();
        assert!(Arc::ptr_eq(&app, &again));
    }

    #[test]
    fn test_strict_boot_fails_on_missing_action() {
        let tmp = temp_app("[[route]]\nmethod = \"GET\"\npath = \"/\"\nto = \"home#index\"\n");
        let dir = tmp.path();
        let loader = Loader::from_config(AppConfig::default(), dir, ActionRegistry::new());

        let err = loader.load().unwrap_err();
        assert!(matches!(
            err,
            BootError::Routes {
                source: RouteError::UnknownEndpoint { .. },
                ..
            }
        ));
        assert!(!loader.is_loaded());
    }

    #[test]
    fn test_overlapping_routes_fail_without_poisoning_the_lock() {
        let tmp = temp_app(
            "[[route]]\nmethod = \"GET\"\npath = \"/files/:id\"\nto = \"files#show\"\n\n\
             [[route]]\nmethod = \"GET\"\npath = \"/files/*path\"\nto = \"files#download\"\n",
        );
        let loader = Loader::from_config(AppConfig::default(), tmp.path(), ActionRegistry::new()).lenient();

        for _ in 0..2 {
            let err = loader.load().unwrap_err();
            assert!(
                matches!(
                    err,
                    BootError::Routes {
                        source: RouteError::Conflict { .. },
                        ..
                    }
                ),
                "{:?}",
                err
            );
        }
        assert!(!loader.is_loaded());
    }

    #[test]
    fn test_invalid_inline_config() {
        let mut config = AppConfig::default();
        config.timeouts.request_secs = 0;
        let loader = Loader::from_config(config, ".", ActionRegistry::new());

        let err = loader.load().unwrap_err();
        assert!(matches!(
            err,
            BootError::Config {
                source: ConfigError::Validation(_),
                ..
            }
        ));
    }

    #[test]
    fn test_missing_routes_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        let loader = Loader::from_config(AppConfig::default(), dir, ActionRegistry::new());

        match loader.load().unwrap_err() {
            BootError::Config { path, source: ConfigError::Io(_) } => {
                assert_eq!(path, dir.join("./config/routes.toml"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
