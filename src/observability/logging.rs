//! Application logger configuration.
//!
//! # Responsibilities
//! - Hold the logger settings (stream, engine, level, app name, format, filters)
//! - Map the `[logger]` section of the configuration file onto those settings
//! - Build the logger handed to the application
//!
//! # Design Decisions
//! - One read accessor and one write accessor per setting
//! - A custom engine short-circuits `build`; the other settings are then ignored
//! - `build` constructs a new logger on every call, nothing is memoized

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;
use tracing::Dispatch;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;

use crate::config::schema::LoggerSettings;
use crate::observability::formatter::{FormatSpec, LogFormatter};
use crate::observability::layer::AppLogLayer;
use crate::observability::stream::LogStream;

/// Errors raised while configuring or building the application logger.
#[derive(Debug, Error)]
pub enum LoggerError {
    /// The level setting is not a known severity.
    #[error("Unknown log level '{0}'")]
    UnknownLevel(String),

    /// The output stream could not be opened.
    #[error("Cannot open log stream {stream}: {source}")]
    Stream {
        stream: String,
        #[source]
        source: std::io::Error,
    },
}

/// Parse a severity name.
///
/// `fatal` and `unknown` have no `tracing` counterpart and map to ERROR.
pub fn parse_level(value: &str) -> Result<LevelFilter, LoggerError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "fatal" | "unknown" => Ok(LevelFilter::ERROR),
        other => LevelFilter::from_str(other).map_err(|_| LoggerError::UnknownLevel(value.to_string())),
    }
}

/// Declarative configuration for the application logger.
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    stream: LogStream,
    engine: Option<Dispatch>,
    level: LevelFilter,
    app_name: Option<String>,
    format: FormatSpec,
    filters: Vec<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            stream: LogStream::Stdout,
            engine: None,
            level: LevelFilter::DEBUG,
            app_name: None,
            format: FormatSpec::default(),
            filters: Vec::new(),
        }
    }
}

impl LoggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a `[logger]` section onto a fresh configuration.
    ///
    /// File streams are resolved against `root`.
    pub fn from_settings(settings: &LoggerSettings, root: &Path) -> Result<Self, LoggerError> {
        let mut config = Self::new();
        if let Some(stream) = &settings.stream {
            config.set_stream(LogStream::from_setting(stream, root));
        }
        if let Some(level) = &settings.level {
            config.set_level(parse_level(level)?);
        }
        if let Some(app_name) = &settings.app_name {
            config.set_app_name(app_name.clone());
        }
        if let Some(format) = &settings.format {
            config.set_format(format.as_str());
        }
        config.set_filters(settings.filters.clone());
        Ok(config)
    }

    pub fn stream(&self) -> &LogStream {
        &self.stream
    }

    pub fn set_stream(&mut self, stream: LogStream) -> &mut Self {
        self.stream = stream;
        self
    }

    /// The custom engine, if one was set.
    pub fn engine(&self) -> Option<&Dispatch> {
        self.engine.as_ref()
    }

    /// Use `engine` as the logger instead of building one.
    pub fn set_engine(&mut self, engine: impl Into<Dispatch>) -> &mut Self {
        self.engine = Some(engine.into());
        self
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    pub fn set_level(&mut self, level: impl Into<LevelFilter>) -> &mut Self {
        self.level = level.into();
        self
    }

    pub fn app_name(&self) -> Option<&str> {
        self.app_name.as_deref()
    }

    pub fn set_app_name(&mut self, app_name: impl Into<String>) -> &mut Self {
        self.app_name = Some(app_name.into());
        self
    }

    /// The format selection as it was set.
    pub fn format(&self) -> &FormatSpec {
        &self.format
    }

    pub fn set_format(&mut self, format: impl Into<FormatSpec>) -> &mut Self {
        self.format = format.into();
        self
    }

    /// Select a custom formatter type.
    pub fn format_with<F>(&mut self) -> &mut Self
    where
        F: LogFormatter + Default + 'static,
    {
        self.format = FormatSpec::custom::<F>();
        self
    }

    /// The formatter the current selection resolves to.
    pub fn formatter(&self) -> Arc<dyn LogFormatter> {
        self.format.resolve()
    }

    /// Field names whose values are masked in log output.
    pub fn filters(&self) -> &[String] {
        &self.filters
    }

    pub fn set_filters<I, T>(&mut self, filters: I) -> &mut Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.filters = filters.into_iter().map(Into::into).collect();
        self
    }

    /// Build the logger.
    ///
    /// Returns the custom engine when one is set. Otherwise opens the stream
    /// and constructs a new logger from the remaining settings.
    pub fn build(&self) -> Result<Dispatch, LoggerError> {
        if let Some(engine) = &self.engine {
            return Ok(engine.clone());
        }

        let writer = self.stream.open().map_err(|source| LoggerError::Stream {
            stream: self.stream.to_string(),
            source,
        })?;

        let layer = AppLogLayer::new(
            self.app_name.clone(),
            self.level,
            self.formatter(),
            self.filters.clone(),
            writer,
        );

        Ok(Dispatch::new(tracing_subscriber::registry().with(layer)))
    }
}
