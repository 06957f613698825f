//! Log line formatters.
//!
//! # Responsibilities
//! - Render one log record to one line
//! - Map a format setting (keyword or custom type) to a formatter
//!
//! # Design Decisions
//! - `json` is the only recognized keyword; every other keyword falls back
//!   to the plain formatter instead of failing the boot
//! - Custom formatters are selected by type and instantiated on demand, so
//!   every built logger owns a fresh instance

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use tracing::Level;

/// A single event as seen by a formatter.
#[derive(Debug, Clone)]
pub struct LogRecord<'a> {
    pub app: Option<&'a str>,
    pub level: Level,
    pub target: &'a str,
    pub time: DateTime<Utc>,
    pub message: &'a str,
    pub fields: &'a [(String, Value)],
}

/// Strategy controlling how a record is rendered.
pub trait LogFormatter: Send + Sync {
    /// Render the record without a trailing newline.
    fn format(&self, record: &LogRecord<'_>) -> String;
}

/// Plain text: `[app] [LEVEL] [time] message key=value`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFormatter;

impl LogFormatter for DefaultFormatter {
    fn format(&self, record: &LogRecord<'_>) -> String {
        let mut line = String::new();
        if let Some(app) = record.app {
            line.push_str(&format!("[{}] ", app));
        }
        line.push_str(&format!(
            "[{}] [{}] {}",
            record.level,
            record.time.format("%Y-%m-%d %H:%M:%S %z"),
            record.message
        ));
        for (key, value) in record.fields {
            match value {
                Value::String(s) => line.push_str(&format!(" {}={}", key, s)),
                other => line.push_str(&format!(" {}={}", key, other)),
            }
        }
        line
    }
}

/// One JSON object per line.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl LogFormatter for JsonFormatter {
    fn format(&self, record: &LogRecord<'_>) -> String {
        let mut object = Map::new();
        if let Some(app) = record.app {
            object.insert("app".into(), Value::String(app.to_string()));
        }
        object.insert("severity".into(), Value::String(record.level.to_string()));
        object.insert(
            "time".into(),
            Value::String(record.time.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        object.insert("target".into(), Value::String(record.target.to_string()));
        object.insert("message".into(), Value::String(record.message.to_string()));
        for (key, value) in record.fields {
            object.insert(key.clone(), value.clone());
        }
        Value::Object(object).to_string()
    }
}

type FormatterFactory = Arc<dyn Fn() -> Arc<dyn LogFormatter> + Send + Sync>;

/// Formatter selection as written in configuration.
#[derive(Clone)]
pub enum FormatSpec {
    /// A keyword such as `json` or `default`.
    Keyword(String),
    /// A formatter type, instantiated through its `Default` impl.
    Custom {
        type_name: &'static str,
        make: FormatterFactory,
    },
}

impl FormatSpec {
    /// Select a formatter by type.
    pub fn custom<F>() -> Self
    where
        F: LogFormatter + Default + 'static,
    {
        FormatSpec::Custom {
            type_name: std::any::type_name::<F>(),
            make: Arc::new(|| Arc::new(F::default()) as Arc<dyn LogFormatter>),
        }
    }

    /// Produce the formatter this selection stands for.
    pub fn resolve(&self) -> Arc<dyn LogFormatter> {
        match self {
            FormatSpec::Keyword(keyword) if keyword.eq_ignore_ascii_case("json") => {
                Arc::new(JsonFormatter)
            }
            FormatSpec::Keyword(_) => Arc::new(DefaultFormatter),
            FormatSpec::Custom { make, .. } => make(),
        }
    }
}

impl Default for FormatSpec {
    fn default() -> Self {
        FormatSpec::Keyword("default".to_string())
    }
}

impl From<&str> for FormatSpec {
    fn from(keyword: &str) -> Self {
        FormatSpec::Keyword(keyword.to_string())
    }
}

impl From<String> for FormatSpec {
    fn from(keyword: String) -> Self {
        FormatSpec::Keyword(keyword)
    }
}

impl PartialEq for FormatSpec {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FormatSpec::Keyword(a), FormatSpec::Keyword(b)) => a == b,
            (FormatSpec::Custom { type_name: a, .. }, FormatSpec::Custom { type_name: b, .. }) => {
                a == b
            }
            _ => false,
        }
    }
}

impl fmt::Debug for FormatSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatSpec::Keyword(keyword) => f.debug_tuple("Keyword").field(keyword).finish(),
            FormatSpec::Custom { type_name, .. } => f.debug_tuple("Custom").field(type_name).finish(),
        }
    }
}
