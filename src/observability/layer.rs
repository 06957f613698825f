//! The application logger's `tracing` layer.

use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use serde_json::Value;
use tracing::field::{Field, Visit};
use tracing::subscriber::Interest;
use tracing::{Event, Metadata, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Context, Layer};

use crate::observability::formatter::{LogFormatter, LogRecord};

const FILTERED: &str = "[FILTERED]";

/// Writes every enabled event as one formatted line.
pub struct AppLogLayer {
    app_name: Option<String>,
    level: LevelFilter,
    formatter: Arc<dyn LogFormatter>,
    filters: Vec<String>,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl AppLogLayer {
    pub fn new(
        app_name: Option<String>,
        level: LevelFilter,
        formatter: Arc<dyn LogFormatter>,
        filters: Vec<String>,
        writer: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            app_name,
            level,
            formatter,
            filters,
            writer: Mutex::new(writer),
        }
    }

    fn is_filtered(&self, key: &str) -> bool {
        self.filters.iter().any(|f| f.eq_ignore_ascii_case(key))
    }
}

impl fmt::Debug for AppLogLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppLogLayer")
            .field("app_name", &self.app_name)
            .field("level", &self.level)
            .field("filters", &self.filters)
            .finish_non_exhaustive()
    }
}

impl<S: Subscriber> Layer<S> for AppLogLayer {
    // Several application loggers with different levels can be alive at
    // once, so callsite interest must not be cached.
    fn register_callsite(&self, _metadata: &'static Metadata<'static>) -> Interest {
        Interest::sometimes()
    }

    fn enabled(&self, metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        *metadata.level() <= self.level
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let fields: Vec<(String, Value)> = visitor
            .fields
            .into_iter()
            .map(|(key, value)| {
                if self.is_filtered(&key) {
                    (key, Value::String(FILTERED.to_string()))
                } else {
                    (key, value)
                }
            })
            .collect();

        let metadata = event.metadata();
        let record = LogRecord {
            app: self.app_name.as_deref(),
            level: *metadata.level(),
            target: metadata.target(),
            time: Utc::now(),
            message: &visitor.message,
            fields: &fields,
        };
        let line = self.formatter.format(&record);

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writeln!(writer, "{}", line);
        let _ = writer.flush();
    }
}

/// Collects the message and structured fields of an event.
#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: Vec<(String, Value)>,
}

impl FieldVisitor {
    fn push(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
        } else {
            self.fields.push((field.name().to_string(), value));
        }
    }
}

impl Visit for FieldVisitor {
    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.push(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push(field, Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.push(field, Value::String(format!("{:?}", value)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::formatter::{DefaultFormatter, JsonFormatter};
    use crate::observability::stream::SharedBuffer;
    use tracing_subscriber::layer::SubscriberExt;

    fn dispatch(level: LevelFilter, formatter: Arc<dyn LogFormatter>, filters: Vec<String>) -> (tracing::Dispatch, SharedBuffer) {
        let buffer = SharedBuffer::new();
        let layer = AppLogLayer::new(
            Some("web".to_string()),
            level,
            formatter,
            filters,
            Box::new(buffer.clone()),
        );
        let dispatch = tracing::Dispatch::new(tracing_subscriber::registry().with(layer));
        (dispatch, buffer)
    }

    #[test]
    fn test_level_filtering() {
        let (dispatch, buffer) = dispatch(LevelFilter::WARN, Arc::new(DefaultFormatter), vec![]);

        tracing::dispatcher::with_default(&dispatch, || {
            tracing::debug!("hidden");
            tracing::info!("hidden too");
            tracing::warn!("shown");
            tracing::error!("also shown");
        });

        let lines = buffer.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("[web] [WARN]"));
        assert!(lines[0].ends_with("shown"));
        assert!(lines[1].starts_with("[web] [ERROR]"));
    }

    #[test]
    fn test_fields_and_filters() {
        let (dispatch, buffer) = dispatch(
            LevelFilter::TRACE,
            Arc::new(JsonFormatter),
            vec!["password".to_string()],
        );

        tracing::dispatcher::with_default(&dispatch, || {
            tracing::info!(user = "ada", password = "hunter2", attempts = 3u64, "login");
        });

        let lines = buffer.lines();
        assert_eq!(lines.len(), 1);
        let parsed: Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(parsed["message"], "login");
        assert_eq!(parsed["user"], "ada");
        assert_eq!(parsed["password"], "[FILTERED]");
        assert_eq!(parsed["attempts"], 3);
        assert_eq!(parsed["app"], "web");
    }

    #[test]
    fn test_poisoned_writer_keeps_logging() {
        let buffer = SharedBuffer::new();
        let layer = AppLogLayer::new(
            None,
            LevelFilter::INFO,
            Arc::new(DefaultFormatter),
            vec![],
            Box::new(buffer.clone()),
        );
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = layer.writer.lock().unwrap();
            panic!("writer panicked mid-line");
        }));
        assert!(layer.writer.is_poisoned());

        let dispatch = tracing::Dispatch::new(tracing_subscriber::registry().with(layer));
        tracing::dispatcher::with_default(&dispatch, || tracing::info!("still here"));

        let lines = buffer.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("still here"));
    }
}
