use crate::logger::{EventLogger, Level, APP_EVENT_TARGET, CONTEXT_FIELD, LOG_LEVEL_FIELD};
use crate::value::{Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{debug, Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that turns events on one target into app
/// events and hands them to an [`EventLogger`].
///
/// The formatted message becomes the event name and the remaining fields
/// the event data. A `log_level` field overrides the level derived from
/// the tracing level, and a `context` field holding a JSON object is merged
/// into the data, which is how [`TracingEventLogger`](crate::logger::TracingEventLogger)
/// ships its payload.
pub struct AppEventLayer {
    logger: Arc<dyn EventLogger>,
    target: String,
    /// Events forwarded to the logger.
    pub forwarded_events: Arc<AtomicU64>,
    /// Events on the target that carried no message.
    pub skipped_events: Arc<AtomicU64>,
}

impl AppEventLayer {
    /// Capture events on [`APP_EVENT_TARGET`].
    pub fn new(logger: Arc<dyn EventLogger>) -> Self {
        Self::with_target(logger, APP_EVENT_TARGET)
    }

    pub fn with_target(logger: Arc<dyn EventLogger>, target: impl Into<String>) -> Self {
        Self {
            logger,
            target: target.into(),
            forwarded_events: Arc::new(AtomicU64::new(0)),
            skipped_events: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl<S> Layer<S> for AppEventLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if meta.target() != self.target {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let Some(event_name) = visitor.message else {
            self.skipped_events.fetch_add(1, Ordering::Relaxed);
            debug!(app_event_target = %self.target, "app event without a message, skipping");
            return;
        };

        let level = visitor
            .log_level
            .and_then(|name| name.parse::<Level>().ok())
            .unwrap_or_else(|| Level::from(*meta.level()));

        self.logger.log(level, &event_name, &visitor.data);
        self.forwarded_events.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Default)]
pub struct FieldVisitor {
    pub message: Option<String>,
    pub log_level: Option<String>,
    pub data: Map,
}

impl FieldVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        self.data.insert(field.name().to_string(), value);
    }

    fn merge_context(&mut self, raw: &str) {
        let parsed = serde_json::from_str::<serde_json::Value>(raw).map(Value::from);
        if let Ok(Value::Map(context)) = parsed {
            self.data.extend(context);
        } else {
            self.data.insert(CONTEXT_FIELD.to_string(), Value::from(raw));
        }
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = Some(value.to_string()),
            LOG_LEVEL_FIELD => self.log_level = Some(value.to_string()),
            CONTEXT_FIELD => self.merge_context(value),
            _ => self.insert(field, Value::from(value)),
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let rendered = format!("{:?}", value);
        match field.name() {
            "message" => self.message = Some(rendered),
            LOG_LEVEL_FIELD => self.log_level = Some(rendered),
            CONTEXT_FIELD => self.merge_context(&rendered),
            _ => self.insert(field, Value::from(rendered)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::Registry;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(Level, String, Map)>>,
    }

    impl EventLogger for Recorder {
        fn log(&self, level: Level, event_name: &str, data: &Map) {
            self.calls
                .lock()
                .unwrap()
                .push((level, event_name.to_string(), data.clone()));
        }
    }

    struct Captured {
        calls: Vec<(Level, String, Map)>,
        forwarded: u64,
        skipped: u64,
    }

    fn capture(f: impl FnOnce()) -> Captured {
        let recorder = Arc::new(Recorder::default());
        let layer = AppEventLayer::new(recorder.clone());
        let forwarded = Arc::clone(&layer.forwarded_events);
        let skipped = Arc::clone(&layer.skipped_events);

        tracing::subscriber::with_default(Registry::default().with(layer), f);

        let calls = recorder.calls.lock().unwrap().clone();
        Captured {
            calls,
            forwarded: forwarded.load(Ordering::Relaxed),
            skipped: skipped.load(Ordering::Relaxed),
        }
    }

    #[test]
    fn captures_fields_of_app_events() {
        let captured = capture(|| {
            tracing::warn!(target: "app_event", user_id = 42, admin = false, ratio = 0.5, "login.failure");
        });

        assert_eq!(captured.calls.len(), 1);
        let (level, name, data) = &captured.calls[0];
        assert_eq!(*level, Level::Warning);
        assert_eq!(name, "login.failure");
        assert_eq!(
            Value::Map(data.clone()),
            Value::from(json!({"user_id": 42, "admin": false, "ratio": 0.5}))
        );
        assert_eq!(captured.forwarded, 1);
    }

    #[test]
    fn ignores_other_targets() {
        let captured = capture(|| {
            tracing::error!(target: "http", "request failed");
        });

        assert!(captured.calls.is_empty());
        assert_eq!(captured.forwarded, 0);
    }

    #[test]
    fn log_level_field_overrides_tracing_level() {
        let captured = capture(|| {
            tracing::info!(target: "app_event", log_level = "NOTICE", "login.success");
        });

        assert_eq!(captured.calls[0].0, Level::Notice);
        assert!(captured.calls[0].2.is_empty());
    }

    #[test]
    fn json_context_is_merged_into_data() {
        let captured = capture(|| {
            tracing::info!(target: "app_event", context = r#"{"username":"william"}"#, "login.success");
        });

        assert_eq!(
            Value::Map(captured.calls[0].2.clone()),
            Value::from(json!({"username": "william"}))
        );
    }

    #[test]
    fn events_without_message_are_skipped() {
        let captured = capture(|| {
            tracing::info!(target: "app_event", user_id = 1);
        });

        assert!(captured.calls.is_empty());
        assert_eq!(captured.skipped, 1);
    }
}
