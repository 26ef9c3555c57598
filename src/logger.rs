use crate::error::ConfigError;
use crate::normalizer::scrubbed;
use crate::value::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Tracing target used for app events travelling through `tracing`.
pub const APP_EVENT_TARGET: &str = "app_event";

/// Tracing field carrying the exact [`Level`] name.
pub const LOG_LEVEL_FIELD: &str = "log_level";

/// Tracing field carrying the event data as a JSON object.
pub const CONTEXT_FIELD: &str = "context";

/// RFC 5424 severity of an app event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Level {
    Debug,
    #[default]
    Info,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

impl Level {
    pub const ALL: [Level; 8] = [
        Level::Debug,
        Level::Info,
        Level::Notice,
        Level::Warning,
        Level::Error,
        Level::Critical,
        Level::Alert,
        Level::Emergency,
    ];

    /// Lower-case name, e.g. `notice`.
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Notice => "notice",
            Level::Warning => "warning",
            Level::Error => "error",
            Level::Critical => "critical",
            Level::Alert => "alert",
            Level::Emergency => "emergency",
        }
    }

    /// Upper-case label stored as a record's `level_name`, e.g. `NOTICE`.
    pub fn name(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Notice => "NOTICE",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
            Level::Alert => "ALERT",
            Level::Emergency => "EMERGENCY",
        }
    }

    /// Numeric severity stored as a record's `level`.
    pub fn code(self) -> u32 {
        match self {
            Level::Debug => 100,
            Level::Info => 200,
            Level::Notice => 250,
            Level::Warning => 300,
            Level::Error => 400,
            Level::Critical => 500,
            Level::Alert => 550,
            Level::Emergency => 600,
        }
    }

    /// Closest `tracing` level. `tracing` has no notice/critical/alert/emergency.
    pub fn as_tracing(self) -> tracing::Level {
        match self {
            Level::Debug => tracing::Level::DEBUG,
            Level::Info | Level::Notice => tracing::Level::INFO,
            Level::Warning => tracing::Level::WARN,
            Level::Error | Level::Critical | Level::Alert | Level::Emergency => {
                tracing::Level::ERROR
            }
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Level::ALL
            .into_iter()
            .find(|level| level.as_str() == lower)
            .ok_or_else(|| ConfigError::UnknownLevel(s.to_string()))
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        if level == tracing::Level::ERROR {
            Level::Error
        } else if level == tracing::Level::WARN {
            Level::Warning
        } else if level == tracing::Level::INFO {
            Level::Info
        } else {
            Level::Debug
        }
    }
}

/// Destination for app events emitted through [`AppEventLogger`].
pub trait EventLogger: Send + Sync {
    fn log(&self, level: Level, event_name: &str, data: &Map);
}

/// Optional event logger plus a default level, owned by any component that
/// wants to emit app events.
///
/// Without a logger attached, [`log`](AppEventLogger::log) does nothing.
#[derive(Clone, Default)]
pub struct AppEventLogger {
    logger: Option<Arc<dyn EventLogger>>,
    default_level: Level,
}

impl fmt::Debug for AppEventLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppEventLogger")
            .field("attached", &self.logger.is_some())
            .field("default_level", &self.default_level)
            .finish()
    }
}

impl AppEventLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_logger(logger: Arc<dyn EventLogger>) -> Self {
        Self {
            logger: Some(logger),
            default_level: Level::default(),
        }
    }

    pub fn set_app_event_logger(&mut self, logger: Arc<dyn EventLogger>) {
        self.logger = Some(logger);
    }

    /// Level used by later [`log`](AppEventLogger::log) calls that pass `None`.
    pub fn set_default_log_level(&mut self, level: Level) {
        self.default_level = level;
    }

    pub fn default_log_level(&self) -> Level {
        self.default_level
    }

    pub fn has_logger(&self) -> bool {
        self.logger.is_some()
    }

    /// Emit `event_name` with `data` at `level`, or at the default level.
    pub fn log(&self, event_name: &str, data: &Map, level: Option<Level>) {
        let Some(logger) = &self.logger else {
            return;
        };
        logger.log(level.unwrap_or(self.default_level), event_name, data);
    }
}

/// [`EventLogger`] re-emitting app events as `tracing` events on the
/// [`APP_EVENT_TARGET`] target, to be picked up by
/// [`AppEventLayer`](crate::layer::AppEventLayer).
///
/// The data travels as a JSON string. Instants cross as RFC 3339 strings and
/// handles are scrubbed, everything else is left for the formatter.
#[derive(Debug, Clone, Default)]
pub struct TracingEventLogger;

impl TracingEventLogger {
    pub fn new() -> Self {
        TracingEventLogger
    }
}

fn without_resources(value: &Value) -> Value {
    match value {
        Value::Resource(resource) => Value::String(scrubbed(resource)),
        Value::List(items) => Value::List(items.iter().map(without_resources).collect()),
        Value::Map(entries) => Value::Map(
            entries
                .iter()
                .map(|(key, value)| (key.clone(), without_resources(value)))
                .collect(),
        ),
        other => other.clone(),
    }
}

macro_rules! emit {
    ($level:expr, $log_level:expr, $context:expr, $name:expr) => {
        tracing::event!(
            target: APP_EVENT_TARGET,
            $level,
            log_level = $log_level,
            context = $context,
            "{}",
            $name
        )
    };
}

impl EventLogger for TracingEventLogger {
    fn log(&self, level: Level, event_name: &str, data: &Map) {
        let data = data
            .iter()
            .map(|(key, value)| (key.clone(), without_resources(value)))
            .collect::<Map>();
        let context = serde_json::to_string(&data).unwrap_or_else(|_| "{}".to_string());
        let context = context.as_str();
        let log_level = level.name();

        // `event!` needs the level at compile time.
        match level {
            Level::Debug => emit!(tracing::Level::DEBUG, log_level, context, event_name),
            Level::Info | Level::Notice => {
                emit!(tracing::Level::INFO, log_level, context, event_name)
            }
            Level::Warning => emit!(tracing::Level::WARN, log_level, context, event_name),
            Level::Error | Level::Critical | Level::Alert | Level::Emergency => {
                emit!(tracing::Level::ERROR, log_level, context, event_name)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_parse_case_insensitively() {
        assert_eq!("NOTICE".parse::<Level>().unwrap(), Level::Notice);
        assert_eq!(" warning ".parse::<Level>().unwrap(), Level::Warning);
        assert_eq!(
            "verbose".parse::<Level>().unwrap_err(),
            ConfigError::UnknownLevel("verbose".to_string())
        );
    }

    #[test]
    fn levels_order_by_severity() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Alert < Level::Emergency);
        assert!(Level::ALL.windows(2).all(|w| w[0].code() < w[1].code()));
    }

    #[test]
    fn display_and_name_differ_in_case() {
        assert_eq!(Level::Critical.to_string(), "critical");
        assert_eq!(Level::Critical.name(), "CRITICAL");
    }

    #[test]
    fn tracing_levels_round_trip_where_they_exist() {
        for level in [Level::Debug, Level::Info, Level::Warning, Level::Error] {
            assert_eq!(Level::from(level.as_tracing()), level);
        }
        assert_eq!(Level::from(tracing::Level::TRACE), Level::Debug);
    }

    #[test]
    fn bridge_payload_keeps_resources_out_and_sizes_intact() {
        use crate::value::Resource;
        use std::io::Cursor;

        let mut data: Map = (0..1500)
            .map(|i| (format!("key{:04}", i), Value::from(i as u64)))
            .collect();
        data.insert(
            "stream".to_string(),
            Value::from(Resource::new(Cursor::new(Vec::new()))),
        );

        let wire = without_resources(&Value::Map(data));
        let wire = wire.as_map().unwrap();
        assert_eq!(wire.len(), 1501);
        assert_eq!(
            wire.get("stream"),
            Some(&Value::from("(scrubbed a resource of type stream)"))
        );
    }

    #[test]
    fn default_level_is_info() {
        assert_eq!(AppEventLogger::new().default_log_level(), Level::Info);
    }
}
