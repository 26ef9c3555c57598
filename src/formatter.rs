use crate::env::{env_or, APP_EVENT_DATE_FORMAT_ENV};
use crate::error::{BoxError, ConfigError, RecordError};
use crate::mapper;
use crate::normalizer::{Normalizer, DEFAULT_DATE_FORMAT};
use crate::record::{AppEvent, RawRecord};
use crate::serializer::EventSerializer;

/// Configuration for [`AppEventFormatter`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormatterConfig {
    /// `strftime`-style format used for every instant in the record,
    /// including `@timestamp`.
    pub date_format: String,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

impl FormatterConfig {
    /// Read the configuration from `APP_EVENT_DATE_FORMAT`, falling back
    /// to the defaults.
    pub fn from_env() -> Self {
        Self {
            date_format: env_or(APP_EVENT_DATE_FORMAT_ENV, DEFAULT_DATE_FORMAT),
        }
    }
}

/// Reformats raw log records as application events.
///
/// Each record is mapped onto the app event schema, normalized, and then
/// encoded by the wrapped [`EventSerializer`]. The formatter holds no
/// per-call state, so a shared reference can be used from many threads at
/// once as long as the serializer allows it.
#[derive(Debug, Clone)]
pub struct AppEventFormatter<S> {
    normalizer: Normalizer,
    serializer: S,
}

impl<S: EventSerializer> AppEventFormatter<S> {
    /// Wrap `serializer` using the default ISO-8601 date format.
    pub fn new(serializer: S) -> Self {
        Self {
            normalizer: Normalizer::default(),
            serializer,
        }
    }

    /// Wrap `serializer` with an explicit [`FormatterConfig`].
    ///
    /// **Returns**
    /// - `Err(ConfigError::InvalidDateFormat)` if the date format contains
    ///   an unknown specifier.
    pub fn with_config(serializer: S, config: FormatterConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            normalizer: Normalizer::new(config.date_format)?,
            serializer,
        })
    }

    /// Map, normalize and encode a single record.
    ///
    /// Errors are either a [`RecordError`] for a record missing one of its
    /// required fields, or whatever the serializer returned, unchanged.
    pub fn format(&self, record: &RawRecord) -> Result<S::Output, BoxError> {
        let event = self.prepare(record)?;
        self.serializer.serialize(&event)
    }

    /// Map and normalize every record, in order, then encode them as one
    /// batch.
    pub fn format_batch(&self, records: &[RawRecord]) -> Result<S::Output, BoxError> {
        let batch = records
            .iter()
            .map(|record| self.prepare(record))
            .collect::<Result<Vec<_>, _>>()?;
        self.serializer.serialize_batch(&batch)
    }

    /// The normalized event `format` would hand to the serializer.
    pub fn prepare(&self, record: &RawRecord) -> Result<AppEvent, RecordError> {
        let mapped = mapper::map(record)?;
        Ok(self.normalizer.normalize_event(&mapped))
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn serializer(&self) -> &S {
        &self.serializer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::JsonSerializer;

    #[test]
    fn default_config_uses_iso8601() {
        assert_eq!(FormatterConfig::default().date_format, "%Y-%m-%dT%H:%M:%S%:z");
    }

    #[test]
    fn invalid_date_format_is_rejected() {
        let config = FormatterConfig {
            date_format: "%Y-%".to_string(),
        };

        let err = AppEventFormatter::with_config(JsonSerializer::default(), config).unwrap_err();
        assert_eq!(err, ConfigError::InvalidDateFormat("%Y-%".to_string()));
    }

    #[test]
    fn missing_fields_surface_as_record_errors() {
        let formatter = AppEventFormatter::new(JsonSerializer::default());

        let err = formatter.format(&RawRecord::default()).unwrap_err();
        let err = err.downcast_ref::<RecordError>().unwrap();
        assert!(matches!(err, RecordError::MissingField(_)));
    }

    #[test]
    fn formatter_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AppEventFormatter<JsonSerializer>>();
    }
}
