/// Error type shared with [`EventSerializer`](crate::serializer::EventSerializer)
/// implementations. Serializer failures travel through the formatter in
/// this shape without being wrapped or translated.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A raw log record that does not satisfy the caller contract.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("log record is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("log record field `{field}` must be {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },
}

/// Error type returned when building formatter or logger configuration.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid date format `{0}`")]
    InvalidDateFormat(String),

    #[error("unknown log level `{0}`")]
    UnknownLevel(String),
}
