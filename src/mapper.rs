//! Field mapping from raw log records to the application event schema.
//!
//! | raw record       | app event          |
//! |------------------|--------------------|
//! | `message`        | `event_name`       |
//! | `datetime`       | `@timestamp`       |
//! | `level_name`     | `log_level`        |
//! | `context`        | `event`            |
//! | `extra.token`    | `user`             |
//! | `extra.tags`     | `tags`             |
//! | rest of `extra`  | `extra`            |

use crate::error::RecordError;
use crate::record::{
    AppEvent, RawRecord, CONTEXT, DATETIME, EXTRA, EXTRA_TAGS, EXTRA_TOKEN, LEVEL_NAME, MESSAGE,
};
use crate::value::{Map, Value};

/// Map a raw record onto the application event schema.
///
/// Values are copied verbatim; nothing is normalized here. Fails when one
/// of `message`, `datetime`, `level_name` or `context` is absent, or when
/// `extra` is not a mapping.
pub fn map(record: &RawRecord) -> Result<AppEvent, RecordError> {
    let mut event = AppEvent {
        event_name: required(record, MESSAGE)?.clone(),
        timestamp: required(record, DATETIME)?.clone(),
        log_level: required(record, LEVEL_NAME)?.clone(),
        event: required(record, CONTEXT)?.clone(),
        user: None,
        tags: None,
        extra: None,
    };

    match record.get(EXTRA) {
        None | Some(Value::Null) => {}
        Some(Value::Map(extra)) => map_extra(&mut event, extra),
        Some(_) => {
            return Err(RecordError::InvalidField {
                field: EXTRA,
                expected: "a mapping",
            })
        }
    }

    Ok(event)
}

fn required<'a>(record: &'a RawRecord, field: &'static str) -> Result<&'a Value, RecordError> {
    record.get(field).ok_or(RecordError::MissingField(field))
}

fn map_extra(event: &mut AppEvent, extra: &Map) {
    event.user = present(extra, EXTRA_TOKEN);
    event.tags = present(extra, EXTRA_TAGS);

    let remaining: Map = extra
        .iter()
        .filter(|(key, _)| key.as_str() != EXTRA_TOKEN && key.as_str() != EXTRA_TAGS)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    if !remaining.is_empty() {
        event.extra = Some(remaining);
    }
}

// A key holding null counts as unset.
fn present(extra: &Map, key: &str) -> Option<Value> {
    extra.get(key).filter(|value| !value.is_null()).cloned()
}
