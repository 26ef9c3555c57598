//! Recursive sanitization of log payloads.
//!
//! Every value of a mapped [`AppEvent`] goes through [`Normalizer::normalize`]
//! before it reaches a serializer. Instants become strings, OS handles are
//! scrubbed, and oversized or overly deep structures are cut short with a
//! visible marker instead of failing the whole record.

use crate::error::ConfigError;
use crate::record::AppEvent;
use crate::value::{Map, Resource, Value};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, SecondsFormat, TimeZone, Utc};
use std::fmt::{self, Write};
use tracing::debug;

/// ISO-8601 with a numeric offset, e.g. `2000-01-01T01:01:01+00:00`.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Deepest nesting level that is still walked.
pub const MAX_DEPTH: usize = 9;

/// Entries kept per container before the rest is dropped.
pub const MAX_ITEMS: usize = 1000;

/// Key holding the summary of a truncated container.
pub const TRUNCATION_KEY: &str = "...";

/// Replaces any value nested deeper than [`MAX_DEPTH`].
pub const DEPTH_SENTINEL: &str = "Over 9 levels deep, aborting normalization";

#[derive(Debug, Clone)]
pub struct Normalizer {
    date_format: String,
}

impl Default for Normalizer {
    fn default() -> Self {
        Normalizer {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

impl Normalizer {
    /// Build a normalizer rendering instants with a `strftime`-style format.
    pub fn new(date_format: impl Into<String>) -> Result<Self, ConfigError> {
        let date_format = date_format.into();
        validate_date_format(&date_format)?;
        Ok(Normalizer { date_format })
    }

    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    /// Normalize every field of a mapped event.
    ///
    /// The event itself sits at depth 0, so its fields start at depth 1.
    pub fn normalize_event(&self, event: &AppEvent) -> AppEvent {
        AppEvent {
            event_name: self.normalize(&event.event_name, 1),
            timestamp: self.normalize(&event.timestamp, 1),
            log_level: self.normalize(&event.log_level, 1),
            event: self.normalize(&event.event, 1),
            user: event.user.as_ref().map(|user| self.normalize(user, 1)),
            tags: event.tags.as_ref().map(|tags| self.normalize(tags, 1)),
            extra: event
                .extra
                .as_ref()
                .map(|extra| self.normalize_map(extra, 1)),
        }
    }

    /// Return an encodable copy of `value`, found at nesting level `depth`.
    pub fn normalize(&self, value: &Value, depth: usize) -> Value {
        if depth > MAX_DEPTH {
            return Value::from(DEPTH_SENTINEL);
        }

        match value {
            Value::List(items) => Value::List(self.normalize_list(items, depth)),
            Value::Map(entries) => Value::Map(self.normalize_map(entries, depth)),
            Value::DateTime(dt) => Value::String(
                render_date(dt, &self.date_format)
                    .unwrap_or_else(|_| dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)),
            ),
            Value::Resource(resource) => Value::String(scrubbed(resource)),
            scalar => scalar.clone(),
        }
    }

    fn normalize_list(&self, items: &[Value], depth: usize) -> Vec<Value> {
        let mut normalized = Vec::with_capacity(items.len().min(MAX_ITEMS + 1));
        for (count, item) in items.iter().enumerate() {
            if count >= MAX_ITEMS {
                let mut marker = Map::new();
                marker.insert(TRUNCATION_KEY.to_string(), truncation_summary(items.len(), depth));
                normalized.push(Value::Map(marker));
                break;
            }
            normalized.push(self.normalize(item, depth + 1));
        }
        normalized
    }

    fn normalize_map(&self, entries: &Map, depth: usize) -> Map {
        let mut normalized = Map::new();
        for (count, (key, value)) in entries.iter().enumerate() {
            if count >= MAX_ITEMS {
                normalized.insert(
                    TRUNCATION_KEY.to_string(),
                    truncation_summary(entries.len(), depth),
                );
                break;
            }
            normalized.insert(key.clone(), self.normalize(value, depth + 1));
        }
        normalized
    }
}

fn truncation_summary(total: usize, depth: usize) -> Value {
    debug!(total, depth, "truncating oversized container");
    Value::String(format!(
        "Over {} items ({} total), aborting normalization",
        MAX_ITEMS, total
    ))
}

pub(crate) fn scrubbed(resource: &Resource) -> String {
    format!("(scrubbed a resource of type {})", resource.resource_type())
}

// Parse-only specifiers such as `%#z` pass `StrftimeItems` but fail on display.
fn render_date(dt: &DateTime<FixedOffset>, format: &str) -> Result<String, fmt::Error> {
    let mut rendered = String::new();
    write!(rendered, "{}", dt.format(format))?;
    Ok(rendered)
}

fn validate_date_format(format: &str) -> Result<(), ConfigError> {
    let invalid = || ConfigError::InvalidDateFormat(format.to_string());
    if format.is_empty() || StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(invalid());
    }
    let sample = Utc.timestamp_opt(0, 0).single().ok_or_else(invalid)?;
    render_date(&sample.fixed_offset(), format).map_err(|_| invalid())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Resource;
    use chrono::{DateTime, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::io::Cursor;

    fn nested(levels: usize, leaf: Value) -> Value {
        (0..levels).fold(leaf, |inner, _| Value::List(vec![inner]))
    }

    fn innermost(mut value: &Value) -> &Value {
        while let Value::List(items) = value {
            value = &items[0];
        }
        value
    }

    fn wide_map(len: usize) -> Value {
        (0..len)
            .map(|i| (format!("key{:04}", i), Value::from(i as u64)))
            .collect()
    }

    #[test]
    fn formats_instants_as_iso8601_with_offset() {
        let normalizer = Normalizer::default();
        let datetime = DateTime::parse_from_rfc3339("2000-01-01T01:01:01+00:00").unwrap();

        assert_eq!(
            normalizer.normalize(&Value::DateTime(datetime), 0),
            Value::from("2000-01-01T01:01:01+00:00")
        );
    }

    #[test]
    fn keeps_non_utc_offsets() {
        let normalizer = Normalizer::default();
        let datetime = DateTime::parse_from_rfc3339("2000-01-01T01:01:01+00:01").unwrap();

        assert_eq!(
            normalizer.normalize(&Value::DateTime(datetime), 0),
            Value::from("2000-01-01T01:01:01+00:01")
        );
    }

    #[test]
    fn honours_custom_date_format() {
        let normalizer = Normalizer::new("%d/%m/%Y %H:%M").unwrap();
        let datetime = Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap();

        assert_eq!(
            normalizer.normalize(&Value::from(datetime), 0),
            Value::from("04/03/2021 05:06")
        );
    }

    #[test]
    fn rejects_invalid_date_formats() {
        assert_eq!(
            Normalizer::new("%Y-%").unwrap_err(),
            ConfigError::InvalidDateFormat("%Y-%".to_string())
        );
        assert!(Normalizer::new("").is_err());
    }

    #[test]
    fn rejects_parse_only_date_formats() {
        assert_eq!(
            Normalizer::new("%#z").unwrap_err(),
            ConfigError::InvalidDateFormat("%#z".to_string())
        );
    }

    #[test]
    fn scrubs_resources() {
        let normalizer = Normalizer::default();
        let stream = Value::from(Resource::new(Cursor::new(Vec::new())));

        assert_eq!(
            normalizer.normalize(&stream, 0),
            Value::from("(scrubbed a resource of type stream)")
        );
    }

    #[test]
    fn scrubs_nested_instants_and_resources() {
        let normalizer = Normalizer::default();
        let datetime = Utc.with_ymd_and_hms(2000, 1, 1, 1, 1, 1).unwrap();
        let mut payload = Map::new();
        payload.insert("at".to_string(), Value::from(datetime));
        payload.insert(
            "handles".to_string(),
            Value::List(vec![Value::from(Resource::new(Cursor::new(Vec::new())))]),
        );

        let normalized = normalizer.normalize(&Value::Map(payload), 0);
        assert_eq!(
            normalized,
            Value::from(json!({
                "at": "2000-01-01T01:01:01+00:00",
                "handles": ["(scrubbed a resource of type stream)"],
            }))
        );
    }

    #[test]
    fn values_past_depth_nine_are_replaced() {
        let normalizer = Normalizer::default();

        let normalized = normalizer.normalize(&nested(10, Value::from("leaf")), 0);
        assert_eq!(innermost(&normalized), &Value::from(DEPTH_SENTINEL));

        let normalized = normalizer.normalize(&nested(9, Value::from("leaf")), 0);
        assert_eq!(innermost(&normalized), &Value::from("leaf"));
    }

    #[test]
    fn depth_guard_applies_to_the_value_itself() {
        let normalizer = Normalizer::default();

        assert_eq!(normalizer.normalize(&Value::from(1), 10), Value::from(DEPTH_SENTINEL));
        assert_eq!(normalizer.normalize(&Value::from(1), 9), Value::from(1));
    }

    #[test]
    fn maps_over_a_thousand_entries_are_truncated() {
        let normalizer = Normalizer::default();

        let normalized = normalizer.normalize(&wide_map(1001), 0);
        let map = normalized.as_map().unwrap();

        assert_eq!(map.len(), 1001);
        assert_eq!(map.get("key0999"), Some(&Value::UInt(999)));
        assert_eq!(map.get("key1000"), None);
        assert_eq!(
            map.get(TRUNCATION_KEY),
            Some(&Value::from(
                "Over 1000 items (1001 total), aborting normalization"
            ))
        );
    }

    #[test]
    fn maps_of_exactly_a_thousand_entries_are_kept() {
        let normalizer = Normalizer::default();
        let input = wide_map(1000);

        let normalized = normalizer.normalize(&input, 0);
        assert_eq!(normalized, input);
        assert!(normalized.get(TRUNCATION_KEY).is_none());
    }

    #[test]
    fn lists_over_a_thousand_entries_end_with_a_marker() {
        let normalizer = Normalizer::default();
        let input = Value::List((0..1500u64).map(Value::from).collect());

        let normalized = normalizer.normalize(&input, 0);
        let items = normalized.as_list().unwrap();

        assert_eq!(items.len(), 1001);
        assert_eq!(items[999], Value::UInt(999));
        assert_eq!(
            items[1000].get(TRUNCATION_KEY),
            Some(&Value::from(
                "Over 1000 items (1500 total), aborting normalization"
            ))
        );
    }

    #[test]
    fn lists_of_exactly_a_thousand_entries_are_kept() {
        let normalizer = Normalizer::default();
        let input = Value::List((0..1000u64).map(Value::from).collect());

        let normalized = normalizer.normalize(&input, 0);
        assert_eq!(normalized, input);
    }

    #[test]
    fn lists_of_a_thousand_and_one_entries_are_truncated() {
        let normalizer = Normalizer::default();
        let input = Value::List((0..1001u64).map(Value::from).collect());

        let normalized = normalizer.normalize(&input, 0);
        let items = normalized.as_list().unwrap();

        assert_eq!(items.len(), 1001);
        assert_eq!(items[999], Value::UInt(999));
        assert_eq!(
            items[1000],
            Value::from(json!({"...": "Over 1000 items (1001 total), aborting normalization"}))
        );
    }

    #[test]
    fn item_cap_is_counted_per_container() {
        let normalizer = Normalizer::default();
        let input: Value = [("first", wide_map(600)), ("second", wide_map(600))]
            .into_iter()
            .collect();

        let normalized = normalizer.normalize(&input, 0);
        assert_eq!(normalized, input);
    }

    #[test]
    fn safe_values_are_unchanged_and_idempotent() {
        let normalizer = Normalizer::default();
        let input = Value::from(json!({
            "username": "william",
            "attempts": 3,
            "ratio": 0.25,
            "admin": false,
            "missing": null,
            "roles": ["reader", "writer"],
        }));

        let once = normalizer.normalize(&input, 0);
        assert_eq!(once, input);
        assert_eq!(normalizer.normalize(&once, 0), once);
    }

    #[test]
    fn event_fields_start_one_level_down() {
        let normalizer = Normalizer::default();
        let event = AppEvent {
            event_name: Value::from("deep.event"),
            timestamp: Value::from(Utc.with_ymd_and_hms(2000, 1, 1, 1, 1, 1).unwrap()),
            log_level: Value::from("INFO"),
            event: nested(9, Value::from("leaf")),
            user: None,
            tags: None,
            extra: None,
        };

        let normalized = normalizer.normalize_event(&event);
        assert_eq!(normalized.timestamp, Value::from("2000-01-01T01:01:01+00:00"));
        assert_eq!(innermost(&normalized.event), &Value::from(DEPTH_SENTINEL));
    }
}
