use crate::value::{Map, Value};
use serde::Serialize;

pub const MESSAGE: &str = "message";
pub const CONTEXT: &str = "context";
pub const LEVEL: &str = "level";
pub const LEVEL_NAME: &str = "level_name";
pub const CHANNEL: &str = "channel";
pub const DATETIME: &str = "datetime";
pub const EXTRA: &str = "extra";

/// Key under which processors store the authenticated principal.
pub const EXTRA_TOKEN: &str = "token";
/// Key under which processors store the record tags.
pub const EXTRA_TAGS: &str = "tags";

/// Generic structured log entry, as produced by an application logger.
///
/// By convention `message` holds the symbolic event name (e.g.
/// `login.success`) and `context` the event payload. Keys other than the
/// ones the mapper knows about (`level`, `channel`, ...) are carried along
/// and ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    fields: Map,
}

impl RawRecord {
    pub fn new(
        message: impl Into<String>,
        level_name: impl Into<String>,
        datetime: impl Into<Value>,
        context: Map,
    ) -> Self {
        let mut fields = Map::new();
        fields.insert(MESSAGE.to_string(), Value::String(message.into()));
        fields.insert(LEVEL_NAME.to_string(), Value::String(level_name.into()));
        fields.insert(DATETIME.to_string(), datetime.into());
        fields.insert(CONTEXT.to_string(), Value::Map(context));
        RawRecord { fields }
    }

    pub fn with_extra(mut self, extra: Map) -> Self {
        self.fields.insert(EXTRA.to_string(), Value::Map(extra));
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Mutable access to the `extra` bag, created empty when absent.
    ///
    /// Returns `None` when `extra` holds something other than a mapping.
    pub fn extra_mut(&mut self) -> Option<&mut Map> {
        match self
            .fields
            .entry(EXTRA.to_string())
            .or_insert_with(|| Value::Map(Map::new()))
        {
            Value::Map(extra) => Some(extra),
            _ => None,
        }
    }

    pub fn fields(&self) -> &Map {
        &self.fields
    }

    pub fn into_fields(self) -> Map {
        self.fields
    }
}

impl From<Map> for RawRecord {
    fn from(fields: Map) -> Self {
        RawRecord { fields }
    }
}

/// Application event in the shape expected by indexing pipelines.
///
/// The mapper produces it with raw values (`timestamp` still an instant);
/// the normalizer turns it into an encodable one. Serialization emits the
/// keys in declaration order and leaves out absent optional keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppEvent {
    pub event_name: Value,
    #[serde(rename = "@timestamp")]
    pub timestamp: Value,
    pub log_level: Value,
    pub event: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<Map>,
}
