use crate::record::{RawRecord, EXTRA_TAGS, EXTRA_TOKEN};
use crate::value::Value;

/// Enriches a [`RawRecord`] before it is formatted, usually by adding keys
/// to its `extra` bag.
pub trait Processor: Send + Sync {
    fn process(&self, record: &mut RawRecord);
}

impl<F> Processor for F
where
    F: Fn(&mut RawRecord) + Send + Sync,
{
    fn process(&self, record: &mut RawRecord) {
        self(record)
    }
}

/// Stamps a fixed list of tags on every record as `extra.tags`.
#[derive(Debug, Clone, Default)]
pub struct TagProcessor {
    tags: Vec<String>,
}

impl TagProcessor {
    pub fn new<I, T>(tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    pub fn add_tags<I, T>(&mut self, tags: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

impl Processor for TagProcessor {
    fn process(&self, record: &mut RawRecord) {
        if let Some(extra) = record.extra_mut() {
            extra.insert(EXTRA_TAGS.to_string(), Value::from(self.tags.clone()));
        }
    }
}

/// Records the authenticated principal as `extra.token`.
///
/// The closure is asked for the current principal on every record; when it
/// returns `None` the record is left alone.
pub struct TokenProcessor<F> {
    token: F,
}

impl<F> TokenProcessor<F>
where
    F: Fn() -> Option<Value> + Send + Sync,
{
    pub fn new(token: F) -> Self {
        Self { token }
    }
}

impl<F> Processor for TokenProcessor<F>
where
    F: Fn() -> Option<Value> + Send + Sync,
{
    fn process(&self, record: &mut RawRecord) {
        let Some(token) = (self.token)() else {
            return;
        };
        if let Some(extra) = record.extra_mut() {
            extra.insert(EXTRA_TOKEN.to_string(), token);
        }
    }
}
