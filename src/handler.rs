use crate::env::{env_or, APP_EVENT_CHANNEL_ENV};
use crate::error::BoxError;
use crate::formatter::AppEventFormatter;
use crate::logger::{EventLogger, Level, APP_EVENT_TARGET};
use crate::processor::Processor;
use crate::record::{RawRecord, CHANNEL, LEVEL};
use crate::serializer::EventSerializer;
use crate::value::Map;
use chrono::{DateTime, FixedOffset, Local};
use std::io::Write;
use std::sync::Mutex;
use tracing::warn;

/// Builds raw records for app events, runs processors over them, formats
/// them and writes one entry per event to `W`.
///
/// Writes are serialized through an internal mutex so the handler can be
/// shared as an [`EventLogger`] between threads.
pub struct WriterHandler<S, W> {
    formatter: AppEventFormatter<S>,
    processors: Vec<Box<dyn Processor>>,
    channel: String,
    writer: Mutex<W>,
}

impl<S, W> WriterHandler<S, W>
where
    S: EventSerializer,
    S::Output: AsRef<[u8]>,
    W: Write + Send,
{
    pub fn new(formatter: AppEventFormatter<S>, writer: W) -> Self {
        Self {
            formatter,
            processors: Vec::new(),
            channel: env_or(APP_EVENT_CHANNEL_ENV, APP_EVENT_TARGET),
            writer: Mutex::new(writer),
        }
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    /// Processors run in the order they were pushed.
    pub fn push_processor(mut self, processor: impl Processor + 'static) -> Self {
        self.processors.push(Box::new(processor));
        self
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Raw record for an event logged now.
    pub fn build_record(&self, level: Level, event_name: &str, data: &Map) -> RawRecord {
        let now: DateTime<FixedOffset> = Local::now().into();
        RawRecord::new(event_name, level.name(), now, data.clone())
            .with_field(LEVEL, level.code())
            .with_field(CHANNEL, self.channel.as_str())
            .with_extra(Map::new())
    }

    /// Run processors over `record`, format it and write the result.
    ///
    /// A newline is appended when the serializer output does not already
    /// end with one.
    pub fn handle(&self, mut record: RawRecord) -> Result<(), BoxError> {
        for processor in &self.processors {
            processor.process(&mut record);
        }

        let output = self.formatter.format(&record)?;
        let bytes = output.as_ref();

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| -> BoxError { "app event writer lock poisoned".into() })?;
        writer.write_all(bytes)?;
        if !bytes.ends_with(b"\n") {
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Give back the writer, e.g. to inspect an in-memory buffer.
    pub fn into_writer(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<S, W> EventLogger for WriterHandler<S, W>
where
    S: EventSerializer,
    S::Output: AsRef<[u8]>,
    W: Write + Send,
{
    fn log(&self, level: Level, event_name: &str, data: &Map) {
        let record = self.build_record(level, event_name, data);
        if let Err(e) = self.handle(record) {
            warn!(error = %e, event_name, "failed to write app event");
        }
    }
}
