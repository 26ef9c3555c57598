use crate::error::BoxError;
use crate::record::AppEvent;

/// Final encoding stage for normalized [`AppEvent`]s.
///
/// [`AppEventFormatter`](crate::formatter::AppEventFormatter) hands every
/// normalized event to an implementation of this trait and returns its
/// output and errors untouched.
pub trait EventSerializer: Send + Sync {
    type Output;

    /// Encode a single normalized event.
    fn serialize(&self, event: &AppEvent) -> Result<Self::Output, BoxError>;

    /// Encode an ordered batch of normalized events.
    fn serialize_batch(&self, events: &[AppEvent]) -> Result<Self::Output, BoxError>;
}

/// How [`JsonSerializer`] lays out a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchMode {
    /// One JSON array holding every event.
    #[default]
    Json,
    /// One JSON document per line, ready for bulk ingestion.
    Newlines,
}

/// [`EventSerializer`] producing JSON text through `serde_json`.
#[derive(Debug, Clone)]
pub struct JsonSerializer {
    pub batch_mode: BatchMode,
    /// Terminate the output with `\n`.
    pub append_newline: bool,
}

impl Default for JsonSerializer {
    fn default() -> Self {
        JsonSerializer {
            batch_mode: BatchMode::Json,
            append_newline: true,
        }
    }
}

impl JsonSerializer {
    pub fn new(batch_mode: BatchMode, append_newline: bool) -> Self {
        JsonSerializer {
            batch_mode,
            append_newline,
        }
    }

    fn terminate(&self, mut out: String) -> String {
        if self.append_newline && !out.is_empty() {
            out.push('\n');
        }
        out
    }
}

impl EventSerializer for JsonSerializer {
    type Output = String;

    fn serialize(&self, event: &AppEvent) -> Result<String, BoxError> {
        Ok(self.terminate(serde_json::to_string(event)?))
    }

    fn serialize_batch(&self, events: &[AppEvent]) -> Result<String, BoxError> {
        let out = match self.batch_mode {
            BatchMode::Json => serde_json::to_string(events)?,
            BatchMode::Newlines => events
                .iter()
                .map(serde_json::to_string)
                .collect::<Result<Vec<_>, _>>()?
                .join("\n"),
        };
        Ok(self.terminate(out))
    }
}
