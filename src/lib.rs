pub mod error;
pub mod value;
pub mod record;
pub mod mapper;
pub mod normalizer;
pub mod serializer;
pub mod formatter;

pub mod logger;
pub mod processor;
pub mod handler;
pub mod layer;
pub mod init;
pub mod env;

pub use error::{BoxError, ConfigError, RecordError};
pub use formatter::{AppEventFormatter, FormatterConfig};
pub use logger::{AppEventLogger, EventLogger, Level};
pub use record::{AppEvent, RawRecord};
pub use serializer::{BatchMode, EventSerializer, JsonSerializer};
pub use value::{Map, Resource, ResourceHandle, Value};
