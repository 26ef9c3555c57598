use std::sync::Arc;

use app_event_formatter::handler::WriterHandler;
use app_event_formatter::init::{init_tracing_with_config, LayerConfig};
use app_event_formatter::logger::TracingEventLogger;
use app_event_formatter::{AppEventFormatter, AppEventLogger, JsonSerializer, Level, Map, Value};
use tracing::{info, warn};

fn main() {
    let handler = WriterHandler::new(
        AppEventFormatter::new(JsonSerializer::default()),
        std::io::stdout(),
    );

    if let Err(e) = init_tracing_with_config(Arc::new(handler), LayerConfig::from_env()) {
        eprintln!("failed to install subscriber: {}", e);
        return;
    }

    info!("starting service");

    // Plain tracing events on the app event target.
    warn!(target: "app_event", user_id = 42, reason = "invalid password", "login.failure");

    // Or through the logger helper, which keeps the exact level name.
    let events = AppEventLogger::with_logger(Arc::new(TracingEventLogger::new()));
    let mut data = Map::new();
    data.insert("username".to_string(), Value::from("william"));
    events.log("login.success", &data, Some(Level::Notice));
}
