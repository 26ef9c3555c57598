use std::sync::Arc;

use app_event_formatter::handler::WriterHandler;
use app_event_formatter::processor::{TagProcessor, TokenProcessor};
use app_event_formatter::{AppEventFormatter, AppEventLogger, JsonSerializer, Level, Map, Value};

/// A service that emits app events through a composed logger helper.
struct LoginService {
    events: AppEventLogger,
}

impl LoginService {
    fn login(&self, username: &str, ok: bool) {
        let mut data = Map::new();
        data.insert("username".to_string(), Value::from(username));

        if ok {
            self.events.log("login.success", &data, None);
        } else {
            self.events.log("login.failure", &data, Some(Level::Warning));
        }
    }
}

fn main() {
    let handler = WriterHandler::new(
        AppEventFormatter::new(JsonSerializer::default()),
        std::io::stdout(),
    )
    .push_processor(TagProcessor::new(["auth", "demo"]))
    .push_processor(TokenProcessor::new(|| {
        Some(Value::from_iter([("username", Value::from("admin"))]))
    }));

    let mut events = AppEventLogger::with_logger(Arc::new(handler));
    events.set_default_log_level(Level::Notice);

    let service = LoginService { events };
    service.login("william", true);
    service.login("mallory", false);
}
