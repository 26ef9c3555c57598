//! Environment variable names used by this crate for configuring the
//! formatter and the tracing layer from a service's environment.
//!
//! These are purely helpers; the core types remain decoupled from
//! environment access.

/// `strftime` format for `@timestamp` and nested instants.
pub const APP_EVENT_DATE_FORMAT_ENV: &str = "APP_EVENT_DATE_FORMAT";

/// Tracing target captured by the app event layer.
pub const APP_EVENT_TARGET_ENV: &str = "APP_EVENT_TARGET";

/// Set to `1`/`true`/`yes`/`on` to also print events through the `fmt` layer.
pub const APP_EVENT_STDOUT_ENV: &str = "APP_EVENT_STDOUT";

/// Channel name stamped on records built by a handler.
pub const APP_EVENT_CHANNEL_ENV: &str = "APP_EVENT_CHANNEL";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read a boolean flag; unset or unrecognised values yield `default`.
pub fn env_flag(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(raw) => parse_flag(&raw).unwrap_or(default),
        Err(_) => default,
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
