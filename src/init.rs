use crate::env::{env_flag, env_or, APP_EVENT_STDOUT_ENV, APP_EVENT_TARGET_ENV};
use crate::layer::AppEventLayer;
use crate::logger::{EventLogger, APP_EVENT_TARGET};
use std::sync::Arc;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the app event layer.
///
/// **Fields**
/// - `target`: tracing target whose events are treated as app events.
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   installed next to [`AppEventLayer`] and every event is also printed
///   to the console.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerConfig {
    pub target: String,
    pub enable_stdout: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            target: APP_EVENT_TARGET.to_string(),
            enable_stdout: false,
        }
    }
}

impl LayerConfig {
    /// Read `APP_EVENT_TARGET` and `APP_EVENT_STDOUT`, falling back to the
    /// defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            target: env_or(APP_EVENT_TARGET_ENV, &defaults.target),
            enable_stdout: env_flag(APP_EVENT_STDOUT_ENV, defaults.enable_stdout),
        }
    }
}

/// Install a global `tracing` subscriber routing app events to `logger`.
///
/// **Parameters**
/// - `logger`: [`EventLogger`] receiving every event captured by the layer,
///   typically a [`WriterHandler`](crate::handler::WriterHandler). It must
///   not re-emit into `tracing` on the captured target.
/// - `config`: [`LayerConfig`] selecting the target and console output.
///
/// **Returns**
/// - `Err(..)` if a global subscriber was already installed.
pub fn init_tracing_with_config(
    logger: Arc<dyn EventLogger>,
    config: LayerConfig,
) -> Result<(), SetGlobalDefaultError> {
    let layer = AppEventLayer::with_target(logger, config.target);

    // Two arms because the layered subscriber types differ.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)
    }
}

/// Initialize tracing with [`LayerConfig::default`].
pub fn init_tracing(logger: Arc<dyn EventLogger>) -> Result<(), SetGlobalDefaultError> {
    init_tracing_with_config(logger, LayerConfig::default())
}
