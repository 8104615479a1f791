//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

use crate::{LogConfig, LogFormat};

/// Install the global subscriber. `RUST_LOG` wins over `default_directive`.
///
/// Returns `false` when a subscriber is already installed.
pub fn init_tracing(format: LogFormat, default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let installed = match format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(false)
            .try_init(),
    };
    installed.is_ok()
}

/// [`init_tracing`] from a config section
pub fn init_from_config(config: &LogConfig) -> bool {
    init_tracing(config.format, &config.directive)
}
