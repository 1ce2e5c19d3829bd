//! Tracing setup driven by `[logging]` configuration.
//!
//! `init_tracing` installs the global subscriber once; later configuration
//! changes (for example a `Notifier` built with a different level) are pushed
//! through the reload handle.
use std::sync::OnceLock;
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

use crate::config::LoggingConfig;

type FilterHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

static FILTER_HANDLE: OnceLock<FilterHandle> = OnceLock::new();

/// Install the subscriber. `RUST_LOG`, when set and valid, wins over `logging.level`.
pub fn init_tracing(logging: &LoggingConfig) {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|_| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(&logging.level));

    let (filter_layer, handle) = reload::Layer::new(filter);
    if FILTER_HANDLE.set(handle).is_err() {
        // Already installed; treat as a level change.
        apply_logging_config(logging);
        return;
    }

    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt::layer())
        .try_init();
}

/// Switch the active level. No-op until `init_tracing` has run.
pub fn apply_logging_config(logging: &LoggingConfig) {
    if let Some(handle) = FILTER_HANDLE.get() {
        if handle
            .modify(|filter| *filter = EnvFilter::new(&logging.level))
            .is_ok()
        {
            tracing::debug!(level = %logging.level, "Logging level applied");
        }
    }
}

/// Active filter directives, if tracing was initialized here.
pub fn current_filter() -> Option<String> {
    FILTER_HANDLE
        .get()
        .and_then(|handle| handle.with_current(|filter| filter.to_string()).ok())
}
