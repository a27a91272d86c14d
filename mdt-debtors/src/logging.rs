//! Logging setup
//!
//! The subscriber is installed before the config file is read so config
//! loading can report what it found. The configured `logging.level` is
//! applied afterwards through a reload handle. `RUST_LOG` always wins.

use tracing::warn;
use tracing_subscriber::{
    layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

/// Level used until the config file has been read
pub const BOOTSTRAP_LOG_LEVEL: &str = "info";

/// Handle for swapping the active filter
pub type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// `RUST_LOG` when set, otherwise the bootstrap level
pub fn bootstrap_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(BOOTSTRAP_LOG_LEVEL))
}

/// Reloadable filter layer and its handle
pub fn reloadable_filter() -> (reload::Layer<EnvFilter, Registry>, FilterHandle) {
    reload::Layer::new(bootstrap_filter())
}

/// Install the global subscriber
pub fn init() -> FilterHandle {
    let (filter, handle) = reloadable_filter();
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
    handle
}

/// Switch to the configured level unless `RUST_LOG` is set
///
/// Returns whether the filter was replaced. An unparsable level keeps the
/// current filter.
pub fn apply_configured_level(handle: &FilterHandle, level: &str) -> bool {
    if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        return false;
    }

    let filter = match EnvFilter::try_new(level) {
        Ok(filter) => filter,
        Err(e) => {
            warn!(level, error = %e, "Invalid logging.level, keeping current filter");
            return false;
        }
    };

    match handle.reload(filter) {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Failed to apply logging.level");
            false
        }
    }
}
