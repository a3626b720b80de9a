//! Logging bootstrap.
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and a fmt layer.
//! Log output goes to stderr so that verdict lines on stdout stay clean.

use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, TelemetryConfig};
use crate::{Error, Result};

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Calling this more
/// than once is harmless; later calls keep the first subscriber.
pub fn init_logging(config: &TelemetryConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| {
            Error::Telemetry(format!("Invalid log level '{}': {e}", config.level))
        })?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match config.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init(),
    };

    if installed.is_err() {
        debug!("Tracing subscriber already installed, keeping the existing one");
    }
    Ok(())
}
