//! Tracing subscriber setup.
//!
//! Operational logs (startup, access log, panics) go through `tracing` to
//! stdout. Payload records do not: they are written to the
//! [`LogSink`](crate::LogSink) by the payload middleware.

use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;
use crate::error::{Error, Result};

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `config.log_level`. Fails if a global
/// subscriber is already set.
pub fn init(config: &ServerConfig) -> Result<()> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) => EnvFilter::new(directives),
        Err(_) => EnvFilter::new(format!("bims={},warn", config.log_level)),
    };

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if config.log_json {
        registry
            .with(fmt::layer().json().with_current_span(true).with_target(true))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .try_init()
    };
    installed.map_err(|e| Error::Telemetry(e.to_string()))?;

    info!(json = config.log_json, level = %config.log_level, "tracing initialized");
    Ok(())
}
