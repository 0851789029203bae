//! Logging initialization.
//!
//! Logs go to stderr so stdout stays reserved for command output.

use std::io;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "VFNET_LOG";

/// Default filter when `VFNET_LOG` is unset or invalid.
const DEFAULT_FILTER: &str = "info";

/// Initialize the global subscriber.
pub fn init(json: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = if json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(io::stderr)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .try_init()?;

    Ok(())
}
