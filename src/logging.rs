//! Tracing setup for the command line tool.
//!
//! Logs go to stderr so stdout stays clean for listings.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "vimusync=info,warn";

/// Initialize the logging system.
///
/// `RUST_LOG` wins over `configured`, which wins over the built-in default.
/// Calling this twice is harmless; the second call keeps the first subscriber.
pub fn init_logging(configured: Option<&str>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(configured.unwrap_or(DEFAULT_FILTER))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    });

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false);

    if tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .is_ok()
    {
        tracing::debug!("Logging initialized");
    }
}
