//! Console logging via `tracing_subscriber`.
//!
//! Verbosity follows `RUST_LOG` and defaults to `info`. Per-stage start and
//! stop events are at `trace`, channel closes at `debug`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init() -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_thread_ids(true)
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init()
}
