//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! The filter comes from `RUST_LOG` when set, otherwise
//! [`DEFAULT_FILTER`]. GPU and windowing crates are noisy at `info`, so the
//! default only raises this crate's verbosity.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "warn,image_gallery=info";

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init();
}
