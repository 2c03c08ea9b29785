//! Tracing setup for binaries, demos, and tests.
//!
//! Library code only emits via the `tracing` macros; installing a subscriber
//! is the host application's call. These helpers wire up the usual
//! registry + env-filter + fmt + error-layer stack.

use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the default subscriber, honouring `RUST_LOG`.
///
/// Falls back to `info` when `RUST_LOG` is unset. Safe to call only once per
/// process.
pub fn init() {
    init_with_filter("info");
}

/// Install the default subscriber with an explicit fallback filter.
pub fn init_with_filter(fallback: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(fallback.to_string()));
    let fmt_layer = fmt::layer().with_target(true);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(ErrorLayer::default())
        .init();
}
