//! Tracing subscriber bootstrap
//!
//! Installs a formatted `tracing` subscriber honoring `RUST_LOG`. Called
//! once by whatever binary embeds the pipeline; a repeated call is a no-op.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset
const DEFAULT_DIRECTIVES: &str = "info";

/// Install the global tracing subscriber
///
/// Returns `false` when a subscriber was already installed.
pub fn init() -> bool {
    init_with_default(DEFAULT_DIRECTIVES)
}

/// Install the global tracing subscriber with custom default directives
///
/// `RUST_LOG` still wins when set. Returns `false` when a subscriber was
/// already installed.
pub fn init_with_default(directives: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
