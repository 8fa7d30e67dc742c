//! Logging setup
//!
//! Installs the tracing subscriber used by binaries and integration harnesses
//! embedding the recorder.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "broadcast_recorder=debug";

/// Initialize tracing/logging
///
/// Returns `false` when a global subscriber was already installed.
pub fn init() -> bool {
    let installed = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("Broadcast recorder v{}", env!("CARGO_PKG_VERSION"));
    }
    installed
}
