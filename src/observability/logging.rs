//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Respect `RUST_LOG` over the configured level
//!
//! # Design Decisions
//! - Uses the tracing crate for structured logging
//! - `try_init` so embedding hosts and tests that already installed a
//!   subscriber are left alone

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging at the configured level.
///
/// The `RUST_LOG` environment variable, when set, takes precedence.
pub fn init(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("cache_fleet={}", log_level).into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
