//! `tracing` subscriber installation.
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level when set
//! - Plain fmt layer; sinks render their own wire format into the message

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter: `RUST_LOG` if present, otherwise `level` for this crate
/// and the HTTP stack.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("service_scaffold={level},tower_http={level},{level}"))
    })
}

/// Install the global subscriber. Returns `false` if one was already set.
pub fn init(level: &str) -> bool {
    tracing_subscriber::registry()
        .with(env_filter(level))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
