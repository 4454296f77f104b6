//! Configuration schema definitions.
//!
//! `Options` is what callers and config files provide: every field is
//! optional, and the zero value means "use the built-in default".
//! `Settings` is the resolved, immutable result every subsystem reads.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(15);
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Caller-provided options. Zero values are unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Options {
    /// Interface to bind (e.g., "127.0.0.1").
    pub host: String,

    /// Port to bind.
    pub port: u16,

    /// Time allowed to receive a request body, in seconds.
    pub read_timeout_secs: u64,

    /// Time allowed to produce a response, in seconds.
    pub write_timeout_secs: u64,

    /// Time a kept-alive connection may sit idle, in seconds.
    pub idle_timeout_secs: u64,

    /// Bound on the graceful drain after a termination signal, in seconds.
    pub grace_period_secs: u64,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Options {
    /// Options that spell out every built-in default.
    pub fn defaults() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            read_timeout_secs: DEFAULT_READ_TIMEOUT.as_secs(),
            write_timeout_secs: DEFAULT_WRITE_TIMEOUT.as_secs(),
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT.as_secs(),
            grace_period_secs: DEFAULT_GRACE_PERIOD.as_secs(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }

    /// Field-wise merge: every set field of `later` wins.
    pub fn overlay(&self, later: &Options) -> Options {
        fn pick_str(base: &str, later: &str) -> String {
            let chosen = if later.is_empty() { base } else { later };
            chosen.to_string()
        }
        fn pick<T: Copy + Default + PartialEq>(base: T, later: T) -> T {
            if later == T::default() { base } else { later }
        }

        Options {
            host: pick_str(&self.host, &later.host),
            port: pick(self.port, later.port),
            read_timeout_secs: pick(self.read_timeout_secs, later.read_timeout_secs),
            write_timeout_secs: pick(self.write_timeout_secs, later.write_timeout_secs),
            idle_timeout_secs: pick(self.idle_timeout_secs, later.idle_timeout_secs),
            grace_period_secs: pick(self.grace_period_secs, later.grace_period_secs),
            log_level: pick_str(&self.log_level, &later.log_level),
        }
    }
}

/// Resolved configuration with every default applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub idle_timeout: Duration,
    pub grace_period: Duration,
    pub log_level: String,
}

impl Settings {
    /// Apply `options` in order, then fill whatever is still unset.
    pub fn resolve(options: &[Options]) -> Self {
        let merged = options
            .iter()
            .fold(Options::default(), |acc, next| acc.overlay(next));
        let filled = Options::defaults().overlay(&merged);

        Self {
            host: filled.host,
            port: filled.port,
            read_timeout: Duration::from_secs(filled.read_timeout_secs),
            write_timeout: Duration::from_secs(filled.write_timeout_secs),
            idle_timeout: Duration::from_secs(filled.idle_timeout_secs),
            grace_period: Duration::from_secs(filled.grace_period_secs),
            log_level: filled.log_level,
        }
    }

    /// Listen address, `host:port`. Bare IPv6 hosts are bracketed.
    pub fn address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::resolve(&[])
    }
}
