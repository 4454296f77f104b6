//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts, log level)
//! - Reject hosts that cannot form a `host:port` address
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: `&Options → Result<(), Vec<ValidationError>>`
//! - Unset (zero) fields are always valid; defaults fill them later

use std::fmt;

use crate::config::schema::Options;

/// Longest timeout accepted for any duration option.
pub const MAX_TIMEOUT_SECS: u64 = 24 * 60 * 60;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem with the options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Check `options` and collect every problem.
pub fn validate_options(options: &Options) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if options.host.chars().any(|c| c.is_whitespace() || c == '/') {
        errors.push(ValidationError::new(
            "host",
            format!("'{}' is not a valid host", options.host),
        ));
    }

    for (field, secs) in [
        ("read_timeout_secs", options.read_timeout_secs),
        ("write_timeout_secs", options.write_timeout_secs),
        ("idle_timeout_secs", options.idle_timeout_secs),
        ("grace_period_secs", options.grace_period_secs),
    ] {
        if secs > MAX_TIMEOUT_SECS {
            errors.push(ValidationError::new(
                field,
                format!("{} exceeds the maximum of {} seconds", secs, MAX_TIMEOUT_SECS),
            ));
        }
    }

    if !options.log_level.is_empty()
        && !LOG_LEVELS.contains(&options.log_level.to_ascii_lowercase().as_str())
    {
        errors.push(ValidationError::new(
            "log_level",
            format!("unknown level '{}'", options.log_level),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
