//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::Options;
use crate::config::validation::{validate_options, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate options from TOML text.
pub fn parse_options(content: &str) -> Result<Options, ConfigError> {
    let options: Options = toml::from_str(content)?;
    validate_options(&options).map_err(ConfigError::Validation)?;
    Ok(options)
}

/// Load and validate options from a TOML file.
pub fn load_options(path: &Path) -> Result<Options, ConfigError> {
    let content = fs::read_to_string(path)?;
    let options = parse_options(&content)?;

    tracing::debug!(path = %path.display(), "Configuration loaded");
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_file() {
        let options = parse_options("port = 9090\ngrace_period_secs = 5\n").unwrap();
        assert_eq!(options.port, 9090);
        assert_eq!(options.grace_period_secs, 5);
        assert!(options.host.is_empty());
    }

    #[test]
    fn test_parse_empty_file() {
        assert_eq!(parse_options("").unwrap(), Options::default());
    }

    #[test]
    fn test_parse_error() {
        let err = parse_options("port = \"eighty\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation_error_lists_fields() {
        let err = parse_options("host = \"a b\"\nlog_level = \"noisy\"").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 2));
        assert!(err.to_string().starts_with("Validation failed: host:"));
        assert!(err.to_string().contains(", log_level:"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_options(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
