//! Error types for formtree settings

use std::path::PathBuf;
use thiserror::Error;

/// Settings-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Settings directory does not exist
    #[error("Settings directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Settings parsing failed
    #[error("Failed to parse settings: {source}")]
    ParseError { source: Box<figment::Error> },

    /// A setting was present but unusable
    #[error("Invalid value for setting '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

impl ConfigError {
    /// Create an invalid value error
    pub fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(error: figment::Error) -> Self {
        ConfigError::ParseError {
            source: Box::new(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_value_display() {
        let err = ConfigError::invalid_value("related_endpoint", "must not be empty");
        assert_eq!(
            err.to_string(),
            "Invalid value for setting 'related_endpoint': must not be empty"
        );
    }

    #[test]
    fn test_directory_not_found_display() {
        let err = ConfigError::DirectoryNotFound {
            path: PathBuf::from("/nope"),
        };
        assert!(err.to_string().contains("/nope"));
    }
}
