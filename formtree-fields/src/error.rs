//! Error types for the field tree

use thiserror::Error;

/// Result type for field tree operations
pub type Result<T> = std::result::Result<T, FieldError>;

/// Errors that can occur while resolving, reading or validating fields
#[derive(Debug, Error)]
pub enum FieldError {
    /// Sub-fields were requested from a schema value that is not a schema
    #[error("expected a schema object, but found \"{found}\" instead")]
    SchemaTypeMismatch { found: String },

    /// The aggregate value of a sub-schema node cannot be assigned
    #[error("unable to set value of schema field '{field}'")]
    UnsupportedWrite { field: String },

    /// A value element rejected a value of the wrong shape
    #[error("invalid value for field '{field}': expected {expected}, found {found}")]
    InvalidValue {
        field: String,
        expected: String,
        found: String,
    },

    /// The default remote data request failed
    #[error("remote request to '{endpoint}' failed: {source}")]
    RemoteFetch {
        endpoint: String,
        #[source]
        source: anyhow::Error,
    },

    /// A validation rule failed to evaluate
    #[error("rule evaluation failed on field '{field}': {source}")]
    RuleEvaluation {
        field: String,
        #[source]
        source: anyhow::Error,
    },

    /// A collaborator needed for the operation was not configured
    #[error("no {name} configured")]
    MissingCollaborator { name: String },
}

impl FieldError {
    /// Create an invalid value error, naming the JSON type that was found
    pub fn invalid_value(
        field: impl Into<String>,
        expected: impl Into<String>,
        found: &serde_json::Value,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            expected: expected.into(),
            found: json_type_name(found).to_string(),
        }
    }
}

/// The JSON type name of a value, as used in error messages
pub fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
