//! Error types for clinic operations

use thiserror::Error;

/// Schema registry errors. These are configuration defects, not runtime
/// conditions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    #[error("Duplicate entity: {0}")]
    DuplicateEntity(String),

    #[error("Invalid field {field} on {entity}: {reason}")]
    InvalidField {
        entity: String,
        field: String,
        reason: String,
    },

    #[error("Relationship to {0} is not a parent reference")]
    NotParentReference(String),

    #[error("Relationship to {0} is not a nested collection")]
    NotNestedCollection(String),

    #[error("Failed to read model file: {0}")]
    Io(String),

    #[error("Failed to parse model: {0}")]
    Parse(String),
}

/// Failure of a single transport call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request {method} {path} failed: {reason}")]
    Transport {
        method: &'static str,
        path: String,
        reason: String,
    },

    #[error("{method} {path} returned HTTP {status}: {message}")]
    Status {
        method: &'static str,
        path: String,
        status: u16,
        message: String,
    },

    #[error("Could not decode response of {method} {path}: {reason}")]
    Decode {
        method: &'static str,
        path: String,
        reason: String,
    },
}

impl FetchError {
    pub fn path(&self) -> &str {
        match self {
            FetchError::Transport { path, .. }
            | FetchError::Status { path, .. }
            | FetchError::Decode { path, .. } => path,
        }
    }
}

/// Record shape errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("Record is not a JSON object")]
    NotAnObject,

    #[error("Record has no scalar id field")]
    MissingId,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_entity_display() {
        let err = SchemaError::UnknownEntity("Horse".to_string());
        assert_eq!(err.to_string(), "Unknown entity: Horse");
    }

    #[test]
    fn test_status_error_display() {
        let err = FetchError::Status {
            method: "DELETE",
            path: "/pets/3".to_string(),
            status: 404,
            message: "not found".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("DELETE /pets/3"));
        assert!(msg.contains("404"));
        assert_eq!(err.path(), "/pets/3");
    }
}
