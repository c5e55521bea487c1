// ⚠️ Error Taxonomy - everything the store can fail with
//
// Absence is NOT an error here: lookups return Option, deletes return bool.
// The command layer turns these into user-facing text.

use std::path::PathBuf;
use thiserror::Error;

/// Alias for `Result<T, StoreError>`.
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Kind name is not one of the registered kinds
    #[error("unknown kind: {0}")]
    UnknownKind(String),

    /// Reconstruction input is missing identity fields or has bad values
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// Durable file exists but cannot be parsed as a store snapshot
    #[error("corrupt store file {path:?}: {message}")]
    CorruptStore { path: PathBuf, message: String },

    /// I/O failure while reading, writing or copying the durable file
    #[error("persistence error on {path:?}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Value does not fit the declared type of the attribute
    #[error("invalid value for {attribute}: {message}")]
    InvalidValue { attribute: String, message: String },

    /// kind, id and the timestamps are managed by the entity itself
    #[error("attribute {0} is read-only")]
    ReadOnlyAttribute(String),
}

impl StoreError {
    pub(crate) fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Persistence {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        StoreError::CorruptStore {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn invalid_value(attribute: &str, message: impl Into<String>) -> Self {
        StoreError::InvalidValue {
            attribute: attribute.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = StoreError::UnknownKind("Vehicle".to_string());
        assert_eq!(err.to_string(), "unknown kind: Vehicle");

        let err = StoreError::invalid_value("number_rooms", "expected integer, got \"many\"");
        assert_eq!(
            err.to_string(),
            "invalid value for number_rooms: expected integer, got \"many\""
        );

        let err = StoreError::ReadOnlyAttribute("id".to_string());
        assert_eq!(err.to_string(), "attribute id is read-only");
    }

    #[test]
    fn test_persistence_keeps_io_source() {
        use std::error::Error as _;

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = StoreError::persistence("/tmp/file.json", io);

        assert!(err.to_string().contains("/tmp/file.json"));
        assert!(err.source().is_some());
    }
}
