//! Error types for manifest operations

use boxpub_core_interface::DestinationError;
use thiserror::Error;

/// Result type for manifest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during manifest operations
#[derive(Error, Debug)]
pub enum Error {
    /// The destination holding the manifest failed
    #[error("Manifest storage error: {0}")]
    Destination(#[from] DestinationError),

    /// Stored manifest bytes are not a well-formed manifest document
    #[error("Failed to parse manifest at {location}: {source}")]
    Parse {
        location: String,
        #[source]
        source: serde_json::Error,
    },

    /// Stored manifest is valid JSON but does not match the manifest schema
    #[error("Manifest at {location} does not match the manifest schema:\n  - {message}")]
    Schema { location: String, message: String },

    /// Manifest could not be serialized
    #[error("Failed to serialize manifest: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Manifest or provider entry failed validation
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Unknown checksum algorithm identifier
    #[error("Unsupported checksum type: {0}")]
    UnsupportedChecksumType(String),
}

impl Error {
    /// Create a validation error with a message
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Error::Validation {
            message: message.into(),
        }
    }

    /// Create a parse error for the manifest at `location`
    pub fn parse<S: Into<String>>(location: S, source: serde_json::Error) -> Self {
        Error::Parse {
            location: location.into(),
            source,
        }
    }

    /// True when the stored document could not be parsed or is off-schema
    pub fn is_parse(&self) -> bool {
        matches!(self, Error::Parse { .. } | Error::Schema { .. })
    }

    /// True when a manifest or entry was rejected by validation
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::Validation { .. } | Error::UnsupportedChecksumType(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = Error::validation("test message");
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Validation error: test message");
    }

    #[test]
    fn test_parse_error_names_location() {
        let source = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = Error::parse("mybox/manifest.json", source);
        assert!(err.is_parse());
        assert!(err.to_string().contains("mybox/manifest.json"));
    }

    #[test]
    fn test_schema_error_counts_as_parse() {
        let err = Error::Schema {
            location: "manifest.json".to_string(),
            message: "/versions: \"x\" is not of type \"array\"".to_string(),
        };
        assert!(err.is_parse());
        assert!(!err.is_validation());
    }

    #[test]
    fn test_destination_error_conversion() {
        let err: Error = DestinationError::InvalidKey(String::new()).into();
        assert!(matches!(err, Error::Destination(_)));
        assert!(!err.is_parse());
    }
}
