/*!
 * Error types for boxpub
 */

use std::fmt;
use std::io;
use std::path::PathBuf;

use boxpub_core_interface::DestinationError;

pub type Result<T> = std::result::Result<T, PublishError>;

/// Exit code constants for structured process exit
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_FATAL: i32 = 2;
pub const EXIT_INTEGRITY: i32 = 3;

#[derive(Debug)]
pub enum PublishError {
    /// Mandatory options missing; every missing option is listed
    MissingOptions(Vec<String>),

    /// Other configuration error
    Config(String),

    /// Artifact did not come from the vagrant post-processor, or does not
    /// hold a single `.box` file
    UnsupportedSource {
        builder_id: String,
        files: Vec<PathBuf>,
        reason: String,
    },

    /// I/O error on a local path
    Io { path: PathBuf, source: io::Error },

    /// Fewer bytes reached the destination than the source held
    IncompleteCopy {
        path: PathBuf,
        expected: u64,
        written: u64,
    },

    /// Destination backend error
    Destination(DestinationError),

    /// Manifest load, merge or save failed
    Manifest(boxpub_core_manifest::Error),
}

impl PublishError {
    /// Wrap an I/O error with the path it happened on
    pub fn io<P: Into<PathBuf>>(path: P, source: io::Error) -> Self {
        PublishError::Io {
            path: path.into(),
            source,
        }
    }

    /// Build an unsupported-source error for an artifact
    pub fn unsupported_source<S: Into<String>>(
        builder_id: &str,
        files: &[PathBuf],
        reason: S,
    ) -> Self {
        PublishError::UnsupportedSource {
            builder_id: builder_id.to_string(),
            files: files.to_vec(),
            reason: reason.into(),
        }
    }

    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Configuration | ErrorCategory::Source => EXIT_FATAL,
            ErrorCategory::Integrity | ErrorCategory::Validation => EXIT_INTEGRITY,
            _ => EXIT_FAILURE,
        }
    }

    /// Check if this error is fatal (re-running with the same inputs cannot help)
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Configuration
                | ErrorCategory::Source
                | ErrorCategory::Parse
                | ErrorCategory::Validation
        )
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            PublishError::MissingOptions(_) | PublishError::Config(_) => {
                ErrorCategory::Configuration
            }
            PublishError::UnsupportedSource { .. } => ErrorCategory::Source,
            PublishError::Io { .. } | PublishError::Destination(_) => ErrorCategory::IoError,
            PublishError::IncompleteCopy { .. } => ErrorCategory::Integrity,
            PublishError::Manifest(err) => {
                if err.is_parse() {
                    ErrorCategory::Parse
                } else if err.is_validation() {
                    ErrorCategory::Validation
                } else {
                    ErrorCategory::IoError
                }
            }
        }
    }
}

/// Error category for classification and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing or invalid options
    Configuration,
    /// Artifact of the wrong origin or shape
    Source,
    /// Filesystem or destination failures
    IoError,
    /// Stored manifest is malformed
    Parse,
    /// Manifest entry rejected
    Validation,
    /// Published bytes do not match the source
    Integrity,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::Source => write!(f, "source"),
            ErrorCategory::IoError => write!(f, "io"),
            ErrorCategory::Parse => write!(f, "parse"),
            ErrorCategory::Validation => write!(f, "validation"),
            ErrorCategory::Integrity => write!(f, "integrity"),
        }
    }
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishError::MissingOptions(options) => {
                let messages: Vec<String> = options
                    .iter()
                    .map(|option| format!("vagrant-path {} must be set", option))
                    .collect();
                write!(f, "Configuration error: {}", messages.join("; "))
            }
            PublishError::Config(msg) => {
                write!(f, "Configuration error: {}", msg)
            }
            PublishError::UnsupportedSource {
                builder_id,
                files,
                reason,
            } => {
                let files: Vec<String> = files.iter().map(|p| p.display().to_string()).collect();
                write!(
                    f,
                    "Unsupported artifact from '{}' ({}): [{}]",
                    builder_id,
                    reason,
                    files.join(", ")
                )
            }
            PublishError::Io { path, source } => {
                write!(f, "I/O error on {}: {}", path.display(), source)
            }
            PublishError::IncompleteCopy {
                path,
                expected,
                written,
            } => {
                write!(
                    f,
                    "Incomplete copy of {}: expected {} bytes, wrote {}",
                    path.display(),
                    expected,
                    written
                )
            }
            PublishError::Destination(err) => {
                write!(f, "Destination error: {}", err)
            }
            PublishError::Manifest(err) => {
                write!(f, "Manifest error: {}", err)
            }
        }
    }
}

impl std::error::Error for PublishError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PublishError::Io { source, .. } => Some(source),
            PublishError::Destination(err) => Some(err),
            PublishError::Manifest(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DestinationError> for PublishError {
    fn from(err: DestinationError) -> Self {
        PublishError::Destination(err)
    }
}

impl From<boxpub_core_manifest::Error> for PublishError {
    fn from(err: boxpub_core_manifest::Error) -> Self {
        match err {
            // Keep destination failures in one place regardless of who hit them
            boxpub_core_manifest::Error::Destination(inner) => PublishError::Destination(inner),
            other => PublishError::Manifest(other),
        }
    }
}
