//! Error types for the lmdbx client.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while locating the native library or talking to it.
#[derive(Debug, Error)]
pub enum Error {
    /// A required location input is missing or the platform is unsupported.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the problem.
        message: String,
    },

    /// Every candidate artifact failed to load.
    #[error(transparent)]
    LibraryLoad(#[from] LibraryLoadError),

    /// A native call returned a non-zero status.
    #[error("{operation} failed with engine status {code}")]
    Engine {
        /// Name of the native operation.
        operation: &'static str,
        /// Status code returned by the engine, unmodified.
        code: i32,
    },

    /// Operation not permitted in the current session state.
    #[error("invalid state: {message}")]
    InvalidState {
        /// Description of why the operation is invalid.
        message: String,
    },

    /// An argument cannot be passed across the foreign boundary.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the argument problem.
        message: String,
    },
}

impl Error {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an engine error for a failed native call.
    pub fn engine(operation: &'static str, code: i32) -> Self {
        Self::Engine { operation, code }
    }

    /// Creates an invalid state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Returns the engine status code, if this is an engine error.
    #[must_use]
    pub fn engine_code(&self) -> Option<i32> {
        match self {
            Self::Engine { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// One failed attempt to load a candidate artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadAttempt {
    /// The path that was tried.
    pub path: PathBuf,
    /// The loader's error for this path.
    pub error: String,
}

/// Raised when no candidate artifact could be loaded.
///
/// Carries every attempt in the order it was made, since the first
/// failure is often more telling than the last.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct LibraryLoadError {
    /// All attempts, in order.
    pub attempts: Vec<LoadAttempt>,
}

impl LibraryLoadError {
    /// Returns the attempted paths in order.
    pub fn paths(&self) -> impl Iterator<Item = &std::path::Path> {
        self.attempts.iter().map(|a| a.path.as_path())
    }
}

impl fmt::Display for LibraryLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to load lmdbx library. Tried: ")?;
        for (i, attempt) in self.attempts.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", attempt.path.display())?;
        }
        write!(f, ". Errors: ")?;
        for (i, attempt) in self.attempts.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{}: {}", attempt.path.display(), attempt.error)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_error_keeps_code() {
        let err = Error::engine("put", -30799);
        assert_eq!(err.engine_code(), Some(-30799));
        assert_eq!(err.to_string(), "put failed with engine status -30799");
    }

    #[test]
    fn load_error_lists_every_attempt() {
        let err = LibraryLoadError {
            attempts: vec![
                LoadAttempt {
                    path: PathBuf::from("/libs/liblmdbx-x86_64-gnu.so"),
                    error: "version GLIBC_2.34 not found".into(),
                },
                LoadAttempt {
                    path: PathBuf::from("/libs/liblmdbx.so"),
                    error: "no such file".into(),
                },
            ],
        };

        let msg = err.to_string();
        assert!(msg.contains("Tried: /libs/liblmdbx-x86_64-gnu.so, /libs/liblmdbx.so"));
        assert!(msg.contains("/libs/liblmdbx-x86_64-gnu.so: version GLIBC_2.34 not found"));
        assert!(msg.contains("/libs/liblmdbx.so: no such file"));
        assert_eq!(err.paths().count(), 2);
    }

    #[test]
    fn other_errors_have_no_code() {
        assert_eq!(Error::invalid_state("closed").engine_code(), None);
        assert_eq!(Error::configuration("x").engine_code(), None);
    }
}
