//! Custom error types with exit codes

use thiserror::Error;

/// Main error type for sparsefetch operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FetchError {
    /// Configuration Error - missing or invalid input
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Clone Error - the initial clone failed
    #[error("Clone error: {message}")]
    Clone { message: String },

    /// State Error - operation invoked out of lifecycle order
    #[error("State error: {message}")]
    State { message: String },

    /// Path Error - requested path absent upstream or on disk
    #[error("Path error: {message}")]
    Path { message: String },

    /// Git Error - any other git invocation failed
    #[error("Git error: {message}")]
    Git { message: String },

    /// Filesystem Error - file operation failed
    #[error("Filesystem error: {message}")]
    Filesystem { message: String },
}

impl FetchError {
    /// Get the appropriate exit code for this error type
    #[must_use]
    #[inline]
    pub const fn exit_code(&self) -> i32 {
        match *self {
            Self::Configuration { .. } => 1,
            Self::Clone { .. } => 2,
            Self::State { .. } => 3,
            Self::Path { .. } => 4,
            Self::Git { .. } => 5,
            Self::Filesystem { .. } => 6,
        }
    }

    /// Create a configuration error
    #[inline]
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a clone error
    #[inline]
    pub fn clone_failed<S: Into<String>>(message: S) -> Self {
        Self::Clone {
            message: message.into(),
        }
    }

    /// Create a state error
    #[inline]
    pub fn state<S: Into<String>>(message: S) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Create a path error
    #[inline]
    pub fn path<S: Into<String>>(message: S) -> Self {
        Self::Path {
            message: message.into(),
        }
    }

    /// Create a git error
    #[inline]
    pub fn git<S: Into<String>>(message: S) -> Self {
        Self::Git {
            message: message.into(),
        }
    }

    /// Create a filesystem error
    #[inline]
    pub fn filesystem<S: Into<String>>(message: S) -> Self {
        Self::Filesystem {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let errors = [
            FetchError::configuration("a"),
            FetchError::clone_failed("b"),
            FetchError::state("c"),
            FetchError::path("d"),
            FetchError::git("e"),
            FetchError::filesystem("f"),
        ];
        let mut codes: Vec<i32> = errors.iter().map(FetchError::exit_code).collect();
        codes.dedup();
        assert_eq!(codes, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_display_carries_message() {
        let err = FetchError::clone_failed("repository not found");
        assert_eq!(err.to_string(), "Clone error: repository not found");
    }
}
