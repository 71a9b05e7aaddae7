//! Error types for procommand.
//!
//! Only caller mistakes and unexpected I/O surface here. A process that fails
//! to start, times out, or cannot be killed is reported through
//! [`CommandResult`](crate::CommandResult) instead.

use thiserror::Error;

/// Main error type for procommand operations.
#[derive(Error, Debug)]
pub enum ProcommandError {
    /// A required argument was absent.
    #[error("value cannot be missing (parameter '{param}')")]
    MissingArgument { param: &'static str },

    /// The argument holds a NUL character, which no native command line can carry.
    #[error("the null character cannot be passed as a command line argument (parameter '{param}')")]
    NulCharacter { param: &'static str },

    /// An operation was attempted while the receiver holds invalid data.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The command has no file name to execute.
    #[error("the file name on the command must not be empty")]
    EmptyFileName,

    /// I/O error outside the failure modes encoded in a command result.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for procommand operations.
pub type Result<T> = std::result::Result<T, ProcommandError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_argument_display() {
        let err = ProcommandError::MissingArgument { param: "argument" };
        assert!(err.to_string().contains("'argument'"));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_nul_character_display() {
        let err = ProcommandError::NulCharacter { param: "argument" };
        assert!(err
            .to_string()
            .starts_with("the null character cannot be passed as a command line argument"));
        assert!(err.to_string().contains("'argument'"));
    }

    #[test]
    fn test_invalid_state_display() {
        let err = ProcommandError::InvalidState("an argument cannot be missing".into());
        assert_eq!(err.to_string(), "invalid state: an argument cannot be missing");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ProcommandError = io_err.into();
        assert!(matches!(err, ProcommandError::Io(_)));
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_empty_file_name_display() {
        let err = ProcommandError::EmptyFileName;
        assert!(err.to_string().contains("file name"));
    }
}
