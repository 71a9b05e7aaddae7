//! Captured output lines.

use serde::{Deserialize, Serialize};

/// The stream a captured line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandOutputLineType {
    /// Standard output.
    StandardOut,
    /// Standard error.
    StandardError,
}

impl std::fmt::Display for CommandOutputLineType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StandardOut => write!(f, "stdout"),
            Self::StandardError => write!(f, "stderr"),
        }
    }
}

/// One line of captured output.
///
/// A line with no value is the end-of-stream marker for its stream. Each
/// stream that is read to completion contributes exactly one marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommandOutputLine {
    /// Originating stream.
    pub line_type: CommandOutputLineType,
    /// Line text without its terminator, or `None` at end of stream.
    pub value: Option<String>,
}

impl CommandOutputLine {
    /// Create a line carrying text.
    pub fn new(line_type: CommandOutputLineType, value: impl Into<String>) -> Self {
        Self {
            line_type,
            value: Some(value.into()),
        }
    }

    /// Create the end-of-stream marker for a stream.
    pub fn end_of_stream(line_type: CommandOutputLineType) -> Self {
        Self {
            line_type,
            value: None,
        }
    }

    /// Shorthand for a standard output line.
    pub fn stdout(value: impl Into<String>) -> Self {
        Self::new(CommandOutputLineType::StandardOut, value)
    }

    /// Shorthand for a standard error line.
    pub fn stderr(value: impl Into<String>) -> Self {
        Self::new(CommandOutputLineType::StandardError, value)
    }

    /// Check whether this is an end-of-stream marker.
    pub fn is_end_of_stream(&self) -> bool {
        self.value.is_none()
    }
}

/// Decode one raw line, dropping the `\n` or `\r\n` terminator.
pub(crate) fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}
