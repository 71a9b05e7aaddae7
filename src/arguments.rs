//! Composing escaped command-line strings.

use crate::error::{ProcommandError, Result};
use crate::escape::escape;

/// Builds one escaped command-line string from a list of raw arguments.
///
/// Entries may be absent (`None`); that is only reported when [`build`] runs,
/// so a builder can be filled from optional sources and validated once.
///
/// [`build`]: ArgumentsBuilder::build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentsBuilder {
    arguments: Vec<Option<String>>,
}

impl ArgumentsBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder seeded with the given arguments.
    pub fn with_arguments<I, S>(arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            arguments: arguments.into_iter().map(|a| Some(a.into())).collect(),
        }
    }

    /// Append an argument.
    pub fn arg(mut self, argument: impl Into<String>) -> Self {
        self.push(argument);
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments
            .extend(arguments.into_iter().map(|a| Some(a.into())));
        self
    }

    /// Append an argument in place.
    pub fn push(&mut self, argument: impl Into<String>) {
        self.arguments.push(Some(argument.into()));
    }

    /// Append an argument that may be absent.
    pub fn push_optional<S: Into<String>>(&mut self, argument: Option<S>) {
        self.arguments.push(argument.map(Into::into));
    }

    /// The accumulated arguments, in insertion order.
    pub fn arguments(&self) -> &[Option<String>] {
        &self.arguments
    }

    /// Mutable access to the accumulated arguments.
    pub fn arguments_mut(&mut self) -> &mut Vec<Option<String>> {
        &mut self.arguments
    }

    /// Escape every argument and join them with single spaces.
    ///
    /// # Errors
    ///
    /// - [`ProcommandError::InvalidState`] if any entry is absent.
    /// - [`ProcommandError::NulCharacter`] if any entry contains `'\0'`.
    pub fn build(&self) -> Result<String> {
        let mut command_line = String::new();

        for argument in &self.arguments {
            let argument = argument.as_deref().ok_or_else(|| {
                ProcommandError::InvalidState("an argument cannot be missing".to_string())
            })?;

            if !command_line.is_empty() {
                command_line.push(' ');
            }
            command_line.push_str(&escape(argument)?);
        }

        Ok(command_line)
    }

    /// One-shot form of [`build`](ArgumentsBuilder::build) over a fixed sequence.
    pub fn build_from<I, S>(arguments: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut command_line = String::new();

        for argument in arguments {
            if !command_line.is_empty() {
                command_line.push(' ');
            }
            command_line.push_str(&escape(argument.as_ref())?);
        }

        Ok(command_line)
    }
}

impl<S: Into<String>> FromIterator<S> for ArgumentsBuilder {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::with_arguments(iter)
    }
}
