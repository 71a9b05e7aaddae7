//! Description of a process to run.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::AsyncRead;

use crate::arguments::ArgumentsBuilder;
use crate::error::{ProcommandError, Result};

/// Default execution timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Byte stream copied to the child's standard input.
pub type CommandInput = Box<dyn AsyncRead + Send + Unpin>;

/// A process to run: executable, escaped arguments, and execution settings.
///
/// The working directory is captured when the command is created, so running
/// it never consults the process-wide current directory.
pub struct Command {
    file_name: String,
    arguments: String,
    working_directory: PathBuf,
    environment: HashMap<String, String>,
    timeout: Duration,
    input: Option<CommandInput>,
}

impl Command {
    /// Create a command with no arguments.
    ///
    /// # Errors
    ///
    /// - [`ProcommandError::EmptyFileName`] if `file_name` is empty.
    /// - [`ProcommandError::Io`] if the current directory cannot be read.
    pub fn new(file_name: impl Into<String>) -> Result<Self> {
        Self::with_arguments(file_name, "")
    }

    /// Create a command from an already escaped argument string.
    pub fn with_arguments(file_name: impl Into<String>, arguments: impl Into<String>) -> Result<Self> {
        let file_name = file_name.into();
        if file_name.is_empty() {
            return Err(ProcommandError::EmptyFileName);
        }

        Ok(Self {
            file_name,
            arguments: arguments.into(),
            working_directory: std::env::current_dir()?,
            environment: HashMap::new(),
            timeout: DEFAULT_TIMEOUT,
            input: None,
        })
    }

    /// Create a command from raw arguments, escaping each one.
    pub fn with_args<I, S>(file_name: impl Into<String>, arguments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let arguments = ArgumentsBuilder::build_from(arguments)?;
        Self::with_arguments(file_name, arguments)
    }

    /// Set the working directory.
    pub fn working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = dir.into();
        self
    }

    /// Add or override an environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    /// Add or override multiple environment variables.
    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in vars {
            self.environment.insert(k.into(), v.into());
        }
        self
    }

    /// Set the execution timeout.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = duration;
        self
    }

    /// Set a stream to copy into the child's standard input.
    pub fn input(mut self, input: impl AsyncRead + Send + Unpin + 'static) -> Self {
        self.input = Some(Box::new(input));
        self
    }

    /// Set bytes to copy into the child's standard input.
    pub fn input_bytes(self, bytes: impl Into<Vec<u8>>) -> Self {
        self.input(std::io::Cursor::new(bytes.into()))
    }

    /// The executable path or name.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// The escaped argument string.
    pub fn arguments(&self) -> &str {
        &self.arguments
    }

    /// The working directory for the child.
    pub fn get_working_directory(&self) -> &Path {
        &self.working_directory
    }

    /// Environment overrides applied on top of the inherited environment.
    pub fn environment(&self) -> &HashMap<String, String> {
        &self.environment
    }

    /// Maximum time to wait for the child to exit.
    pub fn get_timeout(&self) -> Duration {
        self.timeout
    }

    /// Check whether an input stream is attached.
    pub fn has_input(&self) -> bool {
        self.input.is_some()
    }

    pub(crate) fn take_input(&mut self) -> Option<CommandInput> {
        self.input.take()
    }

    /// Check the command can be run.
    pub fn validate(&self) -> Result<()> {
        if self.file_name.is_empty() {
            return Err(ProcommandError::EmptyFileName);
        }
        Ok(())
    }

    /// The file name followed by the argument string, if any.
    pub fn display_string(&self) -> String {
        if self.arguments.is_empty() {
            self.file_name.clone()
        } else {
            format!("{} {}", self.file_name, self.arguments)
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_string())
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("file_name", &self.file_name)
            .field("arguments", &self.arguments)
            .field("working_directory", &self.working_directory)
            .field("environment", &self.environment)
            .field("timeout", &self.timeout)
            .field("input", &self.input.as_ref().map(|_| "<stream>"))
            .finish()
    }
}
