//! Execution result types.

use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::output::{CommandOutputLine, CommandOutputLineType};

/// Exit code reported when the process did not exit on its own.
pub const NO_EXIT_CODE: i32 = -1;

/// How one run of a command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandStatus {
    /// The process could not be started.
    FailedToStartCommand,
    /// The process outlived its timeout and was killed.
    Timeout,
    /// The process outlived its timeout and could not be killed.
    FailedToKillAfterTimeout,
    /// The process exited on its own.
    Exited,
}

impl CommandStatus {
    /// Check whether the process ran to completion.
    pub fn is_exited(&self) -> bool {
        matches!(self, CommandStatus::Exited)
    }

    /// Check whether the run carries a failure detail.
    pub fn has_failure(&self) -> bool {
        matches!(
            self,
            CommandStatus::FailedToStartCommand | CommandStatus::FailedToKillAfterTimeout
        )
    }
}

impl std::fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::FailedToStartCommand => "failed to start",
            Self::Timeout => "timed out",
            Self::FailedToKillAfterTimeout => "failed to kill after timeout",
            Self::Exited => "exited",
        };
        f.write_str(text)
    }
}

/// Result of running a command.
#[derive(Debug)]
pub struct CommandResult {
    /// The command that was run.
    pub command: Command,
    /// How the run ended.
    pub status: CommandStatus,
    /// Exit code, or [`NO_EXIT_CODE`] if the process did not exit normally.
    pub exit_code: i32,
    /// Start or kill failure, for the statuses that have one.
    pub failure: Option<std::io::Error>,
    /// Captured lines in arrival order.
    pub lines: Vec<CommandOutputLine>,
}

impl CommandResult {
    /// Create a result for a process that exited.
    pub fn exited(command: Command, exit_code: i32, lines: Vec<CommandOutputLine>) -> Self {
        Self {
            command,
            status: CommandStatus::Exited,
            exit_code,
            failure: None,
            lines,
        }
    }

    /// Create a result for a process that could not be started.
    pub fn failed_to_start(command: Command, failure: std::io::Error) -> Self {
        Self {
            command,
            status: CommandStatus::FailedToStartCommand,
            exit_code: NO_EXIT_CODE,
            failure: Some(failure),
            lines: Vec::new(),
        }
    }

    /// Create a result for a process killed after its timeout.
    pub fn timeout(command: Command, lines: Vec<CommandOutputLine>) -> Self {
        Self {
            command,
            status: CommandStatus::Timeout,
            exit_code: NO_EXIT_CODE,
            failure: None,
            lines,
        }
    }

    /// Create a result for a process that could not be killed after its timeout.
    pub fn failed_to_kill(
        command: Command,
        failure: std::io::Error,
        lines: Vec<CommandOutputLine>,
    ) -> Self {
        Self {
            command,
            status: CommandStatus::FailedToKillAfterTimeout,
            exit_code: NO_EXIT_CODE,
            failure: Some(failure),
            lines,
        }
    }

    /// Check if the command exited with code 0.
    pub fn success(&self) -> bool {
        self.status.is_exited() && self.exit_code == 0
    }

    /// Text lines from one stream, in order, without the end-of-stream marker.
    pub fn lines_of(&self, line_type: CommandOutputLineType) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .filter(move |line| line.line_type == line_type)
            .filter_map(|line| line.value.as_deref())
    }

    /// Standard output, one `\n` after every line.
    pub fn output(&self) -> String {
        self.joined(CommandOutputLineType::StandardOut)
    }

    /// Standard error, one `\n` after every line.
    pub fn error(&self) -> String {
        self.joined(CommandOutputLineType::StandardError)
    }

    fn joined(&self, line_type: CommandOutputLineType) -> String {
        self.lines_of(line_type).fold(String::new(), |mut text, line| {
            text.push_str(line);
            text.push('\n');
            text
        })
    }
}
