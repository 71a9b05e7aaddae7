//! Command execution engine.
//!
//! A run spawns the process with all three standard streams piped, starts one
//! task per output stream, copies any input, then waits for exit up to the
//! command's timeout:
//!
//! ```text
//! spawn ──fails──> FailedToStartCommand
//!   │
//!   └─> running ──exits──> Exited
//!         │
//!         └─timeout─> kill ──ok──> Timeout
//!                       └──fails──> FailedToKillAfterTimeout
//! ```
//!
//! Both reader tasks push into one unbounded channel, so neither ever waits
//! on the other. Lines keep their order within a stream; across streams the
//! order is whatever order they arrived in.
//!
//! Readers are joined for at most the time left before the deadline (or the
//! drain grace, if longer), even after a normal exit: a descendant that
//! inherited the pipes must not hold the run open.

use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use futures_util::future::join_all;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command as ProcessCommand};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, trace, warn};

use crate::command::{Command, CommandInput};
use crate::config::Config;
use crate::error::Result;
use crate::output::{decode_line, CommandOutputLine, CommandOutputLineType};
use crate::result::{CommandResult, NO_EXIT_CODE};

/// Default time readers may keep draining after a timed-out process is killed.
pub const DEFAULT_KILL_DRAIN_GRACE: Duration = Duration::from_millis(250);

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Runs commands and captures their output.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    kill_drain_grace: Duration,
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner {
    /// Create a runner with default settings.
    pub fn new() -> Self {
        Self {
            kill_drain_grace: DEFAULT_KILL_DRAIN_GRACE,
        }
    }

    /// Create a runner from loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            kill_drain_grace: config.runner.kill_drain_grace(),
        }
    }

    /// Set how long readers may drain after a timed-out process is killed.
    ///
    /// End-of-stream markers that arrive within this window are kept.
    pub fn kill_drain_grace(mut self, grace: Duration) -> Self {
        self.kill_drain_grace = grace;
        self
    }

    /// Run a command to completion, timeout, or failure.
    ///
    /// Start failures, timeouts and kill failures are reported through
    /// [`CommandResult::status`], not as errors.
    ///
    /// # Errors
    ///
    /// - [`ProcommandError::EmptyFileName`](crate::ProcommandError::EmptyFileName)
    ///   if the command has no file name.
    /// - [`ProcommandError::Io`](crate::ProcommandError::Io) if waiting on the
    ///   process fails.
    pub async fn run(&self, mut command: Command) -> Result<CommandResult> {
        command.validate()?;

        debug!(
            file_name = command.file_name(),
            arguments = command.arguments(),
            working_directory = %command.get_working_directory().display(),
            "starting process"
        );

        let mut child = match build_process(&command).spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(command = %command, error = %e, "failed to start process");
                return Ok(CommandResult::failed_to_start(command, e));
            }
        };
        let deadline = deadline_after(command.get_timeout());

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(tokio::spawn(read_lines(
                stdout,
                CommandOutputLineType::StandardOut,
                tx.clone(),
            )));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(tokio::spawn(read_lines(
                stderr,
                CommandOutputLineType::StandardError,
                tx.clone(),
            )));
        }
        drop(tx);

        // Without input the child's stdin stays open until the run ends.
        let stdin = child.stdin.take();
        let _open_stdin = match command.take_input() {
            Some(input) => {
                if tokio::time::timeout_at(deadline, write_input(input, stdin))
                    .await
                    .is_err()
                {
                    debug!("input not fully copied before the timeout");
                }
                None
            }
            None => stdin,
        };

        let result = match wait_for_exit(&mut child, deadline).await? {
            Some(status) => {
                self.drain_after_exit(&mut readers, deadline).await;
                let exit_code = status.code().unwrap_or(NO_EXIT_CODE);
                debug!(command = %command, exit_code, "process exited");
                CommandResult::exited(command, exit_code, collect_lines(&mut rx))
            }
            None => {
                let kill = child.start_kill();
                self.finish_timed_out(command, &mut child, kill, &mut readers, &mut rx)
                    .await
            }
        };

        Ok(result)
    }

    /// Blocking form of [`run`](CommandRunner::run) for callers without a runtime.
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous execution context.
    pub fn run_blocking(&self, command: Command) -> Result<CommandResult> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.run(command))
    }

    /// Resolve a timed-out run given the outcome of the kill request.
    async fn finish_timed_out(
        &self,
        command: Command,
        child: &mut Child,
        kill: io::Result<()>,
        readers: &mut [JoinHandle<()>],
        rx: &mut mpsc::UnboundedReceiver<CommandOutputLine>,
    ) -> CommandResult {
        match kill {
            Ok(()) => {
                info!(
                    command = %command,
                    timeout_ms = command.get_timeout().as_millis() as u64,
                    "process timed out and was killed"
                );
                if let Err(e) = child.wait().await {
                    debug!(error = %e, "failed to reap killed process");
                }
                if !drain_until(readers, deadline_after(self.kill_drain_grace)).await {
                    debug!("output streams still open after kill; abandoning readers");
                }
                CommandResult::timeout(command, collect_lines(rx))
            }
            Err(e) => {
                error!(command = %command, error = %e, "failed to kill process after timeout");
                abort_readers(readers);
                let lines = collect_lines(rx);
                CommandResult::failed_to_kill(command, e, lines)
            }
        }
    }

    /// Join the readers after a normal exit. Descendants may still hold the
    /// pipes open, so the join ends at the run's deadline or after the drain
    /// grace, whichever is later.
    async fn drain_after_exit(&self, readers: &mut [JoinHandle<()>], deadline: Instant) {
        let until = deadline.max(deadline_after(self.kill_drain_grace));
        if !drain_until(readers, until).await {
            debug!("output streams held open after exit; abandoning readers");
        }
    }
}

fn build_process(command: &Command) -> ProcessCommand {
    let mut process = ProcessCommand::new(command.file_name());
    apply_arguments(&mut process, command.arguments());
    process
        .current_dir(command.get_working_directory())
        .envs(command.environment())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    process
}

#[cfg(windows)]
fn apply_arguments(process: &mut ProcessCommand, arguments: &str) {
    if !arguments.is_empty() {
        process.raw_arg(arguments);
    }
    process.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(windows))]
fn apply_arguments(process: &mut ProcessCommand, arguments: &str) {
    process.args(crate::escape::split(arguments));
}

fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout)
        .unwrap_or_else(|| now + Duration::from_secs(60 * 60 * 24 * 365))
}

/// Wait until `deadline` for the child to exit. A deadline already passed is
/// a single non-blocking poll.
async fn wait_for_exit(child: &mut Child, deadline: Instant) -> Result<Option<ExitStatus>> {
    if deadline <= Instant::now() {
        return Ok(child.try_wait()?);
    }

    match tokio::time::timeout_at(deadline, child.wait()).await {
        Ok(status) => Ok(Some(status?)),
        Err(_elapsed) => Ok(None),
    }
}

async fn write_input(mut input: CommandInput, stdin: Option<ChildStdin>) {
    let Some(mut stdin) = stdin else {
        return;
    };

    match tokio::io::copy(&mut input, &mut stdin).await {
        Ok(bytes) => trace!(bytes, "copied input"),
        Err(e) => debug!(error = %e, "input copy stopped early"),
    }

    if let Err(e) = stdin.shutdown().await {
        debug!(error = %e, "failed to close stdin");
    }
}

async fn read_lines<R>(
    stream: R,
    line_type: CommandOutputLineType,
    tx: mpsc::UnboundedSender<CommandOutputLine>,
) where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let value = decode_line(&buf);
                trace!(stream = %line_type, line = %value, "captured line");
                if tx.send(CommandOutputLine::new(line_type, value)).is_err() {
                    return;
                }
            }
            Err(e) => {
                warn!(stream = %line_type, error = %e, "output read failed");
                break;
            }
        }
    }

    let _ = tx.send(CommandOutputLine::end_of_stream(line_type));
}

async fn join_readers(readers: &mut [JoinHandle<()>]) {
    for joined in join_all(readers.iter_mut()).await {
        if let Err(e) = joined {
            if !e.is_cancelled() {
                error!(error = %e, "output reader task failed");
            }
        }
    }
}

/// Join the readers until `until`, then abort any still running. Returns
/// whether every reader finished.
async fn drain_until(readers: &mut [JoinHandle<()>], until: Instant) -> bool {
    let finished = tokio::time::timeout_at(until, join_readers(readers))
        .await
        .is_ok();
    abort_readers(readers);
    finished
}

fn abort_readers(readers: &[JoinHandle<()>]) {
    for reader in readers {
        reader.abort();
    }
}

fn collect_lines(rx: &mut mpsc::UnboundedReceiver<CommandOutputLine>) -> Vec<CommandOutputLine> {
    let mut lines = Vec::new();
    while let Ok(line) = rx.try_recv() {
        lines.push(line);
    }
    lines
}
