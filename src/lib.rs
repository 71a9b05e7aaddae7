//! # procommand
//!
//! Run external processes with three guarantees the standard process APIs
//! leave to the caller:
//!
//! - **Exact arguments**: a list of argument strings is escaped so the
//!   child's command-line parser rebuilds it unchanged, including empty
//!   strings, embedded quotes and trailing backslashes.
//! - **Concurrent capture**: stdout and stderr are drained at the same time,
//!   line by line, so the child never blocks on a full pipe.
//! - **Bounded execution**: a timeout kills the child, and the result says
//!   whether it exited, timed out, failed to start, or could not be killed.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use procommand::{Command, CommandRunner, CommandStatus};
//!
//! #[tokio::main]
//! async fn main() -> procommand::Result<()> {
//!     procommand::logging::try_init().ok();
//!
//!     let command = Command::with_args("git", ["log", "--format=%an: %s", "-n", "5"])?
//!         .timeout(Duration::from_secs(10));
//!
//!     let result = CommandRunner::new().run(command).await?;
//!     match result.status {
//!         CommandStatus::Exited => print!("{}", result.output()),
//!         status => eprintln!("git {}: {:?}", status, result.failure),
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod arguments;
pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod escape;
pub mod logging;
pub mod output;
pub mod result;
pub mod runner;

// Re-export commonly used types
pub use arguments::ArgumentsBuilder;
pub use command::{Command, CommandInput, DEFAULT_TIMEOUT};
pub use config::Config;
pub use error::{ProcommandError, Result};
pub use escape::escape;
pub use output::{CommandOutputLine, CommandOutputLineType};
pub use result::{CommandResult, CommandStatus, NO_EXIT_CODE};
pub use runner::CommandRunner;
