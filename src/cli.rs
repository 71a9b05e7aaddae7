//! Command-line interface for `procommand-test-command`.
//!
//! The test command is a small, predictable child process for exercising the
//! runner: it reports the argv, environment and directory it received, echoes
//! stdin, emits tagged lines to either stream, sleeps, and exits with any
//! code. Uses lexopt for minimal binary size overhead.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

/// Pause after each tagged line so the two streams interleave observably.
const OUTPUT_LINE_DELAY: Duration = Duration::from_millis(5);

/// A parsed test command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestCommand {
    /// Print usage.
    Help,
    /// Print argv, environment and current directory as JSON.
    Dump {
        /// Every argument after the program name, the subcommand included.
        arguments: Vec<String>,
    },
    /// Copy stdin to stdout.
    Echo,
    /// Exit with the given code.
    ExitCode(i32),
    /// Write each line to the tagged stream.
    Output(Vec<TaggedLine>),
    /// Copy a file to stdout.
    ReadFile(PathBuf),
    /// Announce, sleep for the given milliseconds, then announce again.
    Wait(u64),
    /// Run a fixed question-and-answer sequence over stdin/stdout.
    Interactive,
}

/// A line destined for one of the output streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaggedLine {
    /// `o:` prefix.
    Out(String),
    /// `e:` prefix.
    Err(String),
}

impl TaggedLine {
    /// Parse an `o:`/`e:` tagged value. Anything else is skipped.
    pub fn parse(tagged: &str) -> Option<Self> {
        if let Some(value) = tagged.strip_prefix("o:") {
            Some(Self::Out(value.to_string()))
        } else {
            tagged
                .strip_prefix("e:")
                .map(|value| Self::Err(value.to_string()))
        }
    }
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<TestCommand, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
///
/// Only the subcommand goes through option parsing. Everything after it is
/// taken verbatim, so values such as `-/?` or the empty string survive.
pub fn parse_args_from<I>(args: I) -> Result<TestCommand, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let args: Vec<OsString> = args.into_iter().collect();
    let arguments: Vec<String> = args
        .iter()
        .skip(1)
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();

    let mut parser = lexopt::Parser::from_iter(args);
    let subcommand = match parser.next()? {
        None | Some(Short('h') | Long("help")) => return Ok(TestCommand::Help),
        Some(Value(value)) => value.string()?,
        Some(arg) => return Err(arg.unexpected().into()),
    };

    let rest: Vec<String> = parser
        .raw_args()?
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();

    match subcommand.as_str() {
        "dump" => Ok(TestCommand::Dump { arguments }),
        "echo" => Ok(TestCommand::Echo),
        "exit-code" => Ok(TestCommand::ExitCode(parse_single(&rest, "value")?)),
        "output" => Ok(TestCommand::Output(
            rest.iter().map(String::as_str).filter_map(TaggedLine::parse).collect(),
        )),
        "read-file" => Ok(TestCommand::ReadFile(PathBuf::from(single(&rest, "path")?))),
        "wait" => Ok(TestCommand::Wait(parse_single(&rest, "duration")?)),
        "interactive" => Ok(TestCommand::Interactive),
        other => Err(ArgsError::UnknownSubcommand(other.to_string())),
    }
}

fn single<'a>(rest: &'a [String], name: &'static str) -> Result<&'a str, ArgsError> {
    rest.first()
        .map(String::as_str)
        .ok_or(ArgsError::MissingValue(name))
}

fn parse_single<T: std::str::FromStr>(rest: &[String], name: &'static str) -> Result<T, ArgsError> {
    let value = single(rest, name)?;
    value
        .parse()
        .map_err(|_| ArgsError::InvalidValue(name, value.to_string()))
}

/// Run a test command against the given streams, returning the exit code.
pub fn execute<R, O, E>(command: &TestCommand, stdin: R, stdout: &mut O, stderr: &mut E) -> io::Result<i32>
where
    R: BufRead,
    O: Write,
    E: Write,
{
    match command {
        TestCommand::Help => {
            stdout.write_all(usage().as_bytes())?;
        }
        TestCommand::Dump { arguments } => {
            let environment: BTreeMap<String, String> = std::env::vars_os()
                .map(|(k, v)| (k.to_string_lossy().into_owned(), v.to_string_lossy().into_owned()))
                .collect();
            let dump = serde_json::json!({
                "arguments": arguments,
                "environment": environment,
                "current_directory": std::env::current_dir()?.display().to_string(),
            });
            let text = serde_json::to_string_pretty(&dump).map_err(io::Error::other)?;
            writeln!(stdout, "{}", text)?;
        }
        TestCommand::Echo => {
            let mut stdin = stdin;
            io::copy(&mut stdin, stdout)?;
        }
        TestCommand::ExitCode(code) => return Ok(*code),
        TestCommand::Output(lines) => {
            for line in lines {
                match line {
                    TaggedLine::Out(value) => {
                        writeln!(stdout, "{}", value)?;
                        stdout.flush()?;
                    }
                    TaggedLine::Err(value) => {
                        writeln!(stderr, "{}", value)?;
                        stderr.flush()?;
                    }
                }
                std::thread::sleep(OUTPUT_LINE_DELAY);
            }
        }
        TestCommand::ReadFile(path) => {
            let mut file = std::fs::File::open(path)?;
            io::copy(&mut file, stdout)?;
        }
        TestCommand::Wait(milliseconds) => {
            writeln!(stdout, "About to sleep {} milliseconds.", milliseconds)?;
            stdout.flush()?;
            std::thread::sleep(Duration::from_millis(*milliseconds));
            writeln!(stdout, "Done sleeping.")?;
        }
        TestCommand::Interactive => return interactive(stdin, stdout),
    }

    stdout.flush()?;
    Ok(0)
}

fn interactive<R: BufRead, O: Write>(mut stdin: R, stdout: &mut O) -> io::Result<i32> {
    writeln!(stdout, "Welcome to a silly interactive thing.")?;
    write!(stdout, "Would you like to quit right now? (Y/N) ")?;
    stdout.flush()?;

    match read_answer(&mut stdin)?.to_uppercase().as_str() {
        "Y" => {
            writeln!(stdout, "Okay. We'll just quit right now.")?;
            stdout.flush()?;
            return Ok(1);
        }
        "N" => writeln!(stdout, "Great! Let's continue.")?,
        _ => {
            writeln!(stdout, "Invalid input. We will quit.")?;
            stdout.flush()?;
            return Ok(1);
        }
    }

    writeln!(stdout, "What is your name?")?;
    stdout.flush()?;
    let name = read_answer(&mut stdin)?;
    writeln!(stdout, "Hello, {}! How is your day?", name)?;
    stdout.flush()?;
    let day = read_answer(&mut stdin)?;
    writeln!(stdout, "Your day is {}? I hope that's a good thing...", day)?;
    stdout.flush()?;

    Ok(0)
}

/// Read one line, trimmed. End of input reads as an empty answer.
fn read_answer<R: BufRead>(stdin: &mut R) -> io::Result<String> {
    let mut line = String::new();
    stdin.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Usage text.
pub fn usage() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!(
        r#"procommand-test-command {version}
An application to help testing procommand.

USAGE:
    procommand-test-command <SUBCOMMAND> [ARGS...]

SUBCOMMANDS:
    dump                 Dump arguments, environment and directory as JSON
    echo                 Write STDIN to STDOUT
    exit-code <VALUE>    Exit with an arbitrary code
    interactive          Run an interactive question-and-answer session
    output <LINES...>    Write lines to STDOUT ('o:' prefix) or STDERR ('e:' prefix)
    read-file <PATH>     Write out the contents of a file
    wait <MILLISECONDS>  Wait before exiting
"#
    )
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// The subcommand is not known.
    UnknownSubcommand(String),
    /// A required positional value is missing.
    MissingValue(&'static str),
    /// Invalid argument value.
    InvalidValue(&'static str, String),
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::UnknownSubcommand(name) => write!(f, "unknown subcommand: '{}'", name),
            Self::MissingValue(name) => write!(f, "missing value for <{}>", name),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for <{}>: '{}'", name, value)
            }
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<lexopt::Error> for ArgsError {
    fn from(e: lexopt::Error) -> Self {
        Self::Lexopt(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(args: &[&str]) -> Vec<OsString> {
        std::iter::once("procommand-test-command")
            .chain(args.iter().copied())
            .map(OsString::from)
            .collect()
    }

    fn run(command: &TestCommand, stdin: &str) -> (i32, String, String) {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let code = execute(command, stdin.as_bytes(), &mut stdout, &mut stderr).unwrap();
        (
            code,
            String::from_utf8(stdout).unwrap(),
            String::from_utf8(stderr).unwrap(),
        )
    }

    #[test]
    fn test_no_subcommand_is_help() {
        assert_eq!(parse_args_from(args(&[])).unwrap(), TestCommand::Help);
        assert_eq!(parse_args_from(args(&["--help"])).unwrap(), TestCommand::Help);
    }

    #[test]
    fn test_dump_keeps_raw_arguments() {
        let result = parse_args_from(args(&["dump", "", "-/?=`!@#", "--flag", "a b"])).unwrap();
        assert_eq!(
            result,
            TestCommand::Dump {
                arguments: vec![
                    "dump".to_string(),
                    String::new(),
                    "-/?=`!@#".to_string(),
                    "--flag".to_string(),
                    "a b".to_string(),
                ]
            }
        );
    }

    #[test]
    fn test_exit_code() {
        assert_eq!(
            parse_args_from(args(&["exit-code", "42"])).unwrap(),
            TestCommand::ExitCode(42)
        );
        assert_eq!(
            parse_args_from(args(&["exit-code", "-3"])).unwrap(),
            TestCommand::ExitCode(-3)
        );
        assert!(parse_args_from(args(&["exit-code", "lots"])).is_err());
        assert!(parse_args_from(args(&["exit-code"])).is_err());
    }

    #[test]
    fn test_output_skips_untagged() {
        let result = parse_args_from(args(&["output", "o:a", "x", "e:b", "q:c", "o:"])).unwrap();
        assert_eq!(
            result,
            TestCommand::Output(vec![
                TaggedLine::Out("a".to_string()),
                TaggedLine::Err("b".to_string()),
                TaggedLine::Out(String::new()),
            ])
        );
    }

    #[test]
    fn test_wait_and_read_file() {
        assert_eq!(
            parse_args_from(args(&["wait", "100"])).unwrap(),
            TestCommand::Wait(100)
        );
        assert_eq!(
            parse_args_from(args(&["read-file", "file.txt"])).unwrap(),
            TestCommand::ReadFile(PathBuf::from("file.txt"))
        );
    }

    #[test]
    fn test_unknown_subcommand() {
        let err = parse_args_from(args(&["frobnicate"])).unwrap_err();
        assert!(err.to_string().contains("frobnicate"));
    }

    #[test]
    fn test_execute_echo() {
        let (code, out, err) = run(&TestCommand::Echo, "Foo\nBar\n");
        assert_eq!(code, 0);
        assert_eq!(out, "Foo\nBar\n");
        assert!(err.is_empty());
    }

    #[test]
    fn test_execute_output_routes_streams() {
        let command = TestCommand::Output(vec![
            TaggedLine::Out("one".to_string()),
            TaggedLine::Err("two".to_string()),
            TaggedLine::Out("three".to_string()),
        ]);
        let (code, out, err) = run(&command, "");
        assert_eq!(code, 0);
        assert_eq!(out, "one\nthree\n");
        assert_eq!(err, "two\n");
    }

    #[test]
    fn test_execute_exit_code() {
        let (code, out, _) = run(&TestCommand::ExitCode(7), "");
        assert_eq!(code, 7);
        assert!(out.is_empty());
    }

    #[test]
    fn test_execute_wait() {
        let (_, out, _) = run(&TestCommand::Wait(1), "");
        assert_eq!(out, "About to sleep 1 milliseconds.\nDone sleeping.\n");
    }

    #[test]
    fn test_execute_dump_is_json() {
        let command = TestCommand::Dump {
            arguments: vec!["dump".to_string(), "x y".to_string()],
        };
        let (_, out, _) = run(&command, "");
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["arguments"][1], "x y");
        assert!(value["environment"].is_object());
        assert!(value["current_directory"].is_string());
    }

    #[test]
    fn test_interactive_full_session() {
        let (code, out, _) = run(&TestCommand::Interactive, "n\nJoel\ngreat\n");
        assert_eq!(code, 0);
        assert_eq!(
            out,
            "Welcome to a silly interactive thing.\n\
             Would you like to quit right now? (Y/N) Great! Let's continue.\n\
             What is your name?\n\
             Hello, Joel! How is your day?\n\
             Your day is great? I hope that's a good thing...\n"
        );
    }

    #[test]
    fn test_interactive_quit_and_invalid() {
        let (code, out, _) = run(&TestCommand::Interactive, "Y\n");
        assert_eq!(code, 1);
        assert!(out.ends_with("Okay. We'll just quit right now.\n"));

        let (code, out, _) = run(&TestCommand::Interactive, "");
        assert_eq!(code, 1);
        assert!(out.ends_with("Invalid input. We will quit.\n"));
    }
}
