//! `procommand-test-command` entry point.
//!
//! A predictable child process for the procommand test suite. It never
//! installs a log subscriber: its stderr is part of the data under test.

use std::io;

use procommand::cli;

fn main() {
    let command = match cli::parse_args() {
        Ok(command) => command,
        Err(e) => {
            eprintln!("error: {}", e);
            eprint!("{}", cli::usage());
            std::process::exit(2);
        }
    };

    let stdin = io::stdin();
    let code = match cli::execute(&command, stdin.lock(), &mut io::stdout(), &mut io::stderr()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            1
        }
    };

    std::process::exit(code);
}
