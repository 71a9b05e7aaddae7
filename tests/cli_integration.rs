//! CLI integration tests for the companion test command.
//!
//! These tests verify the subcommand parsing the runner tests rely on.

use std::ffi::OsString;

use procommand::cli::{parse_args_from, TaggedLine, TestCommand};

fn args(args: &[&str]) -> Vec<OsString> {
    std::iter::once("procommand-test-command")
        .chain(args.iter().copied())
        .map(OsString::from)
        .collect()
}

#[test]
fn test_cli_defaults_to_help() {
    assert_eq!(parse_args_from(args(&[])).unwrap(), TestCommand::Help);
    assert_eq!(parse_args_from(args(&["-h"])).unwrap(), TestCommand::Help);
}

#[test]
fn test_cli_dump_includes_subcommand() {
    let result = parse_args_from(args(&["dump", "--", "x"])).unwrap();
    assert_eq!(
        result,
        TestCommand::Dump {
            arguments: vec!["dump".into(), "--".into(), "x".into()]
        }
    );
}

#[test]
fn test_cli_output_lines() {
    let result = parse_args_from(args(&["output", "o:hello", "e:-world"])).unwrap();
    assert_eq!(
        result,
        TestCommand::Output(vec![
            TaggedLine::Out("hello".into()),
            TaggedLine::Err("-world".into()),
        ])
    );
}

#[test]
fn test_cli_invalid_wait() {
    assert!(parse_args_from(args(&["wait", "soon"])).is_err());
    assert!(parse_args_from(args(&["wait"])).is_err());
}

#[test]
fn test_cli_rejects_leading_option() {
    assert!(parse_args_from(args(&["--frobnicate"])).is_err());
}
