//! Command-line argument escaping.
//!
//! Windows hands a child process one command-line string and lets the child
//! split it back into argv. That split treats backslashes specially only when
//! they precede a double quote, or when they end a quoted span. [`escape`]
//! produces a token that survives the split unchanged; [`split`] is the split
//! itself, used on platforms that take argv directly.

use crate::error::{ProcommandError, Result};

/// The token for an empty argument.
const EMPTY_ARGUMENT: &str = "\"\"";

/// Escape one argument so the native command-line parser reconstructs it exactly.
///
/// Strings with no whitespace and no double quote come back unchanged.
///
/// # Errors
///
/// Returns [`ProcommandError::NulCharacter`] if `argument` contains `'\0'`.
pub fn escape(argument: &str) -> Result<String> {
    if argument.is_empty() {
        return Ok(EMPTY_ARGUMENT.to_string());
    }

    if argument.contains('\0') {
        return Err(ProcommandError::NulCharacter { param: "argument" });
    }

    Ok(wrap_whitespace(escape_quotes(argument)))
}

/// Like [`escape`], for a value that may be absent.
///
/// # Errors
///
/// Returns [`ProcommandError::MissingArgument`] for `None`.
pub fn try_escape(argument: Option<&str>) -> Result<String> {
    match argument {
        Some(argument) => escape(argument),
        None => Err(ProcommandError::MissingArgument { param: "argument" }),
    }
}

/// First pass: every run of backslashes followed by a quote has the
/// backslashes doubled and the quote escaped.
fn escape_quotes(argument: &str) -> String {
    let mut escaped = String::with_capacity(argument.len() + 8);
    let mut backslashes = 0usize;

    for c in argument.chars() {
        match c {
            '\\' => backslashes += 1,
            '"' => {
                push_backslashes(&mut escaped, backslashes * 2 + 1);
                escaped.push('"');
                backslashes = 0;
            }
            _ => {
                push_backslashes(&mut escaped, backslashes);
                escaped.push(c);
                backslashes = 0;
            }
        }
    }

    push_backslashes(&mut escaped, backslashes);
    escaped
}

/// Second pass: quote the whole string if it holds whitespace, doubling any
/// trailing backslashes so the closing quote stays unescaped.
fn wrap_whitespace(escaped: String) -> String {
    if !escaped.chars().any(char::is_whitespace) {
        return escaped;
    }

    let body = escaped.trim_end_matches('\\');
    let trailing = escaped.len() - body.len();

    let mut wrapped = String::with_capacity(escaped.len() + trailing + 2);
    wrapped.push('"');
    wrapped.push_str(body);
    push_backslashes(&mut wrapped, trailing * 2);
    wrapped.push('"');
    wrapped
}

fn push_backslashes(target: &mut String, count: usize) {
    target.extend(std::iter::repeat('\\').take(count));
}

/// Split a command-line string into argv using the Windows parsing rules.
///
/// Space and tab separate arguments outside quotes. `2n` backslashes before a
/// quote yield `n` backslashes and toggle quoting; `2n + 1` yield `n`
/// backslashes and a literal quote. Inside quotes `""` is a literal quote.
pub fn split(command_line: &str) -> Vec<String> {
    let mut arguments = Vec::new();
    let mut chars = command_line.chars().peekable();

    loop {
        while matches!(chars.peek(), Some(' ' | '\t')) {
            chars.next();
        }

        if chars.peek().is_none() {
            break;
        }

        let mut current = String::new();
        let mut in_quotes = false;

        while let Some(&c) = chars.peek() {
            match c {
                ' ' | '\t' if !in_quotes => break,
                '\\' => {
                    let mut count = 0usize;
                    while chars.peek() == Some(&'\\') {
                        chars.next();
                        count += 1;
                    }

                    if chars.peek() == Some(&'"') {
                        push_backslashes(&mut current, count / 2);
                        if count % 2 == 1 {
                            current.push('"');
                            chars.next();
                        }
                    } else {
                        push_backslashes(&mut current, count);
                    }
                }
                '"' => {
                    chars.next();
                    if in_quotes && chars.peek() == Some(&'"') {
                        current.push('"');
                        chars.next();
                    } else {
                        in_quotes = !in_quotes;
                    }
                }
                _ => {
                    current.push(c);
                    chars.next();
                }
            }
        }

        arguments.push(current);
    }

    arguments
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Inputs paired with their escaped form.
    const CASES: &[(&str, &str)] = &[
        ("foo", "foo"),
        ("", "\"\""),
        (" ", "\" \""),
        ("          ", "\"          \""),
        ("foo bar", "\"foo bar\""),
        ("'foo bar'", "\"'foo bar'\""),
        ("'foo \" bar'", "\"'foo \\\" bar'\""),
        ("\"foo bar\"", "\"\\\"foo bar\\\"\""),
        ("\"foo bar", "\"\\\"foo bar\""),
        ("'", "'"),
        ("\\", "\\"),
        ("\\\\", "\\\\"),
        ("/", "/"),
        ("//", "//"),
        ("&", "&"),
        ("&&", "&&"),
        ("^", "^"),
        ("^^", "^^"),
        ("-/?=`!@#", "-/?=`!@#"),
        ("*/foo.txt", "*/foo.txt"),
        ("*\\foo.txt", "*\\foo.txt"),
        ("**\\foo.txt", "**\\foo.txt"),
        ("<p>some html</p>", "\"<p>some html</p>\""),
        ("\"", "\\\""),
        ("\"\"", "\\\"\\\""),
        ("\"\"\"", "\\\"\\\"\\\""),
        ("\"\"\"\"", "\\\"\\\"\\\"\\\""),
        ("\"\"\"\"\"", "\\\"\\\"\\\"\\\"\\\""),
        ("\x07", "\x07"),
        ("\x08", "\x08"),
        ("\x0c", "\"\x0c\""),
        ("\n", "\"\n\""),
        ("\t", "\"\t\""),
        ("\r", "\"\r\""),
        ("\r\n", "\"\r\n\""),
        ("\x0b", "\"\x0b\""),
    ];

    #[test]
    fn test_escape_known_cases() {
        for (input, expected) in CASES {
            assert_eq!(&escape(input).unwrap(), expected, "input: {:?}", input);
        }
    }

    #[test]
    fn test_escape_rejects_nul() {
        let err = escape("foo \0 bar").unwrap_err();
        assert!(matches!(
            err,
            ProcommandError::NulCharacter { param: "argument" }
        ));
    }

    #[test]
    fn test_try_escape_rejects_missing() {
        let err = try_escape(None).unwrap_err();
        assert!(matches!(
            err,
            ProcommandError::MissingArgument { param: "argument" }
        ));
        assert_eq!(try_escape(Some("a b")).unwrap(), "\"a b\"");
    }

    #[test]
    fn test_escape_doubles_backslashes_before_quote() {
        assert_eq!(escape("a\\\"b").unwrap(), "a\\\\\\\"b");
        assert_eq!(escape("a\\\\b").unwrap(), "a\\\\b");
    }

    #[test]
    fn test_escape_doubles_trailing_backslashes_when_wrapped() {
        assert_eq!(escape("a b\\").unwrap(), "\"a b\\\\\"");
        assert_eq!(escape("a b\\\\").unwrap(), "\"a b\\\\\\\\\"");
        // Not wrapped, so the tail stays as is.
        assert_eq!(escape("ab\\").unwrap(), "ab\\");
    }

    #[test]
    fn test_escape_identity_without_whitespace_or_quotes() {
        for input in ["plain", "C:\\path\\to\\file", "x=1", "ünïcødé", "--flag"] {
            assert_eq!(escape(input).unwrap(), input);
        }
    }

    #[test]
    fn test_split_round_trips_known_cases() {
        for (input, escaped) in CASES {
            assert_eq!(split(escaped), vec![input.to_string()], "escaped: {:?}", escaped);
        }
    }

    #[test]
    fn test_split_round_trips_tricky_inputs() {
        let inputs = [
            "a b\\",
            "a\\\\ b\\\\",
            "\\\"",
            "tab\there",
            "end\\\\\\",
            "mixed \"quote\" and \\\\\" tail \\",
            "\u{3000}ideographic",
        ];
        for input in inputs {
            let escaped = escape(input).unwrap();
            assert_eq!(split(&escaped), vec![input.to_string()], "input: {:?}", input);
        }
    }

    #[test]
    fn test_split_separates_on_space_and_tab() {
        assert_eq!(split("foo  bar\tbaz"), vec!["foo", "bar", "baz"]);
        assert_eq!(split("  leading and trailing  "), vec!["leading", "and", "trailing"]);
    }

    #[test]
    fn test_split_empty_input() {
        assert!(split("").is_empty());
        assert!(split("   ").is_empty());
    }

    #[test]
    fn test_split_keeps_empty_quoted_argument() {
        assert_eq!(split("foo \"\" bar"), vec!["foo", "", "bar"]);
    }

    #[test]
    fn test_split_double_quote_inside_quotes() {
        assert_eq!(split("\"a\"\"b\""), vec!["a\"b"]);
    }

    #[test]
    fn test_split_literal_backslashes() {
        assert_eq!(split("C:\\dir\\ next"), vec!["C:\\dir\\", "next"]);
    }
}
