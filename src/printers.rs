use std::{
    fmt::{self, Display, Write as _},
    io,
};

use indent_write::fmt::IndentWriter;
use joinery::JoinableIterator;
use lazy_format::lazy_format;

use crate::{
    errors::{Error, Failure},
    symbol::Tag,
};

impl Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.as_slice() {
            [] => write!(f, "`{}` failed", self.command),
            [error] => write!(f, "`{}`: {error}", self.command),
            errors => {
                writeln!(f, "`{}` failed with {} errors:", self.command, errors.len())?;

                let lines = errors.iter().map(|error| lazy_format!("- {error}"));
                write!(IndentWriter::new("  ", f), "{}", lines.join_with('\n'))
            }
        }
    }
}

/// A hint that points at the help tag, if there is one
fn help_hint<'a>(command: &'a str, tag: Option<&'a Tag>) -> impl Display + 'a {
    lazy_format!(match (tag) {
        None => "",
        Some(tag) => "\n\nFor usage, try `{command} {tag}`",
    })
}

/// Print a failure report, as shown to the user
pub fn print_failure(
    out: &mut (impl io::Write + ?Sized),
    failure: &Failure,
    help_tag: Option<&Tag>,
) -> io::Result<()> {
    writeln!(
        out,
        "error: {failure}{hint}",
        hint = help_hint(failure.command(), help_tag)
    )
}

/// Print a report of an unexpected internal error
pub fn print_internal(
    out: &mut (impl io::Write + ?Sized),
    command: &str,
    message: &str,
) -> io::Result<()> {
    writeln!(out, "internal error while running `{command}`: {message}")
}

/// Print the error a handler returned
pub fn print_handler_error(out: &mut (impl io::Write + ?Sized), message: &str) -> io::Result<()> {
    writeln!(out, "error: {message}")
}

/// One error per line, for logging
pub(crate) fn error_lines(errors: &[Error]) -> impl Display + '_ {
    errors.iter().join_with("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        errors::{ArityViolation, ParseError},
        symbol::Symbol,
    };

    fn user_missing() -> Error {
        Error::Parse(ParseError::Arity {
            symbol: Symbol::option::<String>("user").long("user").short('u').label(),
            violation: ArityViolation::MinimumNotMet { min: 1, found: 0 },
        })
    }

    #[test]
    fn single_error() {
        let failure = Failure::new("app connect", vec![user_missing()]);
        assert_eq!(
            failure.to_string(),
            "`app connect`: --user/-u: expected at least 1 value(s), got 0"
        );
    }

    #[test]
    fn several_errors() {
        let failure = Failure::new(
            "app connect",
            vec![
                user_missing(),
                Error::Parse(ParseError::UnmatchedArgument {
                    token: "extra".into(),
                    position: 4,
                }),
            ],
        );

        assert_eq!(
            failure.to_string(),
            "\
`app connect` failed with 2 errors:
  - --user/-u: expected at least 1 value(s), got 0
  - unrecognized argument \"extra\""
        );
    }

    #[test]
    fn report_with_hint() {
        let failure = Failure::new("app", vec![user_missing()]);
        let mut out = Vec::new();

        print_failure(&mut out, &failure, Some(&Tag::Long("help".into()))).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "error: `app`: --user/-u: expected at least 1 value(s), got 0\n\nFor usage, try `app --help`\n"
        );
    }
}
