use std::io;

use thiserror::Error;

use crate::symbol::{Arity, SymbolLabel, Tag};

/**
A problem with the declared commands, symbols, or handlers. These are
detected once, when the command line is built, rather than on every
invocation.
*/
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("`{parent}` has more than one subcommand named {name:?}")]
    DuplicateCommand { parent: String, name: String },

    #[error("`{command}`: {tag} is used by both {first:?} and {second:?}")]
    DuplicateTag {
        command: String,
        tag: Tag,
        first: String,
        second: String,
    },

    #[error("`{command}`: {binding:?} is declared more than once")]
    DuplicateBinding { command: String, binding: String },

    #[error("`{command}`: {binding:?} has an empty tag")]
    EmptyTag { command: String, binding: String },

    #[error("`{command}`: {binding:?} has an invalid arity ({arity})")]
    InvalidArity {
        command: String,
        binding: String,
        arity: Arity,
    },

    #[error("`{command}`: no converter is registered for {type_name} (used by {binding:?})")]
    MissingConverter {
        command: String,
        binding: String,
        type_name: &'static str,
    },

    #[error("`{command}`: no handler is registered for {type_name}")]
    MissingHandler {
        command: String,
        type_name: &'static str,
    },

    #[error("`{command}`: invalid route pattern {pattern:?}")]
    RoutePattern {
        command: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A problem with the raw shape of the arguments: response files and
/// directives.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SyntaxError {
    #[error("couldn't read response file {name:?}: {source}")]
    Resource {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("{resource}:{line}:{column}: unterminated {quote} quote")]
    UnterminatedQuote {
        resource: String,
        line: usize,
        column: usize,
        quote: char,
    },

    #[error("{resource}:{line}:{column}: `{terminator}` can't appear in a response file")]
    TerminatorInResponseFile {
        resource: String,
        line: usize,
        column: usize,
        terminator: String,
    },

    #[error("response file {resource:?} is nested more than {max_depth} levels deep")]
    DepthExceeded { resource: String, max_depth: usize },

    #[error("unknown directive [{name}]")]
    UnknownDirective { name: String },
}

/// The arguments didn't lead to a command that can be invoked.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum ResolutionError {
    #[error("`{command}` requires a subcommand ({})", .available.join(", "))]
    MissingSubcommand {
        command: String,
        available: Vec<String>,
    },

    #[error("`{command}` has no subcommand {unexpected:?}")]
    UnknownCommand { command: String, unexpected: String },

    #[error("{input:?} matches more than one command: {}", .candidates.join(", "))]
    Ambiguous {
        input: String,
        candidates: Vec<String>,
    },

    #[error("`{command}` has no handler for {type_name}")]
    NoHandler {
        command: String,
        type_name: &'static str,
    },
}

/// How a symbol's arity was violated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArityViolation {
    #[error("expected at least {min} value(s), got {found}")]
    MinimumNotMet { min: usize, found: usize },

    #[error("expected at most {max} value(s), got {found}")]
    MaximumExceeded { max: usize, found: usize },
}

/// A structural problem found while matching tokens to symbols
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    #[error("{symbol}: {violation}")]
    Arity {
        symbol: SymbolLabel,
        violation: ArityViolation,
    },

    #[error("{symbol} requires a value")]
    MissingParameter { symbol: SymbolLabel },

    #[error("{symbol} is a switch; {parameter:?} isn't true or false")]
    InvalidSwitchParameter {
        symbol: SymbolLabel,
        parameter: String,
    },

    #[error("unrecognized argument {token:?}")]
    UnmatchedArgument { token: String, position: usize },
}

impl ParseError {
    #[must_use]
    pub fn symbol(&self) -> Option<&SymbolLabel> {
        match self {
            Self::Arity { symbol, .. }
            | Self::MissingParameter { symbol }
            | Self::InvalidSwitchParameter { symbol, .. } => Some(symbol),
            Self::UnmatchedArgument { .. } => None,
        }
    }
}

/// A value was found but couldn't be turned into its declared type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum BindError {
    #[error("{symbol}: {value:?} isn't a valid {type_name}: {message}")]
    Conversion {
        symbol: SymbolLabel,
        value: String,
        type_name: &'static str,
        message: String,
    },

    #[error("{symbol}: {value:?} was rejected: {message}")]
    Validation {
        symbol: SymbolLabel,
        value: String,
        message: String,
    },
}

impl BindError {
    #[must_use]
    pub fn symbol(&self) -> &SymbolLabel {
        match self {
            Self::Conversion { symbol, .. } | Self::Validation { symbol, .. } => symbol,
        }
    }
}

/// A model couldn't be assembled from its bindings
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ModelError {
    #[error("nothing is bound to {binding:?}")]
    Unbound { binding: String },

    #[error("{binding:?} is required but has no value")]
    MissingValue { binding: String },

    #[error("{binding:?} doesn't hold a {expected}")]
    TypeMismatch {
        binding: String,
        expected: &'static str,
    },

    #[error("{0}")]
    Custom(String),
}

/// Any single problem encountered while processing an invocation
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Bind(#[from] BindError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl Error {
    /// The symbol this error is attributed to, if any
    #[must_use]
    pub fn symbol(&self) -> Option<&SymbolLabel> {
        match self {
            Self::Parse(err) => err.symbol(),
            Self::Bind(err) => Some(err.symbol()),
            _ => None,
        }
    }
}

/**
Every problem found while processing a single invocation, along with the
command that was being processed. The [`Display`][std::fmt::Display] impl for
this type (in `printers`) renders a complete report.
*/
#[derive(Debug)]
pub struct Failure {
    pub(crate) command: String,
    pub(crate) errors: Vec<Error>,
}

impl Failure {
    #[must_use]
    pub fn new(command: impl Into<String>, errors: Vec<Error>) -> Self {
        Self {
            command: command.into(),
            errors,
        }
    }

    /// The full name of the command being processed, like `app connect`
    #[inline]
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    #[inline]
    #[must_use]
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }
}

impl std::error::Error for Failure {}
