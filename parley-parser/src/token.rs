use alloc::string::String;
use core::{
    fmt::{self, Display},
    hash::{Hash, Hasher},
};

use crate::syntax::{Assignment, Prefix, Syntax};

/// The broad classification of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A prefixed name, like `--name`, `-n`, or `--name=value`
    Identifier,

    /// A bare value, or anything at all after the terminator
    Operand,

    /// A bracketed `[directive]`
    Directive,

    /// The terminator, usually `--`
    Terminator,
}

/**
A single tokenized argument.

Equality and hashing are structural: two tokens are equal if they have the
same kind, text, and syntax. The parse position is bookkeeping about where
the token came from, and doesn't participate.
*/
#[derive(Debug, Clone)]
pub struct Token {
    kind: TokenKind,
    text: String,
    position: usize,
    syntax: Syntax,
}

impl Token {
    #[inline]
    #[must_use]
    pub fn new(kind: TokenKind, text: String, position: usize, syntax: Syntax) -> Self {
        Self {
            kind,
            text,
            position,
            syntax,
        }
    }

    /// Create an operand token, which takes its text verbatim
    #[must_use]
    pub fn operand(text: String, position: usize) -> Self {
        let syntax = Syntax::verbatim(text.len());
        Self::new(TokenKind::Operand, text, position, syntax)
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[inline]
    #[must_use]
    pub fn into_text(self) -> String {
        self.text
    }

    /// The index of the argument this token was parsed from
    #[inline]
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    #[must_use]
    pub fn syntax(&self) -> &Syntax {
        &self.syntax
    }

    #[inline]
    #[must_use]
    pub fn is_operand(&self) -> bool {
        self.kind == TokenKind::Operand
    }

    #[inline]
    #[must_use]
    pub fn prefix(&self) -> Prefix {
        self.syntax.prefix
    }

    /// The name of an identifier token, without its prefix or parameter
    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        match self.kind {
            TokenKind::Identifier => Some(self.syntax.identifier.slice(&self.text)),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn assignment(&self) -> Option<Assignment> {
        self.syntax.assignment
    }

    /// The parameter attached to an identifier, as in `--name=parameter`
    #[must_use]
    pub fn parameter(&self) -> Option<&str> {
        self.syntax
            .parameter
            .map(|parameter| parameter.slice(&self.text))
    }

    /// If this is a directive, get a view of its parts
    #[must_use]
    pub fn directive(&self) -> Option<Directive<'_>> {
        self.syntax.directive.map(|directive| Directive {
            enclosed: directive.enclosed.slice(&self.text),
            identifier: directive.identifier.slice(&self.text),
            parameter: directive
                .parameter
                .map(|parameter| parameter.slice(&self.text)),
        })
    }

    /**
    If this token looks like a cluster of short switches, such as `-abc`,
    get the individual characters. Clusters have a single dash, at least two
    alphanumeric characters, and no attached parameter.
    */
    #[must_use]
    pub fn short_cluster(&self) -> Option<impl Iterator<Item = char> + '_> {
        let identifier = self.identifier()?;

        let is_cluster = self.syntax.prefix == Prefix::Dash
            && self.syntax.assignment.is_none()
            && identifier.chars().nth(1).is_some()
            && identifier.chars().all(|c| c.is_ascii_alphanumeric());

        is_cluster.then(|| identifier.chars())
    }

    /// Rebuild the token text from its syntax spans
    #[must_use]
    pub fn reconstruct(&self) -> String {
        self.syntax.reconstruct(&self.text)
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.text == other.text && self.syntax == other.syntax
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.text.hash(state);
        self.syntax.hash(state);
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// A borrowed view of a directive token's parts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Directive<'a> {
    /// Everything between the brackets
    pub enclosed: &'a str,
    pub identifier: &'a str,
    pub parameter: Option<&'a str>,
}

impl<'a> Directive<'a> {
    /// If this directive is a response file reference, like `[@args.rsp]`,
    /// get the resource name. The whole bracketed content after the `@` is
    /// the name, so names may contain `:` and `=`.
    #[must_use]
    pub fn resource(&self) -> Option<&'a str> {
        self.enclosed.strip_prefix('@')
    }
}
