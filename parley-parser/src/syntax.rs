use alloc::string::String;
use core::ops::Range;

/**
A byte range into the text of a single token.

Spans are always relative to the token they were produced from, and always
fall on `char` boundaries, because the tokenizer only ever splits on ASCII
punctuation.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[inline]
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// An empty span positioned at `at`
    #[inline]
    #[must_use]
    pub const fn empty(at: usize) -> Self {
        Self { start: at, end: at }
    }

    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[inline]
    #[must_use]
    pub const fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Get the part of `text` covered by this span. `text` must be the text
    /// the span was computed from.
    #[inline]
    #[must_use]
    pub fn slice<'t>(&self, text: &'t str) -> &'t str {
        &text[self.range()]
    }
}

/// The leading punctuation that marks an argument as an option or switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prefix {
    /// No prefix at all; operands, terminators, and directives
    None,

    /// `-x`
    Dash,

    /// `--name`
    DoubleDash,

    /// A configured alternate prefix, such as `/name`
    Alternate(char),
}

impl Prefix {
    #[inline]
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// The operator separating an identifier from an attached parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Assignment {
    /// `--name:value`
    Colon,

    /// `--name=value`
    Equals,
}

impl Assignment {
    #[inline]
    pub(crate) const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b':' => Some(Self::Colon),
            b'=' => Some(Self::Equals),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Colon => ':',
            Self::Equals => '=',
        }
    }
}

/**
Decomposition of the inside of a `[identifier:parameter]` directive. All
spans are relative to the whole token, brackets included.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DirectiveSyntax {
    /// Everything between the brackets
    pub enclosed: Span,
    pub identifier: Span,
    pub assignment: Option<Assignment>,
    pub parameter: Option<Span>,
}

/**
The syntactic decomposition of a single token.

For identifiers, `prefix_span`, `identifier`, the assignment operator, and
`parameter` together cover the whole text. For operands and terminators the
identifier span covers everything. For directives, the `directive` field
describes the bracketed content, and the other spans are empty.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Syntax {
    pub prefix: Prefix,
    pub prefix_span: Span,
    pub identifier: Span,
    pub assignment: Option<Assignment>,
    pub parameter: Option<Span>,
    pub directive: Option<DirectiveSyntax>,
}

impl Syntax {
    /// Syntax for a token that is taken verbatim: operands and terminators
    #[inline]
    #[must_use]
    pub const fn verbatim(len: usize) -> Self {
        Self {
            prefix: Prefix::None,
            prefix_span: Span::empty(0),
            identifier: Span::new(0, len),
            assignment: None,
            parameter: None,
            directive: None,
        }
    }

    /// Parse a directive: `[identifier]`, `[identifier:param]`, or
    /// `[identifier=param]`. The identifier is word characters and dashes,
    /// except for a resource reference (`[@name]`), which names a resource
    /// however it likes. Returns `None` if the text isn't bracketed or the
    /// identifier is empty or malformed.
    #[must_use]
    pub fn parse_directive(text: &str) -> Option<Self> {
        let bytes = text.as_bytes();

        let inner = match bytes {
            [b'[', inner @ .., b']'] => inner,
            _ => return None,
        };

        let (identifier_len, assignment) = split_assignment(inner);

        if identifier_len == 0 {
            return None;
        }

        let name = text.get(1..1 + identifier_len)?;
        let well_formed = name.starts_with('@')
            || name
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '-');

        if !well_formed {
            return None;
        }

        let identifier = Span::new(1, 1 + identifier_len);
        let parameter = assignment.map(|_| Span::new(identifier.end + 1, bytes.len() - 1));

        Some(Self {
            directive: Some(DirectiveSyntax {
                enclosed: Span::new(1, bytes.len() - 1),
                identifier,
                assignment,
                parameter,
            }),
            ..Self::verbatim(0)
        })
    }

    /// Parse a prefixed identifier: `--name`, `-n`, `/name`, each optionally
    /// followed by `:value` or `=value`. Returns `None` if there's no prefix,
    /// or nothing follows the prefix.
    #[must_use]
    pub fn parse_identifier(text: &str, alternate: Option<char>) -> Option<Self> {
        let (prefix, prefix_len) = match text.as_bytes() {
            [b'-', b'-', ..] => (Prefix::DoubleDash, 2),
            [b'-', ..] => (Prefix::Dash, 1),
            _ => match alternate {
                Some(alternate) if text.starts_with(alternate) => {
                    (Prefix::Alternate(alternate), alternate.len_utf8())
                }
                _ => return None,
            },
        };

        let (identifier_len, assignment) = split_assignment(&text.as_bytes()[prefix_len..]);

        if identifier_len == 0 {
            return None;
        }

        let identifier = Span::new(prefix_len, prefix_len + identifier_len);

        Some(Self {
            prefix,
            prefix_span: Span::new(0, prefix_len),
            identifier,
            assignment,
            parameter: assignment.map(|_| Span::new(identifier.end + 1, text.len())),
            directive: None,
        })
    }

    /**
    Rebuild the original text of a token from its spans. This is lossless:
    for any token, `syntax.reconstruct(text) == text`.
    */
    #[must_use]
    pub fn reconstruct(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());

        match self.directive {
            Some(directive) => {
                out.push('[');
                out.push_str(directive.identifier.slice(text));
                push_assignment(&mut out, directive.assignment, directive.parameter, text);
                out.push(']');
            }
            None => {
                out.push_str(self.prefix_span.slice(text));
                out.push_str(self.identifier.slice(text));
                push_assignment(&mut out, self.assignment, self.parameter, text);
            }
        }

        out
    }
}

fn push_assignment(
    out: &mut String,
    assignment: Option<Assignment>,
    parameter: Option<Span>,
    text: &str,
) {
    if let Some(assignment) = assignment {
        out.push(assignment.as_char());
    }

    if let Some(parameter) = parameter {
        out.push_str(parameter.slice(text));
    }
}

/// Find the first `:` or `=`, returning the length of the identifier before
/// it along with the operator that was found.
#[inline]
fn split_assignment(input: &[u8]) -> (usize, Option<Assignment>) {
    match memchr::memchr2(b':', b'=', input) {
        Some(i) => (i, Assignment::from_byte(input[i])),
        None => (input.len(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_option_with_colon() {
        let text = "--table:Logs";
        let syntax = Syntax::parse_identifier(text, None).unwrap();

        assert_eq!(syntax.prefix, Prefix::DoubleDash);
        assert_eq!(syntax.identifier.slice(text), "table");
        assert_eq!(syntax.assignment, Some(Assignment::Colon));
        assert_eq!(syntax.parameter.unwrap().slice(text), "Logs");
    }

    #[test]
    fn only_first_operator_splits() {
        let text = "-h=https://x.com";
        let syntax = Syntax::parse_identifier(text, None).unwrap();

        assert_eq!(syntax.identifier.slice(text), "h");
        assert_eq!(syntax.assignment, Some(Assignment::Equals));
        assert_eq!(syntax.parameter.unwrap().slice(text), "https://x.com");
    }

    #[test]
    fn empty_identifiers_are_rejected() {
        assert!(Syntax::parse_identifier("-", None).is_none());
        assert!(Syntax::parse_identifier("--=value", None).is_none());
        assert!(Syntax::parse_identifier("/", Some('/')).is_none());
        assert!(Syntax::parse_identifier("plain", None).is_none());
    }

    #[test]
    fn alternate_prefix() {
        let text = "/verbose";
        assert!(Syntax::parse_identifier(text, None).is_none());

        let syntax = Syntax::parse_identifier(text, Some('/')).unwrap();
        assert_eq!(syntax.prefix, Prefix::Alternate('/'));
        assert_eq!(syntax.identifier.slice(text), "verbose");
    }

    #[test]
    fn directive_spans() {
        let text = "[@login-info.rsp]";
        let syntax = Syntax::parse_directive(text).unwrap();
        let directive = syntax.directive.unwrap();

        assert_eq!(directive.enclosed.slice(text), "@login-info.rsp");
        assert_eq!(directive.identifier.slice(text), "@login-info.rsp");
        assert_eq!(directive.parameter, None);

        let text = "[trace=verbose]";
        let directive = Syntax::parse_directive(text).unwrap().directive.unwrap();
        assert_eq!(directive.identifier.slice(text), "trace");
        assert_eq!(directive.parameter.unwrap().slice(text), "verbose");

        assert!(Syntax::parse_directive("[]").is_none());
        assert!(Syntax::parse_directive("[:x]").is_none());
        assert!(Syntax::parse_directive("[open").is_none());
    }

    #[test]
    fn directive_identifiers_are_words() {
        let text = "[log_level-2:debug info]";
        let directive = Syntax::parse_directive(text).unwrap().directive.unwrap();
        assert_eq!(directive.identifier.slice(text), "log_level-2");
        assert_eq!(directive.parameter.unwrap().slice(text), "debug info");

        assert!(Syntax::parse_directive("[1, 2, 3]").is_none());
        assert!(Syntax::parse_directive("[a.b]").is_none());
        assert!(Syntax::parse_directive("[x y]").is_none());
        assert!(Syntax::parse_directive("[@dir/args.rsp]").is_some());
    }

    #[test]
    fn reconstruct_is_lossless() {
        let cases = [
            ("--name=value", Syntax::parse_identifier("--name=value", None)),
            ("-x", Syntax::parse_identifier("-x", None)),
            ("--empty:", Syntax::parse_identifier("--empty:", None)),
            ("[a:b:c]", Syntax::parse_directive("[a:b:c]")),
            ("plain", Some(Syntax::verbatim(5))),
        ];

        for (text, syntax) in cases {
            assert_eq!(syntax.unwrap().reconstruct(text), text);
        }
    }
}
