/*!
The older, regex-driven view of a single argument: an optional prefix (`--`,
`-`, or `/`), an identifier, and an optional `:` or `=` operand. It predates
the token-level classification in `parley_parser` and is kept as a
convenience for reading tags written the way they appear on a command line.
*/

use std::{
    convert::Infallible,
    fmt::{self, Display},
    str::FromStr,
    sync::OnceLock,
};

use regex::Regex;

fn grammar() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:(?P<prefix>--|-|/)(?P<identifier>[^:=\-][^:=]*)(?:[:=](?P<operand>.*))?|(?P<bare>.*))$")
            .expect("argument grammar is a valid regex")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrefixType {
    None,
    Dash,
    DoubleDash,
    Slash,
}

impl PrefixType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Dash => "-",
            Self::DoubleDash => "--",
            Self::Slash => "/",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArgumentSyntax {
    pub prefix: PrefixType,
    pub identifier: Option<String>,
    pub operand: Option<String>,
}

impl ArgumentSyntax {
    /// Parse a single argument. Anything without a recognized prefix is an
    /// operand in its entirety.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let Some(captures) = grammar().captures(text) else {
            // `.*` can't match across a newline
            return Self::operand(text);
        };

        match captures.name("prefix") {
            None => Self::operand(text),
            Some(prefix) => Self {
                prefix: match prefix.as_str() {
                    "--" => PrefixType::DoubleDash,
                    "-" => PrefixType::Dash,
                    _ => PrefixType::Slash,
                },
                identifier: captures.name("identifier").map(|m| m.as_str().to_owned()),
                operand: captures.name("operand").map(|m| m.as_str().to_owned()),
            },
        }
    }

    fn operand(text: &str) -> Self {
        Self {
            prefix: PrefixType::None,
            identifier: None,
            operand: Some(text.to_owned()),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_operand(&self) -> bool {
        self.identifier.is_none()
    }
}

impl FromStr for ArgumentSyntax {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl Display for ArgumentSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.identifier, &self.operand) {
            (None, Some(operand)) => f.write_str(operand),
            (None, None) => Ok(()),
            (Some(identifier), None) => write!(f, "{}{identifier}", self.prefix.as_str()),
            (Some(identifier), Some(operand)) => {
                write!(f, "{}{identifier}:{operand}", self.prefix.as_str())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixed_identifiers() {
        let syntax = ArgumentSyntax::parse("--table:Logs");
        assert_eq!(syntax.prefix, PrefixType::DoubleDash);
        assert_eq!(syntax.identifier.as_deref(), Some("table"));
        assert_eq!(syntax.operand.as_deref(), Some("Logs"));

        let syntax = ArgumentSyntax::parse("-h=https://x.com");
        assert_eq!(syntax.prefix, PrefixType::Dash);
        assert_eq!(syntax.identifier.as_deref(), Some("h"));
        assert_eq!(syntax.operand.as_deref(), Some("https://x.com"));

        let syntax = ArgumentSyntax::parse("/verbose");
        assert_eq!(syntax.prefix, PrefixType::Slash);
        assert_eq!(syntax.identifier.as_deref(), Some("verbose"));
        assert_eq!(syntax.operand, None);
    }

    #[test]
    fn bare_operands() {
        for text in ["connect", "(secret)", "", "--", "-"] {
            let syntax = ArgumentSyntax::parse(text);
            assert!(syntax.is_operand(), "{text:?}");
            assert_eq!(syntax.operand.as_deref(), Some(text));
            assert_eq!(syntax.to_string(), text);
        }
    }

    #[test]
    fn display_normalizes_the_assignment() {
        assert_eq!(ArgumentSyntax::parse("--user=root").to_string(), "--user:root");
        assert_eq!(ArgumentSyntax::parse("-p").to_string(), "-p");
    }
}
