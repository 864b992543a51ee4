use parley_parser::{TokenKind, TokenList};
use tracing::debug;

use crate::{errors::SyntaxError, options::CliOptions};

/// A single `[name]` or `[name:value]` directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveEntry {
    pub name: String,
    pub value: Option<String>,
}

/// The directives given on a command line, in order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directives {
    entries: Vec<DirectiveEntry>,
}

impl Directives {
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name == name)
    }

    /// The value of the first directive named `name`. `Some(None)` means the
    /// directive was present without a value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Option<&str>> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.value.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &DirectiveEntry> {
        self.entries.iter()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/**
Remove every directive token from `tokens`. Known directives are collected;
unknown ones are reported. Response-file directives that are still present
failed to expand, and were already reported, so they're dropped silently.
*/
pub fn dequeue(tokens: &mut TokenList, options: &CliOptions) -> (Directives, Vec<SyntaxError>) {
    let mut directives = Directives::default();
    let mut errors = Vec::new();

    let ids: Vec<_> = tokens
        .iter()
        .filter(|(_, token)| token.kind() == TokenKind::Directive)
        .map(|(id, _)| id)
        .collect();

    for id in ids {
        let Some(token) = tokens.remove(id) else {
            continue;
        };

        let Some(directive) = token.directive() else {
            continue;
        };

        if options.response_files && directive.resource().is_some() {
            continue;
        }

        if options.is_known_directive(directive.identifier) {
            debug!(name = directive.identifier, "directive");
            directives.entries.push(DirectiveEntry {
                name: directive.identifier.to_owned(),
                value: directive.parameter.map(str::to_owned),
            });
        } else {
            errors.push(SyntaxError::UnknownDirective {
                name: directive.identifier.to_owned(),
            });
        }
    }

    (directives, errors)
}

#[cfg(test)]
mod tests {
    use parley_parser::Tokenizer;

    use super::*;

    #[test]
    fn known_directives_are_collected_and_removed() {
        let options = CliOptions::new().allow_directive("debug");
        let mut tokens =
            Tokenizer::new().tokenize(["[parse]", "connect", "[debug:3]", "[@gone.rsp]", "-v"]);

        let (directives, errors) = dequeue(&mut tokens, &options);

        assert!(errors.is_empty());
        assert_eq!(directives.get("parse"), Some(None));
        assert_eq!(directives.get("debug"), Some(Some("3")));
        assert_eq!(
            tokens.iter().map(|(_, t)| t.text()).collect::<Vec<_>>(),
            ["connect", "-v"]
        );
    }

    #[test]
    fn unknown_directives_are_errors() {
        let mut tokens = Tokenizer::new().tokenize(["[frob]", "x"]);
        let (directives, errors) = dequeue(&mut tokens, &CliOptions::new());

        assert!(directives.is_empty());
        assert!(matches!(
            errors.as_slice(),
            [SyntaxError::UnknownDirective { name }] if name == "frob"
        ));
    }
}
