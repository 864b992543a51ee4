use alloc::string::String;

use crate::{
    list::TokenList,
    syntax::Syntax,
    token::{Token, TokenKind},
};

/**
Turns raw argument strings into [`Token`]s.

Tokenizing never fails: every string is representable as some kind of token.
The rules, checked in order, are:

1. A string exactly equal to the terminator (`--` by default) is a
   [`Terminator`][TokenKind::Terminator], and every string after it is an
   [`Operand`][TokenKind::Operand], verbatim.
2. `[something]` is a [`Directive`][TokenKind::Directive].
3. `--name`, `-n`, or (if configured) an alternate prefix like `/name`, each
   optionally followed by `:value` or `=value`, is an
   [`Identifier`][TokenKind::Identifier].
4. Anything else, including a lone `-`, is an operand.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokenizer {
    terminator: String,
    alternate_prefix: Option<char>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self {
            terminator: String::from("--"),
            alternate_prefix: None,
        }
    }
}

impl Tokenizer {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_terminator(self, terminator: impl Into<String>) -> Self {
        Self {
            terminator: terminator.into(),
            ..self
        }
    }

    #[must_use]
    pub fn with_alternate_prefix(self, prefix: Option<char>) -> Self {
        Self {
            alternate_prefix: prefix,
            ..self
        }
    }

    #[inline]
    #[must_use]
    pub fn terminator(&self) -> &str {
        &self.terminator
    }

    #[inline]
    #[must_use]
    pub fn alternate_prefix(&self) -> Option<char> {
        self.alternate_prefix
    }

    /// Classify a single argument, without regard to whether a terminator
    /// appeared earlier.
    #[must_use]
    pub fn classify(&self, text: &str) -> (TokenKind, Syntax) {
        if text == self.terminator {
            (TokenKind::Terminator, Syntax::verbatim(text.len()))
        } else if let Some(syntax) = Syntax::parse_directive(text) {
            (TokenKind::Directive, syntax)
        } else if let Some(syntax) = Syntax::parse_identifier(text, self.alternate_prefix) {
            (TokenKind::Identifier, syntax)
        } else {
            (TokenKind::Operand, Syntax::verbatim(text.len()))
        }
    }

    /// Tokenize a single argument at the given position, without regard to
    /// whether a terminator appeared earlier.
    #[must_use]
    pub fn token(&self, text: impl Into<String>, position: usize) -> Token {
        let text = text.into();
        let (kind, syntax) = self.classify(&text);
        Token::new(kind, text, position, syntax)
    }

    /// Tokenize a complete argument list. The list should exclude the name
    /// of the program.
    pub fn tokenize<I>(&self, args: I) -> TokenList
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut positional_only = false;

        args.into_iter()
            .enumerate()
            .map(|(position, text)| match positional_only {
                true => Token::operand(text.into(), position),
                false => {
                    let token = self.token(text, position);
                    positional_only = token.kind() == TokenKind::Terminator;
                    token
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use alloc::{string::ToString, vec::Vec};

    use super::*;
    use crate::syntax::Prefix;

    fn kinds(list: &TokenList) -> Vec<TokenKind> {
        list.iter().map(|(_, token)| token.kind()).collect()
    }

    #[test]
    fn bare_words_are_operands() {
        for word in ["connect", "tester", "(secret)", "./var/logs", "-", "x.y", "[1,2]"] {
            let list = Tokenizer::new().tokenize([word]);
            let (_, token) = list.iter().next().unwrap();

            assert_eq!(list.len(), 1);
            assert_eq!(token.kind(), TokenKind::Operand);
            assert_eq!(token.text(), word);
        }
    }

    #[test]
    fn everything_after_terminator_is_an_operand() {
        let list = Tokenizer::new().tokenize([
            "export",
            "--table:Logs",
            "--",
            "./var/logs",
            "-verbose-logging:true",
            "[@file]",
            "--",
        ]);

        assert_eq!(
            kinds(&list),
            [
                TokenKind::Operand,
                TokenKind::Identifier,
                TokenKind::Terminator,
                TokenKind::Operand,
                TokenKind::Operand,
                TokenKind::Operand,
                TokenKind::Operand,
            ]
        );

        let tail = list.iter().nth(4).unwrap().1;
        assert_eq!(tail.text(), "-verbose-logging:true");
        assert_eq!(tail.identifier(), None);
        assert_eq!(tail.position(), 4);
    }

    #[test]
    fn identifiers_expose_their_parts() {
        let token = Tokenizer::new().token("-h=https://x.com", 1);

        assert_eq!(token.kind(), TokenKind::Identifier);
        assert_eq!(token.prefix(), Prefix::Dash);
        assert_eq!(token.identifier(), Some("h"));
        assert_eq!(token.parameter(), Some("https://x.com"));
        assert!(token.short_cluster().is_none());
    }

    #[test]
    fn short_clusters() {
        let tokenizer = Tokenizer::new();

        let cluster: Vec<char> = tokenizer.token("-abc", 0).short_cluster().unwrap().collect();
        assert_eq!(cluster, ['a', 'b', 'c']);

        assert!(tokenizer.token("-a", 0).short_cluster().is_none());
        assert!(tokenizer.token("--abc", 0).short_cluster().is_none());
        assert!(tokenizer.token("-ab:c", 0).short_cluster().is_none());
    }

    #[test]
    fn custom_terminator_and_prefix() {
        let tokenizer = Tokenizer::new()
            .with_terminator("++")
            .with_alternate_prefix(Some('/'));

        let list = tokenizer.tokenize(["/help", "--", "++", "/help"]);

        assert_eq!(
            kinds(&list),
            [
                TokenKind::Identifier,
                TokenKind::Operand,
                TokenKind::Terminator,
                TokenKind::Operand,
            ]
        );
    }

    #[test]
    fn retokenizing_text_is_idempotent() {
        let tokenizer = Tokenizer::new();
        let list = tokenizer.tokenize(["--user-id", "root", "[x:y]", "-abc", "-p=(secret)"]);

        for (_, token) in &list {
            let again = tokenizer.token(token.text().to_string(), 99);
            assert_eq!(&again, token);
            assert_eq!(token.reconstruct(), token.text());
        }
    }
}
