/*!
Splitting response-file lines into words.

Words are separated by whitespace. A `'` or `"` starts a quoted section that
runs until the matching quote on the same line; quoted sections may contain
whitespace and are joined with any unquoted text they touch, so `--name="a b"`
is the single word `--name=a b`. The quotes themselves are removed.
*/

use alloc::{borrow::Cow, string::String};
use core::{
    error::Error,
    fmt::{self, Display},
};

/// A single word from a response-file line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word<'a> {
    pub text: Cow<'a, str>,

    /// The 1-based column, in characters, where this word starts
    pub column: usize,

    /// True if any part of the word was quoted
    pub quoted: bool,
}

/// A quote was opened on a line but never closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnterminatedQuote {
    pub quote: char,

    /// The 1-based column, in characters, of the opening quote
    pub column: usize,
}

impl Display for UnterminatedQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unterminated {quote} quote starting at column {column}",
            quote = self.quote,
            column = self.column
        )
    }
}

impl Error for UnterminatedQuote {}

/**
Iterator over the [`Word`]s of a single line. After an unterminated quote is
reported, the iterator ends: the rest of the line is abandoned.
*/
#[derive(Debug, Clone)]
pub struct Words<'a> {
    line: &'a str,
    position: usize,
    done: bool,
}

/// Split a single response-file line into words
#[inline]
#[must_use]
pub fn split_line(line: &str) -> Words<'_> {
    Words {
        line,
        position: 0,
        done: false,
    }
}

impl Words<'_> {
    fn column(&self, byte: usize) -> usize {
        self.line[..byte].chars().count() + 1
    }
}

impl<'a> Iterator for Words<'a> {
    type Item = Result<Word<'a>, UnterminatedQuote>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let line = self.line;
        let rest = &line[self.position..];
        let start = self.position + (rest.len() - rest.trim_start().len());

        if start == line.len() {
            self.done = true;
            return None;
        }

        // Only allocated if we find a quote
        let mut owned: Option<String> = None;
        let mut cursor = start;

        while let Some(c) = line[cursor..].chars().next() {
            if c.is_whitespace() {
                break;
            }

            if c == '"' || c == '\'' {
                let buffer = owned.get_or_insert_with(|| String::from(&line[start..cursor]));
                let body = cursor + 1;

                match memchr::memchr(c as u8, &line.as_bytes()[body..]) {
                    Some(len) => {
                        buffer.push_str(&line[body..body + len]);
                        cursor = body + len + 1;
                    }
                    None => {
                        self.done = true;
                        return Some(Err(UnterminatedQuote {
                            quote: c,
                            column: self.column(cursor),
                        }));
                    }
                }
            } else {
                if let Some(buffer) = owned.as_mut() {
                    buffer.push(c);
                }

                cursor += c.len_utf8();
            }
        }

        self.position = cursor;

        let quoted = owned.is_some();
        let text = match owned {
            Some(owned) => Cow::Owned(owned),
            None => Cow::Borrowed(&line[start..cursor]),
        };

        Some(Ok(Word {
            text,
            column: self.column(start),
            quoted,
        }))
    }
}
