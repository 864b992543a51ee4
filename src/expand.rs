/*!
Response-file expansion.

A `[@name]` directive before the terminator is replaced, in place, by the
words read from the resource `name`. Each non-blank line that doesn't start
with `#` is split into words (see [`parley_parser::split`]); those words are
tokenized like any other argument, so a response file may itself contain
`[@other]` directives, up to a configured nesting depth.

Problems don't stop expansion. An unreadable resource is reported and its
directive is left where it was; a line with an unterminated quote is reported
and the rest of that line is dropped; a terminator inside a response file is
reported and dropped, even if it's quoted.
*/

use std::{
    collections::HashMap,
    fs::File,
    io::{self, BufRead, BufReader, Cursor},
    path::PathBuf,
};

use parley_parser::{NodeId, Token, TokenKind, TokenList, Tokenizer, split::split_line};
use tracing::{debug, trace, warn};

use crate::errors::SyntaxError;

/// Opens the resources named by `[@name]` directives
pub trait ResourceLoader: Send + Sync {
    fn open(&self, name: &str) -> io::Result<Box<dyn BufRead + '_>>;
}

/// Loads resources from the filesystem, relative to a base directory (or to
/// the working directory, if none is given)
#[derive(Debug, Clone, Default)]
pub struct FileLoader {
    base: Option<PathBuf>,
}

impl FileLoader {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        Self {
            base: Some(base.into()),
        }
    }
}

impl ResourceLoader for FileLoader {
    fn open(&self, name: &str) -> io::Result<Box<dyn BufRead + '_>> {
        let path = match self.base {
            Some(ref base) => base.join(name),
            None => PathBuf::from(name),
        };

        File::open(path).map(|file| Box::new(BufReader::new(file)) as Box<dyn BufRead>)
    }
}

/// Loads resources from memory
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    resources: HashMap<String, String>,
}

impl MemoryLoader {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(name, content);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, content: impl Into<String>) {
        self.resources.insert(name.into(), content.into());
    }
}

impl ResourceLoader for MemoryLoader {
    fn open(&self, name: &str) -> io::Result<Box<dyn BufRead + '_>> {
        match self.resources.get(name) {
            Some(content) => Ok(Box::new(Cursor::new(content.as_bytes()))),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no resource named {name:?}"),
            )),
        }
    }
}

/**
Expand every response-file directive in `tokens`, in place. Returns whether
anything was expanded, and every problem encountered along the way.
*/
pub fn expand(
    tokens: &mut TokenList,
    tokenizer: &Tokenizer,
    loader: &dyn ResourceLoader,
    max_depth: usize,
) -> (bool, Vec<SyntaxError>) {
    let mut depths: HashMap<NodeId, usize> = HashMap::new();
    let mut errors = Vec::new();
    let mut expanded = false;
    let mut cursor = tokens.first();

    while let Some(id) = cursor {
        let next = tokens.next(id);

        let resource = tokens
            .get(id)
            .filter(|token| token.kind() == TokenKind::Directive)
            .and_then(|token| token.directive())
            .and_then(|directive| directive.resource())
            .map(str::to_owned);

        let Some(resource) = resource else {
            cursor = next;
            continue;
        };

        let depth = depths.get(&id).copied().unwrap_or(0);

        if depth >= max_depth {
            warn!(%resource, depth, "response file nesting limit reached");
            errors.push(SyntaxError::DepthExceeded {
                resource,
                max_depth,
            });
            cursor = next;
            continue;
        }

        let position = tokens.get(id).map(|token| token.position()).unwrap_or(0);

        let replacement = match read_resource(loader, &resource, tokenizer, position, &mut errors) {
            Ok(replacement) => replacement,
            Err(error) => {
                warn!(%resource, %error, "couldn't expand response file");
                errors.push(error);
                cursor = next;
                continue;
            }
        };

        debug!(%resource, depth, words = replacement.len(), "expanding response file");

        match tokens.replace(id, replacement) {
            Some((_, inserted)) => {
                expanded = true;
                for &node in &inserted {
                    depths.insert(node, depth + 1);
                }

                // Rescan the inserted tokens, so nested directives expand
                cursor = inserted.first().copied().or(next);
            }
            None => cursor = next,
        }
    }

    (expanded, errors)
}

fn read_resource(
    loader: &dyn ResourceLoader,
    name: &str,
    tokenizer: &Tokenizer,
    position: usize,
    errors: &mut Vec<SyntaxError>,
) -> Result<Vec<Token>, SyntaxError> {
    let terminator = tokenizer.terminator();
    let resource_error = |source| SyntaxError::Resource {
        name: name.to_owned(),
        source,
    };

    let reader = loader.open(name).map_err(resource_error)?;
    let mut words = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(resource_error)?;
        let line_number = index + 1;

        if line.trim_start().starts_with('#') {
            trace!(resource = name, line = line_number, "skipping comment");
            continue;
        }

        for word in split_line(&line) {
            match word {
                Ok(word) if !word.quoted && word.text == terminator => {
                    errors.push(SyntaxError::TerminatorInResponseFile {
                        resource: name.to_owned(),
                        line: line_number,
                        column: word.column,
                        terminator: terminator.to_owned(),
                    })
                }
                // A quoted terminator is just text
                Ok(word) if word.quoted && word.text == terminator => {
                    words.push(Token::operand(word.text.into_owned(), position))
                }
                Ok(word) => words.push(tokenizer.token(word.text.into_owned(), position)),
                Err(error) => errors.push(SyntaxError::UnterminatedQuote {
                    resource: name.to_owned(),
                    line: line_number,
                    column: error.column,
                    quote: error.quote,
                }),
            }
        }
    }

    Ok(words)
}
