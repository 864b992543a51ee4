/*!
Application-wide configuration for a [`CommandLine`][crate::CommandLine].
*/

use std::{fmt, sync::Arc};

use parley_parser::Tokenizer;

use crate::{
    convert::ConverterRegistry,
    expand::{FileLoader, ResourceLoader},
    help::{HelpRenderer, PlainHelp},
    symbol::Tag,
    validate::ValidatorRegistry,
};

/// What to do with an identifier that doesn't match any visible symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownIdentifiers {
    /// Report it as unmatched
    #[default]
    Reject,

    /// Treat it as an operand, so it may be taken by a positional argument
    Positional,
}

/// How leading operands are matched to subcommands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RouteMatching {
    /// Walk the tree one operand at a time
    #[default]
    Tree,

    /// Match the longest run of leading operands against each command's
    /// route pattern
    Pattern,
}

/**
Configuration shared by every invocation. The defaults are:

- `--` terminator, and no alternate prefix
- `--help` and `-?` request help
- exit codes 0 for help, 1 for failures, 70 for internal errors
- response files nest at most 8 levels deep, and are read from the working
  directory
- unknown identifiers are rejected
- the `[parse]` directive is available; no other directives are
*/
#[derive(Clone)]
pub struct CliOptions {
    pub(crate) tokenizer: Tokenizer,
    pub(crate) help_tags: Vec<Tag>,
    pub(crate) help_exit_code: i32,
    pub(crate) failure_exit_code: i32,
    pub(crate) internal_error_exit_code: i32,
    pub(crate) max_expansion_depth: usize,
    pub(crate) response_files: bool,
    pub(crate) unknown_identifiers: UnknownIdentifiers,
    pub(crate) route_matching: RouteMatching,
    pub(crate) directives: Vec<String>,
    pub(crate) parse_directive: bool,
    pub(crate) loader: Arc<dyn ResourceLoader>,
    pub(crate) converters: ConverterRegistry,
    pub(crate) validators: ValidatorRegistry,
    pub(crate) help: Arc<dyn HelpRenderer>,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            tokenizer: Tokenizer::new(),
            help_tags: vec![Tag::Long("help".to_owned()), Tag::Short('?')],
            help_exit_code: 0,
            failure_exit_code: 1,
            internal_error_exit_code: 70,
            max_expansion_depth: 8,
            response_files: true,
            unknown_identifiers: UnknownIdentifiers::Reject,
            route_matching: RouteMatching::Tree,
            directives: Vec::new(),
            parse_directive: true,
            loader: Arc::new(FileLoader::new()),
            converters: ConverterRegistry::new(),
            validators: ValidatorRegistry::new(),
            help: Arc::new(PlainHelp::new()),
        }
    }
}

impl CliOptions {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_terminator(mut self, terminator: impl Into<String>) -> Self {
        self.tokenizer = self.tokenizer.with_terminator(terminator);
        self
    }

    /// Also accept identifiers with this prefix, like `/name`
    #[must_use]
    pub fn with_alternate_prefix(mut self, prefix: char) -> Self {
        self.tokenizer = self.tokenizer.with_alternate_prefix(Some(prefix));
        self
    }

    /// Replace the tags that request help, written as they'd appear on the
    /// command line: `--help`, `-?`, `/h`
    #[must_use]
    pub fn with_help_tags<'a>(self, tags: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            help_tags: tags.into_iter().map(Tag::parse).collect(),
            ..self
        }
    }

    #[must_use]
    pub fn with_exit_codes(self, help: i32, failure: i32, internal_error: i32) -> Self {
        Self {
            help_exit_code: help,
            failure_exit_code: failure,
            internal_error_exit_code: internal_error,
            ..self
        }
    }

    #[must_use]
    pub fn with_max_expansion_depth(self, depth: usize) -> Self {
        Self {
            max_expansion_depth: depth,
            ..self
        }
    }

    /// Disable response files; `[@name]` becomes an ordinary directive
    #[must_use]
    pub fn without_response_files(self) -> Self {
        Self {
            response_files: false,
            ..self
        }
    }

    #[must_use]
    pub fn with_unknown_identifiers(self, policy: UnknownIdentifiers) -> Self {
        Self {
            unknown_identifiers: policy,
            ..self
        }
    }

    #[must_use]
    pub fn with_route_matching(self, matching: RouteMatching) -> Self {
        Self {
            route_matching: matching,
            ..self
        }
    }

    /// Accept a directive, which will be passed through to the call site
    #[must_use]
    pub fn allow_directive(mut self, name: impl Into<String>) -> Self {
        self.directives.push(name.into());
        self
    }

    /// Disable the built-in `[parse]` directive
    #[must_use]
    pub fn without_parse_directive(self) -> Self {
        Self {
            parse_directive: false,
            ..self
        }
    }

    #[must_use]
    pub fn with_loader(self, loader: impl ResourceLoader + 'static) -> Self {
        Self {
            loader: Arc::new(loader),
            ..self
        }
    }

    #[must_use]
    pub fn with_help_renderer(self, renderer: impl HelpRenderer + 'static) -> Self {
        Self {
            help: Arc::new(renderer),
            ..self
        }
    }

    #[inline]
    pub fn converters_mut(&mut self) -> &mut ConverterRegistry {
        &mut self.converters
    }

    #[inline]
    pub fn validators_mut(&mut self) -> &mut ValidatorRegistry {
        &mut self.validators
    }

    #[inline]
    #[must_use]
    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    #[inline]
    #[must_use]
    pub fn help_tags(&self) -> &[Tag] {
        &self.help_tags
    }

    #[inline]
    #[must_use]
    pub fn max_expansion_depth(&self) -> usize {
        self.max_expansion_depth
    }

    #[inline]
    #[must_use]
    pub fn unknown_identifiers(&self) -> UnknownIdentifiers {
        self.unknown_identifiers
    }

    #[inline]
    #[must_use]
    pub fn route_matching(&self) -> RouteMatching {
        self.route_matching
    }

    pub(crate) fn is_known_directive(&self, name: &str) -> bool {
        (self.parse_directive && name == "parse") || self.directives.iter().any(|d| d == name)
    }
}

impl fmt::Debug for CliOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CliOptions")
            .field("tokenizer", &self.tokenizer)
            .field("help_tags", &self.help_tags)
            .field("help_exit_code", &self.help_exit_code)
            .field("failure_exit_code", &self.failure_exit_code)
            .field("internal_error_exit_code", &self.internal_error_exit_code)
            .field("max_expansion_depth", &self.max_expansion_depth)
            .field("response_files", &self.response_files)
            .field("unknown_identifiers", &self.unknown_identifiers)
            .field("route_matching", &self.route_matching)
            .field("directives", &self.directives)
            .field("parse_directive", &self.parse_directive)
            .field("converters", &self.converters)
            .finish_non_exhaustive()
    }
}
