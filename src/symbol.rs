/*!
Declared binding points: switches, options, and positional arguments.

A [`Symbol`] is owned by the command that declares it. Symbols are built with
a small builder API:

```
use parley::{Scope, Symbol};

let verbosity = Symbol::option::<String>("verbosity")
    .long("verbosity")
    .short('v')
    .default_value(String::from("minimal"))
    .scope(Scope::Descendant);
```
*/

use std::{
    any::{Any, TypeId, type_name},
    fmt::{self, Debug, Display},
    sync::Arc,
};

use joinery::JoinableIterator;
use parley_parser::{Prefix, Token};

use crate::{
    argument_syntax::{ArgumentSyntax, PrefixType},
    convert::{ConvertFn, Converter},
    validate::{Rule, Validate},
};

/// A type-erased, converted value
pub type Value = Box<dyn Any + Send>;

pub(crate) type DefaultFn = Arc<dyn Fn() -> Value + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// A boolean flag: `--verbose`, `--verbose:false`
    Switch,

    /// A named value: `--host example.com`, `--host=example.com`
    Option,

    /// A positional value
    Argument,
}

impl Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Switch => "switch",
            Self::Option => "option",
            Self::Argument => "argument",
        })
    }
}

/**
The minimum and maximum number of values a symbol accepts. For switches this
counts occurrences; for options and arguments it counts values.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Arity {
    pub min: usize,
    pub max: usize,
}

impl Arity {
    pub const ZERO_OR_ONE: Self = Self::new(0, 1);
    pub const EXACTLY_ONE: Self = Self::new(1, 1);
    pub const ZERO_OR_MORE: Self = Self::new(0, usize::MAX);
    pub const ONE_OR_MORE: Self = Self::new(1, usize::MAX);

    #[inline]
    #[must_use]
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    #[inline]
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.min > 0
    }

    #[inline]
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.max == usize::MAX
    }

    #[inline]
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.min <= self.max && self.max > 0
    }
}

impl Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.is_unbounded() {
            true => write!(f, "{}..", self.min),
            false => write!(f, "{}..={}", self.min, self.max),
        }
    }
}

/// Whether a symbol declared on a command is visible to its subcommands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    /// Only the declaring command sees this symbol
    #[default]
    Local,

    /// The declaring command and every command beneath it see this symbol
    Descendant,
}

/// A single name a switch or option answers to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    /// `--name`
    Long(String),

    /// `-n`
    Short(char),
}

impl Tag {
    /**
    Parse a tag from the way it's written on the command line: `--name`,
    `-n`, or `/name`. A bare word, or a single dash followed by more than one
    character, is a long tag.
    */
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let syntax = ArgumentSyntax::parse(text);

        let name = match (syntax.prefix, syntax.identifier) {
            (PrefixType::None, _) | (_, None) => return Self::Long(text.to_owned()),
            (_, Some(name)) => name,
        };

        let mut chars = name.chars();

        match (syntax.prefix, chars.next(), chars.next()) {
            (PrefixType::Dash | PrefixType::Slash, Some(short), None) => Self::Short(short),
            _ => Self::Long(name),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(*self, Self::Long(ref long) if long.is_empty())
    }

    /**
    Check if an identifier token refers to this tag. `--name` only matches
    long tags; `-n` and `/n` match short tags; `-name` and `/name` match long
    tags, to support single-dash long names.
    */
    #[must_use]
    pub fn matches(&self, token: &Token) -> bool {
        let Some(identifier) = token.identifier() else {
            return false;
        };

        match (self, token.prefix()) {
            (Self::Long(long), Prefix::DoubleDash | Prefix::Dash | Prefix::Alternate(_)) => {
                long == identifier
            }
            (&Self::Short(short), Prefix::Dash | Prefix::Alternate(_)) => {
                let mut chars = identifier.chars();
                chars.next() == Some(short) && chars.next().is_none()
            }
            _ => false,
        }
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long(long) => write!(f, "--{long}"),
            Self::Short(short) => write!(f, "-{short}"),
        }
    }
}

/// The runtime identity of a symbol's value type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueType {
    id: TypeId,
    name: &'static str,
}

impl ValueType {
    #[must_use]
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/**
A declared switch, option, or positional argument.

Switches and options are found by their [`Tag`]s. Arguments have no tags and
are matched by position, in ascending precedence; unless set explicitly,
precedence is declaration order.
*/
#[derive(Clone)]
pub struct Symbol {
    kind: SymbolKind,
    binding: String,
    tags: Vec<Tag>,
    arity: Arity,
    scope: Scope,
    value_type: ValueType,
    converter: Option<Converter>,
    default: Option<DefaultFn>,
    validators: Vec<Arc<dyn Validate>>,
    precedence: Option<usize>,
    description: Option<String>,
    placeholder: Option<String>,
    group: Option<String>,
}

impl Symbol {
    fn new(kind: SymbolKind, binding: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            kind,
            binding: binding.into(),
            tags: Vec::new(),
            arity: match kind {
                SymbolKind::Switch => Arity::ZERO_OR_ONE,
                SymbolKind::Option | SymbolKind::Argument => Arity::EXACTLY_ONE,
            },
            scope: Scope::Local,
            value_type,
            converter: None,
            default: None,
            validators: Vec::new(),
            precedence: None,
            description: None,
            placeholder: None,
            group: None,
        }
    }

    /// A boolean switch. Absent switches are `false`.
    #[must_use]
    pub fn switch(binding: impl Into<String>) -> Self {
        Self::new(SymbolKind::Switch, binding, ValueType::of::<bool>())
    }

    /// A named option taking values of type `T`; required by default
    #[must_use]
    pub fn option<T: 'static>(binding: impl Into<String>) -> Self {
        Self::new(SymbolKind::Option, binding, ValueType::of::<T>())
    }

    /// A positional argument taking values of type `T`; required by default
    #[must_use]
    pub fn argument<T: 'static>(binding: impl Into<String>) -> Self {
        Self::new(SymbolKind::Argument, binding, ValueType::of::<T>())
    }

    /// Add a `--long` tag. Ignored for arguments.
    #[must_use]
    pub fn long(self, long: impl Into<String>) -> Self {
        self.tag(Tag::Long(long.into()))
    }

    /// Add a `-s` tag. Ignored for arguments.
    #[must_use]
    pub fn short(self, short: char) -> Self {
        self.tag(Tag::Short(short))
    }

    /// Add a tag written the way it appears on the command line, like
    /// `--user-id` or `-u`. Ignored for arguments.
    #[must_use]
    pub fn alias(self, alias: &str) -> Self {
        self.tag(Tag::parse(alias))
    }

    #[must_use]
    pub fn tag(mut self, tag: Tag) -> Self {
        if self.kind != SymbolKind::Argument && !self.tags.contains(&tag) {
            self.tags.push(tag);
        }

        self
    }

    #[must_use]
    pub fn arity(self, arity: Arity) -> Self {
        Self { arity, ..self }
    }

    /// Make this symbol optional (minimum arity of 0)
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.arity.min = 0;
        self
    }

    /// Accept any number of values
    #[must_use]
    pub fn many(mut self) -> Self {
        self.arity.max = usize::MAX;
        self
    }

    #[must_use]
    pub fn scope(self, scope: Scope) -> Self {
        Self { scope, ..self }
    }

    /// Set the precedence of a positional argument. Lower values are
    /// matched first.
    #[must_use]
    pub fn precedence(self, precedence: usize) -> Self {
        Self {
            precedence: Some(precedence),
            ..self
        }
    }

    /// Use this value when the symbol is absent. Makes the symbol optional.
    #[must_use]
    pub fn default_value<T>(self, value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.default_with(move || value.clone())
    }

    /// Compute a value when the symbol is absent. Makes the symbol optional.
    #[must_use]
    pub fn default_with<T, F>(mut self, default: F) -> Self
    where
        T: Send + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        debug_assert_eq!(TypeId::of::<T>(), self.value_type.id());

        self.default = Some(Arc::new(move || Box::new(default()) as Value));
        self.arity.min = 0;
        self
    }

    /// Use a specific converter for this symbol, instead of the one
    /// registered for its type.
    #[must_use]
    pub fn convert_with<T, E, F>(mut self, convert: F) -> Self
    where
        T: Send + 'static,
        E: Display,
        F: Fn(&str) -> Result<T, E> + Send + Sync + 'static,
    {
        let convert: Arc<ConvertFn> = Arc::new(move |raw: &str| {
            convert(raw)
                .map(|value| Box::new(value) as Value)
                .map_err(|err| err.to_string())
        });

        self.converter = Some(Converter::new(ValueType::of::<T>(), convert));
        self
    }

    #[must_use]
    pub fn validate(mut self, validator: impl Validate + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    /// Add a validation rule as a closure over the converted value
    #[must_use]
    pub fn rule<T, F>(self, check: F) -> Self
    where
        T: 'static,
        F: Fn(&T) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validate(Rule::new(check))
    }

    #[must_use]
    pub fn describe(self, description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..self
        }
    }

    #[must_use]
    pub fn placeholder(self, placeholder: impl Into<String>) -> Self {
        Self {
            placeholder: Some(placeholder.into()),
            ..self
        }
    }

    /// Put this symbol under a labeled group in usage messages
    #[must_use]
    pub fn group(self, group: impl Into<String>) -> Self {
        Self {
            group: Some(group.into()),
            ..self
        }
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    /// The name this symbol's values are bound to
    #[inline]
    #[must_use]
    pub fn binding(&self) -> &str {
        &self.binding
    }

    #[inline]
    #[must_use]
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    #[inline]
    #[must_use]
    pub fn arity_range(&self) -> Arity {
        self.arity
    }

    #[inline]
    #[must_use]
    pub fn visibility(&self) -> Scope {
        self.scope
    }

    #[inline]
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    #[inline]
    #[must_use]
    pub fn explicit_precedence(&self) -> Option<usize> {
        self.precedence
    }

    pub(crate) fn converter(&self) -> Option<&Converter> {
        self.converter.as_ref()
    }

    pub(crate) fn default_value_of(&self) -> Option<Value> {
        self.default.as_ref().map(|default| default())
    }

    #[inline]
    #[must_use]
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub(crate) fn validators(&self) -> &[Arc<dyn Validate>] {
        &self.validators
    }

    #[inline]
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn group_label(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// The placeholder used for this symbol's values in messages, like
    /// `USER-ID`
    #[must_use]
    pub fn value_placeholder(&self) -> String {
        match self.placeholder {
            Some(ref placeholder) => placeholder.clone(),
            None => self.binding.to_uppercase().replace('_', "-"),
        }
    }

    /// Check if an identifier token refers to this symbol
    #[must_use]
    pub fn matches(&self, token: &Token) -> bool {
        self.tags.iter().any(|tag| tag.matches(token))
    }

    #[must_use]
    pub fn matches_short(&self, short: char) -> bool {
        self.tags.contains(&Tag::Short(short))
    }

    /// A detached description of this symbol, for use in error messages
    #[must_use]
    pub fn label(&self) -> SymbolLabel {
        SymbolLabel {
            binding: self.binding.clone(),
            kind: self.kind,
            tags: self.tags.clone(),
            placeholder: self.value_placeholder(),
        }
    }
}

impl Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Symbol")
            .field("kind", &self.kind)
            .field("binding", &self.binding)
            .field("tags", &self.tags)
            .field("arity", &self.arity)
            .field("scope", &self.scope)
            .field("value_type", &self.value_type.name())
            .field("default", &self.default.is_some())
            .field("validators", &self.validators.len())
            .finish_non_exhaustive()
    }
}

/// An owned description of a symbol, carried by errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolLabel {
    pub binding: String,
    pub kind: SymbolKind,
    pub tags: Vec<Tag>,
    pub placeholder: String,
}

impl Display for SymbolLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tags.as_slice() {
            [] => write!(f, "<{}>", self.placeholder),
            tags => write!(f, "{}", tags.iter().join_with("/")),
        }
    }
}
