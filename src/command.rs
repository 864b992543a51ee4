/*!
The command tree: an arena of commands, each with its names, its declared
symbols, and (if it can be invoked) the model it binds to.
*/

use std::{
    collections::{HashMap, HashSet},
    ops::Index,
};

use tracing::{debug, trace};

use crate::{
    convert::ConverterRegistry,
    errors::ConfigError,
    model::{Model, ModelFactory},
    route::RoutePath,
    symbol::{Scope, Symbol, SymbolKind, Tag},
};

/// The index of a command in a [`CommandTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(usize);

impl CommandId {
    pub const ROOT: Self = Self(0);
}

#[derive(Debug)]
pub struct Command {
    name: String,
    aliases: Vec<String>,
    description: Option<String>,
    parent: Option<CommandId>,
    children: Vec<CommandId>,
    symbols: Vec<Symbol>,
    model: Option<ModelFactory>,
    route_patterns: Vec<String>,
    path: RoutePath,
}

impl Command {
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// The primary name, followed by every alias
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    #[must_use]
    pub fn answers_to(&self, name: &str) -> bool {
        self.names().any(|candidate| candidate == name)
    }

    #[inline]
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<CommandId> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[CommandId] {
        &self.children
    }

    /// The symbols declared directly on this command
    #[inline]
    #[must_use]
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    #[inline]
    #[must_use]
    pub fn path(&self) -> &RoutePath {
        &self.path
    }

    /// A command is invokable if it has a model to bind to
    #[inline]
    #[must_use]
    pub fn is_invokable(&self) -> bool {
        self.model.is_some()
    }

    pub(crate) fn model(&self) -> Option<&ModelFactory> {
        self.model.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn route_patterns(&self) -> &[String] {
        &self.route_patterns
    }
}

/**
All of the commands of an application. The root is always present, at
[`CommandId::ROOT`]; every other command has exactly one parent.
*/
#[derive(Debug)]
pub struct CommandTree {
    commands: Vec<Command>,
}

impl Index<CommandId> for CommandTree {
    type Output = Command;

    fn index(&self, id: CommandId) -> &Command {
        &self.commands[id.0]
    }
}

impl CommandTree {
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Command {
        &self[CommandId::ROOT]
    }

    #[must_use]
    pub fn get(&self, id: CommandId) -> Option<&Command> {
        self.commands.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (CommandId, &Command)> {
        self.commands
            .iter()
            .enumerate()
            .map(|(index, command)| (CommandId(index), command))
    }

    /// Find a direct child of `parent` by name or alias
    #[must_use]
    pub fn child(&self, parent: CommandId, name: &str) -> Option<CommandId> {
        self[parent]
            .children
            .iter()
            .copied()
            .find(|&child| self[child].answers_to(name))
    }

    /// Find a command by its canonical path
    #[must_use]
    pub fn find(&self, path: &RoutePath) -> Option<CommandId> {
        path.segments()
            .iter()
            .try_fold(CommandId::ROOT, |id, segment| self.child(id, segment))
    }

    /// The ancestors of a command, nearest first, excluding the command
    /// itself
    pub fn ancestors(&self, id: CommandId) -> impl Iterator<Item = CommandId> + '_ {
        std::iter::successors(self[id].parent, |&id| self[id].parent)
    }

    /// The full name of a command, including the application name, like
    /// `app remote add`
    #[must_use]
    pub fn display_name(&self, id: CommandId) -> String {
        let command = &self[id];

        match command.path.is_root() {
            true => command.name.clone(),
            false => format!("{} {}", self.root().name, command.path),
        }
    }

    /**
    Every symbol visible to a command: the descendant-scoped symbols of its
    ancestors, outermost first, followed by the command's own symbols. When
    two visible symbols share a binding name, the one declared nearest to the
    command replaces the other in place.
    */
    #[must_use]
    pub fn aggregate(&self, id: CommandId) -> Vec<&Symbol> {
        let mut chain: Vec<CommandId> = self.ancestors(id).collect();
        chain.reverse();

        let inherited = chain.into_iter().flat_map(|ancestor| {
            self[ancestor]
                .symbols
                .iter()
                .filter(|symbol| symbol.visibility() == Scope::Descendant)
        });

        let mut visible: Vec<&Symbol> = Vec::new();

        for symbol in inherited.chain(self[id].symbols.iter()) {
            match visible
                .iter_mut()
                .find(|existing| existing.binding() == symbol.binding())
            {
                Some(existing) => *existing = symbol,
                None => visible.push(symbol),
            }
        }

        visible
    }

    /// Build a tree from a root builder, checking it for consistency.
    pub fn build(
        root: CommandBuilder,
        converters: &ConverterRegistry,
    ) -> Result<Self, ConfigError> {
        let mut tree = Self {
            commands: Vec::new(),
        };

        tree.insert(root, None, RoutePath::root())?;

        for (id, _) in tree.iter() {
            tree.check_symbols(id, converters)?;
        }

        debug!(commands = tree.commands.len(), "built command tree");

        Ok(tree)
    }

    fn insert(
        &mut self,
        builder: CommandBuilder,
        parent: Option<CommandId>,
        path: RoutePath,
    ) -> Result<CommandId, ConfigError> {
        let id = CommandId(self.commands.len());

        let mut seen: HashSet<&str> = HashSet::new();
        for child in &builder.children {
            for name in std::iter::once(&child.name).chain(&child.aliases) {
                if !seen.insert(name) {
                    return Err(ConfigError::DuplicateCommand {
                        parent: match parent {
                            None => builder.name.clone(),
                            Some(parent) => {
                                format!("{} {}", self.display_name(parent), builder.name)
                            }
                        },
                        name: name.clone(),
                    });
                }
            }
        }

        trace!(
            path = %path,
            symbols = builder.symbols.len(),
            invokable = builder.model.is_some(),
            "registering command"
        );

        self.commands.push(Command {
            name: builder.name,
            aliases: builder.aliases,
            description: builder.description,
            parent,
            children: Vec::new(),
            symbols: builder.symbols,
            model: builder.model,
            route_patterns: builder.route_patterns,
            path: path.clone(),
        });

        for child in builder.children {
            let child_path = path.child(child.name.clone());
            let child_id = self.insert(child, Some(id), child_path)?;
            self.commands[id.0].children.push(child_id);
        }

        Ok(id)
    }

    fn check_symbols(&self, id: CommandId, converters: &ConverterRegistry) -> Result<(), ConfigError> {
        let command = || self.display_name(id);

        let mut bindings: HashSet<&str> = HashSet::new();
        for symbol in &self[id].symbols {
            if !bindings.insert(symbol.binding()) {
                return Err(ConfigError::DuplicateBinding {
                    command: command(),
                    binding: symbol.binding().to_owned(),
                });
            }
        }

        let mut tags: HashMap<&Tag, &str> = HashMap::new();

        for symbol in self.aggregate(id) {
            let arity = symbol.arity_range();
            let binding = || symbol.binding().to_owned();

            if !arity.is_valid() {
                return Err(ConfigError::InvalidArity {
                    command: command(),
                    binding: binding(),
                    arity,
                });
            }

            if symbol.kind() != SymbolKind::Switch
                && symbol.converter().is_none()
                && !converters.contains(symbol.value_type().id())
            {
                return Err(ConfigError::MissingConverter {
                    command: command(),
                    binding: binding(),
                    type_name: symbol.value_type().name(),
                });
            }

            for tag in symbol.tags() {
                if tag.is_empty() {
                    return Err(ConfigError::EmptyTag {
                        command: command(),
                        binding: binding(),
                    });
                }

                if let Some(first) = tags.insert(tag, symbol.binding()) {
                    return Err(ConfigError::DuplicateTag {
                        command: command(),
                        tag: tag.clone(),
                        first: first.to_owned(),
                        second: binding(),
                    });
                }
            }
        }

        Ok(())
    }

    /// A short listing of a command's subcommands, for error messages
    pub(crate) fn subcommand_names(&self, id: CommandId) -> Vec<String> {
        self[id]
            .children
            .iter()
            .map(|&child| self[child].name.clone())
            .collect()
    }
}

/**
Declares a command and, recursively, its subcommands.

```
use parley::{CommandBuilder, Symbol};

let remote = CommandBuilder::new("remote")
    .symbol(Symbol::switch("verbose").long("verbose").short('v'))
    .command("add", |add| add.alias("new").model::<()>());
```
*/
#[derive(Debug)]
pub struct CommandBuilder {
    name: String,
    aliases: Vec<String>,
    description: Option<String>,
    symbols: Vec<Symbol>,
    model: Option<ModelFactory>,
    route_patterns: Vec<String>,
    children: Vec<CommandBuilder>,
}

impl CommandBuilder {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            description: None,
            symbols: Vec::new(),
            model: None,
            route_patterns: Vec::new(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    #[must_use]
    pub fn describe(self, description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..self
        }
    }

    /// Declare a symbol on this command
    #[must_use]
    pub fn symbol(mut self, symbol: Symbol) -> Self {
        self.symbols.push(symbol);
        self
    }

    /// Make this command invokable, binding to `M`. The model's symbols are
    /// declared on this command, after any already declared.
    #[must_use]
    pub fn model<M: Model>(mut self) -> Self {
        self.symbols.extend(M::symbols());
        self.model = Some(ModelFactory::of::<M>());
        self
    }

    /// Match this command with a regular expression, when routes are matched
    /// by pattern. The pattern is matched against the leading operands,
    /// joined with single spaces.
    #[must_use]
    pub fn route_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.route_patterns.push(pattern.into());
        self
    }

    /// Add a subcommand
    #[must_use]
    pub fn command(
        self,
        name: impl Into<String>,
        build: impl FnOnce(CommandBuilder) -> CommandBuilder,
    ) -> Self {
        self.subcommand(build(CommandBuilder::new(name)))
    }

    #[must_use]
    pub fn subcommand(mut self, command: CommandBuilder) -> Self {
        self.children.push(command);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Arity;

    fn tree(root: CommandBuilder) -> Result<CommandTree, ConfigError> {
        CommandTree::build(root, &ConverterRegistry::new())
    }

    fn sample() -> CommandTree {
        tree(
            CommandBuilder::new("app")
                .symbol(
                    Symbol::option::<String>("verbosity")
                        .long("verbosity")
                        .default_value(String::from("minimal"))
                        .scope(Scope::Descendant),
                )
                .symbol(Symbol::switch("version").long("version"))
                .command("remote", |remote| {
                    remote
                        .symbol(Symbol::option::<String>("name").long("name").scope(Scope::Descendant))
                        .command("add", |add| {
                            add.alias("new")
                                .symbol(Symbol::switch("verbosity").short('v'))
                                .model::<()>()
                        })
                }),
        )
        .unwrap()
    }

    #[test]
    fn find_by_path_and_alias() {
        let tree = sample();

        let add = tree.find(&RoutePath::new("remote add")).unwrap();
        assert_eq!(tree.find(&RoutePath::new("remote new")), Some(add));
        assert_eq!(tree[add].path(), &RoutePath::new("remote add"));
        assert_eq!(tree.display_name(add), "app remote add");
        assert!(tree[add].is_invokable());
        assert!(tree.find(&RoutePath::new("add")).is_none());
    }

    #[test]
    fn aggregation_includes_descendant_scoped_ancestors() {
        let tree = sample();
        let remote = tree.find(&RoutePath::new("remote")).unwrap();
        let add = tree.find(&RoutePath::new("remote add")).unwrap();

        let bindings: Vec<&str> = tree.aggregate(remote).iter().map(|s| s.binding()).collect();
        assert_eq!(bindings, ["verbosity", "name"]);

        // The nearer `verbosity` switch replaces the root's option in place
        let visible = tree.aggregate(add);
        let bindings: Vec<&str> = visible.iter().map(|s| s.binding()).collect();
        assert_eq!(bindings, ["verbosity", "name"]);
        assert_eq!(visible[0].kind(), SymbolKind::Switch);
    }

    #[test]
    fn duplicate_subcommands() {
        let result = tree(
            CommandBuilder::new("app")
                .command("connect", |c| c.alias("c"))
                .command("copy", |c| c.alias("c")),
        );

        assert!(matches!(
            result,
            Err(ConfigError::DuplicateCommand { ref name, .. }) if name == "c"
        ));
    }

    #[test]
    fn duplicate_tags_across_scopes() {
        let result = tree(
            CommandBuilder::new("app")
                .symbol(Symbol::switch("verbose").short('v').scope(Scope::Descendant))
                .command("run", |run| run.symbol(Symbol::switch("version").short('v'))),
        );

        assert!(matches!(
            result,
            Err(ConfigError::DuplicateTag { ref first, ref second, .. })
                if first == "verbose" && second == "version"
        ));
    }

    #[test]
    fn missing_converter() {
        struct Opaque;

        let result = tree(CommandBuilder::new("app").symbol(Symbol::option::<Opaque>("thing").long("thing")));
        assert!(matches!(result, Err(ConfigError::MissingConverter { .. })));
    }

    #[test]
    fn invalid_arity() {
        let result = tree(
            CommandBuilder::new("app")
                .symbol(Symbol::argument::<String>("x").arity(Arity::new(2, 1))),
        );
        assert!(matches!(result, Err(ConfigError::InvalidArity { .. })));
    }
}
