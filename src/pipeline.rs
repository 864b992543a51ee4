/*!
The binding pipeline: from raw arguments to a [`CallSite`].

Each invocation runs these stages in order. Any stage may end the invocation
early with a terminal call site:

1. Tokenize, expand response files, and remove directives. Errors found here
   are kept and reported with the rest.
2. Resolve the command, by walking the tree or by route pattern. An
   ambiguous route ends the invocation.
3. If a help tag appears before the terminator, render help for the resolved
   command.
4. Under a panic guard: check that the command is invokable, match tokens to
   its symbols, then convert and validate their values. A `[parse]`
   directive ends the invocation here with a diagram. If nothing has failed,
   the model is built.
5. Unmatched tokens become errors. Any errors at all end the invocation with
   a single [`Failure`].
6. The handler for the model's type is closed over the model.
*/

use std::panic::{AssertUnwindSafe, catch_unwind};

use parley_parser::{Token, TokenKind};
use tracing::{debug, warn};

use crate::{
    bind::bind,
    call_site::{CallSite, HandlerRegistry, IntoExitCode, Target, panic_message},
    command::{CommandBuilder, CommandTree},
    diagram,
    directives,
    errors::{ConfigError, Error, Failure, ParseError, ResolutionError},
    expand,
    help::HelpPage,
    lookup::lookup,
    model::Model,
    options::{CliOptions, RouteMatching},
    printers::error_lines,
    resolve::{self, Resolution},
    route::RouteTable,
};

/// Declares the commands of an application, with a handler for each
/// invokable one.
#[derive(Debug)]
pub struct CommandLineBuilder {
    root: CommandBuilder,
    options: CliOptions,
    handlers: HandlerRegistry,
}

impl CommandLineBuilder {
    /// Start an application. `name` is the root command's name, used in
    /// usage messages and reports.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            root: CommandBuilder::new(name),
            options: CliOptions::default(),
            handlers: HandlerRegistry::default(),
        }
    }

    #[must_use]
    pub fn with_options(self, options: CliOptions) -> Self {
        Self { options, ..self }
    }

    /// Configure the root command: its description, its own symbols and
    /// model, and so on.
    #[must_use]
    pub fn root(self, build: impl FnOnce(CommandBuilder) -> CommandBuilder) -> Self {
        Self {
            root: build(self.root),
            ..self
        }
    }

    /// Add a subcommand of the root
    #[must_use]
    pub fn command(
        self,
        name: impl Into<String>,
        build: impl FnOnce(CommandBuilder) -> CommandBuilder,
    ) -> Self {
        Self {
            root: self.root.command(name, build),
            ..self
        }
    }

    /// Register the handler for every command whose model is `M`. Its return
    /// value becomes the exit code.
    #[must_use]
    pub fn handler<M, R, F>(mut self, handler: F) -> Self
    where
        M: Model,
        R: IntoExitCode,
        F: Fn(M) -> R + Send + Sync + 'static,
    {
        self.handlers.insert(handler);
        self
    }

    /// Register an async handler for every command whose model is `M`
    #[must_use]
    pub fn async_handler<M, Fut, F>(mut self, handler: F) -> Self
    where
        M: Model,
        F: Fn(M) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: IntoExitCode,
    {
        self.handlers.insert_async(handler);
        self
    }

    /// Check the declarations and produce a [`CommandLine`]. Every
    /// invokable command must have a handler for its model.
    pub fn build(self) -> Result<CommandLine, ConfigError> {
        let tree = CommandTree::build(self.root, &self.options.converters)?;

        for (id, command) in tree.iter() {
            if let Some(model) = command.model()
                && !self.handlers.contains(model.type_id)
            {
                return Err(ConfigError::MissingHandler {
                    command: tree.display_name(id),
                    type_name: model.type_name,
                });
            }
        }

        let routes = match self.options.route_matching {
            RouteMatching::Tree => None,
            RouteMatching::Pattern => Some(RouteTable::from_tree(&tree)?),
        };

        debug!(
            app = tree.root().name(),
            commands = tree.iter().count(),
            "command line built"
        );

        Ok(CommandLine {
            tree,
            options: self.options,
            handlers: self.handlers,
            routes,
        })
    }
}

/**
A fully configured application. It's immutable, and can be shared between
threads; each call to [`resolve`][Self::resolve] is independent.
*/
#[derive(Debug)]
pub struct CommandLine {
    tree: CommandTree,
    options: CliOptions,
    handlers: HandlerRegistry,
    routes: Option<RouteTable>,
}

impl CommandLine {
    #[inline]
    #[must_use]
    pub fn tree(&self) -> &CommandTree {
        &self.tree
    }

    #[inline]
    #[must_use]
    pub fn options(&self) -> &CliOptions {
        &self.options
    }

    /// Run the arguments (not including the program name) through the
    /// pipeline. Nothing is printed and no handler runs until the call site
    /// is invoked.
    pub fn resolve<I>(&self, args: I) -> CallSite
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let tokenizer = &self.options.tokenizer;
        let mut tokens = tokenizer.tokenize(args);
        let mut errors: Vec<Error> = Vec::new();

        if self.options.response_files {
            let (expanded, problems) = expand::expand(
                &mut tokens,
                tokenizer,
                &*self.options.loader,
                self.options.max_expansion_depth,
            );
            errors.extend(problems.into_iter().map(Error::from));

            // Renumber, so positions follow the expanded order. Operands stay
            // operands: a quoted terminator from a file is still text.
            if expanded {
                tokens = tokens
                    .into_vec()
                    .into_iter()
                    .enumerate()
                    .map(|(position, token)| match token.kind() {
                        TokenKind::Operand => Token::operand(token.into_text(), position),
                        _ => tokenizer.token(token.into_text(), position),
                    })
                    .collect();
            }
        }

        let (directives, problems) = directives::dequeue(&mut tokens, &self.options);
        errors.extend(problems.into_iter().map(Error::from));
        let tokens = tokens.into_vec();

        debug!(
            tokens = tokens.len(),
            directives = directives.iter().count(),
            errors = errors.len(),
            "preprocessed arguments"
        );

        let resolution = match self.routes {
            None => resolve::walk(&self.tree, &tokens),
            Some(ref routes) => match resolve::by_pattern(&self.tree, routes, &tokens) {
                Ok(resolution) => resolution,
                Err(error) => {
                    errors.push(error.into());
                    let command = self.tree.root().name().to_owned();
                    let target = self.failure(&command, errors);
                    return CallSite::new(command, directives, target);
                }
            },
        };

        let command = self.tree.display_name(resolution.command);
        let rest = &tokens[resolution.consumed..];

        if self.wants_help(rest) {
            debug!(command = %command, "help requested");
            let page = HelpPage::new(&self.tree, resolution.command);
            let target = Target::Help {
                text: self.options.help.render(&page),
                exit_code: self.options.help_exit_code,
            };
            return CallSite::new(command, directives, target);
        }

        let show_diagram = self.options.parse_directive && directives.contains("parse");

        let target = catch_unwind(AssertUnwindSafe(|| {
            self.bind(&command, resolution, rest, errors, show_diagram)
        }))
        .unwrap_or_else(|payload| {
            let message = panic_message(&*payload);
            warn!(command = %command, %message, "caught a panic while binding");
            Target::Internal {
                message,
                exit_code: self.options.internal_error_exit_code,
            }
        });

        CallSite::new(command, directives, target)
    }

    /// Resolve the arguments and invoke the call site, returning its exit
    /// code.
    pub fn run<I>(&self, args: I) -> i32
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.resolve(args).invoke()
    }

    /// Like [`run`][Self::run], but awaiting an async handler instead of
    /// blocking on it.
    pub async fn run_async<I>(&self, args: I) -> i32
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.resolve(args).invoke_async().await
    }

    fn wants_help(&self, tokens: &[Token]) -> bool {
        tokens
            .iter()
            .take_while(|token| token.kind() != TokenKind::Terminator)
            .filter(|token| token.kind() == TokenKind::Identifier)
            .any(|token| self.options.help_tags.iter().any(|tag| tag.matches(token)))
    }

    fn failure(&self, command: &str, errors: Vec<Error>) -> Target {
        debug!(command, errors = %error_lines(&errors), "invocation failed");

        Target::Failure {
            failure: Failure::new(command, errors),
            exit_code: self.options.failure_exit_code,
            help_tag: self.options.help_tags.first().cloned(),
        }
    }

    fn bind(
        &self,
        command: &str,
        resolution: Resolution,
        tokens: &[Token],
        mut errors: Vec<Error>,
        show_diagram: bool,
    ) -> Target {
        let id = resolution.command;

        let Some(factory) = self.tree[id].model() else {
            let error = match tokens.iter().find(|token| token.kind() == TokenKind::Operand) {
                Some(token) => ResolutionError::UnknownCommand {
                    command: command.to_owned(),
                    unexpected: token.text().to_owned(),
                },
                None => ResolutionError::MissingSubcommand {
                    command: command.to_owned(),
                    available: self.tree.subcommand_names(id),
                },
            };

            errors.push(error.into());
            return self.failure(command, errors);
        };

        let parsed = lookup(tokens, self.tree.aggregate(id), self.options.unknown_identifiers);
        let (mut bindings, bind_errors) =
            bind(&parsed, &self.options.converters, &self.options.validators);

        debug!(
            command,
            parse_errors = parsed.errors().len(),
            bind_errors = bind_errors.len(),
            unmatched = parsed.unmatched().len(),
            "bound values"
        );

        if show_diagram {
            let failed: Vec<&str> = parsed
                .errors()
                .iter()
                .filter_map(ParseError::symbol)
                .chain(bind_errors.iter().map(|error| error.symbol()))
                .map(|label| label.binding.as_str())
                .collect();

            return Target::Diagram {
                text: diagram::render(command, &parsed, &failed),
                exit_code: self.options.help_exit_code,
            };
        }

        let (parse_errors, unmatched) = parsed.into_errors();
        errors.extend(parse_errors.into_iter().map(Error::from));
        errors.extend(bind_errors.into_iter().map(Error::from));

        let model = match errors.is_empty() {
            false => None,
            true => match (factory.build)(&mut bindings) {
                Ok(model) => Some(model),
                Err(error) => {
                    errors.push(error.into());
                    None
                }
            },
        };

        errors.extend(unmatched.into_iter().map(|token| {
            Error::from(ParseError::UnmatchedArgument {
                position: token.position(),
                token: token.into_text(),
            })
        }));

        let model = match model {
            Some(model) if errors.is_empty() => model,
            _ => return self.failure(command, errors),
        };

        match self.handlers.prepare(model) {
            Some(invocable) => {
                debug!(command, model = factory.type_name, "ready to invoke");
                Target::Invoke(invocable)
            }
            None => self.failure(
                command,
                vec![Error::from(ResolutionError::NoHandler {
                    command: command.to_owned(),
                    type_name: factory.type_name,
                })],
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{call_site::CallSiteKind, symbol::Symbol};

    fn app() -> CommandLine {
        CommandLineBuilder::new("app")
            .command("status", |status| {
                status
                    .symbol(Symbol::switch("short").long("short").short('s'))
                    .model::<()>()
            })
            .command("remote", |remote| {
                remote.command("add", |add| add.model::<()>())
            })
            .handler(|()| 5)
            .build()
            .unwrap()
    }

    #[test]
    fn invokes_the_handler() {
        let site = app().resolve(["status", "-s"]);
        assert_eq!(site.command(), "app status");
        assert_eq!(site.kind(), CallSiteKind::Invoke);
        assert_eq!(site.invoke_with(&mut Vec::new(), &mut Vec::new()), 5);
    }

    #[test]
    fn routing_nodes_need_a_subcommand() {
        let site = app().resolve(["remote"]);
        let failure = site.failure().unwrap();

        assert!(matches!(
            failure.errors(),
            [Error::Resolution(ResolutionError::MissingSubcommand { available, .. })]
                if available == &["add"]
        ));
        assert_eq!(site.exit_code(), Some(1));

        let site = app().resolve(["remote", "bogus"]);
        assert!(matches!(
            site.failure().unwrap().errors(),
            [Error::Resolution(ResolutionError::UnknownCommand { unexpected, .. })]
                if unexpected == "bogus"
        ));
    }

    #[test]
    fn missing_handler_is_a_config_error() {
        let error = CommandLineBuilder::new("app")
            .command("status", |status| status.model::<()>())
            .build()
            .unwrap_err();

        assert!(matches!(error, ConfigError::MissingHandler { ref command, .. } if command == "app status"));
    }

    #[test]
    fn help_short_circuits() {
        let site = app().resolve(["status", "--bogus", "--help"]);
        assert_eq!(site.kind(), CallSiteKind::Help);
        assert_eq!(site.exit_code(), Some(0));
        assert!(site.help_text().unwrap().contains("app status"));

        let site = app().resolve(["status", "--", "--help"]);
        assert_eq!(site.kind(), CallSiteKind::Failure);
    }

    #[test]
    fn unmatched_tokens_fail() {
        let site = app().resolve(["status", "extra"]);
        assert!(matches!(
            site.failure().unwrap().errors(),
            [Error::Parse(ParseError::UnmatchedArgument { token, position: 1 })] if token == "extra"
        ));
    }
}
