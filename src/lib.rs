/*!
A command-line routing and model-binding engine. `parley` takes the raw
arguments of a process, finds the (possibly nested) command they're aimed
at, converts and validates each option and argument into a typed value,
builds your model type from them, and hands it to your handler.

An application is declared with a [`CommandLineBuilder`]: a tree of
commands, each with the [`Symbol`]s it accepts (switches, options, and
positional arguments) and, for invokable commands, a [`Model`] type and a
handler for it. [`#[derive(Model)]`][derive@Model] writes the symbols and the
model construction for a struct; [`#[derive(Value)]`][derive@Value] makes a
unit enum parsable from its kebab-case variant names.

Beyond ordinary `--name value` arguments, a command line may contain:

- `@`-style response files, written as `[@path]`, whose contents are spliced
  into the arguments in place;
- directives like `[parse]`, which are removed from the arguments and exposed
  on the [`CallSite`];
- a `--` terminator, after which everything is positional.

The `parley-demo` crate in this workspace is a complete application.
*/

extern crate self as parley;

pub mod argument_syntax;
pub mod bind;
pub mod call_site;
pub mod command;
pub mod convert;
mod diagram;
pub mod directives;
pub mod errors;
pub mod expand;
pub mod help;
pub mod lookup;
pub mod model;
pub mod options;
pub mod pipeline;
mod printers;
pub mod resolve;
pub mod route;
pub mod symbol;
pub mod validate;

pub use call_site::{CallSite, CallSiteKind, IntoExitCode};
pub use command::{Command, CommandBuilder, CommandId, CommandTree};
pub use convert::{ConverterRegistry, UnknownVariant};
pub use errors::{ConfigError, Error, Failure};
pub use model::{Bindings, Model, Origin};
pub use options::{CliOptions, RouteMatching, UnknownIdentifiers};
pub use parley_derive::{Model, Value};
pub use parley_parser::{Token, TokenKind, Tokenizer};
pub use pipeline::{CommandLine, CommandLineBuilder};
pub use printers::{print_failure, print_handler_error, print_internal};
pub use route::RoutePath;
pub use symbol::{Arity, Scope, Symbol, Tag};
pub use validate::{Validate, ValidatorRegistry};
