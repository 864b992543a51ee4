#![cfg_attr(not(test), no_std)]

/*!
Low-level tokenizing of command-line arguments. Takes care of distinguishing
identifiers (`--name`, `-n`), operands, `[directives]`, and the `--`
terminator, and of decomposing each one into spans. No knowledge of the
declared commands or options lives here, and no type handling happens here.
Usually this is too low level to use directly.

Tokens are owned, because the stream gets rewritten after the fact: response
files splice new tokens in, and directives get pulled out. The [`TokenList`]
supports those rewrites without shifting the rest of the list around.
*/

extern crate alloc;

mod list;
pub mod split;
mod syntax;
mod token;
mod tokenizer;

pub use list::{Iter, NodeId, TokenList};
pub use syntax::{Assignment, DirectiveSyntax, Prefix, Span, Syntax};
pub use token::{Directive, Token, TokenKind};
pub use tokenizer::Tokenizer;
