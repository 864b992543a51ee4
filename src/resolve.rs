/*!
Selecting the command an invocation refers to, from its leading operands.
*/

use parley_parser::{Token, TokenKind};
use tracing::debug;

use crate::{
    command::{CommandId, CommandTree},
    errors::ResolutionError,
    route::RouteTable,
};

/// The command selected by an invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub command: CommandId,

    /// How many leading tokens named the command
    pub consumed: usize,
}

/**
Walk the tree from the root, descending into a child for each leading
operand that names one. Stops at the first token that isn't an operand
naming a child of the current command. Never fails; whether the result is
invokable is checked separately.
*/
#[must_use]
pub fn walk(tree: &CommandTree, tokens: &[Token]) -> Resolution {
    let mut command = CommandId::ROOT;
    let mut consumed = 0;

    for token in tokens {
        if token.kind() != TokenKind::Operand {
            break;
        }

        match tree.child(command, token.text()) {
            Some(child) => {
                command = child;
                consumed += 1;
            }
            None => break,
        }
    }

    debug!(command = %tree.display_name(command), consumed, "resolved by walking");
    Resolution { command, consumed }
}

/// Select a command by matching the leading operands against route
/// patterns. Falls back to the root if nothing matches.
pub fn by_pattern(
    tree: &CommandTree,
    routes: &RouteTable,
    tokens: &[Token],
) -> Result<Resolution, ResolutionError> {
    let operands: Vec<&str> = tokens
        .iter()
        .take_while(|token| token.kind() == TokenKind::Operand)
        .map(Token::text)
        .collect();

    let resolution = match routes.best_match(tree, &operands)? {
        Some(found) => Resolution {
            command: found.command,
            consumed: found.consumed,
        },
        None => Resolution {
            command: CommandId::ROOT,
            consumed: 0,
        },
    };

    debug!(
        command = %tree.display_name(resolution.command),
        consumed = resolution.consumed,
        "resolved by pattern"
    );

    Ok(resolution)
}
