/*!
Matching tokens to the symbols visible to a command.

Lookup is purely structural: it finds the raw text belonging to each symbol
and checks arities, but it doesn't convert anything. The rules are:

- An identifier is looked up by tag. `--name` only matches long tags; `-n`
  matches a short tag, and `-name` matches a long tag or else a cluster of
  short switches (`-abc` is `-a -b -c`).
- A switch takes an attached `:true` or `:false`, and nothing else.
- An option takes an attached parameter if there is one; otherwise it takes
  following operands, up to its maximum arity. It never reaches past the
  terminator, or past another identifier.
- An identifier that matches nothing, but which reads as a number (like
  `-5` or `-1.5e3`), is an operand, and can be an option's value.
- Operands that weren't taken by an option are distributed to positional
  arguments in precedence order. Each argument gets at least its minimum and
  up to its maximum, leaving enough for the minimums of the arguments after
  it.
- Anything left over is unmatched.
*/

use std::sync::OnceLock;

use parley_parser::{Prefix, Token, TokenKind};
use regex::Regex;
use tracing::trace;

use crate::{
    convert::parse_bool,
    errors::{ArityViolation, ParseError},
    options::UnknownIdentifiers,
    symbol::{Symbol, SymbolKind},
};

/// The raw text matched to a single symbol
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matched {
    /// The raw values, in command-line order. For switches, this holds
    /// `"true"` or `"false"` for each occurrence.
    pub values: Vec<String>,

    /// How many times the symbol's tags appeared
    pub occurrences: usize,

    /// The text of every token that was attributed to this symbol
    pub tokens: Vec<String>,
}

impl Matched {
    #[inline]
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.occurrences > 0 || !self.values.is_empty()
    }
}

/// The outcome of matching tokens against a command's symbols
#[derive(Debug)]
pub struct ParseResult<'t> {
    symbols: Vec<&'t Symbol>,
    matched: Vec<Matched>,
    errors: Vec<ParseError>,
    unmatched: Vec<Token>,
}

impl<'t> ParseResult<'t> {
    /// Every symbol, with whatever was matched to it
    pub fn iter(&self) -> impl Iterator<Item = (&'t Symbol, &Matched)> + '_ {
        self.symbols.iter().copied().zip(&self.matched)
    }

    #[must_use]
    pub fn get(&self, binding: &str) -> Option<&Matched> {
        self.symbols
            .iter()
            .position(|symbol| symbol.binding() == binding)
            .map(|index| &self.matched[index])
    }

    #[inline]
    #[must_use]
    pub fn symbols(&self) -> &[&'t Symbol] {
        &self.symbols
    }

    #[inline]
    #[must_use]
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Tokens that weren't attributed to any symbol
    #[inline]
    #[must_use]
    pub fn unmatched(&self) -> &[Token] {
        &self.unmatched
    }

    pub(crate) fn into_errors(self) -> (Vec<ParseError>, Vec<Token>) {
        (self.errors, self.unmatched)
    }
}

enum Found {
    Symbol(usize),
    Cluster(Vec<usize>),
    Nothing,
}

struct Lookup<'t> {
    symbols: Vec<&'t Symbol>,
    matched: Vec<Matched>,
    errors: Vec<ParseError>,
    unmatched: Vec<Token>,

    // Symbols that already reported a missing parameter; they don't also
    // report an unmet minimum.
    incomplete: Vec<bool>,
}

impl<'t> Lookup<'t> {
    fn find(&self, token: &Token) -> Found {
        if let Some(index) = self.symbols.iter().position(|symbol| symbol.matches(token)) {
            return Found::Symbol(index);
        }

        let Some(cluster) = token.short_cluster() else {
            return Found::Nothing;
        };

        let switches: Option<Vec<usize>> = cluster
            .map(|short| {
                self.symbols.iter().position(|symbol| {
                    symbol.kind() == SymbolKind::Switch && symbol.matches_short(short)
                })
            })
            .collect();

        match switches {
            Some(switches) => Found::Cluster(switches),
            None => Found::Nothing,
        }
    }

    fn switch(&mut self, index: usize, token: &Token) {
        let value = match token.parameter() {
            None => Some(true),
            Some(parameter) => match parse_bool(parameter) {
                Ok(value) => Some(value),
                Err(_) => {
                    self.errors.push(ParseError::InvalidSwitchParameter {
                        symbol: self.symbols[index].label(),
                        parameter: parameter.to_owned(),
                    });
                    None
                }
            },
        };

        let matched = &mut self.matched[index];
        matched.occurrences += 1;
        matched.tokens.push(token.text().to_owned());

        if let Some(value) = value {
            matched.values.push(value.to_string());
        }
    }

    fn option<'a>(
        &mut self,
        index: usize,
        token: &Token,
        rest: &mut std::iter::Peekable<impl Iterator<Item = &'a Token>>,
    ) {
        let symbol = self.symbols[index];
        let symbols = &self.symbols;
        let matched = &mut self.matched[index];
        matched.occurrences += 1;
        matched.tokens.push(token.text().to_owned());

        if let Some(parameter) = token.parameter() {
            matched.values.push(parameter.to_owned());
            return;
        }

        // Always take at least one value, so that a repeated option reports
        // an exceeded maximum instead of leaving its value unmatched.
        let limit = symbol
            .arity_range()
            .max
            .saturating_sub(matched.values.len())
            .max(1);

        let mut taken = 0;
        while taken < limit {
            let Some(operand) = rest.next_if(|next| is_value(symbols, next)) else {
                break;
            };

            matched.values.push(operand.text().to_owned());
            matched.tokens.push(operand.text().to_owned());
            taken += 1;
        }

        if taken == 0 {
            self.errors.push(ParseError::MissingParameter {
                symbol: symbol.label(),
            });
            self.incomplete[index] = true;
        }
    }

    fn arguments(&mut self, operands: Vec<&Token>) {
        let mut arguments: Vec<(usize, usize)> = self
            .symbols
            .iter()
            .enumerate()
            .filter(|(_, symbol)| symbol.kind() == SymbolKind::Argument)
            .enumerate()
            .map(|(order, (index, symbol))| {
                (symbol.explicit_precedence().unwrap_or(order), index)
            })
            .collect();

        arguments.sort_by_key(|&(precedence, _)| precedence);

        let minimums: Vec<usize> = arguments
            .iter()
            .map(|&(_, index)| self.symbols[index].arity_range().min)
            .collect();

        let mut cursor = 0;
        let mut reported = false;

        for (position, &(_, index)) in arguments.iter().enumerate() {
            let arity = self.symbols[index].arity_range();
            let remaining = operands.len() - cursor;
            let reserved: usize = minimums[position + 1..].iter().sum();

            let take = if remaining < arity.min {
                if !reported {
                    self.errors.push(ParseError::Arity {
                        symbol: self.symbols[index].label(),
                        violation: ArityViolation::MinimumNotMet {
                            min: arity.min,
                            found: remaining,
                        },
                    });
                    reported = true;
                }

                remaining
            } else {
                remaining
                    .saturating_sub(reserved)
                    .max(arity.min)
                    .min(arity.max)
            };

            let matched = &mut self.matched[index];
            for operand in &operands[cursor..cursor + take] {
                matched.values.push(operand.text().to_owned());
                matched.tokens.push(operand.text().to_owned());
            }

            cursor += take;
        }

        self.unmatched
            .extend(operands[cursor..].iter().map(|&token| token.clone()));
    }

    fn check_arity(&mut self) {
        for (index, symbol) in self.symbols.iter().enumerate() {
            if symbol.kind() == SymbolKind::Argument || self.incomplete[index] {
                continue;
            }

            let matched = &self.matched[index];
            let arity = symbol.arity_range();
            let found = match symbol.kind() {
                SymbolKind::Switch => matched.occurrences,
                _ => matched.values.len(),
            };

            let violation = if found < arity.min {
                ArityViolation::MinimumNotMet {
                    min: arity.min,
                    found,
                }
            } else if found > arity.max {
                ArityViolation::MaximumExceeded {
                    max: arity.max,
                    found,
                }
            } else {
                continue;
            };

            self.errors.push(ParseError::Arity {
                symbol: symbol.label(),
                violation,
            });
        }
    }
}

fn number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^-(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?$")
            .expect("number grammar is a valid regex")
    })
}

fn looks_numeric(token: &Token) -> bool {
    token.prefix() == Prefix::Dash && number().is_match(token.text())
}

/// Whether `token` can be taken as an option's value: an operand, or a
/// negative number that isn't itself one of the tags in play.
fn is_value(symbols: &[&Symbol], token: &Token) -> bool {
    match token.kind() {
        TokenKind::Operand => true,
        TokenKind::Identifier => {
            looks_numeric(token) && !symbols.iter().any(|symbol| symbol.matches(token))
        }
        _ => false,
    }
}

/**
Match `tokens` against `symbols`. `tokens` should not include the operands
that selected the command, or any directives.
*/
pub fn lookup<'t>(
    tokens: &[Token],
    symbols: Vec<&'t Symbol>,
    unknown: UnknownIdentifiers,
) -> ParseResult<'t> {
    let mut state = Lookup {
        matched: vec![Matched::default(); symbols.len()],
        incomplete: vec![false; symbols.len()],
        symbols,
        errors: Vec::new(),
        unmatched: Vec::new(),
    };

    let mut operands: Vec<&Token> = Vec::new();
    let mut positional_only = false;
    let mut rest = tokens.iter().peekable();

    while let Some(token) = rest.next() {
        if positional_only {
            operands.push(token);
            continue;
        }

        match token.kind() {
            TokenKind::Terminator => positional_only = true,
            TokenKind::Operand => operands.push(token),
            TokenKind::Directive => state.unmatched.push(token.clone()),
            TokenKind::Identifier => match state.find(token) {
                Found::Symbol(index) => {
                    trace!(token = token.text(), binding = state.symbols[index].binding(), "matched");

                    match state.symbols[index].kind() {
                        SymbolKind::Switch => state.switch(index, token),
                        _ => state.option(index, token, &mut rest),
                    }
                }
                Found::Cluster(indexes) => {
                    trace!(token = token.text(), "matched a cluster of switches");

                    for index in indexes {
                        let matched = &mut state.matched[index];
                        matched.occurrences += 1;
                        matched.values.push(true.to_string());
                        matched.tokens.push(token.text().to_owned());
                    }
                }
                Found::Nothing if looks_numeric(token) => operands.push(token),
                Found::Nothing => match unknown {
                    UnknownIdentifiers::Reject => state.unmatched.push(token.clone()),
                    UnknownIdentifiers::Positional => operands.push(token),
                },
            },
        }
    }

    state.arguments(operands);
    state.check_arity();
    state.unmatched.sort_by_key(Token::position);

    ParseResult {
        symbols: state.symbols,
        matched: state.matched,
        errors: state.errors,
        unmatched: state.unmatched,
    }
}
