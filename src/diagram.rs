/*!
The `[parse]` directive's output: a bracketed picture of how each token was
attributed, without running the command.

```text
[ app connect [ --host <https://x.com> ] [ -u <tester> ] *[ --verbosity ] ] ???--> extra
```

Each symbol that was given on the command line is shown with its values.
A `*` marks a symbol that will use its default, and a `!` marks a symbol with
an error. Unmatched tokens follow the `???-->` marker.
*/

use std::fmt::Display;

use joinery::{Joinable, JoinableIterator};
use parley_parser::Token;
use lazy_format::lazy_format;

use crate::{
    lookup::{Matched, ParseResult},
    symbol::{Symbol, Tag},
};

fn name_of(symbol: &Symbol) -> impl Display + '_ {
    let tag = symbol
        .tags()
        .iter()
        .find(|tag| matches!(tag, Tag::Long(_)))
        .or(symbol.tags().first());

    lazy_format!(match (tag) {
        Some(tag) => "{tag}",
        None => ("<{placeholder}>", placeholder = symbol.value_placeholder()),
    })
}

fn node<'a>(symbol: &'a Symbol, matched: &'a Matched, failed: bool) -> impl Display + 'a {
    let marker = match (failed, matched.is_present(), symbol.has_default()) {
        (true, _, _) => "!",
        (false, false, true) => "*",
        _ => "",
    };

    let values = matched
        .values
        .iter()
        .map(|value| lazy_format!(" <{value}>"))
        .join_concat();

    lazy_format!("{marker}[ {name}{values} ]", name = name_of(symbol))
}

/**
Render the diagram. `failed` lists the bindings of symbols that had errors.
Symbols that weren't given, have no default, and didn't fail are omitted.
*/
#[must_use]
pub fn render(command: &str, parsed: &ParseResult<'_>, failed: &[&str]) -> String {
    let nodes: Vec<String> = parsed
        .iter()
        .filter_map(|(symbol, matched)| {
            let failed = failed.contains(&symbol.binding());
            let shown = failed || matched.is_present() || symbol.has_default();
            shown.then(|| format!(" {}", node(symbol, matched, failed)))
        })
        .collect();

    let unmatched: Vec<&str> = parsed.unmatched().iter().map(Token::text).collect();

    let tail = lazy_format!(match (unmatched.is_empty()) {
        true => "",
        false => (" ???--> {rest}", rest = unmatched.iter().join_with(' ')),
    });

    let nodes = nodes.join_concat();

    format!("[ {command}{nodes} ]{tail}")
}
