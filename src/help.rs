/*!
Usage messages.

When a help tag appears, the pipeline builds a [`HelpPage`] for the selected
command and hands it to the configured [`HelpRenderer`]. [`PlainHelp`] is the
default renderer:

```text
Connect to a server

Usage:
  app connect [OPTIONS] --host <HOST> --user <USER>

Options:
  -h, --host <HOST>
          The server to connect to
  -p, --password <PASSWORD>
      --verbosity <VERBOSITY>
```
*/

use std::fmt::{self, Display, Write as _};

use indent_write::fmt::IndentWriter;
use lazy_format::lazy_format;

use crate::{
    command::{Command, CommandId, CommandTree},
    symbol::{Symbol, SymbolKind, Tag},
};

/// Everything needed to describe a single command
#[derive(Debug)]
pub struct HelpPage<'a> {
    /// The full name of the command, like `app remote add`
    pub command: String,
    pub description: Option<&'a str>,

    /// Every symbol visible to the command, ancestors' first
    pub symbols: Vec<&'a Symbol>,
    pub subcommands: Vec<&'a Command>,
    pub invokable: bool,
}

impl<'a> HelpPage<'a> {
    #[must_use]
    pub fn new(tree: &'a CommandTree, id: CommandId) -> Self {
        let command = &tree[id];

        Self {
            command: tree.display_name(id),
            description: command.description(),
            symbols: tree.aggregate(id),
            subcommands: command.children().iter().map(|&child| &tree[child]).collect(),
            invokable: command.is_invokable(),
        }
    }

    fn arguments(&self) -> impl Iterator<Item = &'a Symbol> {
        self.symbols
            .iter()
            .copied()
            .filter(|symbol| symbol.kind() == SymbolKind::Argument)
    }

    fn options(&self, group: Option<&str>) -> impl Iterator<Item = &'a Symbol> {
        self.symbols.iter().copied().filter(move |symbol| {
            symbol.kind() != SymbolKind::Argument && symbol.group_label() == group
        })
    }

    /// The distinct group labels, in order of first appearance
    fn groups(&self) -> Vec<&'a str> {
        let mut groups: Vec<&'a str> = Vec::new();

        for label in self.symbols.iter().filter_map(|symbol| symbol.group_label()) {
            if !groups.contains(&label) {
                groups.push(label);
            }
        }

        groups
    }
}

/// Turns a [`HelpPage`] into text
pub trait HelpRenderer: Send + Sync {
    fn render(&self, page: &HelpPage<'_>) -> String;
}

/// Plain-text help, with descriptions wrapped to a fixed width
#[derive(Debug, Clone, Copy)]
pub struct PlainHelp {
    width: usize,
}

impl Default for PlainHelp {
    fn default() -> Self {
        Self { width: 80 }
    }
}

impl PlainHelp {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_width(width: usize) -> Self {
        Self { width }
    }
}

impl HelpRenderer for PlainHelp {
    fn render(&self, page: &HelpPage<'_>) -> String {
        let mut out = String::new();

        // Writing to a String can't fail
        let _ = print_help(&mut out, page, self.width);
        out
    }
}

fn placeholder_of(symbol: &Symbol) -> impl Display + '_ {
    let placeholder = symbol.value_placeholder();
    let arity = symbol.arity_range();

    lazy_format!(match ((arity.is_required(), arity.max > 1)) {
        (true, false) => "<{placeholder}>",
        (true, true) => "<{placeholder}>...",
        (false, false) => "[{placeholder}]",
        (false, true) => "[{placeholder}...]",
    })
}

fn tags_of(symbol: &Symbol) -> impl Display + '_ {
    let short = symbol.tags().iter().find_map(|tag| match *tag {
        Tag::Short(short) => Some(short),
        Tag::Long(_) => None,
    });

    let long = symbol.tags().iter().find_map(|tag| match tag {
        Tag::Long(long) => Some(long.as_str()),
        Tag::Short(_) => None,
    });

    let tags = lazy_format!(match ((short, long)) {
        (Some(short), Some(long)) => "-{short}, --{long}",
        (Some(short), None) => "-{short}",
        (None, Some(long)) => "    --{long}",
        (None, None) => "",
    });

    let placeholder = symbol.value_placeholder();

    lazy_format!(match (symbol.kind()) {
        SymbolKind::Switch => "{tags}",
        _ => "{tags} <{placeholder}>",
    })
}

fn primary_tag(symbol: &Symbol) -> impl Display + '_ {
    let tag = symbol
        .tags()
        .iter()
        .find(|tag| matches!(tag, Tag::Long(_)))
        .or(symbol.tags().first());

    let placeholder = symbol.value_placeholder();

    lazy_format!(match ((tag, symbol.kind())) {
        (None, _) => "",
        (Some(tag), SymbolKind::Switch) => " {tag}",
        (Some(tag), _) => " {tag} <{placeholder}>",
    })
}

fn print_help(out: &mut String, page: &HelpPage<'_>, width: usize) -> fmt::Result {
    if let Some(description) = page.description {
        writeln!(out, "{}", textwrap::fill(description, width))?;
    }

    section(out, "Usage", |out| {
        write!(out, "{}", page.command)?;

        if page.options(None).any(|symbol| !symbol.arity_range().is_required())
            || !page.groups().is_empty()
        {
            write!(out, " [OPTIONS]")?;
        }

        page.symbols
            .iter()
            .filter(|symbol| symbol.kind() == SymbolKind::Option && symbol.arity_range().is_required())
            .try_for_each(|symbol| write!(out, "{}", primary_tag(symbol)))?;

        page.arguments()
            .try_for_each(|symbol| write!(out, " {}", placeholder_of(symbol)))?;

        match (page.subcommands.is_empty(), page.invokable) {
            (true, _) => {}
            (false, true) => write!(out, " [COMMAND]")?,
            (false, false) => write!(out, " <COMMAND>")?,
        }

        writeln!(out)
    })?;

    let text_width = width.saturating_sub(10).max(20);

    maybe_section(out, "Arguments", page.arguments(), |out, symbol| {
        describe(out, placeholder_of(symbol), symbol.description(), text_width)
    })?;

    maybe_section(out, "Options", page.options(None), |out, symbol| {
        describe(out, tags_of(symbol), symbol.description(), text_width)
    })?;

    page.groups().into_iter().try_for_each(|group| {
        maybe_section(out, group, page.options(Some(group)), |out, symbol| {
            describe(out, tags_of(symbol), symbol.description(), text_width)
        })
    })?;

    maybe_section(out, "Commands", page.subcommands.iter(), |out, command| {
        describe(out, command.name(), command.description(), text_width)
    })
}

/// Write a section: a blank line, then the `header`, then an indented
/// `body`.
fn section(
    out: &mut String,
    header: &str,
    body: impl FnOnce(&mut IndentWriter<'_, &mut String>) -> fmt::Result,
) -> fmt::Result {
    writeln!(out, "\n{header}:")?;
    body(&mut IndentWriter::new("  ", out))
}

/// Write a section only if there's at least one item
fn maybe_section<I: IntoIterator>(
    out: &mut String,
    header: &str,
    items: I,
    body: impl Fn(&mut IndentWriter<'_, &mut String>, I::Item) -> fmt::Result,
) -> fmt::Result {
    let mut items = items.into_iter();

    match items.next() {
        None => Ok(()),
        Some(first) => section(out, header, |out| {
            body(out, first)?;
            items.try_for_each(|item| body(out, item))
        }),
    }
}

/// Describe an item by printing the item, followed by its description. If
/// both are short enough, they share a line; otherwise the description is
/// wrapped and indented beneath the item.
fn describe(
    out: &mut impl fmt::Write,
    item: impl Display,
    description: Option<&str>,
    width: usize,
) -> fmt::Result {
    let item = item.to_string();
    let indent = "        ";

    match description {
        None | Some("") => writeln!(out, "{item}"),
        Some(description) => match indent.len().checked_sub(item.chars().count()) {
            Some(space) if space >= 2 && description.len() <= width && !description.contains('\n') => {
                writeln!(out, "{item}{:space$}{description}", "")
            }
            _ => {
                writeln!(out, "{item}")?;
                let mut out = IndentWriter::new(indent, out);
                writeln!(out, "{}", textwrap::fill(description, width))
            }
        },
    }
}
