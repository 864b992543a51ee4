/*!
Command paths, and pattern-based matching of leading operands to commands.
*/

use std::{
    fmt::{self, Display},
    str::FromStr,
};

use joinery::{Joinable, JoinableIterator};
use regex::Regex;
use tracing::trace;

use crate::{
    command::{CommandId, CommandTree},
    errors::{ConfigError, ResolutionError},
};

/**
The sequence of subcommand names leading from the root to a command. The
root's path is empty.

```
use parley::RoutePath;

let path: RoutePath = "a b".parse().unwrap();
assert!(path.is_child_of(&"a".parse().unwrap()));
assert!(!path.is_child_of(&RoutePath::root()));
assert!(path.is_descendant_of(&RoutePath::root()));
```
*/
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct RoutePath {
    segments: Vec<String>,
}

impl RoutePath {
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Split a space-separated path, like `remote add`, into a route
    #[must_use]
    pub fn new(path: &str) -> Self {
        Self {
            segments: path.split_whitespace().map(str::to_owned).collect(),
        }
    }

    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let (_, parent) = self.segments.split_last()?;
        Some(Self {
            segments: parent.to_vec(),
        })
    }

    /// True if this path is exactly one segment longer than `other`, and
    /// otherwise identical.
    #[must_use]
    pub fn is_child_of(&self, other: &Self) -> bool {
        self.depth() == other.depth() + 1 && self.segments.starts_with(&other.segments)
    }

    /// True if this path strictly extends `other`.
    #[must_use]
    pub fn is_descendant_of(&self, other: &Self) -> bool {
        self.depth() > other.depth() && self.segments.starts_with(&other.segments)
    }
}

impl FromStr for RoutePath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for RoutePath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl Display for RoutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.iter().join_with(' '))
    }
}

#[derive(Debug)]
struct Route {
    command: CommandId,
    pattern: Regex,
}

/// The result of a successful pattern match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteMatch {
    pub command: CommandId,

    /// How many leading operands the match covered
    pub consumed: usize,

    /// The length of the matched text, in bytes
    pub length: usize,
}

/**
Patterns for every non-root command, used when routes are matched by
pattern instead of by walking the tree. Each command's pattern is either
given explicitly, or derived from its own names and aliases and those of its
ancestors, so `remote add` matches `^(?:remote) (?:add|new)$`.
*/
#[derive(Debug)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn from_tree(tree: &CommandTree) -> Result<Self, ConfigError> {
        let mut routes = Vec::new();

        for (id, command) in tree.iter() {
            if id == CommandId::ROOT {
                continue;
            }

            let body = match command.route_patterns() {
                [] => derived_pattern(tree, id),
                patterns => patterns.iter().map(|p| format!("(?:{p})")).join_with('|').to_string(),
            };

            let pattern = Regex::new(&format!("^(?:{body})$")).map_err(|source| {
                ConfigError::RoutePattern {
                    command: tree.display_name(id),
                    pattern: body.clone(),
                    source,
                }
            })?;

            routes.push(Route {
                command: id,
                pattern,
            });
        }

        Ok(Self { routes })
    }

    /**
    Find the command whose pattern matches the longest space-joined prefix of
    `operands`. Returns `Ok(None)` if nothing matches; if two different
    commands match text of the same, longest length, the match is ambiguous.
    */
    pub fn best_match(
        &self,
        tree: &CommandTree,
        operands: &[&str],
    ) -> Result<Option<RouteMatch>, ResolutionError> {
        let mut best: Option<RouteMatch> = None;
        let mut tied: Vec<CommandId> = Vec::new();
        let mut candidate = String::new();

        for (index, operand) in operands.iter().enumerate() {
            if index > 0 {
                candidate.push(' ');
            }
            candidate.push_str(operand);

            for route in &self.routes {
                if !route.pattern.is_match(&candidate) {
                    continue;
                }

                trace!(%candidate, command = %tree.display_name(route.command), "route pattern matched");

                let found = RouteMatch {
                    command: route.command,
                    consumed: index + 1,
                    length: candidate.len(),
                };

                match best {
                    Some(ref current) if current.length > found.length => {}
                    Some(ref current) if current.length == found.length => {
                        if current.command != found.command && !tied.contains(&found.command) {
                            tied.push(found.command);
                        }
                    }
                    _ => {
                        best = Some(found);
                        tied.clear();
                    }
                }
            }
        }

        match (best, tied.is_empty()) {
            (best, true) => Ok(best),
            (Some(best), false) => Err(ResolutionError::Ambiguous {
                input: operands[..best.consumed].join(" "),
                candidates: std::iter::once(best.command)
                    .chain(tied)
                    .map(|id| tree.display_name(id))
                    .collect(),
            }),
            (None, false) => Ok(None),
        }
    }
}

fn derived_pattern(tree: &CommandTree, id: CommandId) -> String {
    let mut chain: Vec<CommandId> = tree.ancestors(id).collect();
    chain.reverse();
    chain.push(id);

    let segments: Vec<String> = chain
        .into_iter()
        .filter(|&id| id != CommandId::ROOT)
        .map(|id| {
            let names: Vec<String> = tree[id].names().map(regex::escape).collect();
            format!("(?:{})", names.join_with('|'))
        })
        .collect();

    segments.join_with(' ').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relations() {
        let root = RoutePath::root();
        let a = RoutePath::new("a");
        let ab = RoutePath::new("a b");
        let abc = RoutePath::new("a  b c");

        assert!(ab.is_child_of(&a));
        assert!(!ab.is_child_of(&root));
        assert!(ab.is_descendant_of(&root));
        assert!(abc.is_descendant_of(&a));
        assert!(!a.is_descendant_of(&a));
        assert!(!a.is_child_of(&ab));
        assert!(!RoutePath::new("x b").is_child_of(&a));
    }

    #[test]
    fn building_paths() {
        let path = RoutePath::root().child("remote").child("add");

        assert_eq!(path, RoutePath::new("remote add"));
        assert_eq!(path.to_string(), "remote add");
        assert_eq!(path.parent(), Some(RoutePath::new("remote")));
        assert_eq!(RoutePath::root().parent(), None);
    }
}
