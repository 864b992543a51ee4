use alloc::vec::Vec;
use core::iter::FusedIterator;

use crate::token::Token;

/// A stable handle to a node in a [`TokenList`]. Handles remain valid (and
/// never get reused) for the life of the list, even after the node is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct Node {
    // `None` once the node is removed
    token: Option<Token>,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

/**
An ordered sequence of tokens supporting O(1) removal and batch insertion
at any node.

Response file expansion and directive handling rewrite the token stream in
place; nodes live in an arena and are linked by index, so none of these
rewrites move any other token. Removed nodes leave a tombstone behind, which
keeps every [`NodeId`] stable.
*/
#[derive(Debug, Clone, Default)]
pub struct TokenList {
    nodes: Vec<Node>,
    head: Option<NodeId>,
    tail: Option<NodeId>,
    len: usize,
}

impl TokenList {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of live tokens in the list
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<NodeId> {
        self.head
    }

    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<NodeId> {
        self.tail
    }

    /// Get the node after `id`. Returns `None` at the end of the list, or if
    /// `id` was removed.
    #[must_use]
    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.live(id)?.next
    }

    #[must_use]
    pub fn prev(&self, id: NodeId) -> Option<NodeId> {
        self.live(id)?.prev
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Token> {
        self.live(id)?.token.as_ref()
    }

    fn live(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).filter(|node| node.token.is_some())
    }

    pub fn push_back(&mut self, token: Token) -> NodeId {
        let tail = self.tail;
        let id = self.splice_after(tail, [token]);
        id[0]
    }

    /// Remove a node from the list, returning its token. Returns `None` if
    /// the node was already removed.
    pub fn remove(&mut self, id: NodeId) -> Option<Token> {
        let node = self.nodes.get_mut(id.0)?;
        let token = node.token.take()?;
        let prev = node.prev.take();
        let next = node.next.take();

        match prev {
            Some(prev) => self.nodes[prev.0].next = next,
            None => self.head = next,
        }

        match next {
            Some(next) => self.nodes[next.0].prev = prev,
            None => self.tail = prev,
        }

        self.len -= 1;
        Some(token)
    }

    /**
    Insert a batch of tokens after `anchor`, or at the front of the list if
    `anchor` is `None`. Returns the ids of the new nodes, in order. `anchor`
    must be a live node.
    */
    pub fn splice_after(
        &mut self,
        anchor: Option<NodeId>,
        tokens: impl IntoIterator<Item = Token>,
    ) -> Vec<NodeId> {
        debug_assert!(anchor.is_none_or(|anchor| self.live(anchor).is_some()));

        let after = match anchor {
            Some(anchor) => self.nodes[anchor.0].next,
            None => self.head,
        };

        let mut prev = anchor;
        let mut inserted = Vec::new();

        for token in tokens {
            let id = NodeId(self.nodes.len());

            self.nodes.push(Node {
                token: Some(token),
                prev,
                next: None,
            });

            match prev {
                Some(prev) => self.nodes[prev.0].next = Some(id),
                None => self.head = Some(id),
            }

            prev = Some(id);
            inserted.push(id);
        }

        if let Some(&last) = inserted.last() {
            self.nodes[last.0].next = after;

            match after {
                Some(after) => self.nodes[after.0].prev = Some(last),
                None => self.tail = Some(last),
            }

            self.len += inserted.len();
        }

        inserted
    }

    /// Replace a node with a batch of tokens, returning the replaced token and
    /// the ids of the new nodes. Returns `None` if `id` was already removed.
    pub fn replace(
        &mut self,
        id: NodeId,
        tokens: impl IntoIterator<Item = Token>,
    ) -> Option<(Token, Vec<NodeId>)> {
        let prev = self.live(id)?.prev;
        let removed = self.remove(id)?;
        let inserted = self.splice_after(prev, tokens);

        Some((removed, inserted))
    }

    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            cursor: self.head,
            remaining: self.len,
        }
    }

    /// The tokens in this list, in order
    #[must_use]
    pub fn into_vec(mut self) -> Vec<Token> {
        let mut tokens = Vec::with_capacity(self.len);
        let mut cursor = self.head;

        while let Some(id) = cursor {
            let node = &mut self.nodes[id.0];
            cursor = node.next;
            tokens.extend(node.token.take());
        }

        tokens
    }
}

impl FromIterator<Token> for TokenList {
    fn from_iter<T: IntoIterator<Item = Token>>(iter: T) -> Self {
        let mut list = Self::new();
        list.splice_after(None, iter);
        list
    }
}

impl<'a> IntoIterator for &'a TokenList {
    type Item = (NodeId, &'a Token);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the live nodes of a [`TokenList`], in order
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    list: &'a TokenList,
    cursor: Option<NodeId>,
    remaining: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (NodeId, &'a Token);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        let node = &self.list.nodes[id.0];
        self.cursor = node.next;
        self.remaining -= 1;
        node.token.as_ref().map(|token| (id, token))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}
impl FusedIterator for Iter<'_> {}
