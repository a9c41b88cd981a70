//! Schema-agnostic tree walker.
//!
//! Finds every `uses` entry wherever it sits in the document, without knowing
//! anything about the workflow layout.

use crate::document::{DocumentTree, Node, NodeId, Scalar};

/// The key under which workflows name an action to run.
pub const REFERENCE_KEY: &str = "uses";

/// A `uses` entry whose value is an inline scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateSite<'a> {
    /// The mapping that carries the entry.
    pub mapping: NodeId,
    pub value: &'a Scalar,
}

/// Walk every document of `tree`, yielding candidate sites in depth-first
/// pre-order.
///
/// Each mapping's own `uses` entry is reported when the mapping is visited,
/// before anything nested below it. Aliases are walked again in place, so a
/// subtree reused through N aliases yields its candidates N+1 times.
#[must_use]
pub fn walk(tree: &DocumentTree) -> Walk<'_> {
    Walk {
        tree,
        // Explicit stack: nesting depth is attacker-controlled.
        pending: tree.roots().iter().rev().copied().collect(),
        visited: 0,
        budget: usize::MAX,
        exhausted: false,
    }
}

/// Lazy traversal returned by [`walk`].
#[derive(Debug, Clone)]
pub struct Walk<'a> {
    tree: &'a DocumentTree,
    pending: Vec<NodeId>,
    visited: usize,
    budget: usize,
    exhausted: bool,
}

impl Walk<'_> {
    /// Stop after visiting `budget` nodes.
    ///
    /// Alias re-entry makes the walked size exponential in the input size,
    /// so callers scanning untrusted files should set one.
    #[must_use]
    pub fn with_budget(mut self, budget: usize) -> Self {
        self.budget = budget;
        self
    }

    /// Nodes visited so far, alias occurrences included.
    #[must_use]
    pub fn visited(&self) -> usize {
        self.visited
    }

    /// The walk stopped early because the budget ran out.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = CandidateSite<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;
        while let Some(id) = self.pending.pop() {
            if self.visited == self.budget {
                self.exhausted = true;
                self.pending.clear();
                return None;
            }
            self.visited += 1;

            match tree.node(id) {
                Node::Alias(target) => self.pending.push(*target),
                Node::Sequence(items) => self.pending.extend(items.iter().rev().copied()),
                Node::Mapping(entries) => {
                    self.pending
                        .extend(entries.iter().rev().map(|(_, value)| *value));
                    // Keys are unique, so a mapping holds at most one site.
                    let site = entries.iter().find_map(|(key, value)| {
                        match tree.resolve(*value) {
                            Node::Scalar(scalar)
                                if is_reference_key(tree, *key) && !scalar.style.is_block() =>
                            {
                                Some(CandidateSite {
                                    mapping: id,
                                    value: scalar,
                                })
                            }
                            _ => None,
                        }
                    });
                    if site.is_some() {
                        return site;
                    }
                }
                Node::Scalar(_) => {}
            }
        }
        None
    }
}

fn is_reference_key(tree: &DocumentTree, key: NodeId) -> bool {
    matches!(tree.resolve(key), Node::Scalar(s) if s.value == REFERENCE_KEY)
}
