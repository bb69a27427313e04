//! The per-file node arena: every [`Node`] a parsed module contains, plus the
//! parent link spec §1 asks the parser to supply.

use pipit_db::{IndexVec, TextRange};

use crate::node::{Node, NodeId, NodeKind};

#[derive(Clone, Debug, Default)]
pub struct AstArena {
    nodes: IndexVec<NodeId, Node>,
}

impl AstArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node with no parent yet; children must already have been
    /// pushed (post-order construction), and `set_parent` wires each of
    /// `children` to point back at the returned id.
    pub fn push(&mut self, kind: NodeKind, range: TextRange, children: &[NodeId]) -> NodeId {
        let id = self.nodes.push(Node {
            kind,
            range,
            parent: None,
        });
        for &child in children {
            self.nodes[child].parent = Some(id);
        }
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id].kind
    }

    pub fn range(&self, id: NodeId) -> TextRange {
        self.nodes[id].range
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Walks the parent chain from `id` up to (and including) the first
    /// ancestor matching `predicate`.
    pub fn find_ancestor(&self, id: NodeId, predicate: impl Fn(&NodeKind) -> bool) -> Option<NodeId> {
        let mut current = self.parent(id);
        while let Some(candidate) = current {
            if predicate(self.kind(candidate)) {
                return Some(candidate);
            }
            current = self.parent(candidate);
        }
        None
    }
}
