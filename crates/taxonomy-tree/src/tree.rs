//! The built, immutable taxonomy tree.
//!
//! Nodes live in a flat arena addressed by [`NodeRef`]. Every tree in this
//! crate is laid out in pre-order: a node always sits before its children,
//! and siblings appear in their presentation order. Two trees with the same
//! shape therefore compare equal regardless of how they were produced.

use std::collections::{HashMap, HashSet};

use crate::TaxId;

/// Handle to a node inside a [`TaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef(usize);

impl NodeRef {
    /// Returns the arena slot of this node.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A single taxonomy node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxNode {
    id: TaxId,
    title: String,
    hidden: bool,
    parent: Option<NodeRef>,
    /// `None` for leaves; never `Some(vec![])`.
    children: Option<Vec<NodeRef>>,
}

impl TaxNode {
    /// The stable identifier of this node.
    #[inline]
    pub fn id(&self) -> TaxId {
        self.id
    }

    /// Display label.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Whether the source data flagged this node for splicing.
    #[inline]
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// The parent node, `None` for the root.
    #[inline]
    pub fn parent(&self) -> Option<NodeRef> {
        self.parent
    }

    /// Direct children in presentation order (empty for leaves).
    pub fn children(&self) -> &[NodeRef] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// Returns true if the node has no children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Number of direct children.
    #[inline]
    pub fn child_count(&self) -> usize {
        self.children.as_ref().map_or(0, Vec::len)
    }
}

/// A rooted taxonomy tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxTree {
    nodes: Vec<TaxNode>,
    lookup: HashMap<TaxId, NodeRef>,
}

impl TaxTree {
    /// The root node handle.
    #[inline]
    pub fn root(&self) -> NodeRef {
        NodeRef(0)
    }

    /// Returns the node behind a handle.
    ///
    /// Panics if the handle belongs to a different tree and is out of range.
    #[inline]
    pub fn node(&self, node: NodeRef) -> &TaxNode {
        &self.nodes[node.0]
    }

    /// Looks up a node handle by id.
    #[inline]
    pub fn get(&self, id: TaxId) -> Option<NodeRef> {
        self.lookup.get(&id).copied()
    }

    /// Looks up a node by id.
    pub fn find(&self, id: TaxId) -> Option<&TaxNode> {
        self.get(id).map(|node| self.node(node))
    }

    /// Returns true if a node with this id is part of the tree.
    #[inline]
    pub fn contains(&self, id: TaxId) -> bool {
        self.lookup.contains_key(&id)
    }

    /// Number of nodes in the tree (at least one, the root).
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Iterates over all nodes in pre-order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeRef, &TaxNode)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (NodeRef(idx), node))
    }

    /// Walks the subtree rooted at `start` depth-first, parent before children.
    pub fn preorder(&self, start: NodeRef) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: vec![start],
        }
    }

    /// Ids of every node carrying the hidden flag.
    pub fn hidden_ids(&self) -> HashSet<TaxId> {
        self.nodes
            .iter()
            .filter(|node| node.hidden)
            .map(|node| node.id)
            .collect()
    }

    /// Depth of the deepest node (root = 0).
    pub fn max_depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(self.root(), 0usize)];
        while let Some((current, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            for &child in self.node(current).children() {
                stack.push((child, depth + 1));
            }
        }
        max_depth
    }

    /// Ancestor ids from the root down to and including `id`.
    ///
    /// Walks parent links; returns `None` if `id` is not in the tree.
    pub fn path_to(&self, id: TaxId) -> Option<Vec<TaxId>> {
        let mut current = self.get(id)?;
        let mut path = vec![self.node(current).id];
        while let Some(parent) = self.node(current).parent {
            path.push(self.node(parent).id);
            current = parent;
        }
        path.reverse();
        Some(path)
    }

    /// Returns true if `ancestor` is `descendant` or lies on its parent chain.
    ///
    /// This is the pointer-chasing reference check, O(depth).
    pub fn is_ancestor_or_self(&self, ancestor: TaxId, descendant: TaxId) -> bool {
        let (Some(target), Some(mut current)) = (self.get(ancestor), self.get(descendant)) else {
            return false;
        };
        loop {
            if current == target {
                return true;
            }
            match self.node(current).parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }
}

/// Pre-order iterator over a subtree, driven by an explicit stack.
pub struct Preorder<'a> {
    tree: &'a TaxTree,
    stack: Vec<NodeRef>,
}

impl Iterator for Preorder<'_> {
    type Item = NodeRef;

    fn next(&mut self) -> Option<NodeRef> {
        let current = self.stack.pop()?;
        self.stack
            .extend(self.tree.node(current).children().iter().rev().copied());
        Some(current)
    }
}

/// Appends nodes into a fresh arena in pre-order.
///
/// Callers must push a parent before any of its children and push
/// siblings in order; the first pushed node becomes the root.
#[derive(Debug, Default)]
pub(crate) struct TreeAssembler {
    nodes: Vec<TaxNode>,
    lookup: HashMap<TaxId, NodeRef>,
}

impl TreeAssembler {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            lookup: HashMap::with_capacity(capacity),
        }
    }

    pub(crate) fn push(
        &mut self,
        id: TaxId,
        title: &str,
        hidden: bool,
        parent: Option<NodeRef>,
    ) -> NodeRef {
        let node = NodeRef(self.nodes.len());
        self.nodes.push(TaxNode {
            id,
            title: title.to_string(),
            hidden,
            parent,
            children: None,
        });
        self.lookup.insert(id, node);
        if let Some(parent) = parent {
            self.nodes[parent.0]
                .children
                .get_or_insert_with(Vec::new)
                .push(node);
        }
        node
    }

    pub(crate) fn finish(self) -> TaxTree {
        TaxTree {
            nodes: self.nodes,
            lookup: self.lookup,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Creates a test hierarchy:
    /// ```text
    /// 1 (root)
    ///  |-- 2
    ///  |    |-- 4
    ///  |    |-- 5
    ///  |-- 3
    /// ```
    fn create_test_tree() -> TaxTree {
        let mut asm = TreeAssembler::default();
        let root = asm.push(1, "root", false, None);
        let a = asm.push(2, "A", true, Some(root));
        asm.push(4, "A1", false, Some(a));
        asm.push(5, "A2", false, Some(a));
        asm.push(3, "B", false, Some(root));
        asm.finish()
    }

    #[test]
    fn test_lookup_and_counts() {
        let tree = create_test_tree();

        assert_eq!(tree.node_count(), 5);
        assert_eq!(tree.node(tree.root()).id(), 1);
        assert!(tree.contains(4));
        assert!(!tree.contains(99));
        assert_eq!(tree.find(3).map(TaxNode::title), Some("B"));
    }

    #[test]
    fn test_leaf_has_no_children_collection() {
        let tree = create_test_tree();

        let leaf = tree.find(4).unwrap();
        assert!(leaf.is_leaf());
        assert!(leaf.children().is_empty());
        assert_eq!(leaf.child_count(), 0);

        let inner = tree.find(2).unwrap();
        assert!(!inner.is_leaf());
        assert_eq!(inner.child_count(), 2);
    }

    #[test]
    fn test_preorder_walk() {
        let tree = create_test_tree();

        let ids: Vec<TaxId> = tree
            .preorder(tree.root())
            .map(|node| tree.node(node).id())
            .collect();
        assert_eq!(ids, vec![1, 2, 4, 5, 3]);

        let sub: Vec<TaxId> = tree
            .preorder(tree.get(2).unwrap())
            .map(|node| tree.node(node).id())
            .collect();
        assert_eq!(sub, vec![2, 4, 5]);
    }

    #[test]
    fn test_hidden_ids() {
        let tree = create_test_tree();
        let hidden = tree.hidden_ids();
        assert_eq!(hidden.len(), 1);
        assert!(hidden.contains(&2));
    }

    #[test]
    fn test_path_to() {
        let tree = create_test_tree();

        assert_eq!(tree.path_to(5), Some(vec![1, 2, 5]));
        assert_eq!(tree.path_to(1), Some(vec![1]));
        assert_eq!(tree.path_to(42), None);
    }

    #[test]
    fn test_is_ancestor_or_self() {
        let tree = create_test_tree();

        assert!(tree.is_ancestor_or_self(1, 5));
        assert!(tree.is_ancestor_or_self(2, 4));
        assert!(tree.is_ancestor_or_self(3, 3));
        assert!(!tree.is_ancestor_or_self(3, 4));
        assert!(!tree.is_ancestor_or_self(4, 2));
        assert!(!tree.is_ancestor_or_self(1, 42));
    }

    #[test]
    fn test_max_depth() {
        let tree = create_test_tree();
        assert_eq!(tree.max_depth(), 2);
    }
}
