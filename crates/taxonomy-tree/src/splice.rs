//! Hidden-node splicing.
//!
//! Splicing removes a node and re-inserts its children, in order, at the
//! position the node occupied among its siblings. Chains of hidden nodes
//! collapse onto the nearest visible ancestor. The root is never removed.

use std::collections::HashSet;

use tracing::{info, warn};

use crate::tree::{TaxTree, TreeAssembler};
use crate::TaxId;

/// Returns a copy of `tree` with every non-root node in `hidden` spliced out.
///
/// A tree without any node from `hidden` comes back unchanged. If the
/// root's id is in `hidden` the flag is ignored for the root and a warning
/// is logged.
///
/// # Example
///
/// ```rust
/// use std::collections::HashSet;
/// use taxonomy_tree::{splice, TreeBuilder};
///
/// let mut builder = TreeBuilder::new();
/// builder.add_edge(1, "root", 1).unwrap();
/// builder.add_edge(2, "A", 1).unwrap();
/// builder.add_edge(3, "B", 1).unwrap();
/// builder.add_edge(4, "A1", 2).unwrap();
/// let tree = builder.build().unwrap();
///
/// let spliced = splice(&tree, &HashSet::from([2]));
/// assert!(!spliced.contains(2));
/// assert_eq!(spliced.path_to(4), Some(vec![1, 4]));
/// ```
pub fn splice(tree: &TaxTree, hidden: &HashSet<TaxId>) -> TaxTree {
    let root = tree.root();
    let root_id = tree.node(root).id();
    if hidden.contains(&root_id) {
        warn!(root_id, "taxonomy.splice.root_hidden_ignored");
    }

    let mut asm = TreeAssembler::with_capacity(tree.node_count());
    // Each entry carries the node to visit and the nearest visible
    // ancestor in the new tree.
    let mut stack = vec![(root, None)];
    while let Some((current, visible_parent)) = stack.pop() {
        let node = tree.node(current);
        let remove = visible_parent.is_some() && hidden.contains(&node.id());
        let next_parent = if remove {
            visible_parent
        } else {
            Some(asm.push(node.id(), node.title(), node.is_hidden(), visible_parent))
        };
        stack.extend(node.children().iter().rev().map(|&child| (child, next_parent)));
    }
    let spliced = asm.finish();

    info!(
        removed = tree.node_count() - spliced.node_count(),
        remaining = spliced.node_count(),
        "taxonomy.splice.complete"
    );
    spliced
}

impl TaxTree {
    /// Splices out every node carrying the hidden flag.
    pub fn without_hidden(&self) -> TaxTree {
        splice(self, &self.hidden_ids())
    }
}
