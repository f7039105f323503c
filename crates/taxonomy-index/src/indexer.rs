//! Nested-set indexing.
//!
//! A single depth-first, pre-order pass assigns each node:
//!
//! - `ind`: its pre-order position (root = 0)
//! - `maxind`: the last `ind` assigned inside its subtree
//! - `layer`: its depth (root = 0)
//! - `lpos`: how many nodes of the same layer were visited before it
//!
//! Children are visited in their existing order; nothing is re-sorted.
//! The pass uses an explicit work stack, so tree depth is bounded only by
//! heap memory.
//!
//! # Example
//!
//! ```rust
//! use taxonomy_index::index;
//! use taxonomy_tree::TreeBuilder;
//!
//! let mut builder = TreeBuilder::new();
//! builder.add_edge(1, "root", 1).unwrap();
//! builder.add_edge(2, "A", 1).unwrap();
//! builder.add_edge(3, "B", 1).unwrap();
//! builder.add_edge(4, "A1", 2).unwrap();
//!
//! let indexed = index(builder.build().unwrap());
//! let a = indexed.entry_of(2).unwrap();
//! assert_eq!((a.ind, a.maxind), (1, 2));
//! assert_eq!(indexed.is_ancestor(1, 4), Some(true));
//! assert_eq!(indexed.is_ancestor(3, 4), Some(false));
//! ```

use std::time::Instant;

use taxonomy_tree::{NodeRef, TaxId, TaxTree};
use tracing::info;

use crate::stats::IndexStats;

/// Nested-set metadata of one node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NestedSetEntry {
    /// Depth from the root.
    pub layer: u32,
    /// Per-layer visitation sequence number.
    pub lpos: u32,
    /// Pre-order index.
    pub ind: u32,
    /// Largest pre-order index in the subtree.
    pub maxind: u32,
}

impl NestedSetEntry {
    /// Returns true if `other` lies in this node's subtree (inclusive).
    #[inline]
    pub fn contains(&self, other: &NestedSetEntry) -> bool {
        self.ind <= other.ind && other.ind <= self.maxind
    }
}

/// A tree together with the nested-set metadata of every node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedTree {
    tree: TaxTree,
    /// Aligned with the tree's arena (`NodeRef::index`).
    entries: Vec<NestedSetEntry>,
    /// Node count per layer.
    layer_widths: Vec<u32>,
}

impl IndexedTree {
    /// The underlying tree.
    pub fn tree(&self) -> &TaxTree {
        &self.tree
    }

    /// Releases the underlying tree.
    pub fn into_tree(self) -> TaxTree {
        self.tree
    }

    /// Metadata for a node handle.
    #[inline]
    pub fn entry(&self, node: NodeRef) -> &NestedSetEntry {
        &self.entries[node.index()]
    }

    /// Metadata for a node id.
    pub fn entry_of(&self, id: TaxId) -> Option<&NestedSetEntry> {
        self.tree.get(id).map(|node| self.entry(node))
    }

    /// Ancestor-or-self test through the stored intervals.
    ///
    /// Returns `None` if either id is unknown.
    pub fn is_ancestor(&self, ancestor: TaxId, descendant: TaxId) -> Option<bool> {
        let a = self.entry_of(ancestor)?;
        let d = self.entry_of(descendant)?;
        Some(a.contains(d))
    }

    /// Number of nodes on each layer, root layer first.
    pub fn layer_widths(&self) -> &[u32] {
        &self.layer_widths
    }

    /// Summary statistics of this index (timing fields left at zero).
    pub fn stats(&self) -> IndexStats {
        let (widest_layer, widest_layer_size) = self
            .layer_widths
            .iter()
            .enumerate()
            .fold((0, 0), |best, (layer, &width)| {
                if width > best.1 {
                    (layer as u32, width)
                } else {
                    best
                }
            });
        IndexStats {
            node_count: self.entries.len(),
            leaf_count: self
                .entries
                .iter()
                .filter(|entry| entry.ind == entry.maxind)
                .count(),
            max_layer: self.layer_widths.len().saturating_sub(1) as u32,
            widest_layer,
            widest_layer_size,
            ..IndexStats::default()
        }
    }
}

/// Work item of the indexing pass.
enum Visit {
    /// First arrival at a node.
    Enter(NodeRef, u32),
    /// All of the node's subtree has been visited.
    Exit(NodeRef),
}

/// Assigns nested-set metadata to every node of `tree`.
pub fn index(tree: TaxTree) -> IndexedTree {
    let start = Instant::now();
    let mut entries = vec![NestedSetEntry::default(); tree.node_count()];
    let mut layer_widths: Vec<u32> = Vec::new();
    // Index the next visited node will receive.
    let mut next_ind: u32 = 0;

    let mut stack = vec![Visit::Enter(tree.root(), 0)];
    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Enter(node, layer) => {
                let slot = layer as usize;
                if slot == layer_widths.len() {
                    layer_widths.push(0);
                }
                let lpos = layer_widths[slot];
                layer_widths[slot] += 1;

                let entry = &mut entries[node.index()];
                entry.ind = next_ind;
                entry.layer = layer;
                entry.lpos = lpos;
                next_ind += 1;

                stack.push(Visit::Exit(node));
                stack.extend(
                    tree.node(node)
                        .children()
                        .iter()
                        .rev()
                        .map(|&child| Visit::Enter(child, layer + 1)),
                );
            }
            Visit::Exit(node) => {
                entries[node.index()].maxind = next_ind - 1;
            }
        }
    }

    info!(
        nodes = entries.len(),
        layers = layer_widths.len(),
        duration_ms = start.elapsed().as_millis() as u64,
        "taxonomy.index.complete"
    );
    IndexedTree {
        tree,
        entries,
        layer_widths,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxonomy_tree::TreeBuilder;

    /// Creates the reference hierarchy:
    /// ```text
    /// 1 (root)
    ///  |-- 2 (A)
    ///  |    |-- 4 (A1)
    ///  |-- 3 (B)
    /// ```
    fn create_small_tree() -> TaxTree {
        let mut builder = TreeBuilder::new();
        builder.add_edge(1, "root", 1).unwrap();
        builder.add_edge(2, "A", 1).unwrap();
        builder.add_edge(3, "B", 1).unwrap();
        builder.add_edge(4, "A1", 2).unwrap();
        builder.build().unwrap()
    }

    /// Creates a hierarchy where layer 2 spans two parents:
    /// ```text
    ///        10
    ///       /  \
    ///     20    30
    ///    /  \     \
    ///  21    22    31
    /// ```
    fn create_wide_tree() -> TaxTree {
        let mut builder = TreeBuilder::new();
        builder.add_edge(10, "root", 10).unwrap();
        builder.add_edge(20, "x", 10).unwrap();
        builder.add_edge(30, "y", 10).unwrap();
        builder.add_edge(21, "x1", 20).unwrap();
        builder.add_edge(22, "x2", 20).unwrap();
        builder.add_edge(31, "y1", 30).unwrap();
        builder.build().unwrap()
    }

    fn entry(indexed: &IndexedTree, id: TaxId) -> NestedSetEntry {
        *indexed.entry_of(id).unwrap()
    }

    #[test]
    fn test_reference_example() {
        let indexed = index(create_small_tree());

        assert_eq!((entry(&indexed, 1).ind, entry(&indexed, 1).maxind), (0, 3));
        assert_eq!((entry(&indexed, 2).ind, entry(&indexed, 2).maxind), (1, 2));
        assert_eq!((entry(&indexed, 4).ind, entry(&indexed, 4).maxind), (2, 2));
        assert_eq!((entry(&indexed, 3).ind, entry(&indexed, 3).maxind), (3, 3));
    }

    #[test]
    fn test_layers() {
        let indexed = index(create_small_tree());

        assert_eq!(entry(&indexed, 1).layer, 0);
        assert_eq!(entry(&indexed, 2).layer, 1);
        assert_eq!(entry(&indexed, 3).layer, 1);
        assert_eq!(entry(&indexed, 4).layer, 2);
        assert_eq!(indexed.layer_widths(), &[1, 2, 1]);
    }

    #[test]
    fn test_lpos_counts_across_parents() {
        let indexed = index(create_wide_tree());

        assert_eq!(entry(&indexed, 10).lpos, 0);
        assert_eq!(entry(&indexed, 20).lpos, 0);
        assert_eq!(entry(&indexed, 30).lpos, 1);
        assert_eq!(entry(&indexed, 21).lpos, 0);
        assert_eq!(entry(&indexed, 22).lpos, 1);
        // 31 is the first child of 30 but the third node visited on layer 2.
        assert_eq!(entry(&indexed, 31).lpos, 2);
    }

    #[test]
    fn test_leaves_have_equal_bounds() {
        let indexed = index(create_wide_tree());

        for (node, tax_node) in indexed.tree().nodes() {
            let e = indexed.entry(node);
            assert!(e.ind <= e.maxind);
            assert_eq!(e.ind == e.maxind, tax_node.is_leaf());
        }
    }

    #[test]
    fn test_is_ancestor() {
        let indexed = index(create_small_tree());

        assert_eq!(indexed.is_ancestor(1, 4), Some(true));
        assert_eq!(indexed.is_ancestor(2, 4), Some(true));
        assert_eq!(indexed.is_ancestor(4, 4), Some(true));
        assert_eq!(indexed.is_ancestor(3, 4), Some(false));
        assert_eq!(indexed.is_ancestor(4, 1), Some(false));
        assert_eq!(indexed.is_ancestor(1, 99), None);
    }

    #[test]
    fn test_single_node_tree() {
        let mut builder = TreeBuilder::new();
        builder.add_edge(1, "root", 1).unwrap();
        let indexed = index(builder.build().unwrap());

        assert_eq!(entry(&indexed, 1), NestedSetEntry::default());
        let stats = indexed.stats();
        assert_eq!(stats.node_count, 1);
        assert_eq!(stats.leaf_count, 1);
        assert_eq!(stats.max_layer, 0);
    }

    #[test]
    fn test_stats() {
        let stats = index(create_wide_tree()).stats();

        assert_eq!(stats.node_count, 6);
        assert_eq!(stats.leaf_count, 3);
        assert_eq!(stats.max_layer, 2);
        assert_eq!(stats.widest_layer, 2);
        assert_eq!(stats.widest_layer_size, 3);
    }

    #[test]
    fn test_indexing_is_deterministic() {
        assert_eq!(index(create_wide_tree()), index(create_wide_tree()));
    }

    #[test]
    fn test_deep_chain() {
        let depth: TaxId = 100_000;
        let mut builder = TreeBuilder::with_capacity(depth as usize);
        builder.add_edge(0, "root", 0).unwrap();
        for id in 1..depth {
            builder.add_edge(id, "", id - 1).unwrap();
        }

        let indexed = index(builder.build().unwrap());
        let root = entry(&indexed, 0);
        let deepest = entry(&indexed, depth - 1);

        assert_eq!(root.maxind, depth - 1);
        assert_eq!(deepest.layer, depth - 1);
        assert_eq!(deepest.lpos, 0);
        assert!(root.contains(&deepest));
    }
}
