//! # taxonomy-tree
//!
//! In-memory construction of a rooted biological taxonomy from flat
//! parent/child edge tuples, plus hidden-node splicing.
//!
//! This crate provides:
//! - **Node store**: [`TreeBuilder`] collects `(id, parent id, title, hidden)`
//!   tuples and lays them out as a [`TaxTree`], rejecting unknown parents,
//!   second parents and ambiguous roots
//! - **Splicer**: [`splice`] removes flagged nodes and promotes their
//!   children into the vacated position
//! - **Tree view**: [`TreeView`], the nested `{id, title, children}` shape
//!   handed to serializers
//!
//! ## Usage
//!
//! ```rust
//! use taxonomy_tree::{Edge, TreeBuilder, TreeView};
//!
//! let edges = [
//!     Edge::new(1, 1, "root"),
//!     Edge::new(2, 1, "A").hidden(true),
//!     Edge::new(3, 1, "B"),
//!     Edge::new(4, 2, "A1"),
//! ];
//!
//! let mut builder = TreeBuilder::new();
//! builder.extend(&edges).unwrap();
//! let tree = builder.build().unwrap().without_hidden();
//!
//! let view = TreeView::new(&tree);
//! let top: Vec<u32> = view.children.unwrap().iter().map(|c| c.id).collect();
//! assert_eq!(top, vec![4, 3]);
//! ```
//!
//! Every traversal in this crate uses an explicit stack, so arbitrarily
//! deep taxonomies do not grow the native call stack.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod builder;
mod error;
mod splice;
mod tree;
mod view;

pub use builder::TreeBuilder;
pub use error::{TreeError, TreeResult};
pub use splice::splice;
pub use tree::{NodeRef, Preorder, TaxNode, TaxTree};
pub use view::TreeView;

/// Taxonomy node identifier (NCBI taxids fit in 32 bits).
pub type TaxId = u32;

/// One upstream record: a node, its parent and its hidden flag.
///
/// A record whose `parent_id` equals its `id` marks the root.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Edge {
    /// The node id.
    pub id: TaxId,
    /// The parent node id.
    pub parent_id: TaxId,
    /// Display label.
    pub title: String,
    /// Hidden flag from the source data.
    pub hidden: bool,
}

impl Edge {
    /// Creates a visible edge.
    pub fn new(id: TaxId, parent_id: TaxId, title: impl Into<String>) -> Self {
        Self {
            id,
            parent_id,
            title: title.into(),
            hidden: false,
        }
    }

    /// Sets the hidden flag.
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Returns true if this record marks the root.
    pub fn is_root(&self) -> bool {
        self.id == self.parent_id
    }
}
