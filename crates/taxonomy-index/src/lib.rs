//! # taxonomy-index
//!
//! Nested-set indexing and querying for taxonomy trees built with
//! [`taxonomy_tree`].
//!
//! This crate turns a [`TaxTree`](taxonomy_tree::TaxTree) into one row per
//! node carrying a pre-order interval `[ind, maxind]`, a depth, a per-layer
//! position and a materialized path. Once persisted, ancestry tests and
//! subtree extraction need no traversal: `a` is an ancestor of `b` exactly
//! when `ind(a) <= ind(b) <= maxind(a)`, and a subtree is one contiguous
//! range of `ind`.
//!
//! ## Quick Start
//!
//! ```rust
//! use taxonomy_index::{rebuild_from_edges, IndexConfig, MemoryIndex, TaxonomyQuery};
//! use taxonomy_tree::Edge;
//!
//! let edges = [
//!     Edge::new(1, 1, "root"),
//!     Edge::new(2, 1, "A"),
//!     Edge::new(3, 1, "B"),
//!     Edge::new(4, 2, "A1"),
//! ];
//!
//! let mut store = MemoryIndex::new();
//! let report = rebuild_from_edges(&edges, &mut store, &IndexConfig::default()).unwrap();
//! assert_eq!(report.rows_written(), 4);
//!
//! let query = TaxonomyQuery::new(&store);
//! let subtree: Vec<u32> = query.subtree_of(2).unwrap().iter().map(|r| r.id).collect();
//! assert_eq!(subtree, vec![2, 4]);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` - Derives `Serialize`/`Deserialize` on [`IndexRow`] and [`NodeSummary`]
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       taxonomy-index                          │
//! │                                                               │
//! │  rebuild                                                      │
//! │  ├── splice hidden nodes (taxonomy-tree, optional)            │
//! │  ├── index: one pre-order pass → NestedSetEntry per node      │
//! │  └── persist: rows → BatchWriter → RowSink                    │
//! │                                                               │
//! │  TaxonomyQuery (via IndexReader trait)                        │
//! │  ├── get_path / get_node / get_children                       │
//! │  ├── is_ancestor / subtree_of / descendant_count              │
//! │  └── optional RowCache                                        │
//! │                                                               │
//! │  Backing stores:                                              │
//! │  ├── MemoryIndex     - this crate                             │
//! │  └── SqliteIndexStore - taxonomy-store                        │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod cache;
mod config;
mod error;
mod indexer;
mod memory;
mod persister;
mod pipeline;
mod query;
mod row;
mod stats;
mod traits;

// Public re-exports
pub use cache::{CacheStats, RowCache};
pub use config::{CacheConfig, IndexConfig, IndexConfigBuilder, DEFAULT_BATCH_SIZE};
pub use error::{IndexError, IndexResult};
pub use indexer::{index, IndexedTree, NestedSetEntry};
pub use memory::MemoryIndex;
pub use persister::{persist, rows, BatchWriter, RowIter, WriteSummary};
pub use pipeline::{rebuild, rebuild_from_edges, RebuildReport};
pub use query::TaxonomyQuery;
pub use row::{IndexRow, LineageEntry, NodeSummary};
pub use stats::IndexStats;
pub use traits::{IndexReader, IndexState, RowSink};

// Re-export commonly used types from dependencies for convenience
pub use taxonomy_tree::TaxId;
