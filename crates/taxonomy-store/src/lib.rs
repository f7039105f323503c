//! # taxonomy-store
//!
//! SQLite storage for taxonomy nested-set indexes.
//!
//! [`SqliteIndexStore`] implements both seams of `taxonomy-index`:
//! [`RowSink`](taxonomy_index::RowSink) for rebuilds and
//! [`IndexReader`](taxonomy_index::IndexReader) for queries. Rows land in
//! a staging table and are swapped in on commit, and a one-row status
//! table records whether the last rebuild completed, failed or was
//! interrupted.
//!
//! ## Quick Start
//!
//! ```rust
//! use taxonomy_index::{rebuild_from_edges, IndexConfig};
//! use taxonomy_store::{SqliteIndexStore, StoreConfig};
//! use taxonomy_tree::Edge;
//!
//! let edges = [
//!     Edge::new(1, 1, "root"),
//!     Edge::new(2, 1, "A"),
//!     Edge::new(3, 1, "B"),
//!     Edge::new(4, 2, "A1"),
//! ];
//!
//! let mut store = SqliteIndexStore::open_in_memory(StoreConfig::default()).unwrap();
//! rebuild_from_edges(&edges, &mut store, &IndexConfig::default()).unwrap();
//!
//! let query = store.query();
//! assert_eq!(query.get_path(4).unwrap(), vec![1, 2, 4]);
//! assert!(store.status().unwrap().is_complete());
//! ```
//!
//! ## Schema
//!
//! | Column | Type | Notes |
//! |--------|------|-------|
//! | `id` | INTEGER | primary key |
//! | `parent_id` | INTEGER | NULL for the root, indexed |
//! | `title` | TEXT | |
//! | `hidden` | INTEGER | 0/1 |
//! | `layer`, `lpos` | INTEGER | indexed together |
//! | `ind` | INTEGER | indexed |
//! | `maxind` | INTEGER | |
//! | `path` | TEXT | `/id1/id2/.../idN` |
//! | `size` | INTEGER | direct child count |

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod config;
mod error;
mod sqlite;
mod status;

pub use config::{JournalMode, StoreConfig, StoreConfigBuilder, Synchronous};
pub use error::{StoreError, StoreResult};
pub use sqlite::SqliteIndexStore;
pub use status::IndexStatus;
