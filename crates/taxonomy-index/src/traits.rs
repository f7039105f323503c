//! Storage seams for the index.
//!
//! This module defines the two traits a backing store implements:
//! [`RowSink`] receives the rows of a rebuild, [`IndexReader`] answers
//! lookups against the last completed rebuild.
//!
//! # Architecture Note
//!
//! This crate does not depend on any storage engine. The SQLite store
//! lives in `taxonomy-store`; [`MemoryIndex`](crate::MemoryIndex) is the
//! in-process implementation.
//!
//! # Rebuild protocol
//!
//! ```text
//! begin_rebuild ──► write_rows* ──► commit_rebuild   (index replaced)
//!                        │
//!                        └────────► abort_rebuild    (previous index kept)
//! ```
//!
//! Readers never observe rows of a rebuild that has not been committed.

use std::ops::Range;

use taxonomy_tree::TaxId;

use crate::error::IndexResult;
use crate::persister::WriteSummary;
use crate::row::{IndexRow, NodeSummary};

/// Lifecycle state of the index held by a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    /// No rebuild has ever completed or started.
    Missing,
    /// A rebuild is in progress.
    Building,
    /// The last rebuild completed.
    Complete,
    /// The last rebuild failed; a previous complete index may still serve reads.
    Failed,
}

impl IndexState {
    /// Stable lowercase name, used when persisting the state.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Building => "building",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }

    /// Parses a name produced by [`as_str`](Self::as_str).
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "missing" => Some(Self::Missing),
            "building" => Some(Self::Building),
            "complete" => Some(Self::Complete),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for IndexState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Destination for the rows of a full rebuild.
///
/// A rebuild replaces the whole index; there is no incremental update.
pub trait RowSink {
    /// Prepares an empty staging area, discarding any earlier staging rows.
    fn begin_rebuild(&mut self) -> IndexResult<()>;

    /// Appends one batch of rows to the staging area.
    ///
    /// No ordering guarantee is required between batches.
    fn write_rows(&mut self, rows: &[IndexRow]) -> IndexResult<()>;

    /// Publishes the staging area as the live index and marks it complete.
    fn commit_rebuild(&mut self, summary: &WriteSummary) -> IndexResult<()>;

    /// Discards the staging area and records the failure.
    fn abort_rebuild(&mut self, reason: &str) -> IndexResult<()>;
}

/// Read access to a completed index.
///
/// Implementations must be safe to share between threads; the index is
/// immutable between rebuilds, so readers need no coordination.
///
/// # Required Methods
///
/// - [`row`](Self::row) - primary key lookup
/// - [`child_rows`](Self::child_rows) - lookup by parent id
/// - [`rows_in_range`](Self::rows_in_range) - contiguous `ind` range scan
/// - [`layer_rows`](Self::layer_rows) - `(layer, lpos)` range scan
/// - [`row_count`](Self::row_count) - number of live rows
pub trait IndexReader: Send + Sync {
    /// Gets the row for `id`, `None` if there is no such node.
    fn row(&self, id: TaxId) -> IndexResult<Option<IndexRow>>;

    /// Gets the rows whose parent is `parent_id`, ordered by `ind`.
    ///
    /// Returns an empty Vec if the node has no children or does not exist.
    fn child_rows(&self, parent_id: TaxId) -> IndexResult<Vec<IndexRow>>;

    /// Gets every row with `lo <= ind <= hi`, ordered by `ind`.
    fn rows_in_range(&self, lo: u32, hi: u32) -> IndexResult<Vec<IndexRow>>;

    /// Gets the rows of one layer whose `lpos` falls in `lpos`, ordered by `lpos`.
    fn layer_rows(&self, layer: u32, lpos: Range<u32>) -> IndexResult<Vec<IndexRow>>;

    /// Number of rows in the live index.
    fn row_count(&self) -> IndexResult<usize>;

    /// Gets the `(id, title, hidden)` projection for `id`.
    fn summary(&self, id: TaxId) -> IndexResult<Option<NodeSummary>> {
        Ok(self.row(id)?.map(|row| row.summary()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_state_names_round_trip() {
        for state in [
            IndexState::Missing,
            IndexState::Building,
            IndexState::Complete,
            IndexState::Failed,
        ] {
            assert_eq!(IndexState::parse(state.as_str()), Some(state));
        }
        assert_eq!(IndexState::parse("bogus"), None);
    }

    #[test]
    fn test_index_state_display() {
        assert_eq!(IndexState::Complete.to_string(), "complete");
    }
}
