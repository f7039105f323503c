//! Error types for indexing and querying.

use taxonomy_tree::{TaxId, TreeError};
use thiserror::Error;

/// Errors that can occur while building, persisting or querying an index.
#[derive(Error, Debug)]
pub enum IndexError {
    /// No row exists for the requested id.
    ///
    /// This is an expected outcome of a query, not a storage failure.
    #[error("Node not found: {0}")]
    NodeNotFound(TaxId),

    /// The backing store holds no completed index yet.
    #[error("Index not ready: no completed rebuild in the backing store")]
    NotReady,

    /// The tree could not be built from the input edges.
    #[error("Tree build error: {0}")]
    Tree(#[from] TreeError),

    /// Error from the underlying store.
    #[error("Store error: {0}")]
    Store(String),

    /// A rebuild stopped partway; the new index was not marked complete.
    #[error("Incomplete rebuild after {rows_written} rows: {reason}")]
    IncompleteRebuild {
        /// Rows handed to the store before the failure.
        rows_written: usize,
        /// Why the rebuild stopped.
        reason: String,
    },

    /// Configuration values that cannot be used.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A stored row could not be decoded.
    #[error("Corrupt row for node {id}: {message}")]
    CorruptRow {
        /// Id of the offending row.
        id: TaxId,
        /// What was wrong with it.
        message: String,
    },
}

impl IndexError {
    /// Returns true for the "no such node" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NodeNotFound(_))
    }

    /// Creates a store error from any displayable cause.
    pub fn store(cause: impl std::fmt::Display) -> Self {
        Self::Store(cause.to_string())
    }
}

/// Result type for index operations.
pub type IndexResult<T> = std::result::Result<T, IndexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_node_not_found() {
        let err = IndexError::NodeNotFound(83333);
        assert_eq!(err.to_string(), "Node not found: 83333");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_store_error_is_not_not_found() {
        let err = IndexError::store("disk I/O error");
        assert_eq!(err.to_string(), "Store error: disk I/O error");
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_error_display_incomplete_rebuild() {
        let err = IndexError::IncompleteRebuild {
            rows_written: 2000,
            reason: "connection lost".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Incomplete rebuild after 2000 rows: connection lost"
        );
    }

    #[test]
    fn test_error_from_tree_error() {
        let err: IndexError = TreeError::UnknownNode(5).into();
        assert!(matches!(err, IndexError::Tree(TreeError::UnknownNode(5))));
    }
}
