//! Error types for taxonomy tree construction.

use thiserror::Error;

use crate::TaxId;

/// Errors that can occur while building a taxonomy tree.
///
/// All of these are fatal for a build: the source data is either
/// well-formed or it is not, so none of them is retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// An edge references a parent id that has not been created yet.
    #[error("no node for parent id {parent_id} (referenced by child {child_id})")]
    MissingParent {
        /// The child the edge was attaching.
        child_id: TaxId,
        /// The unknown parent id.
        parent_id: TaxId,
    },

    /// A node was attached under a second, different parent.
    #[error("node {id} is already attached under {existing_parent}, cannot attach under {new_parent}")]
    DuplicateParent {
        /// The node being attached.
        id: TaxId,
        /// The parent the node already has.
        existing_parent: TaxId,
        /// The parent the rejected edge asked for.
        new_parent: TaxId,
    },

    /// Zero or several root candidates were found.
    #[error("expected exactly one root, found {}: {candidates:?}", candidates.len())]
    RootAmbiguity {
        /// Every self-referencing node seen, in input order.
        candidates: Vec<TaxId>,
    },

    /// An operation referenced an id that was never declared.
    #[error("unknown node id: {0}")]
    UnknownNode(TaxId),
}

/// Result type for tree operations.
pub type TreeResult<T> = std::result::Result<T, TreeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_missing_parent() {
        let err = TreeError::MissingParent {
            child_id: 562,
            parent_id: 561,
        };
        assert_eq!(
            err.to_string(),
            "no node for parent id 561 (referenced by child 562)"
        );
    }

    #[test]
    fn test_error_display_duplicate_parent() {
        let err = TreeError::DuplicateParent {
            id: 4,
            existing_parent: 2,
            new_parent: 3,
        };
        assert_eq!(
            err.to_string(),
            "node 4 is already attached under 2, cannot attach under 3"
        );
    }

    #[test]
    fn test_error_display_root_ambiguity() {
        let err = TreeError::RootAmbiguity { candidates: vec![] };
        assert_eq!(err.to_string(), "expected exactly one root, found 0: []");

        let err = TreeError::RootAmbiguity {
            candidates: vec![1, 7],
        };
        assert_eq!(err.to_string(), "expected exactly one root, found 2: [1, 7]");
    }

    #[test]
    fn test_error_display_unknown_node() {
        assert_eq!(TreeError::UnknownNode(9606).to_string(), "unknown node id: 9606");
    }
}
