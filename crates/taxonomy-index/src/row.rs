//! Persisted row types.

use taxonomy_tree::TaxId;

use crate::error::{IndexError, IndexResult};

/// One persisted index row, one per node.
///
/// `[ind, maxind]` is the node's nested-set interval: a node X lies in the
/// subtree of N exactly when `N.ind <= X.ind <= N.maxind`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndexRow {
    /// Node id (primary key).
    pub id: TaxId,
    /// Parent id, `None` for the root.
    pub parent_id: Option<TaxId>,
    /// Display label.
    pub title: String,
    /// Hidden flag from the source data.
    pub hidden: bool,
    /// Depth from the root (root = 0).
    pub layer: u32,
    /// Visitation sequence number within the layer.
    pub lpos: u32,
    /// Pre-order index.
    pub ind: u32,
    /// Largest pre-order index in the subtree.
    pub maxind: u32,
    /// `/`-delimited ancestor ids, root first, ending with this node.
    pub path: String,
    /// Number of direct children.
    pub size: u32,
}

impl IndexRow {
    /// Returns true if `other` is this node or one of its descendants.
    #[inline]
    pub fn contains(&self, other: &IndexRow) -> bool {
        self.ind <= other.ind && other.ind <= self.maxind
    }

    /// Returns true if the node has no children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.maxind == self.ind
    }

    /// Number of nodes strictly below this one.
    ///
    /// # Errors
    ///
    /// [`IndexError::CorruptRow`] if `maxind` is below `ind`.
    pub fn descendant_count(&self) -> IndexResult<u32> {
        self.maxind
            .checked_sub(self.ind)
            .ok_or_else(|| IndexError::CorruptRow {
                id: self.id,
                message: format!("maxind {} below ind {}", self.maxind, self.ind),
            })
    }

    /// Decodes the materialized path into ids, root first.
    pub fn path_ids(&self) -> IndexResult<Vec<TaxId>> {
        parse_path(&self.path).map_err(|message| IndexError::CorruptRow {
            id: self.id,
            message,
        })
    }

    /// The `(id, title, hidden)` projection of this row.
    pub fn summary(&self) -> NodeSummary {
        NodeSummary {
            id: self.id,
            title: self.title.clone(),
            hidden: self.hidden,
        }
    }
}

/// Minimal node description returned by lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeSummary {
    /// Node id.
    pub id: TaxId,
    /// Display label.
    pub title: String,
    /// Hidden flag.
    pub hidden: bool,
}

/// A path element returned by lineage queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineageEntry {
    /// The ancestor (or the node itself, last).
    pub node: NodeSummary,
    /// Its number of direct children.
    pub child_count: u32,
}

/// Appends `/id` to a parent path.
pub(crate) fn child_path(parent_path: &str, id: TaxId) -> String {
    format!("{parent_path}/{id}")
}

/// Splits a stored path on `/`, skipping empty segments.
pub(crate) fn parse_path(path: &str) -> Result<Vec<TaxId>, String> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            segment
                .parse::<TaxId>()
                .map_err(|e| format!("bad path segment {segment:?} in {path:?}: {e}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: TaxId, ind: u32, maxind: u32, path: &str) -> IndexRow {
        IndexRow {
            id,
            parent_id: None,
            title: format!("node {id}"),
            hidden: false,
            layer: 0,
            lpos: 0,
            ind,
            maxind,
            path: path.to_string(),
            size: 0,
        }
    }

    #[test]
    fn test_contains_is_inclusive_range() {
        let root = row(1, 0, 3, "/1");
        let a = row(2, 1, 2, "/1/2");
        let a1 = row(4, 2, 2, "/1/2/4");
        let b = row(3, 3, 3, "/1/3");

        assert!(root.contains(&a1));
        assert!(root.contains(&root));
        assert!(a.contains(&a1));
        assert!(!b.contains(&a1));
        assert!(!a1.contains(&a));
    }

    #[test]
    fn test_leaf_and_descendant_count() {
        let root = row(1, 0, 3, "/1");
        let leaf = row(3, 3, 3, "/1/3");

        assert!(!root.is_leaf());
        assert_eq!(root.descendant_count().unwrap(), 3);
        assert!(leaf.is_leaf());
        assert_eq!(leaf.descendant_count().unwrap(), 0);
    }

    #[test]
    fn test_inverted_interval_is_corrupt() {
        let err = row(1, 5, 2, "/1").descendant_count().unwrap_err();
        assert!(matches!(err, IndexError::CorruptRow { id: 1, .. }));
    }

    #[test]
    fn test_path_ids() {
        assert_eq!(row(4, 2, 2, "/1/2/4").path_ids().unwrap(), vec![1, 2, 4]);
        assert_eq!(row(1, 0, 0, "/1").path_ids().unwrap(), vec![1]);
        assert_eq!(row(4, 2, 2, "//1//4/").path_ids().unwrap(), vec![1, 4]);
    }

    #[test]
    fn test_corrupt_path() {
        let err = row(4, 2, 2, "/1/x/4").path_ids().unwrap_err();
        assert!(matches!(err, IndexError::CorruptRow { id: 4, .. }));
    }

    #[test]
    fn test_child_path() {
        assert_eq!(child_path("", 1), "/1");
        assert_eq!(child_path("/1/2", 4), "/1/2/4");
    }

    #[test]
    fn test_summary() {
        let summary = row(9606, 5, 5, "/1/9606").summary();
        assert_eq!(summary.id, 9606);
        assert_eq!(summary.title, "node 9606");
        assert!(!summary.hidden);
    }
}
