//! Read-only queries over a persisted nested-set index.

use std::ops::Range;

use taxonomy_tree::TaxId;
use tracing::debug;

use crate::cache::{CacheStats, RowCache};
use crate::config::IndexConfig;
use crate::error::{IndexError, IndexResult};
use crate::row::{IndexRow, LineageEntry, NodeSummary};
use crate::traits::IndexReader;

/// Query layer over any [`IndexReader`].
///
/// Every operation is a bounded number of keyed lookups or one range scan;
/// none walks the tree. The query layer holds no mutable state beside its
/// optional row cache, so one instance can serve many threads.
///
/// # Example
///
/// ```rust
/// use taxonomy_index::{rebuild, IndexConfig, MemoryIndex, TaxonomyQuery};
/// use taxonomy_tree::TreeBuilder;
///
/// let mut builder = TreeBuilder::new();
/// builder.add_edge(1, "root", 1).unwrap();
/// builder.add_edge(2, "A", 1).unwrap();
/// builder.add_edge(3, "B", 1).unwrap();
/// builder.add_edge(4, "A1", 2).unwrap();
///
/// let mut store = MemoryIndex::new();
/// rebuild(builder.build().unwrap(), &mut store, &IndexConfig::default()).unwrap();
///
/// let query = TaxonomyQuery::new(&store);
/// assert_eq!(query.get_path(4).unwrap(), vec![1, 2, 4]);
/// assert!(query.is_ancestor(1, 4).unwrap());
/// assert!(!query.is_ancestor(3, 4).unwrap());
/// ```
pub struct TaxonomyQuery<'a> {
    reader: &'a dyn IndexReader,
    cache: Option<RowCache>,
}

impl<'a> TaxonomyQuery<'a> {
    /// Creates a query layer without caching.
    pub fn new(reader: &'a dyn IndexReader) -> Self {
        Self {
            reader,
            cache: None,
        }
    }

    /// Creates a query layer, caching rows if `config.cache` is set.
    pub fn with_config(reader: &'a dyn IndexReader, config: &IndexConfig) -> Self {
        let cache = config
            .cache
            .as_ref()
            .map(|c| RowCache::new(c.clone()));
        Self { reader, cache }
    }

    /// Returns a reference to the cache if enabled.
    pub fn cache(&self) -> Option<&RowCache> {
        self.cache.as_ref()
    }

    /// Drops all cached rows. Call after the index has been rebuilt.
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
            debug!("taxonomy.query.cache_cleared");
        }
    }

    /// Cache statistics, `None` if caching is disabled.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|c| c.stats())
    }

    /// Loads the row for `id`, going through the cache when enabled.
    ///
    /// # Errors
    ///
    /// [`IndexError::NodeNotFound`] if no row exists.
    pub fn row(&self, id: TaxId) -> IndexResult<IndexRow> {
        if let Some(cache) = &self.cache {
            if let Some(row) = cache.get(id) {
                return Ok(row);
            }
        }
        let row = self
            .reader
            .row(id)?
            .ok_or(IndexError::NodeNotFound(id))?;
        if let Some(cache) = &self.cache {
            cache.insert(row.clone());
        }
        Ok(row)
    }

    /// Ancestor ids of `id`, root first, ending with `id` itself.
    ///
    /// Decoded from the stored materialized path; no parent lookups.
    pub fn get_path(&self, id: TaxId) -> IndexResult<Vec<TaxId>> {
        self.row(id)?.path_ids()
    }

    /// The `(id, title, hidden)` summary of one node.
    pub fn get_node(&self, id: TaxId) -> IndexResult<NodeSummary> {
        Ok(self.row(id)?.summary())
    }

    /// Direct children of `id`, in pre-order.
    ///
    /// An unknown id or a leaf yields an empty list, not an error.
    pub fn get_children(&self, id: TaxId) -> IndexResult<Vec<NodeSummary>> {
        Ok(self
            .reader
            .child_rows(id)?
            .iter()
            .map(IndexRow::summary)
            .collect())
    }

    /// Returns true if `ancestor` is `descendant` or one of its ancestors.
    ///
    /// Two keyed lookups and an interval comparison.
    ///
    /// # Errors
    ///
    /// [`IndexError::NodeNotFound`] if either id has no row.
    pub fn is_ancestor(&self, ancestor: TaxId, descendant: TaxId) -> IndexResult<bool> {
        let a = self.row(ancestor)?;
        let d = self.row(descendant)?;
        Ok(a.contains(&d))
    }

    /// Every row in the subtree rooted at `id` (inclusive), in pre-order.
    pub fn subtree_of(&self, id: TaxId) -> IndexResult<Vec<IndexRow>> {
        let root = self.row(id)?;
        self.reader.rows_in_range(root.ind, root.maxind)
    }

    /// Number of nodes strictly below `id`.
    ///
    /// # Errors
    ///
    /// [`IndexError::CorruptRow`] if the stored interval is inverted.
    pub fn descendant_count(&self, id: TaxId) -> IndexResult<u32> {
        self.row(id)?.descendant_count()
    }

    /// Each node on the path to `id` with its number of direct children.
    ///
    /// # Errors
    ///
    /// [`IndexError::CorruptRow`] if the path names an id with no row.
    pub fn lineage(&self, id: TaxId) -> IndexResult<Vec<LineageEntry>> {
        let path = self.get_path(id)?;
        path.into_iter()
            .map(|step| {
                let row = self.row(step).map_err(|err| match err {
                    IndexError::NodeNotFound(missing) => IndexError::CorruptRow {
                        id,
                        message: format!("path references missing node {missing}"),
                    },
                    other => other,
                })?;
                Ok(LineageEntry {
                    node: row.summary(),
                    child_count: row.size,
                })
            })
            .collect()
    }

    /// Rows of `layer` whose `lpos` lies in `lpos`, ordered by `lpos`.
    pub fn layer_slice(&self, layer: u32, lpos: Range<u32>) -> IndexResult<Vec<IndexRow>> {
        self.reader.layer_rows(layer, lpos)
    }

    /// Number of rows in the live index.
    pub fn node_count(&self) -> IndexResult<usize> {
        self.reader.row_count()
    }
}

impl std::fmt::Debug for TaxonomyQuery<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaxonomyQuery")
            .field("cache", &self.cache)
            .finish()
    }
}
