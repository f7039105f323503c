//! In-process backing store.
//!
//! [`MemoryIndex`] keeps the live index and the staging area of a running
//! rebuild as two independent sets of ordered maps. Commit swaps them;
//! abort drops the staging set. It follows the same protocol as the SQLite
//! store and is what tests and embedders without durable storage use.

use std::collections::{BTreeMap, HashMap};
use std::ops::Range;

use taxonomy_tree::TaxId;
use tracing::{info, warn};

use crate::error::{IndexError, IndexResult};
use crate::persister::WriteSummary;
use crate::row::IndexRow;
use crate::traits::{IndexReader, IndexState, RowSink};

/// One complete set of rows plus its secondary indexes.
#[derive(Debug, Default)]
struct Tables {
    rows: HashMap<TaxId, IndexRow>,
    /// parent id -> ind -> child id
    by_parent: HashMap<TaxId, BTreeMap<u32, TaxId>>,
    by_ind: BTreeMap<u32, TaxId>,
    by_layer: BTreeMap<(u32, u32), TaxId>,
}

impl Tables {
    fn insert(&mut self, row: IndexRow) -> IndexResult<()> {
        if self.rows.contains_key(&row.id) {
            return Err(IndexError::store(format!("duplicate row for node {}", row.id)));
        }
        if let Some(existing) = self.by_ind.get(&row.ind) {
            return Err(IndexError::store(format!(
                "ind {} of node {} already used by node {existing}",
                row.ind, row.id
            )));
        }
        if let Some(existing) = self.by_layer.get(&(row.layer, row.lpos)) {
            return Err(IndexError::store(format!(
                "layer {} lpos {} of node {} already used by node {existing}",
                row.layer, row.lpos, row.id
            )));
        }
        self.by_ind.insert(row.ind, row.id);
        self.by_layer.insert((row.layer, row.lpos), row.id);
        if let Some(parent) = row.parent_id {
            self.by_parent
                .entry(parent)
                .or_default()
                .insert(row.ind, row.id);
        }
        self.rows.insert(row.id, row);
        Ok(())
    }

    fn collect<'t>(&'t self, ids: impl Iterator<Item = &'t TaxId>) -> Vec<IndexRow> {
        ids.filter_map(|id| self.rows.get(id)).cloned().collect()
    }
}

/// An index held entirely in memory.
///
/// # Example
///
/// ```rust
/// use taxonomy_index::{IndexReader, IndexState, MemoryIndex};
///
/// let store = MemoryIndex::new();
/// assert_eq!(store.state(), IndexState::Missing);
/// assert!(store.row(1).is_err());
/// ```
#[derive(Debug)]
pub struct MemoryIndex {
    live: Option<Tables>,
    staging: Option<Tables>,
    state: IndexState,
    last_message: Option<String>,
}

impl Default for MemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryIndex {
    /// Creates an empty store with no index.
    pub fn new() -> Self {
        Self {
            live: None,
            staging: None,
            state: IndexState::Missing,
            last_message: None,
        }
    }

    /// Lifecycle state of the most recent rebuild.
    pub fn state(&self) -> IndexState {
        self.state
    }

    /// Failure reason recorded by the last aborted rebuild.
    pub fn last_message(&self) -> Option<&str> {
        self.last_message.as_deref()
    }

    /// Returns true if a committed index can serve reads.
    pub fn is_ready(&self) -> bool {
        self.live.is_some()
    }

    fn live(&self) -> IndexResult<&Tables> {
        self.live.as_ref().ok_or(IndexError::NotReady)
    }

    fn staging(&mut self) -> IndexResult<&mut Tables> {
        self.staging
            .as_mut()
            .ok_or_else(|| IndexError::store("no rebuild in progress"))
    }
}

impl RowSink for MemoryIndex {
    fn begin_rebuild(&mut self) -> IndexResult<()> {
        if self.staging.is_some() {
            warn!("taxonomy.memory.stale_staging_discarded");
        }
        self.staging = Some(Tables::default());
        self.state = IndexState::Building;
        Ok(())
    }

    fn write_rows(&mut self, rows: &[IndexRow]) -> IndexResult<()> {
        let staging = self.staging()?;
        for row in rows {
            staging.insert(row.clone())?;
        }
        Ok(())
    }

    fn commit_rebuild(&mut self, summary: &WriteSummary) -> IndexResult<()> {
        let staged = self.staging()?.rows.len();
        if staged != summary.rows_written {
            return Err(IndexError::IncompleteRebuild {
                rows_written: staged,
                reason: format!("expected {} rows", summary.rows_written),
            });
        }
        self.live = self.staging.take();
        self.state = IndexState::Complete;
        self.last_message = None;
        info!(rows = staged, "taxonomy.memory.committed");
        Ok(())
    }

    fn abort_rebuild(&mut self, reason: &str) -> IndexResult<()> {
        self.staging = None;
        self.state = IndexState::Failed;
        self.last_message = Some(reason.to_string());
        warn!(reason, kept_previous = self.live.is_some(), "taxonomy.memory.aborted");
        Ok(())
    }
}

impl IndexReader for MemoryIndex {
    fn row(&self, id: TaxId) -> IndexResult<Option<IndexRow>> {
        Ok(self.live()?.rows.get(&id).cloned())
    }

    fn child_rows(&self, parent_id: TaxId) -> IndexResult<Vec<IndexRow>> {
        let live = self.live()?;
        Ok(live
            .by_parent
            .get(&parent_id)
            .map(|children| live.collect(children.values()))
            .unwrap_or_default())
    }

    fn rows_in_range(&self, lo: u32, hi: u32) -> IndexResult<Vec<IndexRow>> {
        let live = self.live()?;
        if lo > hi {
            return Ok(Vec::new());
        }
        Ok(live.collect(live.by_ind.range(lo..=hi).map(|(_, id)| id)))
    }

    fn layer_rows(&self, layer: u32, lpos: Range<u32>) -> IndexResult<Vec<IndexRow>> {
        let live = self.live()?;
        if lpos.start >= lpos.end {
            return Ok(Vec::new());
        }
        let range = (layer, lpos.start)..(layer, lpos.end);
        Ok(live.collect(live.by_layer.range(range).map(|(_, id)| id)))
    }

    fn row_count(&self) -> IndexResult<usize> {
        Ok(self.live()?.rows.len())
    }
}
