//! Flattening an indexed tree into rows and loading them in batches.
//!
//! [`rows`] walks the tree a second time, pre-order, computing each node's
//! materialized path from its parent's. [`BatchWriter`] buffers at most
//! `batch_size` rows before handing them to a [`RowSink`], so the full row
//! set is never held in memory at once. [`persist`] wraps both in the
//! sink's rebuild protocol.

use std::rc::Rc;
use std::time::{Duration, Instant};

use taxonomy_tree::{NodeRef, TaxId};
use tracing::{debug, info, warn};

use crate::error::{IndexError, IndexResult};
use crate::indexer::IndexedTree;
use crate::row::{child_path, IndexRow};
use crate::traits::RowSink;

/// Outcome of a completed row load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Rows handed to the sink.
    pub rows_written: usize,
    /// Number of batches flushed.
    pub batches: usize,
    /// Time spent loading.
    pub duration: Duration,
}

/// Pre-order iterator producing one [`IndexRow`] per node.
pub struct RowIter<'a> {
    indexed: &'a IndexedTree,
    /// Pending nodes with their parent's id and path.
    stack: Vec<(NodeRef, Option<TaxId>, Rc<str>)>,
}

/// Returns the rows of `indexed`, root first, in pre-order.
pub fn rows(indexed: &IndexedTree) -> RowIter<'_> {
    let root = indexed.tree().root();
    RowIter {
        indexed,
        stack: vec![(root, None, Rc::from(""))],
    }
}

impl Iterator for RowIter<'_> {
    type Item = IndexRow;

    fn next(&mut self) -> Option<IndexRow> {
        let (current, parent_id, parent_path) = self.stack.pop()?;
        let node = self.indexed.tree().node(current);
        let entry = self.indexed.entry(current);
        let path: Rc<str> = Rc::from(child_path(&parent_path, node.id()));

        self.stack.extend(
            node.children()
                .iter()
                .rev()
                .map(|&child| (child, Some(node.id()), Rc::clone(&path))),
        );

        Some(IndexRow {
            id: node.id(),
            parent_id,
            title: node.title().to_string(),
            hidden: node.is_hidden(),
            layer: entry.layer,
            lpos: entry.lpos,
            ind: entry.ind,
            maxind: entry.maxind,
            path: path.to_string(),
            size: node.child_count() as u32,
        })
    }
}

/// Buffers rows and flushes them to a sink in fixed-size batches.
pub struct BatchWriter<'a, S: RowSink + ?Sized> {
    sink: &'a mut S,
    buffer: Vec<IndexRow>,
    batch_size: usize,
    rows_written: usize,
    batches: usize,
}

impl<'a, S: RowSink + ?Sized> BatchWriter<'a, S> {
    /// Creates a writer flushing every `batch_size` rows.
    ///
    /// # Errors
    ///
    /// [`IndexError::InvalidConfig`] if `batch_size` is zero.
    pub fn new(sink: &'a mut S, batch_size: usize) -> IndexResult<Self> {
        if batch_size == 0 {
            return Err(IndexError::InvalidConfig(
                "batch_size must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            sink,
            buffer: Vec::with_capacity(batch_size),
            batch_size,
            rows_written: 0,
            batches: 0,
        })
    }

    /// Adds a row, flushing if the buffer is full.
    pub fn push(&mut self, row: IndexRow) -> IndexResult<()> {
        self.buffer.push(row);
        if self.buffer.len() >= self.batch_size {
            self.flush()?;
        }
        Ok(())
    }

    /// Hands all buffered rows to the sink.
    ///
    /// On error the rows stay buffered and nothing is counted as written.
    pub fn flush(&mut self) -> IndexResult<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        self.sink.write_rows(&self.buffer)?;
        self.rows_written += self.buffer.len();
        self.batches += 1;
        debug!(
            batch = self.batches,
            rows = self.buffer.len(),
            total = self.rows_written,
            "taxonomy.persist.flush"
        );
        self.buffer.clear();
        Ok(())
    }

    /// Rows successfully handed to the sink so far.
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Rows waiting in the buffer.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Flushes the remainder and returns the totals.
    pub fn finish(mut self) -> IndexResult<(usize, usize)> {
        self.flush()?;
        Ok((self.rows_written, self.batches))
    }

    /// Drops any buffered rows, returning how many there were.
    pub fn discard(mut self) -> usize {
        let dropped = self.buffer.len();
        self.buffer.clear();
        dropped
    }
}

impl<S: RowSink + ?Sized> Drop for BatchWriter<'_, S> {
    fn drop(&mut self) {
        if !self.buffer.is_empty() {
            warn!(
                pending = self.buffer.len(),
                rows_written = self.rows_written,
                "taxonomy.persist.unflushed_rows_dropped"
            );
        }
    }
}

/// Writes every row of `indexed` into `sink` as one rebuild.
///
/// On success the sink has committed the new index. If any batch fails,
/// the sink is asked to abort (keeping its previous index) and the call
/// returns [`IndexError::IncompleteRebuild`] with the number of rows that
/// had been written.
///
/// # Errors
///
/// [`IndexError::InvalidConfig`] if `batch_size` is zero; the sink is not
/// touched in that case.
pub fn persist<S: RowSink + ?Sized>(
    indexed: &IndexedTree,
    sink: &mut S,
    batch_size: usize,
) -> IndexResult<WriteSummary> {
    if batch_size == 0 {
        return Err(IndexError::InvalidConfig(
            "batch_size must be greater than zero".to_string(),
        ));
    }
    let start = Instant::now();
    sink.begin_rebuild()?;

    let outcome = load(indexed, sink, batch_size);
    match outcome {
        Ok((rows_written, batches)) => {
            let summary = WriteSummary {
                rows_written,
                batches,
                duration: start.elapsed(),
            };
            if let Err(err) = sink.commit_rebuild(&summary) {
                warn!(error = %err, "taxonomy.persist.commit_failed");
                return Err(abort(sink, err));
            }
            info!(
                rows = summary.rows_written,
                batches = summary.batches,
                duration_ms = summary.duration.as_millis() as u64,
                "taxonomy.persist.complete"
            );
            Ok(summary)
        }
        Err(err) => {
            warn!(error = %err, "taxonomy.persist.aborted");
            Err(abort(sink, err))
        }
    }
}

/// Asks the sink to abort, handing back the error that stopped the rebuild.
///
/// A failing abort is logged; it never replaces `cause`.
fn abort<S: RowSink + ?Sized>(sink: &mut S, cause: IndexError) -> IndexError {
    if let Err(err) = sink.abort_rebuild(&cause.to_string()) {
        warn!(error = %err, cause = %cause, "taxonomy.persist.abort_failed");
    }
    cause
}

/// Streams all rows through a [`BatchWriter`].
fn load<S: RowSink + ?Sized>(
    indexed: &IndexedTree,
    sink: &mut S,
    batch_size: usize,
) -> IndexResult<(usize, usize)> {
    let mut writer = BatchWriter::new(sink, batch_size)?;
    if let Err(err) = rows(indexed).try_for_each(|row| writer.push(row)) {
        let rows_written = writer.rows_written();
        let dropped = writer.discard();
        debug!(dropped, "taxonomy.persist.discarded_after_error");
        return Err(IndexError::IncompleteRebuild {
            rows_written,
            reason: err.to_string(),
        });
    }
    let rows_written = writer.rows_written();
    writer
        .finish()
        .map_err(|err| IndexError::IncompleteRebuild {
            rows_written,
            reason: err.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::index;
    use taxonomy_tree::TreeBuilder;

    /// Sink that records every call and can fail on a chosen batch.
    #[derive(Default)]
    struct RecordingSink {
        batches: Vec<Vec<IndexRow>>,
        fail_on_batch: Option<usize>,
        fail_commit: bool,
        fail_abort: bool,
        events: Vec<&'static str>,
    }

    impl RowSink for RecordingSink {
        fn begin_rebuild(&mut self) -> IndexResult<()> {
            self.events.push("begin");
            self.batches.clear();
            Ok(())
        }

        fn write_rows(&mut self, rows: &[IndexRow]) -> IndexResult<()> {
            if self.fail_on_batch == Some(self.batches.len()) {
                return Err(IndexError::store("simulated write failure"));
            }
            self.batches.push(rows.to_vec());
            Ok(())
        }

        fn commit_rebuild(&mut self, _summary: &WriteSummary) -> IndexResult<()> {
            self.events.push("commit");
            if self.fail_commit {
                return Err(IndexError::store("simulated commit failure"));
            }
            Ok(())
        }

        fn abort_rebuild(&mut self, _reason: &str) -> IndexResult<()> {
            self.events.push("abort");
            if self.fail_abort {
                return Err(IndexError::store("connection gone"));
            }
            Ok(())
        }
    }

    /// Creates the reference hierarchy:
    /// ```text
    /// 1 (root)
    ///  |-- 2 (A)
    ///  |    |-- 4 (A1)
    ///  |-- 3 (B)
    /// ```
    fn create_indexed() -> IndexedTree {
        let mut builder = TreeBuilder::new();
        builder.add_edge(1, "root", 1).unwrap();
        builder.add_edge(2, "A", 1).unwrap();
        builder.add_edge(3, "B", 1).unwrap();
        builder.add_edge(4, "A1", 2).unwrap();
        index(builder.build().unwrap())
    }

    /// Creates a root with `len - 1` leaf children.
    fn create_star(len: TaxId) -> IndexedTree {
        let mut builder = TreeBuilder::new();
        builder.add_edge(0, "root", 0).unwrap();
        for id in 1..len {
            builder.add_edge(id, format!("n{id}"), 0).unwrap();
        }
        index(builder.build().unwrap())
    }

    #[test]
    fn test_rows_in_preorder_with_paths() {
        let indexed = create_indexed();
        let all: Vec<IndexRow> = rows(&indexed).collect();

        let ids: Vec<TaxId> = all.iter().map(|row| row.id).collect();
        assert_eq!(ids, vec![1, 2, 4, 3]);

        let paths: Vec<&str> = all.iter().map(|row| row.path.as_str()).collect();
        assert_eq!(paths, vec!["/1", "/1/2", "/1/2/4", "/1/3"]);
    }

    #[test]
    fn test_row_columns() {
        let indexed = create_indexed();
        let all: Vec<IndexRow> = rows(&indexed).collect();

        let root = &all[0];
        assert_eq!(root.parent_id, None);
        assert_eq!((root.layer, root.lpos, root.ind, root.maxind), (0, 0, 0, 3));
        assert_eq!(root.size, 2);

        let a1 = &all[2];
        assert_eq!(a1.parent_id, Some(2));
        assert_eq!(a1.title, "A1");
        assert_eq!((a1.layer, a1.lpos, a1.ind, a1.maxind), (2, 0, 2, 2));
        assert_eq!(a1.size, 0);

        let b = &all[3];
        assert_eq!((b.layer, b.lpos), (1, 1));
    }

    #[test]
    fn test_batches_are_bounded() {
        let indexed = create_star(2_501);
        let mut sink = RecordingSink::default();

        let summary = persist(&indexed, &mut sink, 1000).unwrap();

        assert_eq!(summary.rows_written, 2_501);
        assert_eq!(summary.batches, 3);
        let sizes: Vec<usize> = sink.batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![1000, 1000, 501]);
        assert_eq!(sink.events, vec!["begin", "commit"]);
    }

    #[test]
    fn test_failed_abort_keeps_incomplete_error() {
        let indexed = create_star(2_501);
        let mut sink = RecordingSink {
            fail_on_batch: Some(2),
            fail_abort: true,
            ..RecordingSink::default()
        };

        let err = persist(&indexed, &mut sink, 1000).unwrap_err();

        assert!(matches!(
            err,
            IndexError::IncompleteRebuild {
                rows_written: 2000,
                ..
            }
        ));
        assert_eq!(sink.events, vec!["begin", "abort"]);
    }

    #[test]
    fn test_failed_abort_keeps_commit_error() {
        let indexed = create_indexed();
        let mut sink = RecordingSink {
            fail_commit: true,
            fail_abort: true,
            ..RecordingSink::default()
        };

        let err = persist(&indexed, &mut sink, 10).unwrap_err();

        assert!(matches!(err, IndexError::Store(ref msg) if msg == "simulated commit failure"));
        assert_eq!(sink.events, vec!["begin", "commit", "abort"]);
    }

    #[test]
    fn test_failure_aborts_and_reports_incomplete() {
        let indexed = create_star(2_501);
        let mut sink = RecordingSink {
            fail_on_batch: Some(2),
            ..RecordingSink::default()
        };

        let err = persist(&indexed, &mut sink, 1000).unwrap_err();

        match err {
            IndexError::IncompleteRebuild { rows_written, .. } => {
                assert_eq!(rows_written, 2000)
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(sink.events, vec!["begin", "abort"]);
    }

    #[test]
    fn test_failure_on_final_flush() {
        let indexed = create_indexed();
        let mut sink = RecordingSink {
            fail_on_batch: Some(0),
            ..RecordingSink::default()
        };

        let err = persist(&indexed, &mut sink, 1000).unwrap_err();
        assert!(matches!(
            err,
            IndexError::IncompleteRebuild { rows_written: 0, .. }
        ));
        assert_eq!(sink.events, vec!["begin", "abort"]);
    }

    #[test]
    fn test_zero_batch_size_rejected_before_begin() {
        let indexed = create_indexed();
        let mut sink = RecordingSink::default();

        let err = persist(&indexed, &mut sink, 0).unwrap_err();
        assert!(matches!(err, IndexError::InvalidConfig(_)));
        assert!(sink.events.is_empty());
    }

    #[test]
    fn test_batch_writer_counts() {
        let indexed = create_indexed();
        let mut sink = RecordingSink::default();
        let mut writer = BatchWriter::new(&mut sink, 3).unwrap();

        for row in rows(&indexed) {
            writer.push(row).unwrap();
        }
        assert_eq!(writer.rows_written(), 3);
        assert_eq!(writer.pending(), 1);

        let (written, batches) = writer.finish().unwrap();
        assert_eq!((written, batches), (4, 2));
    }
}
