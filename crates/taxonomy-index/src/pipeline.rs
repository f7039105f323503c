//! The full rebuild: splice, index, persist.

use std::time::{Duration, Instant};

use taxonomy_tree::{Edge, TaxTree, TreeBuilder};
use tracing::info;

use crate::config::IndexConfig;
use crate::error::IndexResult;
use crate::indexer::index;
use crate::persister::{persist, WriteSummary};
use crate::stats::IndexStats;
use crate::traits::RowSink;

/// Outcome of a successful rebuild.
#[derive(Debug, Clone)]
pub struct RebuildReport {
    /// Shape of the indexed tree.
    pub stats: IndexStats,
    /// What was handed to the sink.
    pub write: WriteSummary,
    /// Wall time of the whole rebuild.
    pub duration: Duration,
}

impl RebuildReport {
    /// Rows persisted.
    pub fn rows_written(&self) -> usize {
        self.write.rows_written
    }
}

/// Rebuilds the index in `sink` from an already built tree.
///
/// Runs the hidden-node splice when `config.remove_hidden` is set, then
/// indexes the tree and loads the rows in batches of `config.batch_size`.
/// The rebuild is all or nothing from the sink's point of view.
///
/// # Errors
///
/// - [`IndexError::InvalidConfig`](crate::IndexError::InvalidConfig) if
///   the configuration does not validate; the sink is not touched.
/// - [`IndexError::IncompleteRebuild`](crate::IndexError::IncompleteRebuild)
///   if writing failed partway.
pub fn rebuild<S: RowSink + ?Sized>(
    tree: TaxTree,
    sink: &mut S,
    config: &IndexConfig,
) -> IndexResult<RebuildReport> {
    config.validate()?;
    let start = Instant::now();
    info!(
        nodes = tree.node_count(),
        hidden = tree.hidden_ids().len(),
        remove_hidden = config.remove_hidden,
        "taxonomy.rebuild.start"
    );

    let before = tree.node_count();
    let tree = if config.remove_hidden {
        tree.without_hidden()
    } else {
        tree
    };
    let hidden_removed = before - tree.node_count();

    let index_start = Instant::now();
    let indexed = index(tree);
    let stats = IndexStats {
        hidden_removed,
        build_time_ms: index_start.elapsed().as_millis() as u64,
        ..indexed.stats()
    };

    let write = persist(&indexed, sink, config.batch_size)?;
    let report = RebuildReport {
        stats,
        write,
        duration: start.elapsed(),
    };
    info!(
        rows = report.write.rows_written,
        batches = report.write.batches,
        hidden_removed,
        max_layer = report.stats.max_layer,
        duration_ms = report.duration.as_millis() as u64,
        "taxonomy.rebuild.complete"
    );
    Ok(report)
}

/// Builds a tree from edge tuples and rebuilds the index from it.
///
/// # Errors
///
/// Any [`TreeError`](taxonomy_tree::TreeError) from building, wrapped in
/// [`IndexError::Tree`](crate::IndexError::Tree), plus everything
/// [`rebuild`] returns.
pub fn rebuild_from_edges<'e, I, S>(
    edges: I,
    sink: &mut S,
    config: &IndexConfig,
) -> IndexResult<RebuildReport>
where
    I: IntoIterator<Item = &'e Edge>,
    S: RowSink + ?Sized,
{
    let mut builder = TreeBuilder::new();
    builder.extend(edges)?;
    rebuild(builder.build()?, sink, config)
}
