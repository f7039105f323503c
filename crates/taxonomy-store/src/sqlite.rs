//! SQLite-backed index store.
//!
//! Layout, for the default table name `taxonomy`:
//!
//! ```text
//! taxonomy          live rows, replaced wholesale on commit
//! taxonomy_staging  rows of the rebuild in progress
//! taxonomy_status   one row: state, row_count, updated_at, message
//! ```
//!
//! A rebuild loads into the staging table. Commit drops the live table,
//! renames staging into its place and builds the secondary indexes, all in
//! one transaction, so a reader sees either the old index or the new one.
//!
//! File-backed stores open a small pool of read-only connections beside
//! the writer. Under WAL each reader runs on its own snapshot, so queries
//! from different threads do not wait for one another.

use std::ops::Range;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Utc;
use parking_lot::{Mutex, MutexGuard};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row, Transaction};
use taxonomy_index::{
    IndexError, IndexReader, IndexResult, IndexRow, IndexState, RowSink, TaxId, TaxonomyQuery,
    WriteSummary,
};
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::status::IndexStatus;

const ROW_COLUMNS: &str = "id, parent_id, title, hidden, layer, lpos, ind, maxind, path, size";

/// Index store persisted in a SQLite database.
///
/// Writes go through `&mut self` and need no locking. Reads borrow an
/// idle connection from the read pool for one statement; an in-memory
/// store has no pool and reads through the writer connection.
pub struct SqliteIndexStore {
    conn: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    next_reader: AtomicUsize,
    config: StoreConfig,
    rebuilding: bool,
}

impl std::fmt::Debug for SqliteIndexStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteIndexStore")
            .field("table", &self.config.table_name)
            .field("readers", &self.readers.len())
            .field("rebuilding", &self.rebuilding)
            .finish_non_exhaustive()
    }
}

impl SqliteIndexStore {
    /// Opens (or creates) the database at `path`.
    ///
    /// Missing parent directories are created. Besides the writer,
    /// `config.read_connections` read-only connections are opened.
    pub fn open(path: impl AsRef<Path>, config: StoreConfig) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::io_error(parent, e))?;
        }
        let conn = Connection::open(path)?;
        // Each ":memory:" connection is a separate database.
        let readers = if path.as_os_str() == ":memory:" {
            0
        } else {
            config.read_connections
        };
        let mut store = Self::from_connection(conn, config)?;
        store.readers = (0..readers)
            .map(|_| {
                Connection::open_with_flags(
                    path,
                    OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
                )
                .map(Mutex::new)
            })
            .collect::<Result<_, _>>()?;
        debug!(path = %path.display(), readers, "taxonomy.store.open");
        Ok(store)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory(config: StoreConfig) -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?, config)
    }

    /// Wraps an open connection, applying pragmas and the status schema.
    pub fn from_connection(conn: Connection, config: StoreConfig) -> StoreResult<Self> {
        config.validate()?;

        let journal: String = conn.pragma_update_and_check(
            None,
            "journal_mode",
            config.journal_mode.as_str(),
            |row| row.get(0),
        )?;
        conn.pragma_update(None, "synchronous", config.synchronous.as_str())?;
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {status} (
                 id         INTEGER PRIMARY KEY CHECK (id = 1),
                 state      TEXT NOT NULL,
                 row_count  INTEGER NOT NULL,
                 updated_at TEXT NOT NULL,
                 message    TEXT
             )",
            status = config.status_table(),
        ))?;

        let store = Self {
            conn: Mutex::new(conn),
            readers: Vec::new(),
            next_reader: AtomicUsize::new(0),
            config,
            rebuilding: false,
        };
        let status = store.status()?;
        if status.state == IndexState::Building {
            warn!(
                table = %store.config.table_name,
                since = %status.updated_at.to_rfc3339(),
                "taxonomy.store.interrupted_rebuild"
            );
        }
        info!(
            table = %store.config.table_name,
            journal_mode = %journal,
            state = %status.state,
            rows = status.row_count,
            "taxonomy.store.ready"
        );
        Ok(store)
    }

    /// The store's configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Number of pooled read-only connections.
    pub fn read_connections(&self) -> usize {
        self.readers.len()
    }

    /// Reads the rebuild status record.
    pub fn status(&self) -> StoreResult<IndexStatus> {
        let conn = self.reader();
        let found = conn
            .query_row(
                &format!(
                    "SELECT state, row_count, updated_at, message FROM {} WHERE id = 1",
                    self.config.status_table()
                ),
                [],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                },
            )
            .optional()?;
        match found {
            Some((state, row_count, updated_at, message)) => {
                IndexStatus::from_columns(&state, row_count, &updated_at, message)
            }
            None => Ok(IndexStatus::missing()),
        }
    }

    /// Returns true if a committed index table exists.
    pub fn is_ready(&self) -> StoreResult<bool> {
        let conn = self.reader();
        table_exists(&conn, &self.config.table_name)
    }

    /// A query layer reading from this store.
    pub fn query(&self) -> TaxonomyQuery<'_> {
        TaxonomyQuery::new(self)
    }

    /// Closes every connection, surfacing any error SQLite reports on close.
    ///
    /// Dropping the store also closes it, but silently.
    pub fn close(self) -> StoreResult<()> {
        if self.rebuilding {
            warn!(table = %self.config.table_name, "taxonomy.store.closed_mid_rebuild");
        }
        for reader in self.readers {
            reader
                .into_inner()
                .close()
                .map_err(|(_, err)| StoreError::Sqlite(err))?;
        }
        self.conn
            .into_inner()
            .close()
            .map_err(|(_, err)| StoreError::Sqlite(err))
    }

    fn begin(&mut self) -> StoreResult<()> {
        let staging = self.config.staging_table();
        let conn = self.conn.get_mut();
        let tx = conn.transaction()?;
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {staging};
             CREATE TABLE {staging} (
                 id        INTEGER PRIMARY KEY,
                 parent_id INTEGER,
                 title     TEXT NOT NULL,
                 hidden    INTEGER NOT NULL,
                 layer     INTEGER NOT NULL,
                 lpos      INTEGER NOT NULL,
                 ind       INTEGER NOT NULL,
                 maxind    INTEGER NOT NULL,
                 path      TEXT NOT NULL,
                 size      INTEGER NOT NULL
             );"
        ))?;
        let live_rows = table_row_count(&tx, &self.config.table_name)?;
        write_status(&tx, &self.config, IndexState::Building, live_rows, None)?;
        tx.commit()?;
        self.rebuilding = true;
        info!(table = %self.config.table_name, "taxonomy.store.rebuild_begin");
        Ok(())
    }

    fn insert(&mut self, rows: &[IndexRow]) -> StoreResult<()> {
        if !self.rebuilding {
            return Err(StoreError::NoRebuildInProgress);
        }
        let sql = format!(
            "INSERT INTO {} ({ROW_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            self.config.staging_table()
        );
        let conn = self.conn.get_mut();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(&sql)?;
            for row in rows {
                stmt.execute(params![
                    row.id,
                    row.parent_id,
                    row.title,
                    row.hidden,
                    row.layer,
                    row.lpos,
                    row.ind,
                    row.maxind,
                    row.path,
                    row.size,
                ])?;
            }
        }
        tx.commit()?;
        debug!(rows = rows.len(), "taxonomy.store.batch_inserted");
        Ok(())
    }

    fn commit(&mut self, summary: &WriteSummary) -> StoreResult<()> {
        if !self.rebuilding {
            return Err(StoreError::NoRebuildInProgress);
        }
        let table = self.config.table_name.clone();
        let staging = self.config.staging_table();
        let conn = self.conn.get_mut();
        let tx = conn.transaction()?;

        let found = table_row_count(&tx, &staging)?;
        if found != summary.rows_written {
            return Err(StoreError::RowCountMismatch {
                expected: summary.rows_written,
                found,
            });
        }
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {table};
             ALTER TABLE {staging} RENAME TO {table};
             CREATE INDEX idx_{table}_parent_id ON {table} (parent_id);
             CREATE INDEX idx_{table}_layer_lpos ON {table} (layer, lpos);
             CREATE INDEX idx_{table}_ind ON {table} (ind);"
        ))?;
        write_status(&tx, &self.config, IndexState::Complete, found, None)?;
        tx.commit()?;

        self.rebuilding = false;
        info!(
            table = %table,
            rows = found,
            batches = summary.batches,
            "taxonomy.store.rebuild_committed"
        );
        Ok(())
    }

    fn abort(&mut self, reason: &str) -> StoreResult<()> {
        let staging = self.config.staging_table();
        let conn = self.conn.get_mut();
        let tx = conn.transaction()?;
        tx.execute_batch(&format!("DROP TABLE IF EXISTS {staging};"))?;
        let live_rows = table_row_count(&tx, &self.config.table_name)?;
        write_status(&tx, &self.config, IndexState::Failed, live_rows, Some(reason))?;
        tx.commit()?;

        self.rebuilding = false;
        warn!(
            table = %self.config.table_name,
            reason,
            kept_rows = live_rows,
            "taxonomy.store.rebuild_aborted"
        );
        Ok(())
    }

    /// Locks a connection for one read.
    ///
    /// Prefers an idle pooled reader, starting from a rotating offset, and
    /// waits on that offset's reader only when all are busy.
    fn reader(&self) -> MutexGuard<'_, Connection> {
        if self.readers.is_empty() {
            return self.conn.lock();
        }
        let count = self.readers.len();
        let start = self.next_reader.fetch_add(1, Ordering::Relaxed) % count;
        (0..count)
            .find_map(|offset| self.readers[(start + offset) % count].try_lock())
            .unwrap_or_else(|| self.readers[start].lock())
    }

    /// Runs a row-returning statement against the live table.
    ///
    /// `clause` follows `FROM <table>` and may use `?1..`.
    fn select<P: rusqlite::Params>(&self, clause: &str, params: P) -> StoreResult<Vec<IndexRow>> {
        let conn = self.reader();
        self.ensure_live(&conn)?;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {ROW_COLUMNS} FROM {} {clause}",
            self.config.table_name
        ))?;
        let rows = stmt
            .query_map(params, read_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Fails with [`StoreError::IndexNotReady`] unless the live table exists.
    fn ensure_live(&self, conn: &Connection) -> StoreResult<()> {
        if table_exists(conn, &self.config.table_name)? {
            return Ok(());
        }
        let state: Option<String> = conn
            .query_row(
                &format!(
                    "SELECT state FROM {} WHERE id = 1",
                    self.config.status_table()
                ),
                [],
                |row| row.get(0),
            )
            .optional()?;
        let state = state
            .as_deref()
            .and_then(IndexState::parse)
            .unwrap_or(IndexState::Missing);
        Err(StoreError::IndexNotReady(state))
    }
}

fn table_exists(conn: &Connection, name: &str) -> StoreResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Row count of `table`, zero if it does not exist.
fn table_row_count(tx: &Transaction<'_>, table: &str) -> StoreResult<usize> {
    if !table_exists(tx, table)? {
        return Ok(0);
    }
    let count: i64 = tx.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get(0)
    })?;
    Ok(usize::try_from(count).unwrap_or(0))
}

fn write_status(
    tx: &Transaction<'_>,
    config: &StoreConfig,
    state: IndexState,
    row_count: usize,
    message: Option<&str>,
) -> StoreResult<()> {
    tx.execute(
        &format!(
            "INSERT INTO {} (id, state, row_count, updated_at, message)
             VALUES (1, ?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
               state = excluded.state,
               row_count = excluded.row_count,
               updated_at = excluded.updated_at,
               message = excluded.message",
            config.status_table()
        ),
        params![
            state.as_str(),
            row_count as i64,
            Utc::now().to_rfc3339(),
            message
        ],
    )?;
    Ok(())
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<IndexRow> {
    Ok(IndexRow {
        id: row.get(0)?,
        parent_id: row.get(1)?,
        title: row.get(2)?,
        hidden: row.get(3)?,
        layer: row.get(4)?,
        lpos: row.get(5)?,
        ind: row.get(6)?,
        maxind: row.get(7)?,
        path: row.get(8)?,
        size: row.get(9)?,
    })
}

impl RowSink for SqliteIndexStore {
    fn begin_rebuild(&mut self) -> IndexResult<()> {
        Ok(self.begin()?)
    }

    fn write_rows(&mut self, rows: &[IndexRow]) -> IndexResult<()> {
        Ok(self.insert(rows)?)
    }

    fn commit_rebuild(&mut self, summary: &WriteSummary) -> IndexResult<()> {
        Ok(self.commit(summary)?)
    }

    fn abort_rebuild(&mut self, reason: &str) -> IndexResult<()> {
        Ok(self.abort(reason)?)
    }
}

impl IndexReader for SqliteIndexStore {
    fn row(&self, id: TaxId) -> IndexResult<Option<IndexRow>> {
        Ok(self.select("WHERE id = ?1", [id])?.into_iter().next())
    }

    fn child_rows(&self, parent_id: TaxId) -> IndexResult<Vec<IndexRow>> {
        Ok(self.select("WHERE parent_id = ?1 ORDER BY ind", [parent_id])?)
    }

    fn rows_in_range(&self, lo: u32, hi: u32) -> IndexResult<Vec<IndexRow>> {
        Ok(self.select("WHERE ind BETWEEN ?1 AND ?2 ORDER BY ind", [lo, hi])?)
    }

    fn layer_rows(&self, layer: u32, lpos: Range<u32>) -> IndexResult<Vec<IndexRow>> {
        Ok(self.select(
            "WHERE layer = ?1 AND lpos >= ?2 AND lpos < ?3 ORDER BY lpos",
            [layer, lpos.start, lpos.end],
        )?)
    }

    fn row_count(&self) -> IndexResult<usize> {
        let conn = self.reader();
        self.ensure_live(&conn)?;
        let count: i64 = conn
            .query_row(
                &format!("SELECT COUNT(*) FROM {}", self.config.table_name),
                [],
                |row| row.get(0),
            )
            .map_err(StoreError::from)?;
        usize::try_from(count).map_err(|_| IndexError::store(format!("negative row count {count}")))
    }
}
