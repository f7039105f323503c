//! Error types for the SQLite store.

use std::path::PathBuf;

use taxonomy_index::{IndexError, IndexState};

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while opening, loading or reading the store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Error reported by SQLite.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The configured table name is not a plain SQL identifier.
    #[error("Invalid table name {0:?}: expected [A-Za-z_][A-Za-z0-9_]*")]
    InvalidTableName(String),

    /// No committed index table exists yet.
    #[error("Index not ready (last rebuild state: {0})")]
    IndexNotReady(IndexState),

    /// The staging table does not hold the rows the writer reported.
    #[error("Staging table holds {found} rows, expected {expected}")]
    RowCountMismatch {
        /// Rows the writer reported.
        expected: usize,
        /// Rows found in the staging table.
        found: usize,
    },

    /// A rebuild step was called out of order.
    #[error("No rebuild in progress")]
    NoRebuildInProgress,

    /// The status record could not be decoded.
    #[error("Corrupt status record: {0}")]
    CorruptStatus(String),

    /// I/O error while preparing the database location.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Creates an I/O error with path context.
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<StoreError> for IndexError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::IndexNotReady(_) => IndexError::NotReady,
            StoreError::RowCountMismatch { found, .. } => IndexError::IncompleteRebuild {
                rows_written: found,
                reason: err.to_string(),
            },
            other => IndexError::store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_ready_maps_to_index_not_ready() {
        let err: IndexError = StoreError::IndexNotReady(IndexState::Building).into();
        assert!(matches!(err, IndexError::NotReady));
    }

    #[test]
    fn test_mismatch_maps_to_incomplete_rebuild() {
        let err: IndexError = StoreError::RowCountMismatch {
            expected: 10,
            found: 7,
        }
        .into();
        match err {
            IndexError::IncompleteRebuild {
                rows_written,
                reason,
            } => {
                assert_eq!(rows_written, 7);
                assert_eq!(reason, "Staging table holds 7 rows, expected 10");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_sqlite_maps_to_store_error() {
        let err: IndexError = StoreError::Sqlite(rusqlite::Error::QueryReturnedNoRows).into();
        assert!(matches!(err, IndexError::Store(_)));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_display() {
        let err = StoreError::InvalidTableName("drop table".to_string());
        assert!(err.to_string().contains("\"drop table\""));

        let err = StoreError::io_error("/nope/db.sqlite", std::io::Error::other("denied"));
        assert_eq!(err.to_string(), "I/O error at /nope/db.sqlite: denied");
    }
}
