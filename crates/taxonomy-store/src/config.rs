//! Configuration for the SQLite store.

use crate::error::{StoreError, StoreResult};

/// SQLite `journal_mode` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JournalMode {
    /// Rollback journal, deleted after each transaction.
    Delete,
    /// Write-ahead log; readers do not block the writer.
    #[default]
    Wal,
    /// Journal kept in memory.
    Memory,
}

impl JournalMode {
    /// Pragma value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Delete => "DELETE",
            Self::Wal => "WAL",
            Self::Memory => "MEMORY",
        }
    }
}

/// SQLite `synchronous` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Synchronous {
    /// No fsync.
    Off,
    /// fsync at critical moments; safe with WAL.
    #[default]
    Normal,
    /// fsync after every transaction.
    Full,
}

impl Synchronous {
    /// Pragma value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Normal => "NORMAL",
            Self::Full => "FULL",
        }
    }
}

/// Configuration for [`SqliteIndexStore`](crate::SqliteIndexStore).
///
/// # Example
///
/// ```rust
/// use taxonomy_store::{JournalMode, StoreConfig};
///
/// let config = StoreConfig::builder()
///     .with_table_name("ncbi_taxonomy")
///     .with_journal_mode(JournalMode::Delete)
///     .build()
///     .unwrap();
/// assert_eq!(config.staging_table(), "ncbi_taxonomy_staging");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Name of the live index table.
    pub table_name: String,
    /// Journal mode applied on open.
    pub journal_mode: JournalMode,
    /// Synchronous mode applied on open.
    pub synchronous: Synchronous,
    /// Read-only connections opened next to the writer for file-backed
    /// stores. Zero routes reads through the writer connection.
    pub read_connections: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            table_name: "taxonomy".to_string(),
            journal_mode: JournalMode::default(),
            synchronous: Synchronous::default(),
            read_connections: 4,
        }
    }
}

impl StoreConfig {
    /// Creates a new builder for StoreConfig.
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }

    /// Checks that the table name can be spliced into SQL.
    pub fn validate(&self) -> StoreResult<()> {
        if is_identifier(&self.table_name) {
            Ok(())
        } else {
            Err(StoreError::InvalidTableName(self.table_name.clone()))
        }
    }

    /// Name of the table a rebuild writes into.
    pub fn staging_table(&self) -> String {
        format!("{}_staging", self.table_name)
    }

    /// Name of the one-row rebuild status table.
    pub fn status_table(&self) -> String {
        format!("{}_status", self.table_name)
    }
}

/// Builder for StoreConfig.
#[derive(Debug, Clone, Default)]
pub struct StoreConfigBuilder {
    config: StoreConfig,
}

impl StoreConfigBuilder {
    /// Sets the live table name.
    pub fn with_table_name(mut self, name: impl Into<String>) -> Self {
        self.config.table_name = name.into();
        self
    }

    /// Sets the journal mode.
    pub fn with_journal_mode(mut self, mode: JournalMode) -> Self {
        self.config.journal_mode = mode;
        self
    }

    /// Sets the synchronous mode.
    pub fn with_synchronous(mut self, mode: Synchronous) -> Self {
        self.config.synchronous = mode;
        self
    }

    /// Sets how many read-only connections a file-backed store opens.
    pub fn with_read_connections(mut self, count: usize) -> Self {
        self.config.read_connections = count;
        self
    }

    /// Builds and validates the StoreConfig.
    pub fn build(self) -> StoreResult<StoreConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_config_default() {
        let config = StoreConfig::default();
        assert_eq!(config.table_name, "taxonomy");
        assert_eq!(config.journal_mode, JournalMode::Wal);
        assert_eq!(config.synchronous, Synchronous::Normal);
        assert_eq!(config.status_table(), "taxonomy_status");
        assert_eq!(config.read_connections, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_read_connections() {
        let config = StoreConfig::builder()
            .with_read_connections(0)
            .build()
            .unwrap();
        assert_eq!(config.read_connections, 0);
    }

    #[test]
    fn test_valid_identifiers() {
        for name in ["taxonomy", "_t", "ncbi_2024", "T1"] {
            assert!(is_identifier(name), "{name}");
        }
    }

    #[test]
    fn test_invalid_identifiers() {
        for name in ["", "1abc", "tax-onomy", "a b", "t;drop", "täx"] {
            assert!(!is_identifier(name), "{name}");
        }
    }

    #[test]
    fn test_builder_rejects_bad_name() {
        let err = StoreConfig::builder()
            .with_table_name("x; DROP TABLE y")
            .build()
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTableName(_)));
    }

    #[test]
    fn test_pragma_values() {
        assert_eq!(JournalMode::Wal.as_str(), "WAL");
        assert_eq!(Synchronous::Full.as_str(), "FULL");
    }
}
