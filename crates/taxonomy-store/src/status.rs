//! The rebuild status record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taxonomy_index::IndexState;

use crate::error::{StoreError, StoreResult};

/// State of the most recent rebuild, as recorded in the status table.
///
/// A reader that finds `state == Building` after a restart knows the
/// process died mid-rebuild; the live table, if any, still holds the
/// previous complete index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStatus {
    /// Lifecycle state.
    #[serde(with = "state_name")]
    pub state: IndexState,
    /// Rows in the live table when the record was written.
    pub row_count: usize,
    /// When the record was last written.
    pub updated_at: DateTime<Utc>,
    /// Failure reason for `Failed`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
}

impl IndexStatus {
    /// Status of a database that has never been rebuilt.
    pub fn missing() -> Self {
        Self {
            state: IndexState::Missing,
            row_count: 0,
            updated_at: Utc::now(),
            message: None,
        }
    }

    /// Returns true if the last rebuild completed.
    pub fn is_complete(&self) -> bool {
        self.state == IndexState::Complete
    }

    /// Renders the record as pretty JSON.
    pub fn to_json(&self) -> StoreResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| StoreError::CorruptStatus(e.to_string()))
    }

    /// Decodes the columns of a status row.
    pub(crate) fn from_columns(
        state: &str,
        row_count: i64,
        updated_at: &str,
        message: Option<String>,
    ) -> StoreResult<Self> {
        let state = IndexState::parse(state)
            .ok_or_else(|| StoreError::CorruptStatus(format!("unknown state {state:?}")))?;
        let updated_at = DateTime::parse_from_rfc3339(updated_at)
            .map_err(|e| StoreError::CorruptStatus(format!("bad timestamp {updated_at:?}: {e}")))?
            .with_timezone(&Utc);
        let row_count = usize::try_from(row_count)
            .map_err(|_| StoreError::CorruptStatus(format!("negative row count {row_count}")))?;
        Ok(Self {
            state,
            row_count,
            updated_at,
            message,
        })
    }
}

impl std::fmt::Display for IndexStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Taxonomy Index Status")?;
        writeln!(f, "  State:    {}", self.state)?;
        writeln!(f, "  Rows:     {}", self.row_count)?;
        writeln!(f, "  Updated:  {}", self.updated_at.to_rfc3339())?;
        if let Some(message) = &self.message {
            writeln!(f, "  Message:  {message}")?;
        }
        Ok(())
    }
}

mod state_name {
    use serde::{Deserialize, Deserializer, Serializer};
    use taxonomy_index::IndexState;

    pub fn serialize<S: Serializer>(state: &IndexState, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(state.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<IndexState, D::Error> {
        let name = String::deserialize(deserializer)?;
        IndexState::parse(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown index state {name:?}")))
    }
}
