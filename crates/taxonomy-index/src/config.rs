//! Configuration types for the indexing pipeline and query layer.

use crate::error::{IndexError, IndexResult};

/// Rows buffered before a batch is handed to the store.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Configuration for rebuilding and querying an index.
///
/// # Example
///
/// ```rust
/// use taxonomy_index::{CacheConfig, IndexConfig};
///
/// let config = IndexConfig::builder()
///     .with_batch_size(5_000)
///     .with_remove_hidden(true)
///     .with_cache(CacheConfig::default())
///     .build();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Rows per batch written to the store.
    pub batch_size: usize,
    /// Splice out hidden nodes before indexing.
    pub remove_hidden: bool,
    /// Query cache configuration (None = caching disabled).
    pub cache: Option<CacheConfig>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            remove_hidden: false,
            cache: None,
        }
    }
}

impl IndexConfig {
    /// Creates a new builder for IndexConfig.
    pub fn builder() -> IndexConfigBuilder {
        IndexConfigBuilder::default()
    }

    /// Checks that the configuration can be used.
    pub fn validate(&self) -> IndexResult<()> {
        if self.batch_size == 0 {
            return Err(IndexError::InvalidConfig(
                "batch_size must be greater than zero".to_string(),
            ));
        }
        if let Some(cache) = &self.cache {
            if cache.max_entries == 0 {
                return Err(IndexError::InvalidConfig(
                    "cache max_entries must be greater than zero".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Builder for IndexConfig.
#[derive(Debug, Clone)]
pub struct IndexConfigBuilder {
    batch_size: usize,
    remove_hidden: bool,
    cache: Option<CacheConfig>,
}

impl Default for IndexConfigBuilder {
    fn default() -> Self {
        let defaults = IndexConfig::default();
        Self {
            batch_size: defaults.batch_size,
            remove_hidden: defaults.remove_hidden,
            cache: defaults.cache,
        }
    }
}

impl IndexConfigBuilder {
    /// Sets the number of rows per batch.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Enables or disables hidden-node splicing.
    pub fn with_remove_hidden(mut self, remove_hidden: bool) -> Self {
        self.remove_hidden = remove_hidden;
        self
    }

    /// Enables query caching with the given configuration.
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Builds the IndexConfig.
    pub fn build(self) -> IndexConfig {
        IndexConfig {
            batch_size: self.batch_size,
            remove_hidden: self.remove_hidden,
            cache: self.cache,
        }
    }
}

/// Configuration for the query cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached rows.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
        }
    }
}
