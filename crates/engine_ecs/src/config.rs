//! World configuration.
//!
//! Every field is a capacity hint. Hints only affect pre-allocation; a world
//! grows past any of them on demand.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors raised while loading a [`WorldConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config '{path}': {source}")]
    Io {
        /// Path that was read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid JSON for this config.
    #[error("invalid world config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Initial capacity hints for a [`World`](crate::World).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Live entities the entity table is sized for.
    pub entity_cache_size: usize,
    /// Components each newly created store is sized for.
    pub component_cache_size: usize,
    /// Component types the store registry is sized for.
    pub pool_cache_size: usize,
    /// Entities each filter's match list is sized for.
    pub entity_type_cache_size: usize,
}

impl WorldConfig {
    /// Default live-entity capacity.
    pub const DEFAULT_ENTITY_CACHE_SIZE: usize = 512;
    /// Default per-store capacity.
    pub const DEFAULT_COMPONENT_CACHE_SIZE: usize = 512;
    /// Default store-registry capacity.
    pub const DEFAULT_POOL_CACHE_SIZE: usize = 128;
    /// Default per-filter capacity.
    pub const DEFAULT_ENTITY_TYPE_CACHE_SIZE: usize = 128;

    /// Create a config with the default hints.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the live-entity capacity hint.
    #[must_use]
    pub fn with_entity_cache_size(mut self, size: usize) -> Self {
        self.entity_cache_size = size;
        self
    }

    /// Override the per-store capacity hint.
    #[must_use]
    pub fn with_component_cache_size(mut self, size: usize) -> Self {
        self.component_cache_size = size;
        self
    }

    /// Override the store-registry capacity hint.
    #[must_use]
    pub fn with_pool_cache_size(mut self, size: usize) -> Self {
        self.pool_cache_size = size;
        self
    }

    /// Override the per-filter capacity hint.
    #[must_use]
    pub fn with_entity_type_cache_size(mut self, size: usize) -> Self {
        self.entity_type_cache_size = size;
        self
    }

    /// Parse a config from a JSON document. Missing fields keep their
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed JSON or mistyped fields.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a config from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Parse`] if its contents are invalid.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            entity_cache_size: Self::DEFAULT_ENTITY_CACHE_SIZE,
            component_cache_size: Self::DEFAULT_COMPONENT_CACHE_SIZE,
            pool_cache_size: Self::DEFAULT_POOL_CACHE_SIZE,
            entity_type_cache_size: Self::DEFAULT_ENTITY_TYPE_CACHE_SIZE,
        }
    }
}
