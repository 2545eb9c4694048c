//! Checkpoint and warm-start protocol.
//!
//! An [`IndexProperties`] value captures everything needed to reopen a
//! flushed index without replaying inserts: the grid configuration and the
//! storage locator. It is decoupled from the in-memory object graph and
//! round-trips through plain bytes, so callers can stash it wherever their
//! own configuration lives.

use serde::{Deserialize, Serialize};

use super::grid_types::{decode, encode, GridError, GridResult};
use super::storage::StorageProperties;
use crate::region::Region;

/// Configuration sufficient to reopen an index on a warm start.
///
/// A warm start recovers the grid shape (node graph and node count) exactly,
/// but not previously inserted payload values: cached entries belong to the
/// process that wrote them and are discarded as stale when the index is
/// reopened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexProperties {
    pub dimension: usize,
    pub universe: Region,
    pub capacity: usize,
    pub tile_threshold: usize,
    pub node_count: u64,
    pub storage: StorageProperties,
}

impl IndexProperties {
    pub fn validate(&self) -> GridResult<()> {
        if self.dimension == 0 || self.universe.dimension() != self.dimension {
            return Err(GridError::InvalidConfiguration(format!(
                "universe dimension {} does not match configured dimension {}",
                self.universe.dimension(),
                self.dimension
            )));
        }
        if !self.universe.is_valid()
            || (0..self.dimension).any(|a| self.universe.extent(a) <= 0.0)
        {
            return Err(GridError::InvalidConfiguration(format!(
                "degenerate universe region {}",
                self.universe
            )));
        }
        if self.capacity == 0 {
            return Err(GridError::InvalidConfiguration(
                "capacity must be positive".into(),
            ));
        }
        if self.tile_threshold == 0 {
            return Err(GridError::InvalidConfiguration(
                "tile threshold must be positive".into(),
            ));
        }
        if self.node_count == 0 {
            return Err(GridError::InvalidConfiguration(
                "node count must cover at least the root".into(),
            ));
        }
        Ok(())
    }

    /// Serializes these properties to bytes.
    pub fn to_bytes(&self) -> GridResult<Vec<u8>> {
        encode(self)
    }

    /// Restores properties from bytes produced by [`IndexProperties::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> GridResult<IndexProperties> {
        let properties: IndexProperties = decode(bytes)?;
        properties.validate()?;
        Ok(properties)
    }
}
