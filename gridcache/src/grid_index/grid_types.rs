//! Core types for the grid spatial index.
//!
//! This module defines the fundamental types used throughout the index:
//! - Error and result types
//! - Structural node identifiers
//! - Data entries
//! - Statistics structures

use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

use crate::region::Region;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur in grid index operations
#[derive(Debug, Error)]
pub enum GridError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// Result type for grid index operations
pub type GridResult<T> = Result<T, GridError>;

// ============================================================================
// Serialization Helpers
// ============================================================================

pub(crate) fn encode<T: Serialize>(value: &T) -> GridResult<Vec<u8>> {
    bincode::serde::encode_to_vec(value, bincode::config::legacy())
        .map_err(|e| GridError::Serialization(e.to_string()))
}

pub(crate) fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> GridResult<T> {
    bincode::serde::decode_from_slice(bytes, bincode::config::legacy())
        .map(|(value, _)| value)
        .map_err(|e| GridError::Serialization(e.to_string()))
}

// ============================================================================
// Node Identity
// ============================================================================

/// Structural node identifier.
///
/// A node is keyed by the region it covers, not by the in-memory object that
/// currently represents it: two identifiers built from coordinate-equal
/// regions are equal and hash identically, so they key maps correctly across
/// node instances and across process restarts. A `NodeId` never owns node
/// memory; it is a lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    region: Region,
}

impl NodeId {
    pub fn new(region: Region) -> Self {
        Self { region }
    }

    /// The region this identifier refers to.
    pub fn region(&self) -> &Region {
        &self.region
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NodeId({})", self.region)
    }
}

// ============================================================================
// Data Entries
// ============================================================================

/// A cached data item: an opaque payload bounded by a region.
///
/// Two entries are duplicates iff both the payload and the region are equal.
/// The same payload at a different region, or a different payload at the
/// same region, are distinct entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub value: Vec<u8>,
    pub region: Region,
}

impl Entry {
    pub fn new(value: impl Into<Vec<u8>>, region: Region) -> Self {
        Self {
            value: value.into(),
            region,
        }
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// Aggregate statistics of a grid index. Kept consistent with every
/// mutation: `node_count` covers the root and every grid cell, `data_count`
/// counts distinct (value, region) pairs.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridStats {
    pub node_count: u64,
    pub data_count: u64,
}
