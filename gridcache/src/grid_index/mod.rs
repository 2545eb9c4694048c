//! Grid-decomposition spatial index over pluggable node storage.
//!
//! This module provides the index core:
//! - Structural node identity: nodes are keyed by the region they cover
//! - Uniform-grid splitting with odometer-style cell enumeration
//! - Duplicate-aware data insertion
//! - Memory and buffered-disk storage backends
//! - A checkpoint/warm-start protocol that recovers the grid shape without
//!   replaying inserts
//!
//! The index trades memory or disk for fast repeated bounding-box queries:
//! consumers cache opaque payloads under their bounding regions and replay
//! them through visitor callbacks.

pub mod disk_storage;
pub mod grid_constants;
pub mod grid_node;
pub mod grid_types;
pub mod persistence;
pub mod storage;
pub mod write_buffer;
mod grid_impl;

pub use disk_storage::{BufferedDiskStorage, DiskHeader, DiskStorageStats, RecordLocation};
pub use grid_constants::{DEFAULT_BUFFER_NODES, HEADER_SIZE, MAGIC, MAX_GRID_DEPTH, VERSION};
pub use grid_impl::GridSpatialIndex;
pub use grid_node::{Node, SplitDescriptor};
pub use grid_types::{Entry, GridError, GridResult, GridStats, NodeId};
pub use persistence::IndexProperties;
pub use storage::{MemoryStorage, Storage, StorageProperties};
pub use write_buffer::WriteBuffer;
