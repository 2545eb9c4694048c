//! # Gridcache - Grid-Decomposition Spatial Index
//!
//! This crate provides a spatial index that caches query results by
//! subdividing a universe region into a uniform grid of cells, trading
//! memory or disk for fast repeated bounding-box queries.
//!
//! ## Features
//!
//! - **Structural Node Identity**: nodes are keyed by the region they
//!   cover, so identifiers stay valid across node instances and restarts
//! - **Uniform-Grid Splitting**: N-dimensional cell decomposition with
//!   odometer-style enumeration
//! - **Duplicate-Aware Insertion**: re-inserting a cached (value, region)
//!   pair is an idempotent no-op
//! - **Pluggable Storage**: pure in-memory, or disk-backed with a bounded
//!   write buffer batching I/O
//! - **Warm Start**: a flushed index reopens from its serialized
//!   properties without replaying inserts, recovering the grid shape
//! - **Visitor Queries**: callbacks per visited node and matching entry
//!
//! ## Quick Start
//!
//! ```rust
//! use gridcache::{CollectingVisitor, GridSpatialIndex, MemoryStorage, Region};
//!
//! # fn main() -> Result<(), gridcache::GridError> {
//! let universe = Region::new(&[0.0, 0.0], &[100.0, 100.0]);
//! let mut index = GridSpatialIndex::new(universe, 100, Box::new(MemoryStorage::new()), 16)?;
//!
//! index.insert_data(b"my feature", &Region::new(&[10.0, 10.0], &[12.0, 12.0]))?;
//!
//! let mut visitor = CollectingVisitor::new();
//! index.intersection_query(&Region::new(&[5.0, 5.0], &[20.0, 20.0]), &mut visitor)?;
//! assert!(!visitor.entries.is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! ## Disk-Backed Index
//!
//! ```rust,no_run
//! use gridcache::{BufferedDiskStorage, GridSpatialIndex, Region};
//!
//! # fn main() -> Result<(), gridcache::GridError> {
//! let storage = BufferedDiskStorage::create("cache.grid")?;
//! let universe = Region::new(&[0.0, 0.0], &[100.0, 100.0]);
//! let mut index = GridSpatialIndex::new(universe, 100, Box::new(storage), 16)?;
//!
//! index.insert_data(b"my feature", &Region::new(&[10.0, 10.0], &[12.0, 12.0]))?;
//! index.flush()?;
//!
//! // Later, in another process: reopen without replaying inserts. The grid
//! // shape comes back; cached payloads are discarded as stale.
//! let properties = index.index_properties();
//! let reopened = GridSpatialIndex::restore(&properties)?;
//! assert_eq!(reopened.stats().node_count, index.stats().node_count);
//! # Ok(())
//! # }
//! ```

pub mod grid_index;
pub mod region;
pub mod visitor;

pub use grid_index::{
    BufferedDiskStorage, Entry, GridError, GridResult, GridSpatialIndex, GridStats,
    IndexProperties, MemoryStorage, Node, NodeId, SplitDescriptor, Storage, StorageProperties,
    DEFAULT_BUFFER_NODES,
};
pub use region::Region;
pub use visitor::{CollectingVisitor, Visitor};
