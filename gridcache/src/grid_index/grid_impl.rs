//! GridSpatialIndex implementation.

use log::debug;

use super::disk_storage::BufferedDiskStorage;
use super::grid_constants::MAX_GRID_DEPTH;
use super::grid_node::Node;
use super::grid_types::{Entry, GridError, GridResult, GridStats, NodeId};
use super::persistence::IndexProperties;
use super::storage::{MemoryStorage, Storage, StorageProperties};
use crate::region::Region;
use crate::visitor::Visitor;

/// Grid-decomposition spatial index.
///
/// Owns one root node covering the universe region, a pluggable [`Storage`]
/// holding every other node, and aggregate statistics. The root subdivides
/// into a uniform grid at construction; tiles that fill up past the tile
/// threshold subdivide further on demand.
///
/// All operations are synchronous and complete before returning; the index
/// is not safe for concurrent mutation without external serialization.
pub struct GridSpatialIndex {
    universe: Region,
    capacity: usize,
    tile_threshold: usize,
    root: Node,
    storage: Box<dyn Storage>,
    stats: GridStats,
}

impl GridSpatialIndex {
    /// Creates an index over `universe`, subdivided into at least
    /// `capacity` grid cells, persisting nodes through `storage`. A tile
    /// holding more than `tile_threshold` entries subdivides on demand.
    pub fn new(
        universe: Region,
        capacity: usize,
        mut storage: Box<dyn Storage>,
        tile_threshold: usize,
    ) -> GridResult<Self> {
        if universe.dimension() == 0 {
            return Err(GridError::InvalidConfiguration(
                "universe must have at least one dimension".into(),
            ));
        }
        if !universe.is_valid() || (0..universe.dimension()).any(|a| universe.extent(a) <= 0.0) {
            return Err(GridError::InvalidConfiguration(format!(
                "degenerate universe region {}",
                universe
            )));
        }
        if capacity == 0 {
            return Err(GridError::InvalidConfiguration(
                "capacity must be positive".into(),
            ));
        }
        if tile_threshold == 0 {
            return Err(GridError::InvalidConfiguration(
                "tile threshold must be positive".into(),
            ));
        }

        let mut root = Node::new(NodeId::new(universe.clone()), 0);
        let children = root.split(capacity)?;
        let mut node_count = 1u64;
        for child in &children {
            storage.store(child)?;
            node_count += 1;
        }
        storage.store(&root)?;
        debug!(
            "created grid index over {}: {} nodes",
            universe, node_count
        );

        Ok(Self {
            universe,
            capacity,
            tile_threshold,
            root,
            storage,
            stats: GridStats {
                node_count,
                data_count: 0,
            },
        })
    }

    /// The region this index covers.
    pub fn universe(&self) -> &Region {
        &self.universe
    }

    /// Current node and data counts.
    pub fn stats(&self) -> GridStats {
        self.stats
    }

    fn node(&mut self, id: &NodeId) -> GridResult<Node> {
        if id == self.root.id() {
            return Ok(self.root.clone());
        }
        self.storage
            .retrieve(id)?
            .ok_or_else(|| GridError::InvalidOperation(format!("missing node record for {}", id)))
    }

    fn store_node(&mut self, node: &Node) -> GridResult<()> {
        if node.id() == self.root.id() {
            self.root = node.clone();
        }
        self.storage.store(node)
    }

    /// Caches `value` under `region`.
    ///
    /// Idempotent per (value, region) pair; a distinct pair is added to
    /// every leaf tile intersecting `region` and bumps the data counter
    /// once. Data wholly outside the universe is not cacheable and is
    /// skipped. A tile pushed past the tile threshold subdivides, unless it
    /// already sits at the maximum grid depth.
    pub fn insert_data(&mut self, value: &[u8], region: &Region) -> GridResult<()> {
        if region.dimension() != self.universe.dimension() {
            return Err(GridError::InvalidOperation(format!(
                "data region dimension {} does not match index dimension {}",
                region.dimension(),
                self.universe.dimension()
            )));
        }
        if !self.universe.intersects(region) {
            debug!("skipping insert outside the universe: {}", region);
            return Ok(());
        }

        // One descent finds the target leaves and checks for a duplicate on
        // any node along the way, including subdivided nodes still holding
        // entries from before their split.
        let mut leaves = Vec::new();
        let mut stack = vec![self.root.id().clone()];
        while let Some(id) = stack.pop() {
            let node = self.node(&id)?;
            if node.contains_data(value, region) {
                return Ok(());
            }
            if node.is_split() {
                stack.extend(node.children_intersecting(region));
            } else {
                leaves.push(id);
            }
        }

        let entry = Entry::new(value, region.clone());
        let mut created = 0u64;
        for id in leaves {
            let mut node = self.node(&id)?;
            if !node.insert_data(entry.clone()) {
                continue;
            }
            if node.data_count() > self.tile_threshold && node.level() < MAX_GRID_DEPTH {
                let children = node.split(self.capacity)?;
                for child in &children {
                    self.storage.store(child)?;
                }
                created += children.len() as u64;
                debug!("split tile {} into {} cells", node.id(), children.len());
            }
            self.store_node(&node)?;
        }
        self.stats.data_count += 1;
        self.stats.node_count += created;
        Ok(())
    }

    /// Removes every stored copy of the (value, region) pair. Decrements
    /// the data counter if a copy existed; a no-op otherwise.
    pub fn delete_data(&mut self, value: &[u8], region: &Region) -> GridResult<()> {
        if region.dimension() != self.universe.dimension() {
            return Err(GridError::InvalidOperation(format!(
                "data region dimension {} does not match index dimension {}",
                region.dimension(),
                self.universe.dimension()
            )));
        }
        if !self.universe.intersects(region) {
            return Ok(());
        }

        let mut removed = false;
        let mut stack = vec![self.root.id().clone()];
        while let Some(id) = stack.pop() {
            let mut node = self.node(&id)?;
            if node.delete_data(value, region) {
                removed = true;
                self.store_node(&node)?;
            }
            if node.is_split() {
                stack.extend(node.children_intersecting(region));
            }
        }
        if removed {
            self.stats.data_count = self.stats.data_count.saturating_sub(1);
        }
        Ok(())
    }

    /// Traverses every grid cell intersecting `region`, invoking the
    /// visitor once per visited node and once per matching entry.
    ///
    /// An entry cached in several cells is reported once per visited cell.
    /// A query region that does not intersect the universe yields an empty
    /// result, not an error.
    pub fn intersection_query<V: Visitor>(
        &mut self,
        region: &Region,
        visitor: &mut V,
    ) -> GridResult<()> {
        if region.dimension() != self.universe.dimension() || !self.universe.intersects(region) {
            return Ok(());
        }

        let mut stack = vec![self.root.id().clone()];
        while let Some(id) = stack.pop() {
            let node = self.node(&id)?;
            visitor.visit_node(&node);
            for entry in node.data() {
                if entry.region.intersects(region) {
                    visitor.visit_data(entry);
                }
            }
            if node.is_split() {
                stack.extend(node.children_intersecting(region));
            }
        }
        Ok(())
    }

    /// Forces durable persistence. Afterward [`Self::index_properties`]
    /// round-trips through [`Self::restore`].
    pub fn flush(&mut self) -> GridResult<()> {
        let root = self.root.clone();
        self.storage.store(&root)?;
        self.storage.flush()?;
        debug!(
            "flushed index: {} nodes, {} entries",
            self.stats.node_count, self.stats.data_count
        );
        Ok(())
    }

    /// Configuration sufficient to reopen this index on a warm start.
    pub fn index_properties(&self) -> IndexProperties {
        IndexProperties {
            dimension: self.universe.dimension(),
            universe: self.universe.clone(),
            capacity: self.capacity,
            tile_threshold: self.tile_threshold,
            node_count: self.stats.node_count,
            storage: self.storage.properties(),
        }
    }

    /// Reopens a previously flushed index from its properties without
    /// replaying inserts.
    ///
    /// The grid shape is recovered exactly: the persisted node graph is
    /// walked and the restored node count must match the checkpoint.
    /// Previously inserted payload values do not survive: cached entries
    /// belong to the process that wrote them and are discarded as stale, so
    /// the reopened index starts with a data count of zero. A locator with
    /// nothing persisted behind it (a memory backend, or a disk file never
    /// flushed) rebuilds the grid from configuration alone.
    pub fn restore(properties: &IndexProperties) -> GridResult<GridSpatialIndex> {
        properties.validate()?;
        let mut storage: Box<dyn Storage> = match &properties.storage {
            StorageProperties::Memory => Box::new(MemoryStorage::new()),
            StorageProperties::BufferedDisk { path, buffer_nodes } => {
                Box::new(BufferedDiskStorage::open_with_buffer(path, *buffer_nodes)?)
            }
        };

        let root_id = NodeId::new(properties.universe.clone());
        let mut root = match storage.retrieve(&root_id)? {
            Some(root) => root,
            None => {
                debug!("no persisted root under {}, rebuilding grid", root_id);
                return Self::new(
                    properties.universe.clone(),
                    properties.capacity,
                    storage,
                    properties.tile_threshold,
                );
            }
        };

        root.clear_data();
        let mut node_count = 1u64;
        let mut stack: Vec<NodeId> = match root.split_descriptor() {
            Some(descriptor) => descriptor.children().to_vec(),
            None => Vec::new(),
        };
        while let Some(id) = stack.pop() {
            let mut node = storage.retrieve(&id)?.ok_or_else(|| {
                GridError::InvalidOperation(format!("missing node record for {}", id))
            })?;
            node.clear_data();
            if let Some(descriptor) = node.split_descriptor() {
                stack.extend(descriptor.children().iter().cloned());
            }
            storage.store(&node)?;
            node_count += 1;
        }
        if node_count != properties.node_count {
            return Err(GridError::InvalidOperation(format!(
                "restored node count {} does not match checkpoint {}",
                node_count, properties.node_count
            )));
        }
        storage.store(&root)?;
        debug!("warm start restored {} nodes", node_count);

        Ok(Self {
            universe: properties.universe.clone(),
            capacity: properties.capacity,
            tile_threshold: properties.tile_threshold,
            root,
            storage,
            stats: GridStats {
                node_count,
                data_count: 0,
            },
        })
    }
}
