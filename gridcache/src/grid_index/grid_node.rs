//! Grid nodes and the uniform-grid splitting algorithm.
//!
//! A single `Node` type covers both roles of the index hierarchy: a plain
//! leaf holds entries, and a node that has subdivided additionally carries a
//! `SplitDescriptor` describing its uniform grid of child cells. Splitting
//! is a purely structural operation: it never moves entries already held by
//! the node being split.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::grid_types::{Entry, GridError, GridResult, NodeId};
use crate::region::Region;

/// Split configuration of a node that has subdivided into a uniform grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitDescriptor {
    /// Achieved child count; at least the capacity requested from `split`
    capacity: usize,
    /// Per-axis tile counts implied by the tile edge length
    tiles: Vec<usize>,
    /// Edge length of every tile, on every axis
    tile_size: f64,
    /// Child identifiers in enumeration order
    children: Vec<NodeId>,
    /// Linearized grid coordinate -> position in `children`
    child_index: HashMap<u64, usize>,
}

impl SplitDescriptor {
    /// Number of children this descriptor registered.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tile counts per axis.
    pub fn tiles_per_axis(&self) -> &[usize] {
        &self.tiles
    }

    /// Edge length of a tile.
    pub fn tile_size(&self) -> f64 {
        self.tile_size
    }

    /// Child identifiers in enumeration order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Linearizes a D-dimensional grid coordinate into a single node id
    /// using row-major weighting with per-axis extent
    /// `of = floor(capacity^(1/D)) + 1`, axis 0 most significant:
    /// `id = sum over a of index[a] * of^(D-1-a)`.
    ///
    /// The ids this produces are stable across splits and lookups, which is
    /// what allows a grid coordinate computed from scratch to find the child
    /// registered during the original split.
    pub fn grid_index_to_node_id(&self, index: &[usize]) -> u64 {
        let dims = self.tiles.len() as f64;
        let of = (self.capacity as f64).powf(1.0 / dims).floor() as u64 + 1;
        let mut id = 0u64;
        for &i in index {
            id = id * of + i as u64;
        }
        id
    }

    /// Advances a coordinate cursor by one tile along axis 0, carrying into
    /// higher axes like an odometer, with the tile edge length as the step.
    /// Returns `false` once the cursor has enumerated every cell.
    ///
    /// The carry test leaves half a tile of slack so accumulated
    /// floating-point drift cannot add or drop a column.
    pub fn increment(&self, region: &Region, pos: &mut [f64], nextpos: &mut [f64]) -> bool {
        let dims = self.tiles.len();
        pos[0] += self.tile_size;
        nextpos[0] = pos[0] + self.tile_size;
        for axis in 0..dims {
            if pos[axis] + self.tile_size / 2.0 > region.high(axis) {
                pos[axis] = region.low(axis);
                nextpos[axis] = pos[axis] + self.tile_size;
                if axis + 1 == dims {
                    return false;
                }
                pos[axis + 1] += self.tile_size;
                nextpos[axis + 1] = pos[axis + 1] + self.tile_size;
            } else {
                break;
            }
        }
        true
    }

    /// Identifiers of the children whose regions intersect `query`.
    ///
    /// Computes the integer tile-coordinate range the query covers, widened
    /// by one tile on each side so boundary-touching neighbors are
    /// considered, then filters candidates by true region intersection.
    pub fn children_intersecting(&self, region: &Region, query: &Region) -> Vec<NodeId> {
        let dims = self.tiles.len();
        let mut lo = Vec::with_capacity(dims);
        let mut hi = Vec::with_capacity(dims);
        for axis in 0..dims {
            if query.high(axis) < region.low(axis) || query.low(axis) > region.high(axis) {
                return Vec::new();
            }
            let last = self.tiles[axis] as i64 - 1;
            let raw_lo = ((query.low(axis) - region.low(axis)) / self.tile_size).floor() as i64 - 1;
            let raw_hi = ((query.high(axis) - region.low(axis)) / self.tile_size).floor() as i64 + 1;
            lo.push(raw_lo.clamp(0, last) as usize);
            hi.push(raw_hi.clamp(0, last) as usize);
        }

        let mut matches = Vec::new();
        let mut coord = lo.clone();
        loop {
            let id = self.grid_index_to_node_id(&coord);
            if let Some(&position) = self.child_index.get(&id) {
                let child = &self.children[position];
                if child.region().intersects(query) {
                    matches.push(child.clone());
                }
            }

            let mut axis = 0;
            loop {
                coord[axis] += 1;
                if coord[axis] <= hi[axis] {
                    break;
                }
                coord[axis] = lo[axis];
                axis += 1;
                if axis == dims {
                    return matches;
                }
            }
        }
    }
}

/// A node of the grid index: a leaf container of entries bounded by its
/// identifier's region, optionally subdivided into a uniform grid of
/// children.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    id: NodeId,
    level: u32,
    entries: Vec<Entry>,
    split: Option<SplitDescriptor>,
}

impl Node {
    pub fn new(id: NodeId, level: u32) -> Self {
        Self {
            id,
            level,
            entries: Vec::new(),
            split: None,
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// The region this node covers.
    pub fn region(&self) -> &Region {
        self.id.region()
    }

    /// Depth of this node below the index root (the root is level 0).
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Number of entries held directly by this node.
    pub fn data_count(&self) -> usize {
        self.entries.len()
    }

    /// Entries held directly by this node.
    pub fn data(&self) -> &[Entry] {
        &self.entries
    }

    pub fn is_split(&self) -> bool {
        self.split.is_some()
    }

    pub fn split_descriptor(&self) -> Option<&SplitDescriptor> {
        self.split.as_ref()
    }

    pub(crate) fn clear_data(&mut self) {
        self.entries.clear();
    }

    /// Adds an entry unless an equal (value, region) pair is already held.
    /// Returns whether an entry was added.
    pub fn insert_data(&mut self, entry: Entry) -> bool {
        if self.entries.contains(&entry) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Removes a matching entry if present. Returns whether one was removed.
    pub fn delete_data(&mut self, value: &[u8], region: &Region) -> bool {
        match self
            .entries
            .iter()
            .position(|e| e.value == value && &e.region == region)
        {
            Some(position) => {
                self.entries.remove(position);
                true
            }
            None => false,
        }
    }

    /// Checks whether an equal (value, region) pair is held by this node.
    pub fn contains_data(&self, value: &[u8], region: &Region) -> bool {
        self.entries
            .iter()
            .any(|e| e.value == value && &e.region == region)
    }

    /// Subdivides this node's region into a uniform grid of at least
    /// `capacity_hint` cells and returns the newly created child nodes.
    ///
    /// With D dimensions, the per-axis tile count is `ceil(C^(1/D))` and the
    /// tile edge length is the D-th root of the resulting cell area, so each
    /// child has area `region.area() / achieved` and fully intersects this
    /// node's region. Children are enumerated odometer-style from the low
    /// corner via [`SplitDescriptor::increment`].
    ///
    /// Entries already held by this node are not redistributed; they remain
    /// here and stay visible to queries, which visit subdivided nodes too.
    pub fn split(&mut self, capacity_hint: usize) -> GridResult<Vec<Node>> {
        if self.split.is_some() {
            return Err(GridError::InvalidOperation(format!(
                "node {} is already split",
                self.id
            )));
        }
        if capacity_hint == 0 {
            return Err(GridError::InvalidConfiguration(
                "split capacity must be positive".into(),
            ));
        }
        let region = self.id.region().clone();
        let dims = region.dimension();
        let per_axis = (capacity_hint as f64).powf(1.0 / dims as f64).ceil();
        let tile_size = (region.area() / per_axis.powi(dims as i32)).powf(1.0 / dims as f64);
        if !tile_size.is_finite() || tile_size <= 0.0 {
            return Err(GridError::InvalidConfiguration(format!(
                "cannot split degenerate region {}",
                region
            )));
        }

        let tiles: Vec<usize> = (0..dims)
            .map(|a| ((region.extent(a) / tile_size + 0.5).floor() as usize).max(1))
            .collect();
        let capacity = tiles.iter().product();

        let mut descriptor = SplitDescriptor {
            capacity,
            tiles,
            tile_size,
            children: Vec::with_capacity(capacity),
            child_index: HashMap::with_capacity(capacity),
        };

        let mut children = Vec::with_capacity(capacity);
        let mut pos: Vec<f64> = (0..dims).map(|a| region.low(a)).collect();
        let mut nextpos: Vec<f64> = pos.iter().map(|p| p + tile_size).collect();
        loop {
            let coord: Vec<usize> = (0..dims)
                .map(|a| ((pos[a] - region.low(a)) / tile_size + 0.5).floor() as usize)
                .collect();
            let id = descriptor.grid_index_to_node_id(&coord);
            let child_id = NodeId::new(Region::new(&pos, &nextpos));
            descriptor.child_index.insert(id, descriptor.children.len());
            descriptor.children.push(child_id.clone());
            children.push(Node::new(child_id, self.level + 1));
            if !descriptor.increment(&region, &mut pos, &mut nextpos) {
                break;
            }
        }
        debug_assert_eq!(children.len(), capacity);

        self.split = Some(descriptor);
        Ok(children)
    }

    /// Odometer step over this node's grid; `false` when not split.
    pub fn increment(&self, pos: &mut [f64], nextpos: &mut [f64]) -> bool {
        match &self.split {
            Some(descriptor) => descriptor.increment(self.id.region(), pos, nextpos),
            None => false,
        }
    }

    /// Linearized node id of a grid coordinate; `None` when not split.
    pub fn grid_index_to_node_id(&self, index: &[usize]) -> Option<u64> {
        self.split
            .as_ref()
            .map(|descriptor| descriptor.grid_index_to_node_id(index))
    }

    /// Identifiers of the children intersecting `query`; empty when not
    /// split.
    pub fn children_intersecting(&self, query: &Region) -> Vec<NodeId> {
        match &self.split {
            Some(descriptor) => descriptor.children_intersecting(self.id.region(), query),
            None => Vec::new(),
        }
    }
}
