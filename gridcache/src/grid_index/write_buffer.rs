//! Write buffer for disk-backed storage.
//!
//! A bounded staging area that batches node writes. Nodes are kept in
//! insertion order so eviction drops the oldest buffered node first; dirty
//! evictees are written through by the owning storage.

use std::collections::{HashMap, VecDeque};

use super::grid_node::Node;
use super::grid_types::NodeId;

/// A buffered node with its dirty flag
struct BufferedNode {
    node: Node,
    dirty: bool,
}

/// Bounded node buffer with dirty tracking and oldest-first eviction.
pub struct WriteBuffer {
    nodes: HashMap<NodeId, BufferedNode>,
    order: VecDeque<NodeId>,
    capacity: usize,
}

impl WriteBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            nodes: HashMap::new(),
            order: VecDeque::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Looks up a buffered node without touching its dirty state.
    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id).map(|buffered| &buffered.node)
    }

    /// Buffers a node, replacing any previous state under the same id.
    pub fn insert(&mut self, node: Node, dirty: bool) {
        let id = node.id().clone();
        if self.nodes.contains_key(&id) {
            self.order.retain(|queued| queued != &id);
        }
        self.order.push_back(id.clone());
        self.nodes.insert(id, BufferedNode { node, dirty });
    }

    /// Whether an insert would push the buffer past its capacity.
    pub fn needs_eviction(&self) -> bool {
        self.nodes.len() >= self.capacity
    }

    /// Removes and returns the oldest buffered node with its dirty flag.
    pub fn evict_oldest(&mut self) -> Option<(NodeId, Node, bool)> {
        while let Some(id) = self.order.pop_front() {
            if let Some(buffered) = self.nodes.remove(&id) {
                return Some((id, buffered.node, buffered.dirty));
            }
        }
        None
    }

    /// Identifiers of every dirty buffered node.
    pub fn dirty_ids(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, buffered)| buffered.dirty)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Marks a buffered node as written through.
    pub fn mark_clean(&mut self, id: &NodeId) {
        if let Some(buffered) = self.nodes.get_mut(id) {
            buffered.dirty = false;
        }
    }

    /// Drops a buffered node, returning it with its dirty flag.
    pub fn remove(&mut self, id: &NodeId) -> Option<(Node, bool)> {
        self.order.retain(|queued| queued != id);
        self.nodes
            .remove(id)
            .map(|buffered| (buffered.node, buffered.dirty))
    }

    /// Empties the buffer, returning every node with its dirty flag.
    pub fn clear(&mut self) -> Vec<(NodeId, Node, bool)> {
        let drained: Vec<_> = self
            .nodes
            .drain()
            .map(|(id, buffered)| (id, buffered.node, buffered.dirty))
            .collect();
        self.order.clear();
        drained
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }
}
