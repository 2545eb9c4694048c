//! Query traversal callbacks.

use crate::grid_index::{Entry, Node};

/// Callback invoked during an intersection query: once per visited node and
/// once per matching entry on that node.
pub trait Visitor {
    fn visit_node(&mut self, node: &Node);

    fn visit_data(&mut self, entry: &Entry);
}

/// Visitor that counts visited nodes and collects matched entries.
///
/// An entry inserted into several grid cells is reported once per visited
/// cell, so `entries` may hold duplicates; deduplicate by (value, region)
/// when that matters.
#[derive(Debug, Default)]
pub struct CollectingVisitor {
    pub visited_nodes: usize,
    pub entries: Vec<Entry>,
}

impl CollectingVisitor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Visitor for CollectingVisitor {
    fn visit_node(&mut self, _node: &Node) {
        self.visited_nodes += 1;
    }

    fn visit_data(&mut self, entry: &Entry) {
        self.entries.push(entry.clone());
    }
}
