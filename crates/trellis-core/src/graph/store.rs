use std::collections::HashMap;

use crate::node::{Node, NodeKind};

use super::traversal::{ChildRef, GraphView, Traversal};
use super::GraphError;

/// Owns every node of one domain by id. Edges between nodes are ids, so a node stays
/// addressable here after it is detached from all of its parents.
#[derive(Debug, Clone)]
pub struct GraphStore<K: NodeKind> {
    root: Node<K>,
    nodes: HashMap<String, Node<K>>,
    order: Vec<String>,
}

impl<K: NodeKind> GraphStore<K> {
    pub fn new(root: Node<K>) -> Self {
        Self {
            root,
            nodes: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn root_id(&self) -> &str {
        &self.root.id
    }

    pub fn root(&self) -> &Node<K> {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, id: &str) -> bool {
        id == self.root.id || self.nodes.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Node<K>> {
        if id == self.root.id {
            Some(&self.root)
        } else {
            self.nodes.get(id)
        }
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Node<K>> {
        if id == self.root.id {
            Some(&mut self.root)
        } else {
            self.nodes.get_mut(id)
        }
    }

    /// Root first, then every node in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node<K>> {
        std::iter::once(&self.root).chain(self.order.iter().filter_map(|id| self.nodes.get(id)))
    }

    /// Registers a node. Composite and computed nodes are placed under the root.
    pub fn create(&mut self, node: Node<K>) -> Result<&Node<K>, GraphError> {
        let placed = node.shape().holds_children() && self.root.shape().holds_children();
        let id = self.insert(node)?;
        if placed {
            self.root.push_child(id.clone());
        }
        tracing::debug!(node_id = %id, root = %self.root.id, placed, "node created");
        self.nodes
            .get(&id)
            .ok_or_else(|| GraphError::NotFound(id.clone()))
    }

    /// Registers a node without attaching it anywhere.
    pub fn register(&mut self, node: Node<K>) -> Result<&Node<K>, GraphError> {
        let id = self.insert(node)?;
        self.nodes.get(&id).ok_or(GraphError::NotFound(id))
    }

    fn insert(&mut self, node: Node<K>) -> Result<String, GraphError> {
        if self.contains(&node.id) {
            return Err(GraphError::DuplicateId(node.id));
        }
        let id = node.id.clone();
        self.order.push(id.clone());
        self.nodes.insert(id.clone(), node);
        Ok(id)
    }

    /// Runs the attach checks for `child_id` under `parent_id` without mutating.
    pub fn check_attach(&self, parent_id: &str, child_id: &str) -> Result<(), GraphError> {
        let parent = self
            .get(parent_id)
            .ok_or_else(|| GraphError::NotFound(parent_id.to_string()))?;
        let child = self
            .get(child_id)
            .ok_or_else(|| GraphError::NotFound(child_id.to_string()))?;
        parent.admit(child)
    }

    pub fn attach(&mut self, parent_id: &str, child_id: &str) -> Result<(), GraphError> {
        self.check_attach(parent_id, child_id)?;
        if let Some(parent) = self.get_mut(parent_id) {
            parent.push_child(child_id.to_string());
        }
        tracing::debug!(parent = %parent_id, child = %child_id, "child attached");
        Ok(())
    }

    /// Removes the edge from `parent_id` to `child_id`. The child node itself is kept.
    pub fn detach(&mut self, parent_id: &str, child_id: &str) -> Result<Option<String>, GraphError> {
        let parent = self
            .get_mut(parent_id)
            .ok_or_else(|| GraphError::NotFound(parent_id.to_string()))?;
        let removed = parent.remove_child(child_id)?;
        if removed.is_some() {
            tracing::debug!(parent = %parent_id, child = %child_id, "child detached");
        }
        Ok(removed)
    }

    /// Starts a traversal over stored children only.
    pub fn traverse(&self, start_id: &str) -> Result<Option<Traversal>, GraphError> {
        if !self.contains(start_id) {
            return Err(GraphError::NotFound(start_id.to_string()));
        }
        Ok(Traversal::new(self, start_id))
    }
}

impl<K: NodeKind> GraphView for GraphStore<K> {
    type Kind = K;

    fn node(&self, id: &str) -> Option<&Node<K>> {
        self.get(id)
    }

    fn children_of(&self, node: &Node<K>) -> Vec<ChildRef> {
        node.children
            .iter()
            .map(|id| ChildRef::Stored(id.clone()))
            .collect()
    }
}
