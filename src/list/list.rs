use super::arena::NodeArena;
use super::links::{self, LinkStorage, NodeId};

/// A single intrusive list together with the arena that owns its nodes.
///
/// New elements are pushed to the front, so iteration runs from the most
/// recently inserted element to the oldest.
pub struct List<T> {
    nodes: NodeArena<T>,
    head: Option<NodeId>,
}

impl<T> List<T> {
    /// Create an empty list.
    pub fn new() -> Self {
        Self {
            nodes: NodeArena::new(),
            head: None,
        }
    }

    /// Push `value` to the front and return its node.
    pub fn push_front(&mut self, value: T) -> NodeId {
        let node = self.nodes.insert(value);
        self.head = Some(links::insert(&mut self.nodes, node, self.head));
        node
    }

    /// Unlink `node` and return its value.
    ///
    /// Returns `None` if the node is not alive in this list.
    pub fn remove(&mut self, node: NodeId) -> Option<T> {
        if !self.nodes.contains(node) {
            return None;
        }
        self.head = links::remove(&mut self.nodes, node, self.head);
        self.nodes.remove(node)
    }

    /// First node.
    pub fn head(&self) -> Option<NodeId> {
        self.head
    }

    /// Value stored in `node`.
    pub fn get(&self, node: NodeId) -> Option<&T> {
        self.nodes.get(node)
    }

    /// Following node.
    pub fn next(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.links(node).next()
    }

    /// Values from head to tail.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        links::iter(&self.nodes, self.head).filter_map(|node| self.nodes.get(node))
    }

    /// Node ids from head to tail.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        links::iter(&self.nodes, self.head)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the list has no elements.
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self::new()
    }
}
