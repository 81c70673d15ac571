use super::links::{LinkStorage, Links, NodeId};

enum Slot<T> {
    Occupied { value: T, links: Links },
    Vacant,
}

/// Slab of list nodes addressed by [`NodeId`].
///
/// Freed slots are reused by later inserts, so a `NodeId` is only meaningful
/// while its node is alive.
pub struct NodeArena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
    len: usize,
}

impl<T> NodeArena<T> {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Store `value` in a detached node.
    pub fn insert(&mut self, value: T) -> NodeId {
        let slot = Slot::Occupied {
            value,
            links: Links::default(),
        };
        self.len += 1;
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = slot;
                NodeId(index)
            }
            None => {
                self.slots.push(slot);
                NodeId(self.slots.len() - 1)
            }
        }
    }

    /// Free a node and return its value.
    ///
    /// The node must already be detached from any list.
    pub fn remove(&mut self, node: NodeId) -> Option<T> {
        let slot = self.slots.get_mut(node.0)?;
        match std::mem::replace(slot, Slot::Vacant) {
            Slot::Occupied { value, links } => {
                assert!(
                    links.is_detached(),
                    "list node {node} freed while still linked"
                );
                self.free.push(node.0);
                self.len -= 1;
                Some(value)
            }
            Slot::Vacant => None,
        }
    }

    /// Value stored in `node`.
    pub fn get(&self, node: NodeId) -> Option<&T> {
        match self.slots.get(node.0) {
            Some(Slot::Occupied { value, .. }) => Some(value),
            _ => None,
        }
    }

    /// Mutable value stored in `node`.
    pub fn get_mut(&mut self, node: NodeId) -> Option<&mut T> {
        match self.slots.get_mut(node.0) {
            Some(Slot::Occupied { value, .. }) => Some(value),
            _ => None,
        }
    }

    /// Whether `node` is occupied.
    pub fn contains(&self, node: NodeId) -> bool {
        self.get(node).is_some()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if no node is live.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<T> Default for NodeArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LinkStorage for NodeArena<T> {
    fn links(&self, node: NodeId) -> &Links {
        match self.slots.get(node.0) {
            Some(Slot::Occupied { links, .. }) => links,
            _ => panic!("dangling list node {node}"),
        }
    }

    fn links_mut(&mut self, node: NodeId) -> &mut Links {
        match self.slots.get_mut(node.0) {
            Some(Slot::Occupied { links, .. }) => links,
            _ => panic!("dangling list node {node}"),
        }
    }
}
