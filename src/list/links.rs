use std::fmt;

/// Index of a list node inside its [`LinkStorage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Raw slot index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The `next`/`prev` slots threaded through a node.
///
/// A node that belongs to no list has both links cleared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Links {
    pub(crate) next: Option<NodeId>,
    pub(crate) prev: Option<NodeId>,
}

impl Links {
    /// Following node, towards the tail.
    pub fn next(&self) -> Option<NodeId> {
        self.next
    }

    /// Preceding node, towards the head.
    pub fn prev(&self) -> Option<NodeId> {
        self.prev
    }

    /// Both links are cleared.
    pub fn is_detached(&self) -> bool {
        self.next.is_none() && self.prev.is_none()
    }
}

/// Storage that owns the links of a set of nodes.
///
/// Several lists may share one storage as long as every node is threaded
/// through at most one of them.
pub trait LinkStorage {
    /// Links of `node`.
    fn links(&self, node: NodeId) -> &Links;

    /// Mutable links of `node`.
    fn links_mut(&mut self, node: NodeId) -> &mut Links;
}

/// Push `node` to the front of the list starting at `head`.
///
/// The node's own links are cleared first. Returns the new head, which is
/// always `node`.
pub fn insert<S>(storage: &mut S, node: NodeId, head: Option<NodeId>) -> NodeId
where
    S: LinkStorage + ?Sized,
{
    *storage.links_mut(node) = Links::default();
    if let Some(head) = head {
        storage.links_mut(node).next = Some(head);
        storage.links_mut(head).prev = Some(node);
    }
    node
}

/// Detach `node` from the list starting at `head` and return the new head.
///
/// Neighbours are relinked and the node's own links cleared. Returns `None`
/// when the list became empty.
///
/// # Panics
///
/// Panics if `node` is neither `head` nor linked to a predecessor, which means
/// it is not a member of this list.
pub fn remove<S>(storage: &mut S, node: NodeId, head: Option<NodeId>) -> Option<NodeId>
where
    S: LinkStorage + ?Sized,
{
    let Links { next, prev } = *storage.links(node);
    assert!(
        prev.is_some() || head == Some(node),
        "list node {node} is not a member of the list headed by {head:?}"
    );

    if let Some(prev) = prev {
        storage.links_mut(prev).next = next;
    }
    if let Some(next) = next {
        storage.links_mut(next).prev = prev;
    }
    *storage.links_mut(node) = Links::default();

    if head == Some(node) {
        next
    } else {
        head
    }
}

/// Walk the list from `head` to tail.
pub fn iter<S>(storage: &S, head: Option<NodeId>) -> Iter<'_, S>
where
    S: LinkStorage + ?Sized,
{
    Iter {
        storage,
        next: head,
    }
}

/// Head-to-tail iterator returned by [`iter`].
pub struct Iter<'a, S: ?Sized> {
    storage: &'a S,
    next: Option<NodeId>,
}

impl<S> Iterator for Iter<'_, S>
where
    S: LinkStorage + ?Sized,
{
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.storage.links(current).next;
        Some(current)
    }
}
