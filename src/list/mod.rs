//! Intrusive doubly-linked lists over an index arena.
//!
//! Links live next to each node in a [`LinkStorage`], and the free functions
//! [`insert`], [`remove`] and [`iter`] thread them. One storage can carry many
//! lists at once; the [`Hub`](crate::Hub) keeps one list per entity in a single
//! [`NodeArena`]. [`List`] wraps one arena and one head for standalone use.
//!
//! # Invariants
//!
//! 1. A node belongs to at most one list.
//! 2. A node outside every list has both links cleared.
//! 3. Insert and remove are O(1).

mod arena;
mod links;
mod list;

pub use arena::NodeArena;
pub use links::{insert, iter, remove, Iter, LinkStorage, Links, NodeId};
pub use list::List;
