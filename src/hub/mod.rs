//! Entity hub: keeps stores bound to the same entity in sync.
//!
//! Every observed [`Entity`] heads an intrusive list of the stores bound to
//! it; a store is threaded into at most one such list. The lists live in one
//! [`NodeArena`](crate::list::NodeArena) so binding and unbinding are O(1).

mod config;
mod entity;
mod hub;

pub use config::HubConfig;
pub use entity::{Entity, EntityId};
pub use hub::Hub;
