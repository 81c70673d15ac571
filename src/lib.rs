//! # Tether
//!
//! Fine-grained observable state for Rust.
//!
//! Tether keeps state in records of independently observable fields and lets
//! several such records mirror one shared entity:
//!
//! ## Fields and stores
//!
//! - `ObservableValue<V>` - One value with its listeners; writes of an equal
//!   value are suppressed unless forced
//! - `Store<V>` - A fixed set of keys, one observable per key
//! - `Projection` / `ProjectionTree` - Stores projected out of deep paths of a
//!   nested source, with the path tree compressed for introspection
//!
//! ## Entity sync
//!
//! - `Entity<V>` - A shared record
//! - `Hub<V>` - Binds stores to entities and forwards a write on one bound
//!   store to its siblings
//!
//! Everything is single-threaded: handles are `Rc` based and listeners run
//! synchronously inside the write that triggered them.

pub mod error;
pub mod hub;
pub mod list;
pub mod projection;
pub mod store;
pub mod value;

// Re-export main types for convenience
pub use error::{StoreError, StoreResult};
pub use hub::{Entity, EntityId, Hub, HubConfig};
pub use projection::{Nested, NodeRef, Projection, ProjectionTree};
pub use store::{Record, Schema, Store, StoreId};
pub use value::{ListenerId, ListenerOptions, ObservableValue, Reason, SetOptions, Subscription};
