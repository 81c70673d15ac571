//! The per-field observable primitive.
//!
//! An [`ObservableValue`] owns one field's current value and the listeners
//! interested in it. Everything else in the crate is built from these:
//! a [`Store`](crate::Store) is a fixed set of them, a
//! [`ProjectionTree`](crate::ProjectionTree) hosts them at nested paths and the
//! [`Hub`](crate::Hub) wires listeners between them.

mod observable;
mod options;

pub use observable::{ListenerId, ObservableValue, Subscription};
pub use options::{ListenerOptions, Reason, SetOptions};
