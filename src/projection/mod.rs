//! Projected stores: flat keys over deep paths of a nested source.
//!
//! A [`Projection`] names a flat key and the path it reads from a [`Nested`]
//! source. [`Store::from_projections`](crate::Store::from_projections) seeds one
//! field per projection and keeps the paths as a path-compressed
//! [`ProjectionTree`] for debugging and diffing.

mod path;
mod tree;

pub use path::{Nested, Projection};
pub(crate) use tree::TreeBuilder;
pub use tree::{NodeRef, ProjectionTree};
