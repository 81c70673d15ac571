//! Stores: fixed records of observable fields.
//!
//! A [`Store`] declares its keys once, through a [`Schema`], and exposes one
//! independently observable field per key. Whole-state reads and writes use
//! [`Record`], an ordered key/value map.

mod record;
mod schema;
mod store;

pub use record::Record;
pub use schema::Schema;
pub use store::{Store, StoreId};
