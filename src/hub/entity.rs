use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;

use crate::error::StoreResult;
use crate::store::Record;

static NEXT_ENTITY_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique identity of an [`Entity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}

struct EntityInner<V> {
    id: EntityId,
    record: RefCell<Record<V>>,
}

/// A shared record whose identity groups stores in a [`Hub`](crate::Hub).
///
/// The hub never interprets an entity beyond reading its fields when a store
/// binds or an update is pushed. Cloning an `Entity` creates a new handle to
/// the same record; two separately created entities are distinct even when
/// their contents are equal.
pub struct Entity<V> {
    inner: Rc<EntityInner<V>>,
}

impl<V> Clone for Entity<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<V> Entity<V> {
    /// Create an entity holding `record`.
    pub fn new(record: Record<V>) -> Self {
        Self {
            inner: Rc::new(EntityInner {
                id: EntityId(NEXT_ENTITY_ID.fetch_add(1, Ordering::Relaxed)),
                record: RefCell::new(record),
            }),
        }
    }

    /// Identity of this entity.
    pub fn id(&self) -> EntityId {
        self.inner.id
    }

    /// Read the record with a function without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&Record<V>) -> R) -> R {
        f(&self.inner.record.borrow())
    }

    /// Mutate the record in place.
    ///
    /// Bound stores are not notified; push the change with
    /// [`Hub::update_entity`](crate::Hub::update_entity).
    pub fn update<R>(&self, f: impl FnOnce(&mut Record<V>) -> R) -> R {
        f(&mut self.inner.record.borrow_mut())
    }

    /// Write one field, returning its previous value.
    pub fn set_field(&self, key: impl Into<String>, value: V) -> Option<V> {
        self.inner.record.borrow_mut().insert(key, value)
    }

    /// Replace the whole record, returning the old one.
    pub fn replace(&self, record: Record<V>) -> Record<V> {
        self.inner.record.replace(record)
    }

    /// Whether both handles point at the same entity.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<V: Clone> Entity<V> {
    /// Clone of the current record.
    pub fn snapshot(&self) -> Record<V> {
        self.inner.record.borrow().clone()
    }

    /// Clone of one field.
    pub fn get(&self, key: &str) -> Option<V> {
        self.inner.record.borrow().get(key).cloned()
    }
}

impl Entity<Value> {
    /// Create an entity from the fields of a JSON object.
    pub fn from_json(value: Value) -> StoreResult<Self> {
        Ok(Entity::new(Record::from_json(value)?))
    }
}

impl<V: fmt::Debug> fmt::Debug for Entity<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.inner.id)
            .field("record", &self.inner.record.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_per_instance() {
        let a = Entity::new(Record::new().with("count", 0));
        let b = Entity::new(Record::new().with("count", 0));
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id(), a.clone().id());
        assert!(a.ptr_eq(&a.clone()));
    }

    #[test]
    fn clones_share_the_record() {
        let entity = Entity::new(Record::new().with("count", 0));
        let handle = entity.clone();
        handle.set_field("count", 3);
        assert_eq!(entity.get("count"), Some(3));

        entity.update(|record| record.insert("name", 1));
        assert_eq!(handle.snapshot().keys().collect::<Vec<_>>(), vec!["count", "name"]);
    }
}
