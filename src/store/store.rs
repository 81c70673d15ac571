use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;

use super::record::Record;
use super::schema::Schema;
use crate::error::{StoreError, StoreResult};
use crate::projection::{Nested, Projection, ProjectionTree, TreeBuilder};
use crate::value::{ListenerId, ListenerOptions, ObservableValue, SetOptions, Subscription};

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique identity of a store.
///
/// Two handles compare equal only if they were cloned from the same store, so
/// the id can serve as the lookup token of an injection layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreId(u64);

impl StoreId {
    fn next() -> Self {
        StoreId(NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "store#{}", self.0)
    }
}

struct StoreInner<V> {
    id: StoreId,
    schema: Schema,
    values: Vec<Rc<ObservableValue<V>>>,
    tree: Option<ProjectionTree<V>>,
}

/// A record of observable fields with a fixed key set.
///
/// Each declared key owns one [`ObservableValue`]; listeners subscribe to a
/// single key and are only called when that key changes. Cloning a `Store`
/// creates a new handle to the **same** fields.
///
/// # Examples
///
/// ```
/// use tether::{Record, Store};
///
/// let store = Store::new(Record::new().with("count", 0).with("step", 1));
/// store.set("count", 5).unwrap();
/// assert_eq!(store.get("count").unwrap(), 5);
/// assert!(store.get("missing").is_err());
/// ```
pub struct Store<V> {
    inner: Rc<StoreInner<V>>,
}

impl<V> Clone for Store<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<V: Clone + PartialEq + 'static> Store<V> {
    /// Create a store with one field per key of `initial`, in record order.
    pub fn new(initial: Record<V>) -> Self {
        let mut keys = Vec::with_capacity(initial.len());
        let mut values = Vec::with_capacity(initial.len());
        for (key, value) in initial {
            let key: Rc<str> = Rc::from(key);
            values.push(Rc::new(ObservableValue::new(Rc::clone(&key), value)));
            keys.push(key);
        }
        Self::from_parts(Schema::from_unique(keys), values, None)
    }

    /// Create a store from an explicit schema.
    ///
    /// Every declared key must have a value in `initial`; keys of `initial`
    /// that the schema does not declare are ignored.
    pub fn from_schema(schema: Schema, initial: &Record<V>) -> StoreResult<Self> {
        let values = (0..schema.len())
            .map(|position| {
                let key = schema.key_at(position);
                initial
                    .get(key)
                    .map(|value| Rc::new(ObservableValue::new(Rc::clone(key), value.clone())))
                    .ok_or_else(|| StoreError::missing_initial_value(&**key))
            })
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Self::from_parts(schema, values, None))
    }

    /// Create a store whose fields are projected out of a nested `source`.
    ///
    /// Each projection contributes one flat key seeded with the value found at
    /// its path. The projection paths are kept as a compressed
    /// [`ProjectionTree`] for introspection.
    pub fn from_projections<I>(source: &V, projections: I) -> StoreResult<Self>
    where
        V: Nested,
        I: IntoIterator<Item = Projection>,
    {
        let projections: Vec<Projection> = projections.into_iter().collect();
        let schema = Schema::new(projections.iter().map(Projection::key))?;

        let mut builder = TreeBuilder::new();
        let mut values = Vec::with_capacity(projections.len());
        for (position, projection) in projections.iter().enumerate() {
            let initial = projection.resolve(source)?.clone();
            let value = Rc::new(ObservableValue::new(
                Rc::clone(schema.key_at(position)),
                initial,
            ));
            builder.attach(projection.host_path(), Rc::clone(&value));
            values.push(value);
        }

        Ok(Self::from_parts(schema, values, Some(builder.finish())))
    }

    fn from_parts(
        schema: Schema,
        values: Vec<Rc<ObservableValue<V>>>,
        tree: Option<ProjectionTree<V>>,
    ) -> Self {
        let id = StoreId::next();
        tracing::trace!(store = %id, keys = schema.len(), projected = tree.is_some(), "store created");
        Self {
            inner: Rc::new(StoreInner {
                id,
                schema,
                values,
                tree,
            }),
        }
    }

    fn field(&self, key: &str) -> StoreResult<&Rc<ObservableValue<V>>> {
        let position = self.inner.schema.resolve(key)?;
        Ok(&self.inner.values[position])
    }

    /// Get a clone of the value stored under `key`.
    pub fn get(&self, key: &str) -> StoreResult<V> {
        Ok(self.field(key)?.get())
    }

    /// Read the value under `key` with a function without cloning.
    pub fn with<R>(&self, key: &str, f: impl FnOnce(&V) -> R) -> StoreResult<R> {
        Ok(self.field(key)?.with(f))
    }

    /// Write `value` under `key`.
    ///
    /// Returns whether listeners were notified, i.e. whether the value changed.
    pub fn set(&self, key: &str, value: V) -> StoreResult<bool> {
        self.set_with(key, value, SetOptions::new())
    }

    /// Write `value` under `key` with explicit options.
    pub fn set_with(&self, key: &str, value: V, options: SetOptions) -> StoreResult<bool> {
        Ok(self.field(key)?.notify(value, options))
    }

    /// Replace the value under `key` with `f(current)`.
    pub fn update(&self, key: &str, f: impl FnOnce(&V) -> V) -> StoreResult<bool> {
        let field = self.field(key)?;
        let next = field.with(f);
        Ok(field.notify(next, SetOptions::new()))
    }

    /// Snapshot of every declared field.
    pub fn get_state(&self) -> Record<V> {
        self.inner
            .values
            .iter()
            .map(|value| (value.key().to_owned(), value.get()))
            .collect()
    }

    /// Write every declared field found in `state`.
    ///
    /// This is one independent write per key, in declaration order: equality
    /// suppression and listeners apply field by field. Declared keys missing
    /// from `state` are left untouched. Returns how many fields notified.
    pub fn set_state(&self, state: &Record<V>) -> usize {
        self.set_state_with(state, SetOptions::new())
    }

    /// [`set_state`](Self::set_state) with explicit options for every write.
    pub fn set_state_with(&self, state: &Record<V>, options: SetOptions) -> usize {
        let mut notified = 0;
        for value in &self.inner.values {
            if let Some(next) = state.get(value.key()) {
                if value.notify(next.clone(), options) {
                    notified += 1;
                }
            }
        }
        notified
    }

    /// Register a listener on `key`.
    pub fn add_listener<F>(
        &self,
        key: &str,
        listener: F,
        options: ListenerOptions,
    ) -> StoreResult<ListenerId>
    where
        F: Fn(&str, &V, &SetOptions) + 'static,
    {
        Ok(self.field(key)?.add_listener(listener, options))
    }

    /// Unregister a listener from `key`.
    ///
    /// Returns `Ok(false)` if it was not registered.
    pub fn remove_listener(&self, key: &str, id: ListenerId) -> StoreResult<bool> {
        Ok(self.field(key)?.remove_listener(id))
    }

    /// Register a listener on `key` and return a guard that removes it.
    pub fn subscribe<F>(
        &self,
        key: &str,
        listener: F,
        options: ListenerOptions,
    ) -> StoreResult<Subscription<V>>
    where
        F: Fn(&str, &V, &SetOptions) + 'static,
    {
        Ok(self.field(key)?.subscribe(listener, options))
    }

    /// Number of listeners registered on `key`.
    pub fn listener_count(&self, key: &str) -> StoreResult<usize> {
        Ok(self.field(key)?.listener_count())
    }

    /// The observable behind `key`.
    pub fn observable(&self, key: &str) -> StoreResult<Rc<ObservableValue<V>>> {
        self.field(key).map(Rc::clone)
    }
}

impl Store<Value> {
    /// Create a store from the fields of a JSON object.
    pub fn from_json(value: Value) -> StoreResult<Self> {
        Ok(Store::new(Record::from_json(value)?))
    }
}

impl<V> Store<V> {
    /// Identity of this store.
    pub fn id(&self) -> StoreId {
        self.inner.id
    }

    /// The declared keys.
    pub fn schema(&self) -> &Schema {
        &self.inner.schema
    }

    /// Declared keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.inner.schema.keys()
    }

    /// Whether `key` is declared.
    pub fn has_key(&self, key: &str) -> bool {
        self.inner.schema.contains(key)
    }

    /// The projection tree, for stores built with
    /// [`from_projections`](Self::from_projections).
    pub fn projection_tree(&self) -> Option<&ProjectionTree<V>> {
        self.inner.tree.as_ref()
    }

    /// Whether both handles point at the same store.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn observables(&self) -> &[Rc<ObservableValue<V>>] {
        &self.inner.values
    }
}

impl<V: fmt::Debug> fmt::Debug for Store<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("id", &self.inner.id)
            .field("values", &self.inner.values)
            .finish()
    }
}
