use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use super::config::HubConfig;
use super::entity::{Entity, EntityId};
use crate::list::{self, NodeArena, NodeId};
use crate::store::{Store, StoreId};
use crate::value::{ListenerId, ListenerOptions, ObservableValue, Reason, SetOptions};

/// A store bound to an entity, threaded into that entity's list.
struct Member<V> {
    store: Store<V>,
    entity: EntityId,
    listeners: Vec<(Rc<ObservableValue<V>>, ListenerId)>,
}

/// Head of the list of stores observing one entity.
struct Observed<V> {
    entity: Entity<V>,
    head: NodeId,
}

struct Registry<V> {
    observed: HashMap<EntityId, Observed<V>>,
    members: NodeArena<Member<V>>,
    nodes: HashMap<StoreId, NodeId>,
}

impl<V> Registry<V> {
    fn new() -> Self {
        Self {
            observed: HashMap::new(),
            members: NodeArena::new(),
            nodes: HashMap::new(),
        }
    }

    fn member(&self, store: StoreId) -> Option<&Member<V>> {
        let node = *self.nodes.get(&store)?;
        self.members.get(node)
    }

    fn entity_of(&self, store: StoreId) -> Option<EntityId> {
        self.member(store).map(|member| member.entity)
    }

    fn is_member(&self, store: StoreId, entity: EntityId) -> bool {
        self.entity_of(store) == Some(entity)
    }

    fn entity(&self, entity: EntityId) -> Option<&Entity<V>> {
        self.observed.get(&entity).map(|observed| &observed.entity)
    }

    /// Stores bound to `entity`, most recently bound first.
    fn stores(&self, entity: EntityId) -> Vec<Store<V>> {
        let head = self.observed.get(&entity).map(|observed| observed.head);
        list::iter(&self.members, head)
            .filter_map(|node| self.members.get(node))
            .map(|member| member.store.clone())
            .collect()
    }

    fn attach(&mut self, store: Store<V>, entity: &Entity<V>) {
        let store_id = store.id();
        let entity_id = entity.id();
        let node = self.members.insert(Member {
            store,
            entity: entity_id,
            listeners: Vec::new(),
        });

        let head = self.observed.get(&entity_id).map(|observed| observed.head);
        let head = list::insert(&mut self.members, node, head);
        self.observed
            .entry(entity_id)
            .and_modify(|observed| observed.head = head)
            .or_insert_with(|| Observed {
                entity: entity.clone(),
                head,
            });
        self.nodes.insert(store_id, node);
    }

    fn detach(&mut self, store: StoreId, entity: EntityId) -> Option<Member<V>> {
        let node = *self.nodes.get(&store)?;
        if self.members.get(node)?.entity != entity {
            return None;
        }

        let Some(observed) = self.observed.get_mut(&entity) else {
            unreachable!("{store} is linked under {entity} but the entity has no list");
        };
        match list::remove(&mut self.members, node, Some(observed.head)) {
            Some(head) => observed.head = head,
            None => {
                self.observed.remove(&entity);
            }
        }
        self.nodes.remove(&store);
        self.members.remove(node)
    }

    fn set_listeners(
        &mut self,
        store: StoreId,
        listeners: Vec<(Rc<ObservableValue<V>>, ListenerId)>,
    ) {
        if let Some(&node) = self.nodes.get(&store) {
            if let Some(member) = self.members.get_mut(node) {
                member.listeners = listeners;
            }
        }
    }
}

struct HubInner<V> {
    config: HubConfig,
    registry: RefCell<Registry<V>>,
}

/// Keeps stores that are bound to the same [`Entity`] in sync.
///
/// A store is bound to at most one entity at a time. A write to a bound store
/// is forwarded to every other store bound to the same entity, tagged with
/// [`Reason::Propagated`] so the receivers do not forward it again. Pushing a
/// change from the entity side goes through [`update_entity`](Self::update_entity)
/// or [`update_entity_field`](Self::update_entity_field).
///
/// The hub never borrows its registry while calling into a store, so listeners
/// may bind and unbind stores while a propagation is in flight. A store
/// unbound during a walk is skipped by the rest of that walk.
///
/// # Examples
///
/// ```
/// use tether::{Entity, Hub, Record, Store};
///
/// let hub = Hub::new();
/// let user = Entity::new(Record::new().with("name", "ada"));
/// let form = Store::new(Record::new().with("name", ""));
/// let header = Store::new(Record::new().with("name", ""));
///
/// hub.bind(&form, &user);
/// hub.bind(&header, &user);
/// assert_eq!(header.get("name").unwrap(), "ada");
///
/// form.set("name", "grace").unwrap();
/// assert_eq!(header.get("name").unwrap(), "grace");
/// ```
pub struct Hub<V> {
    inner: Rc<HubInner<V>>,
}

impl<V> Clone for Hub<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<V: Clone + PartialEq + 'static> Default for Hub<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + PartialEq + 'static> Hub<V> {
    /// Create a hub with the default configuration.
    pub fn new() -> Self {
        Self::with_config(HubConfig::default())
    }

    /// Create a hub with `config`.
    ///
    /// Configurations loaded from outside should be checked with
    /// [`HubConfig::validate`] first; an invalid one trips a debug assertion.
    pub fn with_config(config: HubConfig) -> Self {
        debug_assert!(
            config.validate().is_ok(),
            "invalid hub config: {:?}",
            config.validate()
        );
        Self {
            inner: Rc::new(HubInner {
                config,
                registry: RefCell::new(Registry::new()),
            }),
        }
    }

    /// The hub's configuration.
    pub fn config(&self) -> &HubConfig {
        &self.inner.config
    }

    /// Bind `store` to `entity` and copy the entity's fields into it.
    ///
    /// Binding to the entity the store is already bound to only copies the
    /// fields again. Binding to another entity unbinds from the old one first.
    pub fn bind(&self, store: &Store<V>, entity: &Entity<V>) {
        let label = &self.inner.config.label;
        let current = self.inner.registry.borrow().entity_of(store.id());
        match current {
            Some(bound) if bound == entity.id() => {
                debug!(hub = %label, store = %store.id(), entity = %bound, "resyncing bound store");
                store.set_state_with(&entity.snapshot(), SetOptions::with_reason(Reason::Rebind));
                return;
            }
            Some(bound) => {
                self.detach(store.id(), bound);
            }
            None => {}
        }

        self.inner.registry.borrow_mut().attach(store.clone(), entity);
        debug!(hub = %label, store = %store.id(), entity = %entity.id(), "store bound");
        store.set_state_with(&entity.snapshot(), SetOptions::with_reason(Reason::Rebind));

        // a listener reacting to the resync may have moved the store already
        let still_bound = self.inner.registry.borrow().is_member(store.id(), entity.id());
        if !still_bound {
            trace!(hub = %label, store = %store.id(), "store rebound during resync");
            return;
        }

        let listeners = store
            .observables()
            .iter()
            .map(|value| {
                let hub = Rc::downgrade(&self.inner);
                let origin = store.id();
                let id = value.add_listener(
                    move |key: &str, value: &V, options: &SetOptions| {
                        propagate(&hub, origin, key, value, options)
                    },
                    ListenerOptions::new(),
                );
                (Rc::clone(value), id)
            })
            .collect();
        self.inner
            .registry
            .borrow_mut()
            .set_listeners(store.id(), listeners);
    }

    /// Unbind `store` from `entity`.
    ///
    /// Returns `false` if the store was not bound to that entity.
    pub fn unbind(&self, store: &Store<V>, entity: &Entity<V>) -> bool {
        self.detach(store.id(), entity.id())
    }

    /// Copy every field of `entity` into the stores bound to it.
    ///
    /// Returns `false` if no store observes the entity.
    pub fn update_entity(&self, entity: &Entity<V>) -> bool {
        let stores = self.inner.registry.borrow().stores(entity.id());
        if stores.is_empty() {
            trace!(hub = %self.inner.config.label, entity = %entity.id(), "entity not observed");
            return false;
        }

        let state = entity.snapshot();
        let options = SetOptions::with_reason(Reason::EntitySync);
        debug!(hub = %self.inner.config.label, entity = %entity.id(), stores = stores.len(), "pushing entity");
        for store in stores {
            if self.is_bound_to(&store, entity.id()) {
                store.set_state_with(&state, options);
            }
        }
        true
    }

    /// Write one field of `entity` and push it to the stores bound to it.
    ///
    /// The entity is written even when nothing observes it. Stores that do not
    /// declare `key` are skipped. Returns `false` if no store observes the
    /// entity.
    pub fn update_entity_field(&self, entity: &Entity<V>, key: &str, value: V) -> bool {
        entity.set_field(key, value.clone());

        let stores = self.inner.registry.borrow().stores(entity.id());
        if stores.is_empty() {
            trace!(hub = %self.inner.config.label, entity = %entity.id(), key, "entity not observed");
            return false;
        }

        let options = SetOptions::with_reason(Reason::EntitySync);
        for store in stores {
            if !self.is_bound_to(&store, entity.id()) {
                continue;
            }
            if let Err(error) = store.set_with(key, value.clone(), options) {
                trace!(hub = %self.inner.config.label, store = %store.id(), %error, "field skipped");
            }
        }
        true
    }

    fn is_bound_to(&self, store: &Store<V>, entity: EntityId) -> bool {
        self.inner.registry.borrow().is_member(store.id(), entity)
    }

    fn detach(&self, store: StoreId, entity: EntityId) -> bool {
        let member = self.inner.registry.borrow_mut().detach(store, entity);
        let Some(member) = member else {
            trace!(hub = %self.inner.config.label, %store, %entity, "store not bound to entity");
            return false;
        };
        for (value, id) in member.listeners {
            value.remove_listener(id);
        }
        debug!(hub = %self.inner.config.label, %store, %entity, "store unbound");
        if self.inner.registry.borrow().entity(entity).is_none() {
            debug!(hub = %self.inner.config.label, %entity, "entity no longer observed");
        }
        true
    }
}

impl<V> Hub<V> {
    /// Whether `store` is bound to any entity.
    pub fn is_bound(&self, store: &Store<V>) -> bool {
        self.inner.registry.borrow().nodes.contains_key(&store.id())
    }

    /// The entity `store` is bound to.
    pub fn bound_entity(&self, store: &Store<V>) -> Option<EntityId> {
        self.inner.registry.borrow().entity_of(store.id())
    }

    /// Stores bound to `entity`, most recently bound first.
    pub fn stores_for(&self, entity: &Entity<V>) -> Vec<Store<V>> {
        self.inner.registry.borrow().stores(entity.id())
    }

    /// Number of stores bound to `entity`.
    pub fn bound_count(&self, entity: &Entity<V>) -> usize {
        let registry = self.inner.registry.borrow();
        let head = registry.observed.get(&entity.id()).map(|observed| observed.head);
        list::iter(&registry.members, head).count()
    }

    /// Number of entities with at least one bound store.
    pub fn entity_count(&self) -> usize {
        self.inner.registry.borrow().observed.len()
    }
}

impl<V> fmt::Debug for Hub<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.inner.registry.borrow();
        f.debug_struct("Hub")
            .field("config", &self.inner.config)
            .field("entities", &registry.observed.len())
            .field("stores", &registry.nodes.len())
            .finish()
    }
}

/// Forward a write on `origin` to its siblings.
fn propagate<V: Clone + PartialEq + 'static>(
    hub: &Weak<HubInner<V>>,
    origin: StoreId,
    key: &str,
    value: &V,
    options: &SetOptions,
) {
    if options.suppresses_propagation() {
        return;
    }
    let Some(hub) = hub.upgrade() else {
        return;
    };
    let label = &hub.config.label;

    let (entity, siblings) = {
        let registry = hub.registry.borrow();
        let Some(entity) = registry.entity_of(origin) else {
            return;
        };
        let siblings: Vec<Store<V>> = registry
            .stores(entity)
            .into_iter()
            .filter(|store| store.id() != origin)
            .collect();
        let handle = registry.entity(entity).cloned();
        (handle, siblings)
    };
    let Some(entity) = entity else {
        return;
    };

    if hub.config.write_through {
        entity.set_field(key, value.clone());
    }

    trace!(hub = %label, store = %origin, entity = %entity.id(), key, siblings = siblings.len(), hops = options.hops, "propagating");
    let forwarded = options.propagated();
    for sibling in siblings {
        let still_bound = hub.registry.borrow().is_member(sibling.id(), entity.id());
        if !still_bound {
            trace!(hub = %label, store = %sibling.id(), "sibling unbound during propagation");
            continue;
        }
        if let Err(error) = sibling.set_with(key, value.clone(), forwarded) {
            trace!(hub = %label, store = %sibling.id(), %error, "field skipped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Record;
    use std::cell::Cell;

    fn counter() -> Store<i64> {
        Store::new(Record::new().with("count", 0).with("step", 1))
    }

    fn entity() -> Entity<i64> {
        Entity::new(Record::new().with("count", 10).with("step", 2))
    }

    #[test]
    fn bind_copies_entity_state() {
        let hub = Hub::new();
        let store = counter();
        let entity = entity();
        hub.bind(&store, &entity);

        assert_eq!(store.get_state(), entity.snapshot());
        assert_eq!(hub.bound_entity(&store), Some(entity.id()));
        assert_eq!(hub.bound_count(&entity), 1);
        assert_eq!(store.listener_count("count"), Ok(1));
    }

    #[test]
    fn writes_reach_siblings_once() {
        let hub = Hub::new();
        let entity = entity();
        let (a, b) = (counter(), counter());
        hub.bind(&a, &entity);
        hub.bind(&b, &entity);

        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        a.add_listener("count", move |_, _, _| seen.set(seen.get() + 1), ListenerOptions::new())
            .unwrap();

        a.set("count", 5).unwrap();
        assert_eq!(b.get("count"), Ok(5));
        assert_eq!(calls.get(), 1);
        assert_eq!(entity.get("count"), Some(10));
    }

    #[test]
    fn propagated_writes_carry_reason_and_hops() {
        let hub = Hub::new();
        let entity = entity();
        let (a, b) = (counter(), counter());
        hub.bind(&a, &entity);
        hub.bind(&b, &entity);

        let received = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&received);
        b.add_listener("step", move |_, _, options| *sink.borrow_mut() = Some(*options), ListenerOptions::new())
            .unwrap();

        a.set("step", 7).unwrap();
        let options = received.borrow().unwrap();
        assert_eq!(options.reason, Some(Reason::Propagated));
        assert_eq!(options.hops, 1);
    }

    #[test]
    fn unbind_removes_hub_listeners_and_empty_entries() {
        let hub = Hub::new();
        let entity = entity();
        let store = counter();
        hub.bind(&store, &entity);

        assert!(hub.unbind(&store, &entity));
        assert!(!hub.unbind(&store, &entity));
        assert_eq!(store.listener_count("count"), Ok(0));
        assert_eq!(hub.entity_count(), 0);
        assert!(!hub.is_bound(&store));
    }

    #[test]
    fn rebinding_moves_between_entities() {
        let hub = Hub::new();
        let first = entity();
        let second = Entity::new(Record::new().with("count", 99).with("step", 3));
        let store = counter();

        hub.bind(&store, &first);
        hub.bind(&store, &second);
        assert_eq!(hub.bound_entity(&store), Some(second.id()));
        assert_eq!(hub.bound_count(&first), 0);
        assert_eq!(store.get("count"), Ok(99));
        assert_eq!(store.listener_count("count"), Ok(1));
    }

    #[test]
    fn update_entity_field_without_observers_still_writes() {
        let hub: Hub<i64> = Hub::new();
        let entity = entity();
        assert!(!hub.update_entity_field(&entity, "count", 4));
        assert_eq!(entity.get("count"), Some(4));
    }

    #[test]
    fn write_through_updates_the_entity() {
        let hub = Hub::with_config(HubConfig::new("forms").write_through(true));
        let entity = entity();
        let store = counter();
        hub.bind(&store, &entity);

        store.set("count", 12).unwrap();
        assert_eq!(entity.get("count"), Some(12));
        assert_eq!(hub.config().label, "forms");
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "invalid hub config")]
    fn blank_label_trips_debug_assertion() {
        let _hub: Hub<i64> = Hub::with_config(HubConfig::new(" "));
    }

    #[test]
    fn dropped_hub_leaves_inert_listeners() {
        let entity = entity();
        let (a, b) = (counter(), counter());
        {
            let hub = Hub::new();
            hub.bind(&a, &entity);
            hub.bind(&b, &entity);
        }
        a.set("count", 1).unwrap();
        assert_eq!(b.get("count"), Ok(10));
    }
}
