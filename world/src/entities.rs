//! Recycling entity allocator and per-type component stores.

use std::collections::BTreeMap;

use gridspire_core::Entity;

/// Allocator that hands out entity identifiers and recycles freed ones.
///
/// Freed identifiers are reused in last-in-first-out order, so destroying an
/// entity and spawning a new one yields the freed id exactly once. Liveness
/// checks are constant time against a dense flag table.
#[derive(Debug, Default)]
pub(crate) struct EntityAllocator {
    alive: Vec<bool>,
    free: Vec<Entity>,
    live_count: usize,
}

impl EntityAllocator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn allocate(&mut self) -> Entity {
        let entity = match self.free.pop() {
            Some(recycled) => recycled,
            None => {
                let entity = Entity::new(self.alive.len() as u32);
                self.alive.push(false);
                entity
            }
        };

        let index = entity.get() as usize;
        self.alive[index] = true;
        self.live_count += 1;
        entity
    }

    pub(crate) fn release(&mut self, entity: Entity) -> bool {
        let index = entity.get() as usize;
        match self.alive.get_mut(index) {
            Some(flag) if *flag => {
                *flag = false;
                self.free.push(entity);
                self.live_count -= 1;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn is_alive(&self, entity: Entity) -> bool {
        let index = entity.get() as usize;
        self.alive.get(index).copied().unwrap_or(false)
    }

    pub(crate) fn live_count(&self) -> usize {
        self.live_count
    }
}

/// Mapping from entity id to component value for a single component type.
///
/// Stores are the sole owners of component data. Iteration order follows the
/// entity id ordering of the underlying map, keeping every pass
/// deterministic. [`ComponentStore::entities`] snapshots the key set so
/// callers may insert or remove entries while walking the result.
#[derive(Debug)]
pub struct ComponentStore<T> {
    entries: BTreeMap<Entity, T>,
}

impl<T> Default for ComponentStore<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T> ComponentStore<T> {
    /// Associates a component with the entity, returning any prior value.
    pub fn insert(&mut self, entity: Entity, component: T) -> Option<T> {
        self.entries.insert(entity, component)
    }

    /// Retrieves the component attached to the entity, if present.
    #[must_use]
    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.entries.get(&entity)
    }

    /// Retrieves a mutable reference to the entity's component, if present.
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.entries.get_mut(&entity)
    }

    /// Detaches and returns the entity's component, if present.
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        self.entries.remove(&entity)
    }

    /// Reports whether the entity carries a component of this type.
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.entries.contains_key(&entity)
    }

    /// Number of components currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether the store holds no components.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshots the ids of every entity carrying this component type.
    ///
    /// The returned list is detached from the store, so systems may mutate
    /// the store freely while walking it; entities added afterwards are not
    /// visited in the current pass.
    #[must_use]
    pub fn entities(&self) -> Vec<Entity> {
        self.entries.keys().copied().collect()
    }

    /// Iterates over entries in ascending entity order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.entries.iter().map(|(entity, value)| (*entity, value))
    }
}
