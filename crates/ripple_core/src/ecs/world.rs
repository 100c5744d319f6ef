//! # ECS World
//!
//! The central container for entities, components and filters.
//!
//! Every operation that changes an entity's component mask re-evaluates the
//! world's filters and fires membership events before returning. A dead
//! entity matches no filter, so spawn and despawn are transitions too.

use std::collections::HashMap;
use std::rc::Rc;

use super::component::{Component, ComponentId, ComponentMask, ComponentRegistry};
use super::entity::{Entity, EntityId};
use super::storage::{ComponentStorage, ErasedStorage};
use crate::filter::{Filter, FilterHandle};

/// The ECS World - container for all entity state.
///
/// # Example
///
/// ```rust,ignore
/// let mut world = World::new();
/// let movers = world.filter_builder().with::<Position>().with::<Velocity>().build();
///
/// let entity = world.spawn();
/// world.add_component(entity, Position::default());
/// world.add_component(entity, Velocity::default()); // movers gains `entity`
/// ```
#[derive(Default)]
pub struct World {
    /// All entity slots, alive or dead.
    entities: Vec<Entity>,
    /// Free list of entity indices for reuse.
    free_indices: Vec<u32>,
    /// Number of currently alive entities.
    alive_count: usize,
    /// Component type to id mapping.
    components: ComponentRegistry,
    /// One storage per registered component id.
    storages: HashMap<ComponentId, Box<dyn ErasedStorage>>,
    /// Filters in creation order. Events fan out in this order.
    filters: Vec<FilterHandle>,
    /// Mask to position in `filters`.
    filter_index: HashMap<ComponentMask, usize>,
}

impl World {
    /// Creates an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty world with room for `capacity` entities.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entities: Vec::with_capacity(capacity),
            free_indices: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Returns the number of currently alive entities.
    #[inline]
    #[must_use]
    pub const fn alive_count(&self) -> usize {
        self.alive_count
    }

    /// Spawns a new entity with no components.
    ///
    /// Filters with an empty mask gain the entity.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX` entity slots are needed.
    pub fn spawn(&mut self) -> EntityId {
        let id = if let Some(index) = self.free_indices.pop() {
            let slot = &mut self.entities[index as usize];
            // Increment generation to invalidate old references
            let id = EntityId::new(index, slot.id.generation().wrapping_add(1));
            *slot = Entity::new(id);
            id
        } else {
            assert!(
                self.entities.len() < u32::MAX as usize,
                "entity index space exhausted"
            );
            #[allow(clippy::cast_possible_truncation)]
            let id = EntityId::new(self.entities.len() as u32, 0);
            self.entities.push(Entity::new(id));
            id
        };

        self.alive_count += 1;
        self.sync_filters(id, None, Some(ComponentMask::EMPTY));
        id
    }

    /// Despawns an entity, dropping its components.
    ///
    /// The entity leaves every filter it was a member of, in filter
    /// creation order.
    ///
    /// # Returns
    ///
    /// `true` if the entity was despawned, `false` if it was already dead
    /// or the ID was invalid/stale.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        if !self.is_alive(id) {
            return false;
        }

        let idx = id.index() as usize;
        let old_mask = self.entities[idx].mask;
        for component in old_mask.iter() {
            if let Some(storage) = self.storages.get_mut(&component) {
                storage.erase(idx);
            }
        }

        let slot = &mut self.entities[idx];
        slot.alive = false;
        slot.mask = ComponentMask::EMPTY;
        self.alive_count -= 1;
        self.free_indices.push(id.index());

        self.sync_filters(id, Some(old_mask), None);
        true
    }

    /// Checks if an entity is alive.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        if id.is_null() {
            return false;
        }
        self.entities
            .get(id.index() as usize)
            .is_some_and(|slot| slot.alive && slot.id == id)
    }

    /// Iterates over all alive entity IDs.
    pub fn iter_alive(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter().filter(|e| e.alive).map(|e| e.id)
    }

    /// Returns the component mask of a live entity.
    #[must_use]
    pub fn component_mask(&self, id: EntityId) -> Option<ComponentMask> {
        self.is_alive(id)
            .then(|| self.entities[id.index() as usize].mask)
    }

    /// Returns the id of component type `C`, registering it if needed.
    pub fn component_id<C: Component>(&mut self) -> ComponentId {
        self.components.id_of::<C>()
    }

    /// Returns a mask containing only `C`.
    pub fn mask_of<C: Component>(&mut self) -> ComponentMask {
        ComponentMask::EMPTY.with(self.component_id::<C>())
    }

    /// Returns the component registry.
    #[must_use]
    pub const fn components(&self) -> &ComponentRegistry {
        &self.components
    }

    /// Attaches a component to an entity.
    ///
    /// If the entity already has a `C`, the value is replaced and no
    /// membership changes. Otherwise every filter the entity now matches
    /// is notified before this returns.
    ///
    /// # Returns
    ///
    /// `false` if the entity is dead or stale.
    pub fn add_component<C: Component>(&mut self, id: EntityId, component: C) -> bool {
        if !self.is_alive(id) {
            return false;
        }

        let component_id = self.components.id_of::<C>();
        let idx = id.index() as usize;
        self.storage_mut::<C>(component_id).insert(idx, component);

        let slot = &mut self.entities[idx];
        if slot.mask.contains(component_id) {
            return true;
        }
        let old_mask = slot.mask;
        slot.mask.insert(component_id);
        let new_mask = slot.mask;

        self.sync_filters(id, Some(old_mask), Some(new_mask));
        true
    }

    /// Detaches a component from an entity, returning it.
    ///
    /// Filters the entity no longer matches are notified before this
    /// returns.
    pub fn remove_component<C: Component>(&mut self, id: EntityId) -> Option<C> {
        if !self.is_alive(id) {
            return None;
        }

        let component_id = self.components.get::<C>()?;
        let idx = id.index() as usize;
        let slot = &mut self.entities[idx];
        if !slot.mask.contains(component_id) {
            return None;
        }
        let old_mask = slot.mask;
        slot.mask.remove(component_id);
        let new_mask = slot.mask;

        let removed = self.storage_mut::<C>(component_id).remove(idx);
        self.sync_filters(id, Some(old_mask), Some(new_mask));
        removed
    }

    /// Checks if a live entity has a `C`.
    #[must_use]
    pub fn has_component<C: Component>(&self, id: EntityId) -> bool {
        match (self.components.get::<C>(), self.component_mask(id)) {
            (Some(component_id), Some(mask)) => mask.contains(component_id),
            _ => false,
        }
    }

    /// Gets a live entity's `C`.
    #[must_use]
    pub fn get<C: Component>(&self, id: EntityId) -> Option<&C> {
        if !self.is_alive(id) {
            return None;
        }
        self.storage::<C>()?.get(id.index() as usize)
    }

    /// Gets a live entity's `C` mutably.
    ///
    /// Mutating a component in place changes no mask and fires no event.
    pub fn get_mut<C: Component>(&mut self, id: EntityId) -> Option<&mut C> {
        if !self.is_alive(id) {
            return None;
        }
        let component_id = self.components.get::<C>()?;
        self.storages
            .get_mut(&component_id)?
            .as_any_mut()
            .downcast_mut::<ComponentStorage<C>>()?
            .get_mut(id.index() as usize)
    }

    /// Returns the filter for `mask`, creating it if needed.
    ///
    /// A new filter is seeded with the entities that already match. Seeding
    /// fires no events: nobody can be listening yet.
    pub fn filter(&mut self, mask: ComponentMask) -> FilterHandle {
        if let Some(&position) = self.filter_index.get(&mask) {
            return Rc::clone(&self.filters[position]);
        }

        let filter = Rc::new(Filter::new(mask));
        for entity in self.entities.iter().filter(|e| e.alive && filter.matches(e.mask)) {
            filter.insert(entity.id, false);
        }

        tracing::debug!(
            "created filter {:?} with {} initial members",
            mask,
            filter.len()
        );
        self.filter_index.insert(mask, self.filters.len());
        self.filters.push(Rc::clone(&filter));
        filter
    }

    /// Starts building a filter mask from component types.
    pub fn filter_builder(&mut self) -> FilterBuilder<'_> {
        FilterBuilder {
            world: self,
            mask: ComponentMask::EMPTY,
        }
    }

    /// Returns the number of filters.
    #[must_use]
    pub fn filter_count(&self) -> usize {
        self.filters.len()
    }

    fn storage<C: Component>(&self) -> Option<&ComponentStorage<C>> {
        let component_id = self.components.get::<C>()?;
        self.storages
            .get(&component_id)?
            .as_any()
            .downcast_ref::<ComponentStorage<C>>()
    }

    fn storage_mut<C: Component>(&mut self, component_id: ComponentId) -> &mut ComponentStorage<C> {
        let erased = self
            .storages
            .entry(component_id)
            .or_insert_with(|| Box::new(ComponentStorage::<C>::new()) as Box<dyn ErasedStorage>);
        match erased.as_any_mut().downcast_mut::<ComponentStorage<C>>() {
            Some(storage) => storage,
            None => unreachable!("component id {component_id:?} bound to another type"),
        }
    }

    /// Moves `id` in or out of every filter whose match result changed.
    ///
    /// `None` stands for "not alive", which matches nothing.
    fn sync_filters(&self, id: EntityId, old: Option<ComponentMask>, new: Option<ComponentMask>) {
        for filter in &self.filters {
            let was = old.is_some_and(|mask| filter.matches(mask));
            let now = new.is_some_and(|mask| filter.matches(mask));
            match (was, now) {
                (false, true) => filter.insert(id, true),
                (true, false) => filter.remove(id),
                _ => {}
            }
        }
    }
}

/// Builds a filter mask from component types.
pub struct FilterBuilder<'w> {
    world: &'w mut World,
    mask: ComponentMask,
}

impl FilterBuilder<'_> {
    /// Requires component `C`.
    #[must_use]
    pub fn with<C: Component>(mut self) -> Self {
        let component_id = self.world.component_id::<C>();
        self.mask.insert(component_id);
        self
    }

    /// Returns the filter for the accumulated mask.
    pub fn build(self) -> FilterHandle {
        self.world.filter(self.mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterListener;
    use std::cell::RefCell;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Position(f32);
    impl Component for Position {}

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Velocity(f32);
    impl Component for Velocity {}

    #[derive(Default)]
    struct Log(RefCell<Vec<(bool, EntityId)>>);

    impl FilterListener for Log {
        fn on_entity_added(&self, entity: EntityId) {
            self.0.borrow_mut().push((true, entity));
        }

        fn on_entity_removed(&self, entity: EntityId) {
            self.0.borrow_mut().push((false, entity));
        }
    }

    #[test]
    fn test_spawn_despawn() {
        let mut world = World::new();

        let id1 = world.spawn();
        assert!(world.is_alive(id1));
        let id2 = world.spawn();
        assert_eq!(world.alive_count(), 2);

        assert!(world.despawn(id1));
        assert!(!world.is_alive(id1));
        assert!(!world.despawn(id1));
        assert_eq!(world.alive_count(), 1);

        // Spawn again - should reuse the slot
        let id3 = world.spawn();
        assert_eq!(id3.index(), id1.index());
        assert_ne!(id3.generation(), id1.generation());
        assert!(world.is_alive(id2));
    }

    #[test]
    fn test_component_roundtrip() {
        let mut world = World::new();
        let e = world.spawn();

        assert!(world.add_component(e, Position(1.0)));
        assert!(world.has_component::<Position>(e));
        assert_eq!(world.get::<Position>(e), Some(&Position(1.0)));

        if let Some(pos) = world.get_mut::<Position>(e) {
            pos.0 = 2.0;
        }
        assert_eq!(world.remove_component::<Position>(e), Some(Position(2.0)));
        assert!(!world.has_component::<Position>(e));
        assert!(world.remove_component::<Position>(e).is_none());
    }

    #[test]
    fn test_dead_entity_rejects_components() {
        let mut world = World::new();
        let e = world.spawn();
        world.despawn(e);
        assert!(!world.add_component(e, Position(0.0)));
        assert!(world.get::<Position>(e).is_none());
    }

    #[test]
    fn test_filter_tracks_membership() {
        let mut world = World::new();
        let movers = world.filter_builder().with::<Position>().with::<Velocity>().build();
        let log = Rc::new(Log::default());
        movers.register(log.clone());

        let e = world.spawn();
        world.add_component(e, Position(0.0));
        assert!(!movers.contains(e));
        world.add_component(e, Velocity(1.0));
        assert!(movers.contains(e));

        // Replacing a value is not a transition.
        world.add_component(e, Velocity(2.0));
        world.remove_component::<Position>(e);
        assert!(!movers.contains(e));

        assert_eq!(*log.0.borrow(), vec![(true, e), (false, e)]);
    }

    #[test]
    fn test_filter_seeded_and_shared() {
        let mut world = World::new();
        let e = world.spawn();
        world.add_component(e, Position(0.0));

        let a = world.filter_builder().with::<Position>().build();
        let b = world.filter_builder().with::<Position>().build();
        assert!(Rc::ptr_eq(&a, &b));
        assert!(a.contains(e));
        assert_eq!(world.filter_count(), 1);
    }

    #[test]
    fn test_despawn_leaves_filters() {
        let mut world = World::new();
        let positioned = world.filter_builder().with::<Position>().build();
        let everything = world.filter(ComponentMask::EMPTY);
        let log = Rc::new(Log::default());
        positioned.register(log.clone());

        let e = world.spawn();
        assert!(everything.contains(e));
        world.add_component(e, Position(0.0));
        world.despawn(e);

        assert!(positioned.is_empty());
        assert!(everything.is_empty());
        assert_eq!(*log.0.borrow(), vec![(true, e), (false, e)]);
    }
}
