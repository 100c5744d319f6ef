//! # Component Storage
//!
//! Sparse, growable storage for one component type.
//!
//! The storage uses a slot-per-index strategy:
//! - Slots are indexed by entity index
//! - Access is O(1)
//! - The slot array grows on demand and never shrinks

use std::any::Any;

use super::component::Component;

/// Storage for a single component type.
///
/// # Type Parameters
///
/// * `C` - The component type to store
///
/// # Example
///
/// ```rust,ignore
/// let mut storage: ComponentStorage<Health> = ComponentStorage::new();
/// storage.insert(0, Health(100));
/// ```
pub struct ComponentStorage<C: Component> {
    /// One optional slot per entity index.
    slots: Vec<Option<C>>,
    /// Number of occupied slots.
    len: usize,
}

impl<C: Component> ComponentStorage<C> {
    /// Creates an empty storage.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            len: 0,
        }
    }

    /// Returns the number of stored components.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no component is stored.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Stores a component at `index`, returning the previous value.
    pub fn insert(&mut self, index: usize, component: C) -> Option<C> {
        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, || None);
        }
        let previous = self.slots[index].replace(component);
        if previous.is_none() {
            self.len += 1;
        }
        previous
    }

    /// Removes and returns the component at `index`.
    pub fn remove(&mut self, index: usize) -> Option<C> {
        let removed = self.slots.get_mut(index)?.take();
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    /// Gets a component by entity index.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&C> {
        self.slots.get(index)?.as_ref()
    }

    /// Gets a mutable component by entity index.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut C> {
        self.slots.get_mut(index)?.as_mut()
    }

    /// Checks if a component is stored at `index`.
    #[inline]
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(Some(_)))
    }

    /// Iterates over stored components with their indices.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &C)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|c| (index, c)))
    }
}

impl<C: Component> Default for ComponentStorage<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Type-erased view of a [`ComponentStorage`].
///
/// Lets the world drop a despawned entity's components without knowing
/// their types.
pub(crate) trait ErasedStorage: Any {
    /// Drops the component at `index`, if any.
    fn erase(&mut self, index: usize);

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<C: Component> ErasedStorage for ComponentStorage<C> {
    fn erase(&mut self, index: usize) {
        self.remove(index);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
