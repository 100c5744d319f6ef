//! # Entity Filters
//!
//! A filter is a live set of entities whose component mask contains the
//! filter's mask. The world keeps it up to date on every component change
//! and the filter notifies its listeners synchronously.
//!
//! ## Notification Contract
//!
//! ```text
//! world.add_component(e, C)
//!   └─> mask(e) now matches filter
//!         ├─> membership updated
//!         └─> listeners notified (L1, L2, L3 ...)  <- before add_component returns
//! ```
//!
//! A single filter type covers every combination of components; the mask
//! is built at runtime.

mod listener;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::ecs::{ComponentMask, EntityId};
use crate::error::FilterResult;

pub use listener::{FilterListener, ListenerHandle, ListenerRegistry, MembershipEvent};

/// Shared handle to a filter owned by the world.
pub type FilterHandle = Rc<Filter>;

/// Dense membership set with O(1) insert, remove and lookup.
#[derive(Debug, Default)]
struct Members {
    dense: Vec<EntityId>,
    sparse: HashMap<EntityId, usize>,
}

impl Members {
    fn insert(&mut self, entity: EntityId) -> bool {
        if self.sparse.contains_key(&entity) {
            return false;
        }
        self.sparse.insert(entity, self.dense.len());
        self.dense.push(entity);
        true
    }

    fn remove(&mut self, entity: EntityId) -> bool {
        let Some(slot) = self.sparse.remove(&entity) else {
            return false;
        };
        self.dense.swap_remove(slot);
        if let Some(&moved) = self.dense.get(slot) {
            self.sparse.insert(moved, slot);
        }
        true
    }
}

/// Live set of entities matching a component mask.
///
/// Only the world changes membership. Everything else observes it, either
/// by querying or by registering a [`FilterListener`].
#[derive(Debug)]
pub struct Filter {
    mask: ComponentMask,
    members: RefCell<Members>,
    listeners: ListenerRegistry,
}

impl Filter {
    /// Creates an empty filter for `mask`.
    pub(crate) fn new(mask: ComponentMask) -> Self {
        Self {
            mask,
            members: RefCell::new(Members::default()),
            listeners: ListenerRegistry::new(mask),
        }
    }

    /// Returns the mask this filter matches against.
    #[inline]
    #[must_use]
    pub const fn mask(&self) -> ComponentMask {
        self.mask
    }

    /// Checks if an entity mask satisfies this filter.
    #[inline]
    #[must_use]
    pub const fn matches(&self, entity_mask: ComponentMask) -> bool {
        entity_mask.contains_all(self.mask)
    }

    /// Checks if `entity` is currently a member.
    #[must_use]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.members.borrow().sparse.contains_key(&entity)
    }

    /// Returns the number of member entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.borrow().dense.len()
    }

    /// Returns `true` if the filter has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.borrow().dense.is_empty()
    }

    /// Returns a snapshot of the current members.
    ///
    /// Order is unspecified: removals swap the last member into the hole.
    #[must_use]
    pub fn entities(&self) -> Vec<EntityId> {
        self.members.borrow().dense.clone()
    }

    /// Registers a listener.
    ///
    /// # Panics
    ///
    /// Panics if the listener is already registered or if called from a
    /// listener callback. Both are lifecycle bugs.
    pub fn register(&self, listener: ListenerHandle) {
        if let Err(err) = self.try_register(listener) {
            panic!("{err}");
        }
    }

    /// Registers a listener, reporting misuse as an error.
    ///
    /// # Errors
    ///
    /// See [`ListenerRegistry::register`].
    pub fn try_register(&self, listener: ListenerHandle) -> FilterResult<()> {
        self.listeners.register(listener)?;
        tracing::debug!(
            "listener registered on filter {:?} ({} total)",
            self.mask,
            self.listeners.len()
        );
        Ok(())
    }

    /// Unregisters a listener.
    ///
    /// # Panics
    ///
    /// Panics if the listener is not registered or if called from a
    /// listener callback.
    pub fn unregister(&self, listener: &ListenerHandle) {
        if let Err(err) = self.try_unregister(listener) {
            panic!("{err}");
        }
    }

    /// Unregisters a listener, reporting misuse as an error.
    ///
    /// # Errors
    ///
    /// See [`ListenerRegistry::unregister`].
    pub fn try_unregister(&self, listener: &ListenerHandle) -> FilterResult<()> {
        self.listeners.unregister(listener)?;
        tracing::debug!(
            "listener unregistered from filter {:?} ({} left)",
            self.mask,
            self.listeners.len()
        );
        Ok(())
    }

    /// Checks if `listener` is registered on this filter.
    #[must_use]
    pub fn is_registered(&self, listener: &ListenerHandle) -> bool {
        self.listeners.contains(listener)
    }

    /// Returns the number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Adds `entity` and notifies listeners. Seeding skips notification.
    pub(crate) fn insert(&self, entity: EntityId, notify: bool) {
        // The borrow ends before dispatch so listeners may query membership.
        let inserted = self.members.borrow_mut().insert(entity);
        if inserted && notify {
            self.listeners.dispatch(MembershipEvent::Added, entity);
        }
    }

    /// Removes `entity` and notifies listeners.
    pub(crate) fn remove(&self, entity: EntityId) {
        let removed = self.members.borrow_mut().remove(entity);
        if removed {
            self.listeners.dispatch(MembershipEvent::Removed, entity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::ComponentId;
    use std::cell::Cell;

    #[derive(Default)]
    struct Counter {
        added: Cell<u32>,
        removed: Cell<u32>,
    }

    impl FilterListener for Counter {
        fn on_entity_added(&self, _entity: EntityId) {
            self.added.set(self.added.get() + 1);
        }

        fn on_entity_removed(&self, _entity: EntityId) {
            self.removed.set(self.removed.get() + 1);
        }
    }

    #[test]
    fn test_filter_matches_superset() {
        let a = ComponentId::from_raw(0);
        let b = ComponentId::from_raw(1);
        let filter = Filter::new(ComponentMask::EMPTY.with(a));

        assert!(filter.matches(ComponentMask::EMPTY.with(a).with(b)));
        assert!(!filter.matches(ComponentMask::EMPTY.with(b)));
    }

    #[test]
    fn test_membership_notifies_once_per_transition() {
        let filter = Filter::new(ComponentMask::EMPTY);
        let counter = Rc::new(Counter::default());
        filter.register(counter.clone());

        let entity = EntityId::new(1, 1);
        filter.insert(entity, true);
        filter.insert(entity, true);
        assert_eq!(counter.added.get(), 1);
        assert!(filter.contains(entity));

        filter.remove(entity);
        filter.remove(entity);
        assert_eq!(counter.removed.get(), 1);
        assert!(filter.is_empty());
    }

    #[test]
    fn test_seeding_is_silent() {
        let filter = Filter::new(ComponentMask::EMPTY);
        let counter = Rc::new(Counter::default());
        filter.register(counter.clone());

        filter.insert(EntityId::new(0, 0), false);
        assert_eq!(counter.added.get(), 0);
        assert_eq!(filter.len(), 1);
    }

    #[test]
    fn test_swap_remove_keeps_index() {
        let filter = Filter::new(ComponentMask::EMPTY);
        let (a, b, c) = (EntityId::new(0, 0), EntityId::new(1, 0), EntityId::new(2, 0));
        for e in [a, b, c] {
            filter.insert(e, false);
        }

        filter.remove(a);
        assert!(filter.contains(b));
        assert!(filter.contains(c));
        filter.remove(c);
        assert_eq!(filter.entities(), vec![b]);
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn test_register_twice_panics() {
        let filter = Filter::new(ComponentMask::EMPTY);
        let counter: ListenerHandle = Rc::new(Counter::default());
        filter.register(Rc::clone(&counter));
        filter.register(counter);
    }
}
