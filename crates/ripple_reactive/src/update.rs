//! # Update Markers
//!
//! An "updated" event built from the two filter primitives.
//!
//! ## Flow
//!
//! ```text
//! mark_as_updated::<Health>(e)
//!   └─> attach Updated<Health>      (no-op if already attached)
//!         └─> filter [Updated<Health>] gains e
//!               └─> OnAdded capture -> buffer
//!
//! next tick, UpdateAdapter::process(batch)
//!   1. strip Updated<Health> from every e in batch
//!   2. U::process_updated(batch)
//! ```
//!
//! Filter membership is what is observed, not a call counter: marking the
//! same entity twice before the next run yields one notification. Because
//! the marker is stripped before user logic runs, a mark made later (even
//! from inside the handler) produces a fresh notification.

use std::fmt;
use std::marker::PhantomData;

use ripple_core::{Component, EntityId, FilterHandle, World};

use crate::buffer::ReactiveBatch;
use crate::config::ReactiveConfig;
use crate::system::{Reactive, ReactiveSystem, ReactiveType};

/// Payload-less marker meaning "this entity's `T` changed".
pub struct Updated<T: Component> {
    _marker: PhantomData<fn() -> T>,
}

impl<T: Component> Updated<T> {
    /// Creates the marker.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T: Component> Default for Updated<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Component> Clone for Updated<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Component> Copy for Updated<T> {}

impl<T: Component> fmt::Debug for Updated<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Updated<{}>", std::any::type_name::<T>())
    }
}

impl<T: Component> Component for Updated<T> {}

/// Flags `entity`'s `T` as updated.
///
/// # Returns
///
/// `true` if this call attached the marker and therefore queued a
/// notification; `false` if the entity was already marked or is dead.
pub fn mark_as_updated<T: Component>(world: &mut World, entity: EntityId) -> bool {
    if !world.is_alive(entity) {
        tracing::trace!("ignoring update mark on dead {}", entity);
        return false;
    }
    if world.has_component::<Updated<T>>(entity) {
        return false;
    }
    world.add_component(entity, Updated::<T>::new())
}

/// Checks if `entity` carries an unprocessed update marker for `T`.
#[must_use]
pub fn is_marked_updated<T: Component>(world: &World, entity: EntityId) -> bool {
    world.has_component::<Updated<T>>(entity)
}

/// Method-call form of the marker functions.
pub trait UpdateMarking {
    /// See [`mark_as_updated`].
    fn mark_updated<T: Component>(&mut self, entity: EntityId) -> bool;

    /// See [`is_marked_updated`].
    fn is_marked_updated<T: Component>(&self, entity: EntityId) -> bool;
}

impl UpdateMarking for World {
    fn mark_updated<T: Component>(&mut self, entity: EntityId) -> bool {
        mark_as_updated::<T>(self, entity)
    }

    fn is_marked_updated<T: Component>(&self, entity: EntityId) -> bool {
        is_marked_updated::<T>(self, entity)
    }
}

/// User logic reacting to `mark_as_updated::<Self::Component>`.
///
/// Only the batch callback is provided; the filter and reactive type are
/// fixed by [`UpdateAdapter`].
pub trait UpdateReactive {
    /// Component type whose updates are watched.
    type Component: Component;

    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Processes entities marked since the last run.
    ///
    /// Markers are already stripped when this is called. Ids may be stale.
    fn process_updated(&mut self, world: &mut World, batch: ReactiveBatch<'_>);
}

/// Wires an [`UpdateReactive`] to the marker filter.
pub struct UpdateAdapter<U: UpdateReactive> {
    inner: U,
}

impl<U: UpdateReactive> UpdateAdapter<U> {
    /// Wraps `inner`.
    #[must_use]
    pub const fn new(inner: U) -> Self {
        Self { inner }
    }

    /// Returns the wrapped logic.
    #[must_use]
    pub const fn inner(&self) -> &U {
        &self.inner
    }

    /// Returns the wrapped logic mutably.
    pub fn inner_mut(&mut self) -> &mut U {
        &mut self.inner
    }
}

impl<U: UpdateReactive> Reactive for UpdateAdapter<U> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn filter(&mut self, world: &mut World) -> FilterHandle {
        let mask = world.mask_of::<Updated<U::Component>>();
        world.filter(mask)
    }

    fn reactive_type(&self) -> ReactiveType {
        ReactiveType::OnAdded
    }

    fn process(&mut self, world: &mut World, batch: ReactiveBatch<'_>) {
        // The resulting remove events are not captured: this system only
        // watches adds.
        for entity in batch {
            world.remove_component::<Updated<U::Component>>(entity);
        }
        self.inner.process_updated(world, batch);
    }
}

/// Reactive system driven by update markers.
pub type UpdateReactiveSystem<U> = ReactiveSystem<UpdateAdapter<U>>;

impl<U: UpdateReactive> ReactiveSystem<UpdateAdapter<U>> {
    /// Builds an update-driven system with default settings.
    #[must_use]
    pub fn updates(inner: U) -> Self {
        Self::new(UpdateAdapter::new(inner))
    }

    /// Builds an update-driven system with the given settings.
    #[must_use]
    pub fn updates_with_config(inner: U, config: &ReactiveConfig) -> Self {
        Self::with_config(UpdateAdapter::new(inner), config)
    }
}
