//! # Reactive Systems
//!
//! Turns synchronous filter callbacks into one batch per tick.
//!
//! ## State Machine
//!
//! ```text
//!                 initialize                    teardown
//! Uninitialized ─────────────> Active ──────────────────> TornDown
//!                  (register     │ ▲     (unregister,
//!                   listener)    │ │      discard buffers)
//!                                └─┘
//!                   run: buffer non-empty? -> process(batch) once, clear
//! ```
//!
//! ## Capture
//!
//! The filter calls the system's listener while a membership change is in
//! progress. The listener appends the id to the live buffer if the event
//! kind matches the system's [`ReactiveType`], and does nothing else.
//!
//! ## Processing
//!
//! On run, the live buffer is swapped with a spare one and the spare is
//! handed to [`Reactive::process`]. Events raised while the batch runs
//! (the handler changing the world) land in the spare, which is now live.
//! Afterwards the processed buffer is cleared, those ids are moved into it,
//! and it becomes live again, so they are delivered next tick and the live
//! buffer never loses capacity it has grown to.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use ripple_core::{EntityId, FilterHandle, FilterListener, ListenerHandle, System, World};

use crate::buffer::{ReactiveBatch, ReactiveBuffer};
use crate::config::ReactiveConfig;

/// Which membership event a reactive system captures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReactiveType {
    /// Entity entered the watched filter.
    OnAdded,
    /// Entity left the watched filter.
    OnRemoved,
}

/// Lifecycle state of a [`ReactiveSystem`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReactiveState {
    /// Constructed, not yet registered with a filter.
    Uninitialized,
    /// Registered and capturing events.
    Active,
    /// Unregistered; will never run again.
    TornDown,
}

/// Counters for one reactive system.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReactiveStats {
    /// Batches handed to [`Reactive::process`].
    pub batches_processed: u64,
    /// Total ids across those batches.
    pub entities_delivered: u64,
    /// Events appended to the buffer.
    pub events_captured: u64,
    /// Events dropped because their kind did not match.
    pub events_ignored: u64,
}

/// User logic of a reactive system.
///
/// # Example
///
/// ```rust,ignore
/// struct OnSpawned;
///
/// impl Reactive for OnSpawned {
///     fn filter(&mut self, world: &mut World) -> FilterHandle {
///         world.filter_builder().with::<Health>().build()
///     }
///
///     fn reactive_type(&self) -> ReactiveType {
///         ReactiveType::OnAdded
///     }
///
///     fn process(&mut self, world: &mut World, batch: ReactiveBatch<'_>) {
///         for entity in batch {
///             if let Some(health) = world.get_mut::<Health>(entity) {
///                 health.0 = 100;
///             }
///         }
///     }
/// }
/// ```
pub trait Reactive {
    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Returns the filter to watch. Called once, on initialize.
    fn filter(&mut self, world: &mut World) -> FilterHandle;

    /// Returns the event kind to capture. Read once, at construction.
    fn reactive_type(&self) -> ReactiveType;

    /// Processes one non-empty batch.
    ///
    /// Ids may be stale: check liveness before touching entity state.
    fn process(&mut self, world: &mut World, batch: ReactiveBatch<'_>);
}

/// Listener half of a reactive system, shared with the filter.
struct Capture {
    reactive_type: ReactiveType,
    buffer: RefCell<ReactiveBuffer>,
    captured: Cell<u64>,
    ignored: Cell<u64>,
}

impl Capture {
    #[inline]
    fn capture(&self, kind: ReactiveType, entity: EntityId) {
        if kind == self.reactive_type {
            self.buffer.borrow_mut().push(entity);
            self.captured.set(self.captured.get() + 1);
        } else {
            self.ignored.set(self.ignored.get() + 1);
        }
    }
}

impl FilterListener for Capture {
    fn on_entity_added(&self, entity: EntityId) {
        self.capture(ReactiveType::OnAdded, entity);
    }

    fn on_entity_removed(&self, entity: EntityId) {
        self.capture(ReactiveType::OnRemoved, entity);
    }
}

/// Scheduler-facing wrapper that buffers filter events for a [`Reactive`].
pub struct ReactiveSystem<R: Reactive> {
    reactive: R,
    capture: Rc<Capture>,
    /// Buffer being processed; swapped with the live one on each run.
    spare: ReactiveBuffer,
    filter: Option<FilterHandle>,
    state: ReactiveState,
    batches_processed: u64,
    entities_delivered: u64,
    large_batch_warning: Option<usize>,
}

impl<R: Reactive> ReactiveSystem<R> {
    /// Wraps `reactive` with default settings.
    #[must_use]
    pub fn new(reactive: R) -> Self {
        Self::with_config(reactive, &ReactiveConfig::default())
    }

    /// Wraps `reactive` with the given settings.
    ///
    /// # Panics
    ///
    /// Panics if `config.initial_buffer_capacity` is zero.
    #[must_use]
    pub fn with_config(reactive: R, config: &ReactiveConfig) -> Self {
        let capacity = config.initial_buffer_capacity;
        let capture = Capture {
            reactive_type: reactive.reactive_type(),
            buffer: RefCell::new(ReactiveBuffer::with_capacity(capacity)),
            captured: Cell::new(0),
            ignored: Cell::new(0),
        };

        Self {
            reactive,
            capture: Rc::new(capture),
            spare: ReactiveBuffer::with_capacity(capacity),
            filter: None,
            state: ReactiveState::Uninitialized,
            batches_processed: 0,
            entities_delivered: 0,
            large_batch_warning: config.large_batch_warning,
        }
    }

    /// Returns the lifecycle state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> ReactiveState {
        self.state
    }

    /// Returns the captured event kind.
    #[inline]
    #[must_use]
    pub fn reactive_type(&self) -> ReactiveType {
        self.capture.reactive_type
    }

    /// Returns the number of ids waiting for the next run.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.capture.buffer.borrow().len()
    }

    /// Returns the capacity of the live buffer.
    #[must_use]
    pub fn buffer_capacity(&self) -> usize {
        self.capture.buffer.borrow().capacity()
    }

    /// Returns a copy of the ids waiting for the next run.
    #[must_use]
    pub fn pending(&self) -> Vec<EntityId> {
        self.capture.buffer.borrow().batch().iter().collect()
    }

    /// Returns the watched filter once initialized.
    #[must_use]
    pub const fn filter(&self) -> Option<&FilterHandle> {
        self.filter.as_ref()
    }

    /// Returns the handle this system registers on its filter.
    ///
    /// Unregistering it by hand is tolerated: teardown then only logs.
    #[must_use]
    pub fn listener(&self) -> ListenerHandle {
        Rc::clone(&self.capture) as ListenerHandle
    }

    /// Returns the wrapped user logic.
    #[must_use]
    pub const fn reactive(&self) -> &R {
        &self.reactive
    }

    /// Returns the wrapped user logic mutably.
    pub fn reactive_mut(&mut self) -> &mut R {
        &mut self.reactive
    }

    /// Returns the counters.
    #[must_use]
    pub fn stats(&self) -> ReactiveStats {
        ReactiveStats {
            batches_processed: self.batches_processed,
            entities_delivered: self.entities_delivered,
            events_captured: self.capture.captured.get(),
            events_ignored: self.capture.ignored.get(),
        }
    }
}

impl<R: Reactive> System for ReactiveSystem<R> {
    fn name(&self) -> &str {
        self.reactive.name()
    }

    /// Resolves the filter and registers the listener.
    ///
    /// # Panics
    ///
    /// Panics if the listener is already registered on the filter (for
    /// example when initialized twice), or after teardown.
    fn initialize(&mut self, world: &mut World) {
        assert!(
            self.state != ReactiveState::TornDown,
            "reactive system {} initialized after teardown",
            self.reactive.name()
        );

        let filter = self.reactive.filter(world);
        filter.register(self.listener());
        tracing::debug!(
            "reactive system {} watching {:?} for {:?}",
            self.reactive.name(),
            filter.mask(),
            self.capture.reactive_type
        );

        self.filter = Some(filter);
        self.state = ReactiveState::Active;
    }

    fn run(&mut self, world: &mut World) {
        if self.state != ReactiveState::Active {
            return;
        }

        {
            let mut live = self.capture.buffer.borrow_mut();
            if live.is_empty() {
                return;
            }
            std::mem::swap(&mut *live, &mut self.spare);
        }

        let len = self.spare.len();
        if self.large_batch_warning.is_some_and(|limit| len > limit) {
            tracing::warn!(
                "reactive system {} processing {} entities in one batch",
                self.reactive.name(),
                len
            );
        }
        tracing::trace!("reactive system {} processing {} entities", self.reactive.name(), len);

        self.reactive.process(world, self.spare.batch());
        self.spare.clear();

        // Keep the grown buffer live; ids raised by the batch move into it.
        {
            let mut live = self.capture.buffer.borrow_mut();
            self.spare.append(&mut *live);
            std::mem::swap(&mut *live, &mut self.spare);
        }

        self.batches_processed += 1;
        self.entities_delivered += len as u64;
    }

    fn teardown(&mut self, _world: &mut World) {
        if let Some(filter) = self.filter.take() {
            if let Err(err) = filter.try_unregister(&self.listener()) {
                tracing::warn!("reactive system {} teardown: {}", self.reactive.name(), err);
            }
        }
        self.capture.buffer.borrow_mut().discard();
        self.spare.discard();

        tracing::debug!(
            "reactive system {} torn down after {} batches",
            self.reactive.name(),
            self.batches_processed
        );
        self.state = ReactiveState::TornDown;
    }
}

impl<R: Reactive> Drop for ReactiveSystem<R> {
    fn drop(&mut self) {
        // Dropped without teardown: stop the filter feeding a dead buffer.
        if let Some(filter) = self.filter.take() {
            if filter.try_unregister(&self.listener()).is_err() {
                tracing::warn!(
                    "reactive system {} could not unregister on drop",
                    self.reactive.name()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripple_core::Component;

    struct Tag;
    impl Component for Tag {}

    /// Records every batch it receives.
    struct Recorder {
        reactive_type: ReactiveType,
        batches: Vec<Vec<EntityId>>,
    }

    impl Recorder {
        fn new(reactive_type: ReactiveType) -> Self {
            Self {
                reactive_type,
                batches: Vec::new(),
            }
        }
    }

    impl Reactive for Recorder {
        fn filter(&mut self, world: &mut World) -> FilterHandle {
            world.filter_builder().with::<Tag>().build()
        }

        fn reactive_type(&self) -> ReactiveType {
            self.reactive_type
        }

        fn process(&mut self, _world: &mut World, batch: ReactiveBatch<'_>) {
            self.batches.push(batch.iter().collect());
        }
    }

    #[test]
    fn test_lifecycle_states() {
        let mut world = World::new();
        let mut system = ReactiveSystem::new(Recorder::new(ReactiveType::OnAdded));
        assert_eq!(system.state(), ReactiveState::Uninitialized);

        system.initialize(&mut world);
        assert_eq!(system.state(), ReactiveState::Active);
        let filter = system.filter().cloned().unwrap();
        assert!(filter.is_registered(&system.listener()));

        system.teardown(&mut world);
        assert_eq!(system.state(), ReactiveState::TornDown);
        assert_eq!(filter.listener_count(), 0);
    }

    #[test]
    fn test_uninitialized_system_captures_nothing() {
        let mut world = World::new();
        let mut system = ReactiveSystem::new(Recorder::new(ReactiveType::OnAdded));

        let e = world.spawn();
        world.add_component(e, Tag);
        system.run(&mut world);

        assert!(system.reactive().batches.is_empty());
        assert_eq!(system.buffered_len(), 0);
    }

    #[test]
    fn test_process_once_then_clear() {
        let mut world = World::new();
        let mut system = ReactiveSystem::new(Recorder::new(ReactiveType::OnAdded));
        system.initialize(&mut world);

        let a = world.spawn();
        let b = world.spawn();
        world.add_component(a, Tag);
        world.add_component(b, Tag);
        assert_eq!(system.pending(), vec![a, b]);

        system.run(&mut world);
        system.run(&mut world);

        assert_eq!(system.reactive().batches, vec![vec![a, b]]);
        assert_eq!(system.buffered_len(), 0);
        let stats = system.stats();
        assert_eq!(stats.batches_processed, 1);
        assert_eq!(stats.entities_delivered, 2);
    }

    #[test]
    fn test_mismatched_events_ignored() {
        let mut world = World::new();
        let mut system = ReactiveSystem::new(Recorder::new(ReactiveType::OnRemoved));
        system.initialize(&mut world);

        let e = world.spawn();
        world.add_component(e, Tag);
        assert_eq!(system.buffered_len(), 0);

        world.remove_component::<Tag>(e);
        assert_eq!(system.pending(), vec![e]);
        assert_eq!(system.stats().events_ignored, 1);
        assert_eq!(system.stats().events_captured, 1);
    }

    #[test]
    fn test_drop_unregisters() {
        let mut world = World::new();
        let filter = {
            let mut system = ReactiveSystem::new(Recorder::new(ReactiveType::OnAdded));
            system.initialize(&mut world);
            let filter = system.filter().cloned().unwrap();
            assert_eq!(filter.listener_count(), 1);
            filter
        };
        assert_eq!(filter.listener_count(), 0);
    }

    #[test]
    fn test_live_buffer_keeps_grown_capacity() {
        let mut world = World::new();
        let mut system = ReactiveSystem::new(Recorder::new(ReactiveType::OnAdded));
        system.initialize(&mut world);

        for _ in 0..33 {
            let e = world.spawn();
            world.add_component(e, Tag);
        }
        let grown = system.buffer_capacity();
        assert!(grown >= 64);

        for _ in 0..3 {
            system.run(&mut world);
            assert_eq!(system.buffered_len(), 0);
            assert_eq!(system.buffer_capacity(), grown);
        }
    }

    #[test]
    fn test_teardown_after_external_unregister() {
        let mut world = World::new();
        let mut system = ReactiveSystem::new(Recorder::new(ReactiveType::OnAdded));
        system.initialize(&mut world);
        let filter = system.filter().cloned().unwrap();

        filter.unregister(&system.listener());
        system.teardown(&mut world);

        assert_eq!(system.state(), ReactiveState::TornDown);
        assert_eq!(filter.listener_count(), 0);
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn test_double_initialize_panics() {
        let mut world = World::new();
        let mut system = ReactiveSystem::new(Recorder::new(ReactiveType::OnAdded));
        system.initialize(&mut world);
        system.initialize(&mut world);
    }
}
