//! # System Scheduler
//!
//! Runs systems once per tick in a fixed order.
//!
//! ## Lifecycle
//!
//! ```text
//! add_system ──> initialize (once) ──> run, run, run ... ──> teardown (once)
//! ```
//!
//! - Systems run in the order they were added
//! - A system added after the first tick is initialized before its first run
//! - Teardown runs in reverse order and is idempotent
//! - Nothing runs after teardown

use crate::ecs::World;

/// A unit of per-tick logic.
pub trait System {
    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Called once before the first run.
    fn initialize(&mut self, _world: &mut World) {}

    /// Called once per tick.
    fn run(&mut self, world: &mut World);

    /// Called once when the scheduler is torn down.
    fn teardown(&mut self, _world: &mut World) {}
}

struct ScheduledSystem {
    system: Box<dyn System>,
    initialized: bool,
}

/// Fixed-order, single-threaded system scheduler.
///
/// # Example
///
/// ```rust,ignore
/// let mut scheduler = Scheduler::new();
/// scheduler.add_system(MovementSystem).add_system(DamageReactor::new());
///
/// loop {
///     scheduler.tick(&mut world);
/// }
/// ```
#[derive(Default)]
pub struct Scheduler {
    systems: Vec<ScheduledSystem>,
    tick_count: u64,
    torn_down: bool,
}

impl Scheduler {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a system to the run order.
    ///
    /// # Panics
    ///
    /// Panics if the scheduler was already torn down.
    pub fn add_system<S: System + 'static>(&mut self, system: S) -> &mut Self {
        assert!(!self.torn_down, "cannot add a system after teardown");
        self.systems.push(ScheduledSystem {
            system: Box::new(system),
            initialized: false,
        });
        self
    }

    /// Returns the number of scheduled systems.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Returns `true` if no system is scheduled.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Returns the number of completed ticks.
    #[inline]
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Returns `true` once [`Self::teardown`] has run.
    #[inline]
    #[must_use]
    pub const fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Initializes every system that has not been initialized yet.
    pub fn initialize(&mut self, world: &mut World) {
        if self.torn_down {
            return;
        }
        for scheduled in self.systems.iter_mut().filter(|s| !s.initialized) {
            tracing::debug!("initializing system {}", scheduled.system.name());
            scheduled.system.initialize(world);
            scheduled.initialized = true;
        }
    }

    /// Runs one tick: pending initializations, then every system in order.
    pub fn tick(&mut self, world: &mut World) {
        if self.torn_down {
            tracing::warn!("tick requested after teardown, ignoring");
            return;
        }

        self.initialize(world);
        tracing::trace!("tick {} ({} systems)", self.tick_count, self.systems.len());

        for scheduled in &mut self.systems {
            scheduled.system.run(world);
        }
        self.tick_count += 1;
    }

    /// Tears down every initialized system, last added first.
    pub fn teardown(&mut self, world: &mut World) {
        if self.torn_down {
            return;
        }
        for scheduled in self.systems.iter_mut().rev().filter(|s| s.initialized) {
            tracing::debug!("tearing down system {}", scheduled.system.name());
            scheduled.system.teardown(world);
            scheduled.initialized = false;
        }
        self.torn_down = true;
    }
}
