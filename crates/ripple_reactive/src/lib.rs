//! # RIPPLE Reactive
//!
//! Per-tick batching of filter membership events.
//!
//! ## Pipeline
//!
//! ```text
//! world mutation ─> filter membership change ─> listener fan-out
//!                                                   │
//!                                   ReactiveSystem buffer (append)
//!                                                   │
//! scheduler tick ─> ReactiveSystem::run ─> process(batch) once ─> clear
//! ```
//!
//! ## Rules
//!
//! 1. **At most once per tick** - a system's batch runs once, and only if
//!    something was captured
//! 2. **Arrival order** - ids are delivered in the order events fired
//! 3. **Type isolation** - `OnAdded` systems never see removals and vice
//!    versa
//! 4. **Stale ids** - a batch is a record of past events; check liveness
//!
//! ## Example
//!
//! ```rust,ignore
//! use ripple_reactive::{ReactiveSystem, UpdateReactiveSystem, UpdateMarking};
//!
//! scheduler
//!     .add_system(ReactiveSystem::new(OnSpawned))
//!     .add_system(UpdateReactiveSystem::updates(HealthChanged::default()));
//!
//! world.mark_updated::<Health>(player);
//! scheduler.tick(&mut world); // HealthChanged sees [player] once
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod buffer;
pub mod config;
pub mod error;
pub mod system;
pub mod update;

pub use buffer::{ReactiveBatch, ReactiveBuffer, DEFAULT_BUFFER_CAPACITY};
pub use config::ReactiveConfig;
pub use error::{ConfigError, ConfigResult};
pub use system::{Reactive, ReactiveState, ReactiveStats, ReactiveSystem, ReactiveType};
pub use update::{
    is_marked_updated, mark_as_updated, UpdateAdapter, UpdateMarking, UpdateReactive,
    UpdateReactiveSystem, Updated,
};
