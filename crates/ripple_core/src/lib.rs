//! # RIPPLE Core
//!
//! Minimal single-threaded ECS host for the reactive layer:
//! - Generational entity ids
//! - Runtime component ids and bitset masks
//! - Live filters that notify listeners synchronously, in registration order
//! - A fixed-order scheduler with initialize / run / teardown hooks
//!
//! ## Example
//!
//! ```rust,ignore
//! use ripple_core::{World, Scheduler};
//!
//! let mut world = World::new();
//! let mut scheduler = Scheduler::new();
//! scheduler.add_system(MySystem::default());
//! scheduler.tick(&mut world);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod ecs;
pub mod error;
pub mod filter;
pub mod schedule;

pub use ecs::{
    Component, ComponentId, ComponentMask, ComponentRegistry, ComponentStorage, Entity, EntityId,
    FilterBuilder, World,
};
pub use error::{FilterError, FilterResult};
pub use filter::{
    Filter, FilterHandle, FilterListener, ListenerHandle, ListenerRegistry, MembershipEvent,
};
pub use schedule::{Scheduler, System};
