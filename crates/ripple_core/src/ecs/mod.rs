//! # Entity Component System
//!
//! The host runtime the reactive layer sits on.
//!
//! ## Design Philosophy
//!
//! - Entity IDs are simple indices with generation counters
//! - Component ids are assigned at runtime, masks are bitsets
//! - Filters are maintained incrementally on every mask change
//! - Everything is single threaded; notifications are synchronous

mod component;
mod entity;
mod storage;
mod world;

pub use component::{Component, ComponentId, ComponentMask, ComponentRegistry};
pub use entity::{Entity, EntityId};
pub use storage::ComponentStorage;
pub use world::{FilterBuilder, World};
