//! # Component System
//!
//! Components are pure data containers with no behavior.
//!
//! Unlike a compile-time id scheme, component ids are handed out at runtime
//! by a [`ComponentRegistry`] the first time a type is seen. Filters match
//! against a [`ComponentMask`] built from those ids, so one filter type
//! covers any combination of components.

use std::any::{type_name, TypeId};
use std::collections::HashMap;

/// Marker trait for ECS components.
///
/// Any `'static` type can be a component. Zero-sized types make good flags.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Clone, Copy, Debug, Default)]
/// struct Health(u32);
///
/// impl Component for Health {}
/// ```
pub trait Component: 'static {}

/// Runtime identifier of a component type (0-127).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ComponentId(u8);

impl ComponentId {
    /// Builds an id from its raw bit position.
    ///
    /// # Panics
    ///
    /// Panics if `raw` does not fit in a [`ComponentMask`].
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        assert!((raw as u32) < ComponentMask::BITS, "component id out of range");
        Self(raw)
    }

    /// Returns the bit position of this id.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }
}

/// Set of component types, one bit per [`ComponentId`].
///
/// A filter matches an entity when the entity's mask contains every bit of
/// the filter's mask.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ComponentMask(u128);

impl ComponentMask {
    /// Number of distinct component types a mask can hold.
    pub const BITS: u32 = u128::BITS;

    /// The mask with no components.
    pub const EMPTY: Self = Self(0);

    /// Returns a copy of this mask with `component` added.
    #[inline]
    #[must_use]
    pub const fn with(self, component: ComponentId) -> Self {
        Self(self.0 | (1u128 << component.0))
    }

    /// Adds a component to the mask.
    #[inline]
    pub fn insert(&mut self, component: ComponentId) {
        self.0 |= 1u128 << component.0;
    }

    /// Removes a component from the mask.
    #[inline]
    pub fn remove(&mut self, component: ComponentId) {
        self.0 &= !(1u128 << component.0);
    }

    /// Checks if the mask contains a component.
    #[inline]
    #[must_use]
    pub const fn contains(self, component: ComponentId) -> bool {
        (self.0 >> component.0) & 1 == 1
    }

    /// Checks if every component of `other` is also in this mask.
    #[inline]
    #[must_use]
    pub const fn contains_all(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if no component is set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns the number of components in the mask.
    #[inline]
    #[must_use]
    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    /// Iterates over the component ids in ascending order.
    pub fn iter(self) -> impl Iterator<Item = ComponentId> {
        let mut bits = self.0;
        std::iter::from_fn(move || {
            if bits == 0 {
                return None;
            }
            let bit = bits.trailing_zeros();
            bits &= bits - 1;
            Some(ComponentId(bit as u8))
        })
    }
}

impl FromIterator<ComponentId> for ComponentMask {
    fn from_iter<I: IntoIterator<Item = ComponentId>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

/// Assigns [`ComponentId`]s to component types on first use.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    ids: HashMap<TypeId, ComponentId>,
    names: Vec<&'static str>,
}

impl ComponentRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id for `C`, registering it if needed.
    ///
    /// # Panics
    ///
    /// Panics if more than [`ComponentMask::BITS`] component types are
    /// registered.
    pub fn id_of<C: Component>(&mut self) -> ComponentId {
        if let Some(&id) = self.ids.get(&TypeId::of::<C>()) {
            return id;
        }

        let next = self.names.len();
        assert!(
            next < ComponentMask::BITS as usize,
            "too many component types (max {})",
            ComponentMask::BITS
        );

        #[allow(clippy::cast_possible_truncation)]
        let id = ComponentId(next as u8);
        self.ids.insert(TypeId::of::<C>(), id);
        self.names.push(type_name::<C>());
        tracing::debug!("registered component {} as id {}", type_name::<C>(), next);
        id
    }

    /// Returns the id for `C` without registering it.
    #[inline]
    #[must_use]
    pub fn get<C: Component>(&self) -> Option<ComponentId> {
        self.ids.get(&TypeId::of::<C>()).copied()
    }

    /// Returns the type name a component id was registered with.
    #[must_use]
    pub fn name(&self, id: ComponentId) -> Option<&'static str> {
        self.names.get(id.0 as usize).copied()
    }

    /// Returns the number of registered component types.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if no component type is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
