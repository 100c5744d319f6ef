//! # Reactive Buffer
//!
//! Per-system store of the entity ids captured during the current tick.
//!
//! ## Growth Policy
//!
//! ```text
//! capacity: 32 ──(33rd push)──> 64 ──(65th push)──> 128 ...
//! clear():  len = 0, capacity unchanged
//! ```
//!
//! Capacity doubles when full and is never given back while the system is
//! active, so a steady per-tick load stops allocating after warm-up.

use ripple_core::EntityId;

/// Starting capacity of a reactive buffer.
pub const DEFAULT_BUFFER_CAPACITY: usize = 32;

/// Growable, insertion-ordered list of entity ids.
///
/// Duplicates are kept: every captured event is one entry.
#[derive(Debug, Clone)]
pub struct ReactiveBuffer {
    entities: Vec<EntityId>,
}

impl ReactiveBuffer {
    /// Creates a buffer with [`DEFAULT_BUFFER_CAPACITY`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_CAPACITY)
    }

    /// Creates a buffer with the given starting capacity.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");
        Self {
            entities: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of buffered ids.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if nothing is buffered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Returns the allocated capacity.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entities.capacity()
    }

    /// Appends an id, doubling capacity first if the buffer is full.
    #[inline]
    pub fn push(&mut self, entity: EntityId) {
        if self.entities.len() == self.entities.capacity() {
            let grow_by = self.entities.capacity().max(1);
            self.entities.reserve_exact(grow_by);
        }
        self.entities.push(entity);
    }

    /// Moves every id out of `other` onto the end of this buffer, keeping
    /// arrival order. `other` is left empty with its capacity intact.
    pub fn append(&mut self, other: &mut ReactiveBuffer) {
        for entity in other.entities.drain(..) {
            self.push(entity);
        }
    }

    /// Resets the length to zero. Capacity is kept.
    #[inline]
    pub fn clear(&mut self) {
        self.entities.clear();
    }

    /// Drops the contents and the allocation.
    pub fn discard(&mut self) {
        self.entities = Vec::new();
    }

    /// Returns a read-only view of the buffered ids.
    #[inline]
    #[must_use]
    pub fn batch(&self) -> ReactiveBatch<'_> {
        ReactiveBatch {
            entities: &self.entities,
        }
    }
}

impl Default for ReactiveBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of one batch of captured entity ids.
///
/// Valid only for the duration of the batch callback. Ids appear in event
/// arrival order. They are snapshots of past events: an entity may have
/// been despawned, or lost the watched component, since it was captured.
/// Check with the world before dereferencing.
///
/// Traversal can be restarted any number of times with [`Self::iter`].
#[derive(Clone, Copy, Debug)]
pub struct ReactiveBatch<'a> {
    entities: &'a [EntityId],
}

impl<'a> ReactiveBatch<'a> {
    /// Returns the number of ids in the batch.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if the batch is empty.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterates over the ids in arrival order.
    #[inline]
    pub fn iter(&self) -> std::iter::Copied<std::slice::Iter<'a, EntityId>> {
        self.entities.iter().copied()
    }

    /// Checks if `entity` was captured at least once.
    #[must_use]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.entities.contains(&entity)
    }
}

impl<'a> IntoIterator for ReactiveBatch<'a> {
    type Item = EntityId;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, EntityId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.iter().copied()
    }
}

impl<'a> IntoIterator for &ReactiveBatch<'a> {
    type Item = EntityId;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, EntityId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
