//! # Listener Registry
//!
//! Ordered fan-out of membership events to registered listeners.
//!
//! ## Dispatch Rules
//!
//! - Listeners are invoked synchronously, in registration order
//! - The same order is used for add and remove events
//! - Removal shifts later listeners left, so order never changes
//! - A listener may not be registered twice
//!
//! ## Mutation During Dispatch
//!
//! The registry refuses to change while an event is being dispatched.
//! `register`/`unregister` called from inside a callback fail with
//! [`FilterError::RegistryBusy`] instead of mutating the list being walked.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::ecs::{ComponentMask, EntityId};
use crate::error::{FilterError, FilterResult};

/// Receiver of filter membership events.
///
/// Callbacks run on the caller's stack while the membership change is in
/// progress, so they must not touch the world. Implementors typically push
/// the id into a buffer behind a `RefCell`.
pub trait FilterListener {
    /// Called after `entity` entered the filter.
    fn on_entity_added(&self, entity: EntityId);

    /// Called after `entity` left the filter.
    fn on_entity_removed(&self, entity: EntityId);
}

/// Shared handle to a listener. Identity is the pointed-to allocation.
pub type ListenerHandle = Rc<dyn FilterListener>;

/// Membership event kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MembershipEvent {
    /// Entity entered the filter.
    Added,
    /// Entity left the filter.
    Removed,
}

#[inline]
fn same_listener(a: &ListenerHandle, b: &ListenerHandle) -> bool {
    Rc::as_ptr(a).cast::<()>() == Rc::as_ptr(b).cast::<()>()
}

/// Ordered list of listeners owned by one filter.
pub struct ListenerRegistry {
    /// Mask of the owning filter, for error reporting.
    owner: ComponentMask,
    listeners: RefCell<Vec<ListenerHandle>>,
    /// Number of dispatches currently on the stack.
    dispatch_depth: Cell<u32>,
}

impl ListenerRegistry {
    /// Creates an empty registry for the filter with mask `owner`.
    #[must_use]
    pub fn new(owner: ComponentMask) -> Self {
        Self {
            owner,
            listeners: RefCell::new(Vec::with_capacity(4)),
            dispatch_depth: Cell::new(0),
        }
    }

    /// Returns the number of registered listeners.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Returns `true` if no listener is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }

    /// Returns `true` while an event is being dispatched.
    #[inline]
    #[must_use]
    pub fn is_dispatching(&self) -> bool {
        self.dispatch_depth.get() > 0
    }

    /// Checks if `listener` is registered.
    #[must_use]
    pub fn contains(&self, listener: &ListenerHandle) -> bool {
        self.listeners
            .borrow()
            .iter()
            .any(|registered| same_listener(registered, listener))
    }

    /// Appends a listener to the dispatch order.
    ///
    /// # Errors
    ///
    /// - [`FilterError::DuplicateListener`] if already registered
    /// - [`FilterError::RegistryBusy`] if called during dispatch
    pub fn register(&self, listener: ListenerHandle) -> FilterResult<()> {
        if self.is_dispatching() {
            return Err(FilterError::RegistryBusy { mask: self.owner });
        }
        if self.contains(&listener) {
            return Err(FilterError::DuplicateListener { mask: self.owner });
        }

        self.listeners.borrow_mut().push(listener);
        Ok(())
    }

    /// Removes a listener, keeping the order of the others.
    ///
    /// # Errors
    ///
    /// - [`FilterError::ListenerNotRegistered`] if it was never registered
    /// - [`FilterError::RegistryBusy`] if called during dispatch
    pub fn unregister(&self, listener: &ListenerHandle) -> FilterResult<()> {
        if self.is_dispatching() {
            return Err(FilterError::RegistryBusy { mask: self.owner });
        }

        let mut listeners = self.listeners.borrow_mut();
        let position = listeners
            .iter()
            .position(|registered| same_listener(registered, listener))
            .ok_or(FilterError::ListenerNotRegistered { mask: self.owner })?;

        // Vec::remove shifts the tail left: dispatch order is preserved.
        listeners.remove(position);
        Ok(())
    }

    /// Invokes every listener for `event`, in registration order.
    pub fn dispatch(&self, event: MembershipEvent, entity: EntityId) {
        let _guard = DispatchGuard::enter(&self.dispatch_depth);
        let listeners = self.listeners.borrow();

        for listener in listeners.iter() {
            match event {
                MembershipEvent::Added => listener.on_entity_added(entity),
                MembershipEvent::Removed => listener.on_entity_removed(entity),
            }
        }
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("owner", &self.owner)
            .field("listeners", &self.len())
            .field("dispatch_depth", &self.dispatch_depth.get())
            .finish()
    }
}

/// Keeps the dispatch depth balanced even if a listener panics.
struct DispatchGuard<'a> {
    depth: &'a Cell<u32>,
}

impl<'a> DispatchGuard<'a> {
    fn enter(depth: &'a Cell<u32>) -> Self {
        depth.set(depth.get() + 1);
        Self { depth }
    }
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get() - 1);
    }
}
