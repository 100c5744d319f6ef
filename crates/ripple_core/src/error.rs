//! # Core Error Types
//!
//! Listener-registry misuse. These are lifecycle bugs in the caller, so the
//! plain `register`/`unregister` forms panic with these messages and only
//! the `try_*` forms hand them back.

use thiserror::Error;

use crate::ecs::ComponentMask;

/// Errors raised by a filter's listener registry.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterError {
    /// The listener is already registered on this filter.
    #[error("listener already registered on filter {mask:?}")]
    DuplicateListener {
        /// Mask of the filter.
        mask: ComponentMask,
    },

    /// The listener was never registered on this filter.
    #[error("listener not registered on filter {mask:?}")]
    ListenerNotRegistered {
        /// Mask of the filter.
        mask: ComponentMask,
    },

    /// Registration changed while the filter was dispatching an event.
    #[error("listener registry of filter {mask:?} modified during dispatch")]
    RegistryBusy {
        /// Mask of the filter.
        mask: ComponentMask,
    },
}

/// Result type for filter operations.
pub type FilterResult<T> = Result<T, FilterError>;
