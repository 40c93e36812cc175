//! The host runtime seam.
//!
//! Listeners live on the host side and are only reachable through weak
//! handles issued by a `HostRuntime`. The runtime decides what a stale
//! handle means; for `NativeRuntime` invoking it is a no-op.

use core::sync::atomic::{AtomicU64, Ordering};
use hashbrown::HashMap;
use parking_lot::Mutex;
use std::cell::RefCell;
use std::fmt;
use std::sync::{Arc, Weak};
use thiserror::Error;
use tracing::{trace, warn};

/// Opaque handle to a weakly referenced listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WeakHandle(u64);

impl WeakHandle {
    /// Returns the raw handle value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for WeakHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "weak#{}", self.0)
    }
}

/// Error raised by a listener while handling a notification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Listener failed: {message}")]
pub struct ListenerError {
    message: String,
}

impl ListenerError {
    /// Creates a listener error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A host-side object receiving change notifications.
pub trait ChangeListener: Send + Sync {
    /// Called when the observed result may have changed.
    ///
    /// `changes_empty` is true for notifications that carry no structural
    /// change, such as the initial notification after subscribing.
    fn on_change(&self, changes_empty: bool) -> Result<(), ListenerError>;
}

/// Weak-reference and callback services of the host runtime.
pub trait HostRuntime: Send + Sync {
    /// Creates a weak reference to `listener`.
    fn create_weak_reference(&self, listener: &Arc<dyn ChangeListener>) -> WeakHandle;

    /// Releases a weak reference.
    fn release_weak_reference(&self, handle: WeakHandle);

    /// Delivers a notification to the listener behind `handle`.
    fn invoke_callback(&self, handle: WeakHandle, changes_empty: bool);

    /// Returns true if the calling thread has an unhandled error pending.
    fn has_pending_error(&self) -> bool;

    /// Binds the calling thread to the runtime before it touches handles.
    fn attach_current_thread(&self) {}
}

thread_local! {
    static PENDING_ERROR: RefCell<Option<ListenerError>> = const { RefCell::new(None) };
}

/// In-process runtime holding listeners through `std::sync::Weak`.
///
/// A listener error is parked in a thread-local slot, as an unhandled
/// exception would be, until `take_pending_error` clears it.
pub struct NativeRuntime {
    references: Mutex<HashMap<WeakHandle, Weak<dyn ChangeListener>>>,
    next_handle: AtomicU64,
}

impl Default for NativeRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeRuntime {
    /// Creates a runtime with no references.
    pub fn new() -> Self {
        Self {
            references: Mutex::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
        }
    }

    /// Number of weak references created and not yet released.
    pub fn live_references(&self) -> usize {
        self.references.lock().len()
    }

    /// Takes the calling thread's pending error, clearing it.
    pub fn take_pending_error() -> Option<ListenerError> {
        PENDING_ERROR.with(|slot| slot.borrow_mut().take())
    }

    /// Parks `error` as the calling thread's pending error.
    pub fn raise(error: ListenerError) {
        PENDING_ERROR.with(|slot| *slot.borrow_mut() = Some(error));
    }
}

impl HostRuntime for NativeRuntime {
    fn create_weak_reference(&self, listener: &Arc<dyn ChangeListener>) -> WeakHandle {
        let handle = WeakHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.references
            .lock()
            .insert(handle, Arc::downgrade(listener));
        handle
    }

    fn release_weak_reference(&self, handle: WeakHandle) {
        if self.references.lock().remove(&handle).is_none() {
            warn!(%handle, "Released unknown weak reference");
        }
    }

    fn invoke_callback(&self, handle: WeakHandle, changes_empty: bool) {
        let listener = self
            .references
            .lock()
            .get(&handle)
            .and_then(Weak::upgrade);
        let Some(listener) = listener else {
            trace!(%handle, "Weak reference no longer resolves");
            return;
        };
        if let Err(err) = listener.on_change(changes_empty) {
            Self::raise(err);
        }
    }

    fn has_pending_error(&self) -> bool {
        PENDING_ERROR.with(|slot| slot.borrow().is_some())
    }
}
