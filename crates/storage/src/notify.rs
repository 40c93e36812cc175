//! Notifier registry and notification tokens.
//!
//! Every registered notifier remembers the last result it observed. The
//! store pump re-evaluates each notifier and hands the resulting change sets
//! to the callbacks once the store lock is released.

use crate::change_set::{ChangeSet, ObservedRow};
use crate::descriptor::DescriptorSet;
use crate::query::Query;
use core::sync::atomic::{AtomicBool, Ordering};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};

/// Unique identifier for a registered notifier.
pub type NotifierId = u64;

/// Callback invoked with the changes observed for one notifier.
pub type NotificationCallback = Arc<dyn Fn(&ChangeSet) + Send + Sync>;

/// A registered notifier.
pub(crate) struct Notifier {
    pub(crate) query: Query,
    pub(crate) descriptors: DescriptorSet,
    pub(crate) callback: NotificationCallback,
    /// Cleared when the notifier is cancelled, even mid-pass.
    pub(crate) active: Arc<AtomicBool>,
    /// Result observed at the last delivery; `None` until the first pass.
    pub(crate) observed: Option<Vec<ObservedRow>>,
    pub(crate) observed_version: u64,
}

/// Registered notifiers, in registration order.
pub(crate) struct NotifierRegistry {
    notifiers: BTreeMap<NotifierId, Notifier>,
    next_id: NotifierId,
}

impl NotifierRegistry {
    pub(crate) fn new() -> Self {
        Self {
            notifiers: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Registers a notifier and returns its id.
    pub(crate) fn register(
        &mut self,
        query: Query,
        descriptors: DescriptorSet,
        callback: NotificationCallback,
    ) -> NotifierId {
        let id = self.next_id;
        self.next_id += 1;
        self.notifiers.insert(
            id,
            Notifier {
                query,
                descriptors,
                callback,
                active: Arc::new(AtomicBool::new(true)),
                observed: None,
                observed_version: 0,
            },
        );
        id
    }

    /// Removes a notifier. Returns true if it was registered.
    pub(crate) fn unregister(&mut self, id: NotifierId) -> bool {
        match self.notifiers.remove(&id) {
            Some(notifier) => {
                notifier.active.store(false, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&NotifierId, &mut Notifier)> + '_ {
        self.notifiers.iter_mut()
    }

    pub(crate) fn len(&self) -> usize {
        self.notifiers.len()
    }
}

/// Handle to an active subscription.
///
/// Dropping the token cancels the subscription. A default token is inactive.
#[derive(Default)]
pub struct NotificationToken {
    inner: Option<(NotifierId, Weak<Mutex<NotifierRegistry>>)>,
}

impl NotificationToken {
    pub(crate) fn new(id: NotifierId, registry: &Arc<Mutex<NotifierRegistry>>) -> Self {
        Self {
            inner: Some((id, Arc::downgrade(registry))),
        }
    }

    /// Creates an inactive token.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the notifier id, if this token is active.
    pub fn id(&self) -> Option<NotifierId> {
        self.inner.as_ref().map(|(id, _)| *id)
    }

    /// Returns true if this token still holds a subscription.
    pub fn is_active(&self) -> bool {
        self.inner.is_some()
    }

    /// Cancels the subscription.
    ///
    /// Returns true if a registered notifier was removed. Calling it again,
    /// or on an inactive token, returns false.
    pub fn cancel(&mut self) -> bool {
        match self.inner.take() {
            Some((id, registry)) => match registry.upgrade() {
                Some(registry) => registry.lock().unregister(id),
                None => false,
            },
            None => false,
        }
    }
}

impl Drop for NotificationToken {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for NotificationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationToken")
            .field("id", &self.id())
            .finish()
    }
}
