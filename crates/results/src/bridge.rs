//! Forwards store notifications to a host-side listener.

use crate::config::ResultsConfig;
use crate::runtime::{ChangeListener, HostRuntime, WeakHandle};
use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};
use vista_core::Result;
use vista_storage::{ChangeSet, DescriptorSet, NotificationCallback, NotificationToken, Query, Store};

/// Binds a collection's notification token to a weakly held listener.
///
/// The weak handle is created on the first `listen` and kept until the
/// bridge is dropped; stopping only cancels the token.
#[derive(Default)]
pub struct ListenerBridge {
    runtime: Option<Arc<dyn HostRuntime>>,
    handle: Option<WeakHandle>,
    token: NotificationToken,
}

impl ListenerBridge {
    /// Creates a bridge with no listener.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the weak handle, once one has been created.
    pub fn weak_handle(&self) -> Option<WeakHandle> {
        self.handle
    }

    /// Returns true while a subscription is active.
    pub fn is_listening(&self) -> bool {
        self.token.is_active()
    }

    /// Subscribes to changes of `query`, replacing any active subscription.
    ///
    /// Later calls reuse the runtime and weak handle of the first call. If
    /// registration fails the previous subscription stays active.
    #[allow(clippy::too_many_arguments)]
    pub fn listen(
        &mut self,
        store: &Store,
        query: &Query,
        descriptors: &DescriptorSet,
        runtime: &Arc<dyn HostRuntime>,
        listener: &Arc<dyn ChangeListener>,
        detached: &Arc<AtomicBool>,
        config: ResultsConfig,
    ) -> Result<()> {
        let runtime = self.runtime.get_or_insert_with(|| runtime.clone()).clone();
        let handle = match self.handle {
            Some(handle) => handle,
            None => {
                let handle = runtime.create_weak_reference(listener);
                self.handle = Some(handle);
                handle
            }
        };

        let callback = forwarder(runtime, handle, detached.clone(), config);
        let token = store.register_notification(query, descriptors, callback)?;
        let mut previous = std::mem::replace(&mut self.token, token);
        previous.cancel();
        debug!(%handle, table = query.table(), "Started listening");
        Ok(())
    }

    /// Cancels the active subscription. The weak handle is kept.
    pub fn stop(&mut self) -> bool {
        let cancelled = self.token.cancel();
        if cancelled {
            debug!("Stopped listening");
        }
        cancelled
    }
}

fn forwarder(
    runtime: Arc<dyn HostRuntime>,
    handle: WeakHandle,
    detached: Arc<AtomicBool>,
    config: ResultsConfig,
) -> NotificationCallback {
    Arc::new(move |changes: &ChangeSet| {
        if runtime.has_pending_error() {
            trace!(%handle, "Pending error, skipping notification");
            return;
        }
        if !config.notify_while_detached() && detached.load(Ordering::SeqCst) {
            trace!(%handle, "Collection detached, skipping notification");
            return;
        }
        runtime.invoke_callback(handle, changes.is_empty());
    })
}

impl Drop for ListenerBridge {
    fn drop(&mut self) {
        self.token.cancel();
        if let (Some(runtime), Some(handle)) = (self.runtime.as_ref(), self.handle.take()) {
            runtime.attach_current_thread();
            runtime.release_weak_reference(handle);
        }
    }
}
