//! Configuration for result collections.

/// Options applied to a `Results` collection and its listener bridge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResultsConfig {
    notify_while_detached: bool,
}

impl Default for ResultsConfig {
    fn default() -> Self {
        Self {
            notify_while_detached: true,
        }
    }
}

impl ResultsConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether listeners are notified while the collection is in
    /// snapshot mode.
    pub fn with_notify_while_detached(mut self, notify: bool) -> Self {
        self.notify_while_detached = notify;
        self
    }

    /// Returns whether listeners are notified while detached.
    pub fn notify_while_detached(&self) -> bool {
        self.notify_while_detached
    }
}
