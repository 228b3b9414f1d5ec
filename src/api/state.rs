//! API shared state

use std::sync::Arc;

use crate::actors::PollerHandle;
use crate::storage::TelemetryStore;

/// Shared state passed to all API handlers
#[derive(Clone)]
pub struct ApiState {
    /// Store the poller writes to
    pub store: Arc<dyn TelemetryStore>,

    /// Poller handle for statistics; absent when the API serves a store
    /// nobody is polling into
    pub poller: Option<PollerHandle>,
}

impl ApiState {
    pub fn new(store: Arc<dyn TelemetryStore>) -> Self {
        Self {
            store,
            poller: None,
        }
    }

    pub fn with_poller(mut self, poller: PollerHandle) -> Self {
        self.poller = Some(poller);
        self
    }
}
