// ============================================================================
// SYNC STATE - señales de sincronización para la UI
// ============================================================================

use crate::models::{ConnectionState, SyncStatus};
use crate::state::reactivity::ReactiveState;

/// Estado observable de sincronización
#[derive(Clone)]
pub struct SyncStateWrapper {
    status: ReactiveState<SyncStatus>,
}

impl SyncStateWrapper {
    pub fn new() -> Self {
        Self {
            status: ReactiveState::new(SyncStatus::default()),
        }
    }

    pub fn snapshot(&self) -> SyncStatus {
        self.status.get()
    }

    pub fn connection(&self) -> ConnectionState {
        self.status.with(|s| s.connection)
    }

    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&SyncStatus) + 'static,
    {
        self.status.subscribe(callback);
    }

    pub fn set_connection(&self, connection: ConnectionState) {
        self.status.update(|s| {
            let changed = s.connection != connection;
            s.connection = connection;
            changed
        });
    }

    /// Recalcula también el overlay `queued`
    pub fn set_pending_count(&self, count: usize) {
        self.status.update(|s| {
            let changed = s.pending_count != count;
            s.pending_count = count;
            s.queued = count > 0;
            changed
        });
    }

    pub fn set_last_drain_sent(&self, sent: usize) {
        self.status.update(|s| {
            let changed = s.last_drain_sent != sent;
            s.last_drain_sent = sent;
            changed
        });
    }

    pub fn set_product_count(&self, count: usize) {
        self.status.update(|s| {
            let changed = s.product_count != count;
            s.product_count = count;
            changed
        });
    }

    pub fn set_last_error(&self, error: Option<String>) {
        self.status.update(|s| {
            let changed = s.last_error != error;
            s.last_error = error;
            changed
        });
    }

    pub fn set_last_sync_attempt(&self, time: i64) {
        self.status.update(|s| {
            s.last_sync_attempt = Some(time);
            true
        });
    }
}

impl Default for SyncStateWrapper {
    fn default() -> Self {
        Self::new()
    }
}
