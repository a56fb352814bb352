//! Gate module
//!
//! The multiple-reader / single-writer gate guarding ring membership.
//! Request forwarders read; the scaler, the quarantine loop, and admin
//! commands write. Backed by `tokio::sync::RwLock`, which is
//! write-preferring: a pending writer blocks new readers, so the rare
//! background writers are not starved by the request path. Readers never
//! upgrade; there is no recursive acquisition.

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Reader/writer gate over a shared value
#[derive(Debug, Default)]
pub struct Gate<T> {
    inner: RwLock<T>,
}

impl<T> Gate<T> {
    /// Create a gate around `value`
    pub fn new(value: T) -> Self {
        Self {
            inner: RwLock::new(value),
        }
    }

    /// Acquire the shared read side
    pub async fn read(&self) -> RwLockReadGuard<'_, T> {
        self.inner.read().await
    }

    /// Acquire the exclusive write side
    pub async fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.inner.write().await
    }
}
