//! Nullable storage whose writes can be made to fail.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use kura_store::{MemoryStorage, Storage, StoreError};
use serde_json::{Map, Value};

/// In-memory storage that rejects writes while `fail_writes` is set, or
/// once a write budget is spent.
pub struct FailingStorage {
    inner: MemoryStorage,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
    budget: AtomicUsize,
}

impl Default for FailingStorage {
    fn default() -> Self {
        Self {
            inner: MemoryStorage::default(),
            fail_writes: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
            budget: AtomicUsize::new(usize::MAX),
        }
    }
}

impl FailingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Let `n` more writes through, then fail every one after.
    pub fn fail_after(&self, n: usize) {
        self.budget.store(self.writes() + n, Ordering::SeqCst);
    }

    fn rejects(&self) -> bool {
        self.fail_writes.load(Ordering::SeqCst)
            || self.writes() >= self.budget.load(Ordering::SeqCst)
    }

    /// Number of successful `set` calls.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Storage for FailingStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.inner.get(key).await
    }

    async fn set(&self, entries: Map<String, Value>) -> Result<(), StoreError> {
        if self.rejects() {
            return Err(StoreError::Backend("injected write failure".into()));
        }
        self.inner.set(entries).await?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected write failure".into()));
        }
        self.inner.clear().await
    }
}
