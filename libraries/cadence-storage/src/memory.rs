//! In-memory session store

use async_trait::async_trait;
use cadence_core::{PersistenceGateway, Result, SessionSnapshot};
use std::sync::{Mutex, PoisonError};

/// Keeps the last saved snapshot in memory
///
/// Also counts saves, which tests use to check which operations persist.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    snapshot: Option<SessionSnapshot>,
    saves: usize,
}

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a snapshot, as if saved by an earlier session
    pub fn with_snapshot(snapshot: SessionSnapshot) -> Self {
        Self {
            inner: Mutex::new(MemoryInner {
                snapshot: Some(snapshot),
                saves: 0,
            }),
        }
    }

    /// Last saved snapshot
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.lock().snapshot.clone()
    }

    /// Number of `save` calls so far
    pub fn save_count(&self) -> usize {
        self.lock().saves
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl PersistenceGateway for MemoryStore {
    async fn load(&self) -> Result<Option<SessionSnapshot>> {
        Ok(self.lock().snapshot.clone())
    }

    async fn save(&self, snapshot: &SessionSnapshot) -> Result<()> {
        let mut inner = self.lock();
        inner.snapshot = Some(snapshot.clone());
        inner.saves += 1;
        Ok(())
    }
}
