//! In-memory history and snapshot store

use super::{HistoryStore, SnapshotStore};
use crate::app::models::{HistoricalDataset, LeaderSnapshot};
use crate::{Error, Result};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Inner {
    history: HistoricalDataset,
    snapshot: Option<LeaderSnapshot>,
    saves: usize,
}

/// Store keeping both primary artifacts in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    fail_loads: bool,
    fail_saves: bool,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with an existing history
    pub fn with_history(history: HistoricalDataset) -> Self {
        Self {
            inner: Mutex::new(Inner {
                history,
                ..Inner::default()
            }),
            ..Self::default()
        }
    }

    /// Make every load fail, as an unreadable history would
    pub fn failing_loads(mut self) -> Self {
        self.fail_loads = true;
        self
    }

    /// Make every save fail
    pub fn failing_saves(mut self) -> Self {
        self.fail_saves = true;
        self
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current history
    pub fn history(&self) -> HistoricalDataset {
        self.lock().history.clone()
    }

    /// Last saved snapshot
    pub fn snapshot(&self) -> Option<LeaderSnapshot> {
        self.lock().snapshot.clone()
    }

    /// Number of successful history saves
    pub fn save_count(&self) -> usize {
        self.lock().saves
    }
}

impl HistoryStore for MemoryStore {
    fn load(&self) -> Result<HistoricalDataset> {
        if self.fail_loads {
            return Err(Error::storage("memory", "history unavailable"));
        }
        Ok(self.history())
    }

    fn save(&self, dataset: &HistoricalDataset) -> Result<()> {
        if self.fail_saves {
            return Err(Error::storage("memory", "history rejected"));
        }
        let mut inner = self.lock();
        inner.history = dataset.clone();
        inner.saves += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

impl SnapshotStore for MemoryStore {
    fn save_snapshot(&self, snapshot: &LeaderSnapshot) -> Result<()> {
        if self.fail_saves {
            return Err(Error::storage("memory", "snapshot rejected"));
        }
        self.lock().snapshot = Some(snapshot.clone());
        Ok(())
    }
}
