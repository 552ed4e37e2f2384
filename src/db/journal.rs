//! Command journal abstraction.

use crate::domain::{JournalEntry, Timestamp};
use async_trait::async_trait;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use thiserror::Error;

/// Durable, ordered store of journal entries.
///
/// `append` must be durable before it returns `Ok`: the service commits the
/// in-memory change only afterwards.
#[async_trait]
pub trait Journal: Send + Sync + fmt::Debug {
    /// Append one entry and return its sequence number.
    async fn append(&self, entry: &JournalEntry, recorded_at: Timestamp)
        -> Result<u64, JournalError>;

    /// Every entry in append order.
    async fn load(&self) -> Result<Vec<JournalEntry>, JournalError>;

    async fn entry_count(&self) -> Result<u64, JournalError>;
}

#[derive(Debug, Error)]
pub enum JournalError {
    #[error(transparent)]
    Db(#[from] sqlx::Error),
    #[error("failed to encode journal entry: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to decode journal entry {seq}: {source}")]
    Decode {
        seq: i64,
        #[source]
        source: serde_json::Error,
    },
    #[error("journal unavailable: {0}")]
    Unavailable(String),
}

/// In-memory journal for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryJournal {
    entries: Mutex<Vec<JournalEntry>>,
    fail_appends: AtomicBool,
}

impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `append` fail until switched back.
    pub fn set_fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Journal for MemoryJournal {
    async fn append(
        &self,
        entry: &JournalEntry,
        _recorded_at: Timestamp,
    ) -> Result<u64, JournalError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(JournalError::Unavailable("appends disabled".to_string()));
        }
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| JournalError::Unavailable("lock poisoned".to_string()))?;
        entries.push(entry.clone());
        Ok(entries.len() as u64)
    }

    async fn load(&self) -> Result<Vec<JournalEntry>, JournalError> {
        self.entries
            .lock()
            .map(|e| e.clone())
            .map_err(|_| JournalError::Unavailable("lock poisoned".to_string()))
    }

    async fn entry_count(&self) -> Result<u64, JournalError> {
        Ok(self.len() as u64)
    }
}
