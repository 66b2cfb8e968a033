use crate::store::FeedbackStore;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use vitrine_core::{Error, FeedbackId, FeedbackRow, Result, StoredFeedback};

/// In-process store. Useful for tests and demos; can simulate an outage.
#[derive(Default)]
pub struct MemoryFeedbackStore {
    rows: RwLock<Vec<StoredFeedback>>,
    next_id: AtomicI64,
    insert_calls: AtomicUsize,
    unavailable: AtomicBool,
}

impl MemoryFeedbackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with a transport error while `true`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Release);
    }

    /// Insert attempts seen, including failed ones
    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::Acquire) {
            Err(Error::Transport("feedback store unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl FeedbackStore for MemoryFeedbackStore {
    async fn insert(&self, row: &FeedbackRow) -> Result<()> {
        self.insert_calls.fetch_add(1, Ordering::AcqRel);
        self.check_available()?;

        let id = self.next_id.fetch_add(1, Ordering::AcqRel) + 1;
        self.rows.write().push(StoredFeedback {
            id: Some(FeedbackId::Integer(id)),
            created_at: Some(Utc::now().to_rfc3339()),
            row: row.clone(),
        });
        Ok(())
    }

    async fn select_all(&self) -> Result<Vec<StoredFeedback>> {
        self.check_available()?;
        Ok(self.rows.read().clone())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
