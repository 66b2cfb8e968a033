use async_trait::async_trait;
use vitrine_core::{FeedbackRow, Result, StoredFeedback};

/// Append-only feedback persistence.
///
/// The recorder only needs these two operations, so a backend is swappable
/// without touching the presentation layer. Implementations must not retry:
/// a failed call is reported once and the caller decides what to show.
#[async_trait]
pub trait FeedbackStore: Send + Sync {
    /// Append one row in a single call.
    async fn insert(&self, row: &FeedbackRow) -> Result<()>;

    /// Every row currently in the store. An empty store is `Ok(vec![])`.
    async fn select_all(&self) -> Result<Vec<StoredFeedback>>;

    /// Short backend name for logs
    fn backend(&self) -> &'static str;
}
