use crate::export::{export_filename, render_csv, FeedbackExport};
use crate::store::FeedbackStore;
use std::sync::Arc;
use vitrine_core::{FeedbackEntry, Rating, Result, StoredFeedback};

/// Validates submissions and talks to the feedback store.
///
/// Each operation is exactly one store call. Failures are returned to the
/// caller as-is: no retry, no queue.
pub struct FeedbackRecorder {
    store: Arc<dyn FeedbackStore>,
    domain: String,
}

impl FeedbackRecorder {
    pub fn new(store: Arc<dyn FeedbackStore>, domain: impl Into<String>) -> Self {
        Self {
            store,
            domain: domain.into(),
        }
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    pub fn export_filename(&self) -> String {
        export_filename(&self.domain)
    }

    /// Validate and append one feedback row.
    ///
    /// Invalid input (not exactly four ids and ratings) is rejected before
    /// the store is called.
    pub async fn submit(
        &self,
        chosen: &str,
        recommended: Vec<String>,
        ratings: Vec<Rating>,
        comment: Option<String>,
    ) -> Result<FeedbackEntry> {
        let entry = FeedbackEntry::new(chosen, recommended, ratings, comment)?;
        self.record(&entry).await?;
        Ok(entry)
    }

    /// Append an already validated entry.
    pub async fn record(&self, entry: &FeedbackEntry) -> Result<()> {
        let row = entry.to_row();
        match self.store.insert(&row).await {
            Ok(()) => {
                tracing::info!(
                    backend = self.store.backend(),
                    chosen = %entry.chosen,
                    "feedback saved"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(backend = self.store.backend(), error = %e, "failed to save feedback");
                Err(e)
            }
        }
    }

    /// Every stored row
    pub async fn fetch_all(&self) -> Result<Vec<StoredFeedback>> {
        self.store.select_all().await.map_err(|e| {
            tracing::error!(backend = self.store.backend(), error = %e, "failed to load feedback");
            e
        })
    }

    /// Read the whole store and render it as a CSV download.
    pub async fn export_all(&self) -> Result<FeedbackExport> {
        let rows = self.fetch_all().await?;
        let bytes = render_csv(&rows)?;
        Ok(FeedbackExport {
            filename: self.export_filename(),
            rows: rows.len(),
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryFeedbackStore;
    use vitrine_core::Error;

    fn recorder() -> (Arc<MemoryFeedbackStore>, FeedbackRecorder) {
        let store = Arc::new(MemoryFeedbackStore::new());
        let recorder = FeedbackRecorder::new(store.clone(), "shop");
        (store, recorder)
    }

    fn ids(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("n{}", i)).collect()
    }

    #[tokio::test]
    async fn incomplete_submission_never_reaches_store() {
        let (store, recorder) = recorder();
        let err = recorder
            .submit("hub", ids(3), vec![Rating::Good; 3], None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidFeedback(_)));
        assert_eq!(store.insert_calls(), 0);
    }

    #[tokio::test]
    async fn transport_failure_is_reported_once() {
        let (store, recorder) = recorder();
        store.set_unavailable(true);
        let err = recorder
            .submit("hub", ids(4), vec![Rating::Bad; 4], None)
            .await
            .unwrap_err();
        assert!(err.is_transport());
        assert_eq!(store.insert_calls(), 1);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn empty_store_exports_header_only() {
        let (_store, recorder) = recorder();
        let export = recorder.export_all().await.unwrap();
        assert!(export.is_empty());
        assert_eq!(export.filename, "feedback_shop.csv");
        assert!(export.bytes.starts_with(crate::export::UTF8_BOM));
    }

    #[tokio::test]
    async fn whitespace_comment_survives_store_and_export() {
        let (_store, recorder) = recorder();
        recorder
            .submit("hub", ids(4), vec![Rating::Good; 4], Some("   ".to_string()))
            .await
            .unwrap();

        let rows = recorder.fetch_all().await.unwrap();
        assert_eq!(rows[0].row.comment.as_deref(), Some("   "));

        let export = recorder.export_all().await.unwrap();
        let body = &export.bytes[crate::export::UTF8_BOM.len()..];
        let mut reader = csv::ReaderBuilder::new().delimiter(b';').from_reader(body);
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[11], "   ");
    }

    #[tokio::test]
    async fn export_failure_propagates() {
        let (store, recorder) = recorder();
        store.set_unavailable(true);
        assert!(recorder.export_all().await.unwrap_err().is_transport());
    }
}
