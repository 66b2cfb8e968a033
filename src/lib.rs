//! # Vitrine
//!
//! Browse precomputed image-similarity neighbours of retail products and
//! collect human ratings on the recommendations.
//!
//! The similarity table is produced offline. Vitrine loads it, joins every
//! product to up to four neighbours, shows them side by side, and records a
//! Bad / Medium / Good rating for each one. Stored ratings can be downloaded
//! as a semicolon-delimited CSV file.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! vitrine --data-file ./data/result_df.csv --image-dir ./Files/file1 --http-port 8501
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vitrine::prelude::*;
//!
//! # async fn run() -> vitrine::Result<()> {
//! let catalog = load_catalog("data/result_df.csv", LoadOptions::default())?;
//! let product = catalog.iter().next().expect("empty catalog");
//! for n in catalog.resolve_neighbours(product) {
//!     println!("{} -> {} ({:?})", product.image_name, n.product.image_name, n.score);
//! }
//!
//! let recorder = FeedbackRecorder::new(Arc::new(MemoryFeedbackStore::new()), "products");
//! let export = recorder.export_all().await?;
//! println!("{} rows in {}", export.rows, export.filename);
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Structure
//!
//! - [`vitrine-core`](https://docs.rs/vitrine-core) - Table loading, neighbour join, ratings, images, page model
//! - [`vitrine-storage`](https://docs.rs/vitrine-storage) - Feedback stores (hosted REST table, JSONL file, memory) and CSV export
//! - [`vitrine-api`](https://docs.rs/vitrine-api) - HTML pages and JSON endpoints

// Re-export core types
pub use vitrine_core::{
    load_catalog, load_catalog_from_reader,
    Catalog, DuplicatePolicy, LoadOptions, LoadWarning, Neighbour,
    ProductRecord, NeighbourRef, NEIGHBOUR_SLOTS,
    FeedbackEntry, FeedbackRow, StoredFeedback, Rating,
    ImageResolver, ImageLookup, ThumbnailSize,
    PageView, Selection,
    Error, Result,
};

// Re-export storage
pub use vitrine_storage::{
    FeedbackExport, FeedbackRecorder, FeedbackStore,
    FileFeedbackStore, MemoryFeedbackStore, RestFeedbackStore, RestStoreConfig,
};

// Re-export API
pub use vitrine_api::{AppContext, RestApi, ViewSettings};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        load_catalog, Catalog, LoadOptions, ProductRecord,
        FeedbackRecorder, FeedbackStore, MemoryFeedbackStore,
        Rating, Error, Result,
        AppContext, RestApi,
    };
}
