pub mod export;
pub mod file;
pub mod memory;
pub mod recorder;
pub mod rest;
pub mod store;

pub use export::{export_filename, render_csv, FeedbackExport};
pub use file::FileFeedbackStore;
pub use memory::MemoryFeedbackStore;
pub use recorder::FeedbackRecorder;
pub use rest::{RestFeedbackStore, RestStoreConfig};
pub use store::FeedbackStore;
