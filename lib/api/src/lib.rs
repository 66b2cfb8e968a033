pub mod context;
pub mod html;
pub mod rest;

pub use context::{AppContext, CatalogState, ViewSettings};
pub use html::{ExportState, Flash};
pub use rest::RestApi;
