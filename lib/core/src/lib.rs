//! # Vitrine Core
//!
//! Core library for the Vitrine similarity browser.
//!
//! This crate provides the data side of the application:
//!
//! - [`ProductRecord`] - One row of the precomputed similarity table
//! - [`Catalog`] - The loaded table with a key index and neighbour joins
//! - [`load_catalog`] - CSV loader with schema checks and derived columns
//! - [`FeedbackEntry`] - A validated rating of four neighbours
//! - [`ImageResolver`] - Image lookup by naming convention
//! - [`PageView`] - View models for the browsing page
//!
//! ## Example
//!
//! ```rust
//! use vitrine_core::{load_catalog_from_reader, LoadOptions};
//!
//! let csv = "image_name,PROD_REF,similar_image_1,similarity_score_1\n\
//!            a,100.0,b,0.93\n\
//!            b,200,a,0.93\n";
//! let catalog = load_catalog_from_reader(csv.as_bytes(), LoadOptions::default()).unwrap();
//!
//! let product = catalog.get("a").unwrap();
//! assert_eq!(product.display_label, "a | 100");
//!
//! let neighbours = catalog.resolve_neighbours(product);
//! assert_eq!(neighbours[0].product.image_name, "b");
//! ```

pub mod catalog;
pub mod error;
pub mod feedback;
pub mod images;
pub mod loader;
pub mod product;
pub mod view;

pub use catalog::{Catalog, DuplicatePolicy, LoadWarning, Neighbour};
pub use error::{Error, Result};
pub use feedback::{FeedbackEntry, FeedbackId, FeedbackRow, Rating, StoredFeedback};
pub use images::{render_thumbnail, ImageLookup, ImageResolver, Thumbnail, ThumbnailSize};
pub use loader::{load_catalog, load_catalog_from_reader, LoadOptions};
pub use product::{display_label, normalize_prod_ref, NeighbourRef, ProductRecord, NEIGHBOUR_SLOTS};
pub use view::{CardView, FeedbackForm, ImageView, NeighbourSection, PageView, Selection};
