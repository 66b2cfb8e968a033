//! View models for the browsing page.
//!
//! Everything here is pure: it reads the catalog and the image resolver
//! and produces plain data that a renderer (HTML or JSON) can format.

use crate::catalog::{Catalog, Neighbour};
use crate::images::{ImageLookup, ImageResolver};
use crate::product::{ProductRecord, NEIGHBOUR_SLOTS};
use serde::Serialize;

pub const SELECT_PROMPT: &str = "Select a product above to see its similar neighbours.";
pub const NO_SIMILAR_PRODUCTS: &str = "No similar products found for this item.";
pub const CANNOT_PREPARE_FEEDBACK: &str = "It was not possible to prepare the recommended 4 articles.";
pub const IMAGE_NOT_FOUND: &str = "Image not found.";
pub const IMAGE_UNREADABLE: &str = "Image could not be opened.";

/// Image scale of the selected product's card
pub const MAIN_IMAGE_SCALE: f32 = 0.50;
/// Image scale of neighbour cards
pub const NEIGHBOUR_IMAGE_SCALE: f32 = 0.65;

/// How the page picks its product
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    /// First label in sort order
    #[default]
    First,
    Label(String),
    ImageName(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImageView {
    Available { image_name: String, scale: f32 },
    NotFound,
}

/// One product card, full or compact
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardView {
    pub image_name: String,
    pub compact: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prod_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<String>,
    pub image: ImageView,
}

impl CardView {
    /// Full card for the selected product
    pub fn full(product: &ProductRecord, resolver: &ImageResolver) -> Self {
        Self {
            image_name: product.image_name.clone(),
            compact: false,
            prod_ref: Some(product.prod_ref_str.clone()).filter(|r| !r.is_empty()),
            description: product.description.clone(),
            color: product.color.clone(),
            sizes: product.sizes.clone(),
            price: product.price.map(format_price),
            similarity: None,
            image: image_view(&product.image_name, resolver, MAIN_IMAGE_SCALE),
        }
    }

    /// Compact card for a neighbour: id, price, similarity
    pub fn compact(neighbour: &Neighbour<'_>, resolver: &ImageResolver) -> Self {
        let product = neighbour.product;
        Self {
            image_name: product.image_name.clone(),
            compact: true,
            prod_ref: None,
            description: None,
            color: None,
            sizes: None,
            price: product.price.map(format_price),
            similarity: Some(format_similarity(neighbour.score)),
            image: image_view(&product.image_name, resolver, NEIGHBOUR_IMAGE_SCALE),
        }
    }
}

fn image_view(image_name: &str, resolver: &ImageResolver, scale: f32) -> ImageView {
    match resolver.resolve(image_name) {
        ImageLookup::Found(_) => ImageView::Available {
            image_name: image_name.to_string(),
            scale,
        },
        ImageLookup::NotFound => ImageView::NotFound,
    }
}

pub fn format_price(price: f64) -> String {
    format!("{:.2} €", price)
}

pub fn format_similarity(score: Option<f32>) -> String {
    match score {
        Some(s) => format!("{:.3}", s),
        None => "n/a".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FeedbackForm {
    /// Exactly four neighbours resolved; ids in slot order
    Enabled {
        chosen: String,
        recommended: Vec<String>,
    },
    Disabled { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NeighbourSection {
    NoSimilarProducts { message: String },
    Neighbours { cards: Vec<CardView>, feedback: FeedbackForm },
}

impl NeighbourSection {
    pub fn build(catalog: &Catalog, product: &ProductRecord, resolver: &ImageResolver) -> Self {
        let neighbours = catalog.resolve_neighbours(product);
        if neighbours.is_empty() {
            return NeighbourSection::NoSimilarProducts {
                message: NO_SIMILAR_PRODUCTS.to_string(),
            };
        }

        let cards: Vec<CardView> = neighbours.iter().map(|n| CardView::compact(n, resolver)).collect();
        let feedback = if neighbours.len() == NEIGHBOUR_SLOTS {
            FeedbackForm::Enabled {
                chosen: product.image_name.clone(),
                recommended: neighbours.iter().map(|n| n.product.image_name.clone()).collect(),
            }
        } else {
            FeedbackForm::Disabled {
                reason: CANNOT_PREPARE_FEEDBACK.to_string(),
            }
        };

        NeighbourSection::Neighbours { cards, feedback }
    }

    pub fn feedback_enabled(&self) -> bool {
        matches!(
            self,
            NeighbourSection::Neighbours {
                feedback: FeedbackForm::Enabled { .. },
                ..
            }
        )
    }
}

/// Everything the browsing page shows for one request
#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub labels: Vec<String>,
    pub selected_label: Option<String>,
    pub product: Option<CardView>,
    pub neighbours: Option<NeighbourSection>,
    pub warnings: Vec<String>,
}

impl PageView {
    pub fn build(catalog: &Catalog, selection: &Selection, resolver: &ImageResolver) -> Self {
        let labels: Vec<String> = catalog.sorted_labels().into_iter().map(str::to_string).collect();

        let selected = match selection {
            Selection::First => labels.first().and_then(|l| catalog.find_by_label(l)),
            Selection::Label(label) => catalog.find_by_label(label),
            Selection::ImageName(name) => catalog.get(name),
        };

        let warnings = catalog.warnings().iter().map(|w| w.to_string()).collect();

        match selected {
            Some(product) => Self {
                labels,
                selected_label: Some(product.display_label.clone()),
                product: Some(CardView::full(product, resolver)),
                neighbours: Some(NeighbourSection::build(catalog, product, resolver)),
                warnings,
            },
            None => Self {
                labels,
                selected_label: None,
                product: None,
                neighbours: None,
                warnings,
            },
        }
    }
}
