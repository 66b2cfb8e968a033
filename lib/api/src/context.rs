use std::path::PathBuf;
use std::sync::Arc;
use vitrine_core::{Catalog, Error, FeedbackEntry, ImageResolver, Rating, Result, ThumbnailSize};
use vitrine_core::view::CANNOT_PREPARE_FEEDBACK;
use vitrine_storage::FeedbackRecorder;

/// Presentation settings fixed at startup
#[derive(Debug, Clone)]
pub struct ViewSettings {
    /// Text shown instead of the logo when the logo file is absent
    pub brand: String,
    pub title: String,
    pub logo: Option<PathBuf>,
    pub thumbnail: ThumbnailSize,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            brand: "VITRINE".to_string(),
            title: "Similarity Detection for Fashion Retail Products".to_string(),
            logo: None,
            thumbnail: ThumbnailSize::default(),
        }
    }
}

impl ViewSettings {
    /// Logo path, only if the file exists
    pub fn logo_path(&self) -> Option<&PathBuf> {
        self.logo.as_ref().filter(|p| p.is_file())
    }
}

/// The loaded table, or why it could not be loaded
pub enum CatalogState {
    Loaded(Arc<Catalog>),
    Unavailable(String),
}

/// Process-wide application state, built once in `main` and shared by handlers
pub struct AppContext {
    catalog: CatalogState,
    images: ImageResolver,
    recorder: FeedbackRecorder,
    settings: ViewSettings,
}

impl AppContext {
    /// A failed load is kept as an error message: the browsing page shows it
    /// and stops, the rest of the application keeps working.
    pub fn new(
        catalog: Result<Catalog>,
        images: ImageResolver,
        recorder: FeedbackRecorder,
        settings: ViewSettings,
    ) -> Self {
        let catalog = match catalog {
            Ok(c) => CatalogState::Loaded(Arc::new(c)),
            Err(e) => {
                tracing::error!(error = %e, "catalog unavailable");
                CatalogState::Unavailable(e.to_string())
            }
        };
        Self {
            catalog,
            images,
            recorder,
            settings,
        }
    }

    pub fn catalog(&self) -> std::result::Result<&Arc<Catalog>, &str> {
        match &self.catalog {
            CatalogState::Loaded(c) => Ok(c),
            CatalogState::Unavailable(msg) => Err(msg),
        }
    }

    pub fn images(&self) -> &ImageResolver {
        &self.images
    }

    pub fn recorder(&self) -> &FeedbackRecorder {
        &self.recorder
    }

    pub fn settings(&self) -> &ViewSettings {
        &self.settings
    }

    /// Check a submission against the current neighbour join, then record it.
    ///
    /// The chosen product must exist and resolve to exactly four neighbours,
    /// and the submitted ids must be those neighbours in slot order. Nothing
    /// reaches the store otherwise.
    pub async fn submit_feedback(
        &self,
        chosen: &str,
        recommended: Vec<String>,
        ratings: Vec<Rating>,
        comment: Option<String>,
    ) -> Result<FeedbackEntry> {
        let catalog = self
            .catalog()
            .map_err(|msg| Error::InvalidFeedback(format!("catalog unavailable: {}", msg)))?;
        let product = catalog
            .get(chosen)
            .ok_or_else(|| Error::ProductNotFound(chosen.to_string()))?;

        let resolved: Vec<&str> = catalog
            .resolve_neighbours(product)
            .iter()
            .map(|n| n.product.image_name.as_str())
            .collect();
        if resolved.len() != vitrine_core::NEIGHBOUR_SLOTS {
            return Err(Error::InvalidFeedback(CANNOT_PREPARE_FEEDBACK.to_string()));
        }
        if recommended.len() == resolved.len() && recommended.iter().zip(&resolved).any(|(a, b)| a != b) {
            return Err(Error::InvalidFeedback(
                "recommended products do not match the current neighbours".to_string(),
            ));
        }

        self.recorder.submit(chosen, recommended, ratings, comment).await
    }
}
