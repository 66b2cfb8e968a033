// Image lookup by naming convention and thumbnail rendering
use crate::{Error, Result};
use ahash::AHashSet;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};

/// Extensions probed for every identifier, in order
pub const DEFAULT_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".webp", ".JPG", ".PNG"];

const THUMBNAIL_QUALITY: u8 = 85;

/// Upper bound on remembered misses; the set is dropped when it fills up
pub const DEFAULT_MISS_CAPACITY: usize = 10_000;

/// Outcome of an image lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageLookup {
    Found(PathBuf),
    NotFound,
}

impl ImageLookup {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ImageLookup::Found(p) => Some(p),
            ImageLookup::NotFound => None,
        }
    }
}

/// Resolves `image_name` to a file across an ordered list of directories
pub struct ImageResolver {
    dirs: Vec<PathBuf>,
    extensions: Vec<String>,
    misses: RwLock<AHashSet<String>>,
    miss_capacity: usize,
}

impl ImageResolver {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self::with_extensions(dirs, DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect())
    }

    pub fn with_extensions(dirs: Vec<PathBuf>, extensions: Vec<String>) -> Self {
        Self {
            dirs,
            extensions,
            misses: RwLock::new(AHashSet::new()),
            miss_capacity: DEFAULT_MISS_CAPACITY,
        }
    }

    pub fn with_miss_capacity(mut self, capacity: usize) -> Self {
        self.miss_capacity = capacity;
        self
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// First existing `<dir>/<image_name><ext>`, directories first, then extensions.
    pub fn resolve(&self, image_name: &str) -> ImageLookup {
        if !is_safe_name(image_name) {
            return ImageLookup::NotFound;
        }
        if self.misses.read().contains(image_name) {
            return ImageLookup::NotFound;
        }

        for dir in &self.dirs {
            for ext in &self.extensions {
                let candidate = dir.join(format!("{}{}", image_name, ext));
                if candidate.is_file() {
                    return ImageLookup::Found(candidate);
                }
            }
        }

        tracing::debug!(image_name, "image not found");
        if self.miss_capacity > 0 {
            let mut misses = self.misses.write();
            if misses.len() >= self.miss_capacity {
                misses.clear();
            }
            misses.insert(image_name.to_string());
        }
        ImageLookup::NotFound
    }

    /// Number of names currently remembered as missing
    pub fn cached_misses(&self) -> usize {
        self.misses.read().len()
    }

    /// Forget cached misses, e.g. after images were added on disk.
    pub fn clear_cache(&self) {
        self.misses.write().clear();
    }
}

fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains("..")
        && !name.contains('\0')
}

/// Base box thumbnails are fitted into before scaling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailSize {
    pub width: u32,
    pub height: u32,
}

impl Default for ThumbnailSize {
    fn default() -> Self {
        Self {
            width: 400,
            height: 600,
        }
    }
}

impl ThumbnailSize {
    /// The box multiplied by `scale`, at least 1x1
    pub fn scaled(&self, scale: f32) -> (u32, u32) {
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        let w = ((self.width as f32) * scale).round().max(1.0) as u32;
        let h = ((self.height as f32) * scale).round().max(1.0) as u32;
        (w, h)
    }
}

/// An encoded thumbnail
pub struct Thumbnail {
    pub data: Vec<u8>,
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
}

/// Decode `path`, fit it inside `size * scale` keeping aspect ratio, encode as JPEG.
pub fn render_thumbnail(path: &Path, size: ThumbnailSize, scale: f32) -> Result<Thumbnail> {
    let img = image::open(path).map_err(|e| Error::Image(format!("{}: {}", path.display(), e)))?;
    thumbnail_from_image(img, size, scale)
}

pub fn thumbnail_from_image(img: DynamicImage, size: ThumbnailSize, scale: f32) -> Result<Thumbnail> {
    let (max_w, max_h) = size.scaled(scale);
    let img = img.resize(max_w, max_h, FilterType::Lanczos3);
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());

    let mut data = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut data, THUMBNAIL_QUALITY);
    rgb.write_with_encoder(encoder)
        .map_err(|e| Error::Image(format!("JPEG encode failed: {}", e)))?;

    Ok(Thumbnail {
        data,
        mime_type: "image/jpeg",
        width: rgb.width(),
        height: rgb.height(),
    })
}
