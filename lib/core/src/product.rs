use serde::{Deserialize, Serialize};

/// Number of precomputed neighbour slots per product
pub const NEIGHBOUR_SLOTS: usize = 4;

/// Cell values treated as missing, matching common spreadsheet/pandas exports
const NA_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "#N/A", "<NA>",
];

/// Returns the trimmed cell, or `None` if it counts as missing.
#[inline]
pub fn clean_cell(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if NA_TOKENS.contains(&trimmed) {
        None
    } else {
        Some(trimmed)
    }
}

/// Normalize a product reference into a clean string.
///
/// Integer-looking floats lose their decimal point (`12345.0` and `12345`
/// both become `"12345"`), other numbers keep their shortest display form,
/// and anything that is not a number is returned as-is.
pub fn normalize_prod_ref(raw: Option<&str>) -> String {
    let Some(value) = raw.and_then(clean_cell) else {
        return String::new();
    };

    match value.parse::<f64>() {
        Ok(v) if v.is_nan() => String::new(),
        Ok(v) if v.is_finite() && v.fract() == 0.0 => {
            if v.abs() < 9.0e15 {
                (v as i64).to_string()
            } else {
                format!("{:.0}", v)
            }
        }
        Ok(v) => v.to_string(),
        Err(_) => value.to_string(),
    }
}

/// Build the selector label `image_name | ref | description`, skipping empty parts.
pub fn display_label(image_name: &str, prod_ref: &str, description: Option<&str>) -> String {
    let mut parts = vec![image_name];
    if !prod_ref.is_empty() {
        parts.push(prod_ref);
    }
    if let Some(desc) = description.filter(|d| !d.is_empty()) {
        parts.push(desc);
    }
    parts.join(" | ")
}

/// A precomputed neighbour reference stored on a product row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighbourRef {
    pub image_name: String,
    /// Cosine similarity in [0, 1]; absent when the cell was empty
    pub score: Option<f32>,
}

/// One row of the similarity table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Unique key, also the image file stem
    pub image_name: String,
    /// Raw `PROD_REF` cell
    pub prod_ref: Option<String>,
    /// Normalized reference, empty when missing
    pub prod_ref_str: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub sizes: Option<String>,
    pub price: Option<f64>,
    /// Slots 1..=4 in order
    pub neighbours: [Option<NeighbourRef>; NEIGHBOUR_SLOTS],
    pub display_label: String,
}

impl ProductRecord {
    /// Create a record with no metadata and no neighbours.
    #[must_use]
    pub fn new(image_name: impl Into<String>) -> Self {
        let image_name = image_name.into();
        let display_label = display_label(&image_name, "", None);
        Self {
            image_name,
            prod_ref: None,
            prod_ref_str: String::new(),
            description: None,
            color: None,
            sizes: None,
            price: None,
            neighbours: Default::default(),
            display_label,
        }
    }

    #[must_use]
    pub fn with_prod_ref(mut self, prod_ref: impl Into<String>) -> Self {
        let prod_ref = prod_ref.into();
        self.prod_ref_str = normalize_prod_ref(Some(&prod_ref));
        self.prod_ref = Some(prod_ref);
        self.refresh_label();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self.refresh_label();
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    #[must_use]
    pub fn with_sizes(mut self, sizes: impl Into<String>) -> Self {
        self.sizes = Some(sizes.into());
        self
    }

    #[must_use]
    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    /// Set neighbour slot `slot` (1-based).
    ///
    /// # Panics
    ///
    /// Panics if `slot` is not in `1..=NEIGHBOUR_SLOTS`.
    #[must_use]
    pub fn with_neighbour(mut self, slot: usize, image_name: impl Into<String>, score: Option<f32>) -> Self {
        assert!((1..=NEIGHBOUR_SLOTS).contains(&slot), "neighbour slot out of range: {}", slot);
        self.neighbours[slot - 1] = Some(NeighbourRef {
            image_name: image_name.into(),
            score,
        });
        self
    }

    /// Number of non-empty neighbour slots (resolved or not)
    #[inline]
    pub fn neighbour_ref_count(&self) -> usize {
        self.neighbours.iter().filter(|n| n.is_some()).count()
    }

    pub(crate) fn refresh_label(&mut self) {
        self.display_label = display_label(
            &self.image_name,
            &self.prod_ref_str,
            self.description.as_deref(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_float_and_integer_refs_normalize_identically() {
        assert_eq!(normalize_prod_ref(Some("12345.0")), "12345");
        assert_eq!(normalize_prod_ref(Some("12345")), "12345");
        assert_eq!(
            normalize_prod_ref(Some("12345.0")),
            normalize_prod_ref(Some("12345"))
        );
    }

    #[test]
    fn non_integer_and_text_refs() {
        assert_eq!(normalize_prod_ref(Some("12.5")), "12.5");
        assert_eq!(normalize_prod_ref(Some(" AB-77 ")), "AB-77");
        assert_eq!(normalize_prod_ref(Some("nan")), "");
        assert_eq!(normalize_prod_ref(Some("")), "");
        assert_eq!(normalize_prod_ref(None), "");
    }

    #[test]
    fn label_skips_missing_parts() {
        assert_eq!(display_label("img1", "123", Some("Bag")), "img1 | 123 | Bag");
        assert_eq!(display_label("img1", "", Some("Bag")), "img1 | Bag");
        assert_eq!(display_label("img1", "123", None), "img1 | 123");
        assert_eq!(display_label("img1", "", Some("")), "img1");
    }

    #[test]
    fn builder_keeps_label_in_sync() {
        let record = ProductRecord::new("img9")
            .with_prod_ref("900.0")
            .with_description("Tote bag");
        assert_eq!(record.prod_ref_str, "900");
        assert_eq!(record.display_label, "img9 | 900 | Tote bag");
    }

    #[test]
    fn clean_cell_recognises_na_tokens() {
        assert_eq!(clean_cell("  x "), Some("x"));
        assert_eq!(clean_cell("N/A"), None);
        assert_eq!(clean_cell("   "), None);
    }
}
