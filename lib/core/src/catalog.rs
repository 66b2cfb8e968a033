use crate::{Error, ProductRecord, Result};
use ahash::AHashMap;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// What to do when the table has repeated `image_name` keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Keep first-match-wins and record a warning
    #[default]
    Warn,
    /// Fail the load
    Reject,
}

/// Non-fatal problems found while loading the table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum LoadWarning {
    MissingColumns(Vec<String>),
    DuplicateKeys(Vec<String>),
    SkippedRows(usize),
}

impl std::fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadWarning::MissingColumns(cols) => {
                write!(f, "Warning: missing columns in input file: {}", cols.join(", "))
            }
            LoadWarning::DuplicateKeys(keys) => {
                write!(f, "Warning: duplicate image_name values (first row wins): {}", keys.join(", "))
            }
            LoadWarning::SkippedRows(n) => write!(f, "Warning: {} rows without image_name were skipped", n),
        }
    }
}

/// A neighbour joined back to its full product row
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Neighbour<'a> {
    /// 1-based slot the reference came from
    pub slot: usize,
    pub product: &'a ProductRecord,
    pub score: Option<f32>,
}

/// Read-only product table with a key index
#[derive(Debug, Default)]
pub struct Catalog {
    products: Vec<ProductRecord>,
    by_key: AHashMap<String, usize>,
    by_label: AHashMap<String, usize>,
    warnings: Vec<LoadWarning>,
    source: Option<PathBuf>,
}

impl Catalog {
    /// Build the catalog and its first-occurrence indexes.
    pub fn from_records(products: Vec<ProductRecord>, policy: DuplicatePolicy) -> Result<Self> {
        let mut by_key = AHashMap::with_capacity(products.len());
        let mut by_label = AHashMap::with_capacity(products.len());
        let mut duplicates = Vec::new();

        for (idx, product) in products.iter().enumerate() {
            if by_key.contains_key(&product.image_name) {
                if !duplicates.contains(&product.image_name) {
                    duplicates.push(product.image_name.clone());
                }
            } else {
                by_key.insert(product.image_name.clone(), idx);
            }
            by_label.entry(product.display_label.clone()).or_insert(idx);
        }

        let mut warnings = Vec::new();
        if !duplicates.is_empty() {
            match policy {
                DuplicatePolicy::Reject => return Err(Error::DuplicateKeys(duplicates)),
                DuplicatePolicy::Warn => {
                    tracing::warn!(count = duplicates.len(), "duplicate image_name values, first row wins");
                    warnings.push(LoadWarning::DuplicateKeys(duplicates));
                }
            }
        }

        Ok(Self {
            products,
            by_key,
            by_label,
            warnings,
            source: None,
        })
    }

    pub(crate) fn with_source(mut self, source: &Path) -> Self {
        self.source = Some(source.to_path_buf());
        self
    }

    pub(crate) fn push_warning(&mut self, warning: LoadWarning) {
        self.warnings.push(warning);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProductRecord> {
        self.products.iter()
    }

    #[inline]
    pub fn warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// First row whose key matches
    #[inline]
    pub fn get(&self, image_name: &str) -> Option<&ProductRecord> {
        self.by_key.get(image_name).map(|&idx| &self.products[idx])
    }

    /// First row whose display label matches
    #[inline]
    pub fn find_by_label(&self, label: &str) -> Option<&ProductRecord> {
        self.by_label.get(label).map(|&idx| &self.products[idx])
    }

    /// Join a product's neighbour slots back to full rows.
    ///
    /// Empty slots and references that do not resolve are skipped. The
    /// result follows slot order, not score order.
    pub fn resolve_neighbours<'a>(&'a self, product: &ProductRecord) -> Vec<Neighbour<'a>> {
        product
            .neighbours
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| {
                let reference = slot.as_ref()?;
                let Some(neighbour) = self.get(&reference.image_name) else {
                    tracing::debug!(
                        product = %product.image_name,
                        neighbour = %reference.image_name,
                        "neighbour reference does not resolve"
                    );
                    return None;
                };
                Some(Neighbour {
                    slot: idx + 1,
                    product: neighbour,
                    score: reference.score,
                })
            })
            .collect()
    }

    /// All display labels in alphabetical order
    pub fn sorted_labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = self.products.iter().map(|p| p.display_label.as_str()).collect();
        labels.sort_unstable();
        labels
    }

    /// Sorted labels containing `query`, case-insensitively. A blank query matches everything.
    pub fn search(&self, query: &str) -> Vec<&str> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.sorted_labels();
        }
        self.sorted_labels()
            .into_iter()
            .filter(|label| label.to_lowercase().contains(&needle))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Catalog {
        let products = vec![
            ProductRecord::new("b")
                .with_neighbour(1, "c", Some(0.9))
                .with_neighbour(2, "ghost", Some(0.8))
                .with_neighbour(4, "a", Some(0.95)),
            ProductRecord::new("a").with_description("Scarf"),
            ProductRecord::new("c").with_prod_ref("7.0"),
        ];
        Catalog::from_records(products, DuplicatePolicy::Warn).unwrap()
    }

    #[test]
    fn resolves_in_slot_order_and_skips_broken_refs() {
        let catalog = sample();
        let product = catalog.get("b").unwrap();
        let neighbours = catalog.resolve_neighbours(product);

        let ids: Vec<_> = neighbours.iter().map(|n| n.product.image_name.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);
        assert_eq!(neighbours[0].slot, 1);
        assert_eq!(neighbours[1].slot, 4);
        assert_eq!(neighbours[1].score, Some(0.95));
    }

    #[test]
    fn resolved_neighbours_always_exist_in_table() {
        let catalog = sample();
        for product in catalog.iter() {
            for n in catalog.resolve_neighbours(product) {
                assert!(catalog.get(&n.product.image_name).is_some());
            }
        }
    }

    #[test]
    fn duplicates_warn_and_first_wins() {
        let products = vec![
            ProductRecord::new("x").with_description("first"),
            ProductRecord::new("x").with_description("second"),
        ];
        let catalog = Catalog::from_records(products, DuplicatePolicy::Warn).unwrap();
        assert_eq!(catalog.get("x").unwrap().description.as_deref(), Some("first"));
        assert_eq!(catalog.warnings(), &[LoadWarning::DuplicateKeys(vec!["x".to_string()])]);
    }

    #[test]
    fn duplicates_rejected_by_policy() {
        let products = vec![ProductRecord::new("x"), ProductRecord::new("x")];
        let err = Catalog::from_records(products, DuplicatePolicy::Reject).unwrap_err();
        assert!(matches!(err, Error::DuplicateKeys(keys) if keys == vec!["x".to_string()]));
    }

    #[test]
    fn labels_sorted_and_searchable() {
        let catalog = sample();
        assert_eq!(catalog.sorted_labels(), vec!["a | Scarf", "b", "c | 7"]);
        assert_eq!(catalog.search("scarf"), vec!["a | Scarf"]);
        assert_eq!(catalog.search("  ").len(), 3);
        assert!(catalog.find_by_label("c | 7").is_some());
    }
}
