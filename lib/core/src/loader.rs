//! CSV loader for the precomputed similarity table.

use crate::catalog::{Catalog, DuplicatePolicy, LoadWarning};
use crate::product::{clean_cell, display_label, normalize_prod_ref, NeighbourRef, NEIGHBOUR_SLOTS};
use crate::{Error, ProductRecord, Result};
use csv::StringRecord;
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const COL_IMAGE_NAME: &str = "image_name";
pub const COL_PROD_REF: &str = "PROD_REF";
pub const COL_DESCRIPTION: &str = "DES_CONC";
pub const COL_COLOR: &str = "Color";
pub const COL_SIZES: &str = "Sizes";
pub const COL_PRICE: &str = "Price";

const REQUIRED_COLUMNS: &[&str] = &[COL_IMAGE_NAME];

/// Loader settings
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    pub duplicates: DuplicatePolicy,
}

/// Columns every well-formed input file carries, in file order
pub fn expected_columns() -> Vec<String> {
    let mut cols: Vec<String> = [COL_IMAGE_NAME, COL_PROD_REF, COL_DESCRIPTION, COL_COLOR, COL_SIZES, COL_PRICE]
        .iter()
        .map(|c| c.to_string())
        .collect();
    for k in 1..=NEIGHBOUR_SLOTS {
        cols.push(neighbour_column(k));
        cols.push(score_column(k));
    }
    cols
}

#[inline]
fn neighbour_column(k: usize) -> String {
    format!("similar_image_{}", k)
}

#[inline]
fn score_column(k: usize) -> String {
    format!("similarity_score_{}", k)
}

/// Header positions resolved once per file
struct Columns {
    image_name: usize,
    prod_ref: Option<usize>,
    description: Option<usize>,
    color: Option<usize>,
    sizes: Option<usize>,
    price: Option<usize>,
    /// (image, score) column pairs; a slot is only readable when both exist
    neighbours: [Option<(usize, usize)>; NEIGHBOUR_SLOTS],
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<(Self, Vec<String>)> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);

        let missing_required: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|c| find(c).is_none())
            .map(|c| c.to_string())
            .collect();
        if !missing_required.is_empty() {
            return Err(Error::SchemaMismatch { missing: missing_required });
        }

        let missing_optional: Vec<String> = expected_columns()
            .into_iter()
            .filter(|c| find(c).is_none())
            .collect();

        let mut neighbours: [Option<(usize, usize)>; NEIGHBOUR_SLOTS] = Default::default();
        for (idx, slot) in neighbours.iter_mut().enumerate() {
            let k = idx + 1;
            *slot = find(&neighbour_column(k)).zip(find(&score_column(k)));
        }

        let columns = Self {
            image_name: find(COL_IMAGE_NAME).ok_or_else(|| Error::SchemaMismatch {
                missing: vec![COL_IMAGE_NAME.to_string()],
            })?,
            prod_ref: find(COL_PROD_REF),
            description: find(COL_DESCRIPTION),
            color: find(COL_COLOR),
            sizes: find(COL_SIZES),
            price: find(COL_PRICE),
            neighbours,
        };
        Ok((columns, missing_optional))
    }
}

fn cell(record: &StringRecord, idx: Option<usize>) -> Option<&str> {
    idx.and_then(|i| record.get(i)).and_then(clean_cell)
}

fn owned_cell(record: &StringRecord, idx: Option<usize>) -> Option<String> {
    cell(record, idx).map(str::to_string)
}

fn parse_row(record: &StringRecord, cols: &Columns) -> Option<ProductRecord> {
    let image_name = cell(record, Some(cols.image_name))?.to_string();

    let prod_ref = owned_cell(record, cols.prod_ref);
    let prod_ref_str = normalize_prod_ref(prod_ref.as_deref());
    let description = owned_cell(record, cols.description);

    let price = cell(record, cols.price).and_then(|raw| match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            tracing::debug!(image_name = %image_name, price = raw, "unparseable price ignored");
            None
        }
    });

    let mut neighbours: [Option<NeighbourRef>; NEIGHBOUR_SLOTS] = Default::default();
    for (slot, columns) in neighbours.iter_mut().zip(cols.neighbours.iter()) {
        let Some((img_idx, score_idx)) = *columns else {
            continue;
        };
        if let Some(neighbour) = cell(record, Some(img_idx)) {
            let score = cell(record, Some(score_idx))
                .and_then(|s| s.parse::<f32>().ok())
                .filter(|s| s.is_finite());
            *slot = Some(NeighbourRef {
                image_name: neighbour.to_string(),
                score,
            });
        }
    }

    let display_label = display_label(&image_name, &prod_ref_str, description.as_deref());

    Some(ProductRecord {
        image_name,
        prod_ref,
        prod_ref_str,
        description,
        color: owned_cell(record, cols.color),
        sizes: owned_cell(record, cols.sizes),
        price,
        neighbours,
        display_label,
    })
}

/// Load the similarity table from any CSV reader.
pub fn load_catalog_from_reader<R: Read>(reader: R, options: LoadOptions) -> Result<Catalog> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let (columns, missing) = Columns::resolve(&headers)?;

    let mut products = Vec::new();
    let mut skipped = 0usize;
    for record in csv_reader.records() {
        let record = record?;
        match parse_row(&record, &columns) {
            Some(product) => products.push(product),
            None => skipped += 1,
        }
    }

    let mut catalog = Catalog::from_records(products, options.duplicates)?;

    if !missing.is_empty() {
        tracing::warn!(columns = ?missing, "missing columns in input file");
        catalog.push_warning(LoadWarning::MissingColumns(missing));
    }
    if skipped > 0 {
        tracing::warn!(skipped, "rows without image_name skipped");
        catalog.push_warning(LoadWarning::SkippedRows(skipped));
    }

    Ok(catalog)
}

/// Load the similarity table from a file.
///
/// A missing file is reported as [`Error::MissingInput`] so callers can
/// halt the page instead of the process.
pub fn load_catalog<P: AsRef<Path>>(path: P, options: LoadOptions) -> Result<Catalog> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::MissingInput(path.to_path_buf()));
    }

    let file = File::open(path)?;
    let catalog = load_catalog_from_reader(file, options)?.with_source(path);
    tracing::info!(path = %path.display(), products = catalog.len(), "catalog loaded");
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = "\
,image_name,PROD_REF,DES_CONC,Color,Sizes,Price,similar_image_1,similarity_score_1,similar_image_2,similarity_score_2,similar_image_3,similarity_score_3,similar_image_4,similarity_score_4
0,img_a,1001.0,Tote bag,Black,U,19.99,img_b,0.91,img_c,0.88,,,img_x,0.5
1,img_b,1002,Scarf,Red,U,,img_a,0.91,,,,,,
2,img_c,REF-9,,Blue,S;M,abc,,,,,,,,
";

    #[test]
    fn loads_rows_and_derived_columns() {
        let catalog = load_catalog_from_reader(FULL.as_bytes(), LoadOptions::default()).unwrap();
        assert_eq!(catalog.len(), 3);
        assert!(catalog.warnings().is_empty());

        let a = catalog.get("img_a").unwrap();
        assert_eq!(a.prod_ref_str, "1001");
        assert_eq!(a.display_label, "img_a | 1001 | Tote bag");
        assert_eq!(a.price, Some(19.99));
        assert_eq!(a.neighbour_ref_count(), 3);
        assert!(a.neighbours[2].is_none());
        assert_eq!(a.neighbours[3].as_ref().unwrap().image_name, "img_x");

        let c = catalog.get("img_c").unwrap();
        assert_eq!(c.display_label, "img_c | REF-9");
        assert_eq!(c.price, None);
        assert_eq!(c.sizes.as_deref(), Some("S;M"));
    }

    #[test]
    fn missing_optional_columns_warn() {
        let csv = "image_name,PROD_REF\nimg_a,1\n";
        let catalog = load_catalog_from_reader(csv.as_bytes(), LoadOptions::default()).unwrap();
        assert_eq!(catalog.len(), 1);
        match &catalog.warnings()[0] {
            LoadWarning::MissingColumns(cols) => {
                assert!(cols.contains(&"DES_CONC".to_string()));
                assert!(cols.contains(&"similarity_score_4".to_string()));
                assert!(!cols.contains(&"PROD_REF".to_string()));
            }
            other => panic!("unexpected warning {:?}", other),
        }
    }

    #[test]
    fn missing_required_column_fails() {
        let csv = "PROD_REF,DES_CONC\n1,Bag\n";
        let err = load_catalog_from_reader(csv.as_bytes(), LoadOptions::default()).unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch { .. }));
    }

    #[test]
    fn slot_ignored_without_score_column() {
        let csv = "image_name,similar_image_1\nimg_a,img_b\nimg_b,img_a\n";
        let catalog = load_catalog_from_reader(csv.as_bytes(), LoadOptions::default()).unwrap();
        assert_eq!(catalog.get("img_a").unwrap().neighbour_ref_count(), 0);
    }

    #[test]
    fn rows_without_key_are_skipped() {
        let csv = "image_name,PROD_REF\n,1\nimg_a,2\nnan,3\n";
        let catalog = load_catalog_from_reader(csv.as_bytes(), LoadOptions::default()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.warnings().contains(&LoadWarning::SkippedRows(2)));
    }

    #[test]
    fn absent_file_is_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_catalog(dir.path().join("result_df.csv"), LoadOptions::default()).unwrap_err();
        assert!(matches!(err, Error::MissingInput(_)));
    }
}
