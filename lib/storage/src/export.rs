// Spreadsheet-friendly CSV export of the feedback store
use vitrine_core::{Error, Result, StoredFeedback};

/// UTF-8 byte-order mark, so spreadsheet tools pick the right encoding
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
pub const DELIMITER: u8 = b';';

pub const EXPORT_COLUMNS: [&str; 12] = [
    "id",
    "created_at",
    "chosen_product",
    "product_1",
    "rating_1",
    "product_2",
    "rating_2",
    "product_3",
    "rating_3",
    "product_4",
    "rating_4",
    "comment",
];

/// Rendered export, ready to be served as a download
#[derive(Debug, Clone)]
pub struct FeedbackExport {
    pub filename: String,
    pub rows: usize,
    pub bytes: Vec<u8>,
}

impl FeedbackExport {
    /// True when the store had no rows; the CSV then holds only the header
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }
}

/// Deterministic download name, `feedback_<domain>.csv`
pub fn export_filename(domain: &str) -> String {
    let domain: String = domain
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if domain.is_empty() {
        "feedback.csv".to_string()
    } else {
        format!("feedback_{}.csv", domain)
    }
}

/// Semicolon-delimited CSV with BOM and header, one line per stored row.
pub fn render_csv(rows: &[StoredFeedback]) -> Result<Vec<u8>> {
    let mut buf = UTF8_BOM.to_vec();
    {
        let mut writer = csv::WriterBuilder::new().delimiter(DELIMITER).from_writer(&mut buf);
        writer.write_record(EXPORT_COLUMNS)?;

        for stored in rows {
            let id = stored.id.as_ref().map(|id| id.to_string()).unwrap_or_default();
            let row = &stored.row;
            writer.write_record([
                id.as_str(),
                stored.created_at.as_deref().unwrap_or(""),
                row.chosen_product.as_str(),
                row.product_1.as_str(),
                row.rating_1.as_str(),
                row.product_2.as_str(),
                row.rating_2.as_str(),
                row.product_3.as_str(),
                row.rating_3.as_str(),
                row.product_4.as_str(),
                row.rating_4.as_str(),
                row.comment.as_deref().unwrap_or(""),
            ])?;
        }
        writer
            .flush()
            .map_err(|e| Error::Store(format!("failed to finish CSV export: {}", e)))?;
    }
    Ok(buf)
}
