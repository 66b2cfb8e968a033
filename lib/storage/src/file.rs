use crate::store::FeedbackStore;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;
use vitrine_core::{Error, FeedbackId, FeedbackRow, Result, StoredFeedback};

/// Append-only JSON-lines feedback log for local use.
/// One line per row, flushed and fdatasync'ed on every insert.
pub struct FileFeedbackStore {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl FileFeedbackStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, line: &[u8]) -> Result<()> {
        let mut writer = self.writer.lock();
        writer.write_all(line)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        writer.get_ref().sync_data()?;
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<StoredFeedback>> {
        // Hold the writer lock so a concurrent append is never read half-written
        let _guard = self.writer.lock();
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut rows = Vec::new();
        for (lineno, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let row: StoredFeedback = serde_json::from_str(&line).map_err(|e| {
                Error::Store(format!("{}:{}: {}", self.path.display(), lineno + 1, e))
            })?;
            rows.push(row);
        }
        Ok(rows)
    }
}

#[async_trait]
impl FeedbackStore for FileFeedbackStore {
    async fn insert(&self, row: &FeedbackRow) -> Result<()> {
        let stored = StoredFeedback {
            id: Some(FeedbackId::Uuid(Uuid::new_v4())),
            created_at: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)),
            row: row.clone(),
        };
        let line = serde_json::to_vec(&stored)?;
        self.append(&line)
    }

    async fn select_all(&self) -> Result<Vec<StoredFeedback>> {
        self.read_all()
    }

    fn backend(&self) -> &'static str {
        "file"
    }
}
