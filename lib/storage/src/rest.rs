// PostgREST-compatible feedback table over HTTP
use crate::store::FeedbackStore;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use vitrine_core::{Error, FeedbackRow, Result, StoredFeedback};

const REST_PREFIX: &str = "rest/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Hosted PostgREST caps responses, commonly at 1000 rows
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Connection settings for a hosted REST table
#[derive(Clone)]
pub struct RestStoreConfig {
    /// Project base URL, e.g. `https://xyz.example.co`
    pub url: String,
    pub api_key: String,
    pub table: String,
}

impl std::fmt::Debug for RestStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestStoreConfig")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("table", &self.table)
            .finish()
    }
}

pub struct RestFeedbackStore {
    client: Client,
    table_url: String,
    page_size: usize,
}

impl RestFeedbackStore {
    pub fn new(config: RestStoreConfig) -> Result<Self> {
        if config.url.trim().is_empty() {
            return Err(Error::InvalidConfig("feedback store URL is empty".to_string()));
        }
        if config.api_key.trim().is_empty() {
            return Err(Error::InvalidConfig("feedback store key is empty".to_string()));
        }
        if config.table.trim().is_empty() {
            return Err(Error::InvalidConfig("feedback table name is empty".to_string()));
        }

        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&config.api_key)
            .map_err(|_| Error::InvalidConfig("feedback store key is not a valid header value".to_string()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|_| Error::InvalidConfig("feedback store key is not a valid header value".to_string()))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("failed to build HTTP client: {}", e)))?;

        let table_url = format!(
            "{}/{}/{}",
            config.url.trim_end_matches('/'),
            REST_PREFIX,
            config.table
        );

        Ok(Self {
            client,
            table_url,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Rows requested per `select_all` round trip. Zero is treated as one.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn table_url(&self) -> &str {
        &self.table_url
    }
}

fn status_error(action: &str, status: StatusCode, body: &str) -> Error {
    let body = body.trim();
    if body.is_empty() {
        Error::Transport(format!("{} failed: HTTP {}", action, status))
    } else {
        Error::Transport(format!("{} failed: HTTP {}: {}", action, status, body))
    }
}

#[async_trait]
impl FeedbackStore for RestFeedbackStore {
    async fn insert(&self, row: &FeedbackRow) -> Result<()> {
        let response = self
            .client
            .post(&self.table_url)
            .header("Prefer", "return=minimal")
            .json(row)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("insert failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error("insert", status, &body));
        }
        Ok(())
    }

    async fn select_all(&self) -> Result<Vec<StoredFeedback>> {
        let limit = self.page_size.to_string();
        let mut rows = Vec::new();

        loop {
            let offset = rows.len().to_string();
            let response = self
                .client
                .get(&self.table_url)
                .query(&[
                    ("select", "*"),
                    ("order", "id.asc"),
                    ("limit", limit.as_str()),
                    ("offset", offset.as_str()),
                ])
                .send()
                .await
                .map_err(|e| Error::Transport(format!("select failed: {}", e)))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(status_error("select", status, &body));
            }

            let page = response
                .json::<Vec<StoredFeedback>>()
                .await
                .map_err(|e| Error::Transport(format!("invalid select response: {}", e)))?;
            let done = page.len() < self.page_size;
            rows.extend(page);
            if done {
                break;
            }
        }

        tracing::debug!(rows = rows.len(), "feedback rows fetched");
        Ok(rows)
    }

    fn backend(&self) -> &'static str {
        "rest"
    }
}
