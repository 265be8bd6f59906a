// Record providers.
//
// Two interchangeable ways to get a department's rows:
// - `BackendSource`: the Apps Script web app, which answers with a JSON
//   envelope `{ok, records, error?}`.
// - `SheetSource`: the spreadsheet's own CSV export, decoded locally.
//
// Both fail the same way. `load_records` turns any failure into an empty
// set plus a message, so nothing half-parsed ever reaches the charts.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::loader::decode_csv;
use crate::types::{Department, Record};

pub const DEFAULT_SHEETS_BASE_URL: &str = "https://docs.google.com/";

/// Errors from fetching department records.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Please enter your Google Sheets ID")]
    MissingSheetId,
    #[error("Failed to fetch data: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Failed to fetch data: {0}")]
    Status(u16),
    #[error("Backend error: {0}")]
    Backend(String),
    #[error("Malformed response: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("Invalid source URL: {0}")]
    InvalidUrl(String),
}

/// Anything that can produce the rows of one department tab.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Short name for logs.
    fn label(&self) -> &'static str;

    async fn fetch(&self, department: Department) -> Result<Vec<Record>, SourceError>;
}

/// Build the shared HTTP client.
pub fn http_client(timeout: Duration) -> Result<Client, SourceError> {
    Ok(Client::builder().timeout(timeout).build()?)
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    records: Vec<Record>,
    #[serde(default)]
    error: Option<String>,
}

/// Unwrap a backend response body.
pub fn parse_envelope(body: &str) -> Result<Vec<Record>, SourceError> {
    let envelope: Envelope = serde_json::from_str(body)?;
    if envelope.ok {
        Ok(envelope.records)
    } else {
        Err(SourceError::Backend(
            envelope.error.unwrap_or_else(|| "Unknown error".to_string()),
        ))
    }
}

pub struct BackendSource {
    client: Client,
    endpoint: String,
    secret: String,
}

impl BackendSource {
    pub fn new(client: Client, endpoint: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            secret: secret.into(),
        }
    }
}

#[async_trait]
impl RecordSource for BackendSource {
    fn label(&self) -> &'static str {
        "backend"
    }

    async fn fetch(&self, department: Department) -> Result<Vec<Record>, SourceError> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("action", "list_all"),
                ("secret", self.secret.as_str()),
                ("department", department.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }
        let body = resp.text().await?;
        let records = parse_envelope(&body)?;
        debug!(department = %department, rows = records.len(), "backend returned records");
        Ok(records)
    }
}

pub struct SheetSource {
    client: Client,
    base_url: String,
    sheet_id: String,
}

impl SheetSource {
    pub fn new(client: Client, base_url: impl Into<String>, sheet_id: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            sheet_id: sheet_id.into(),
        }
    }

    /// CSV export URL for one tab: `{base}spreadsheets/d/{id}/gviz/tq?tqx=out:csv&sheet={tab}`.
    pub fn export_url(&self, department: Department) -> Result<Url, SourceError> {
        let sheet_id = self.sheet_id.trim();
        if sheet_id.is_empty() {
            return Err(SourceError::MissingSheetId);
        }
        let base = Url::parse(&self.base_url).map_err(|e| SourceError::InvalidUrl(e.to_string()))?;
        let mut url = base
            .join(&format!("spreadsheets/d/{}/gviz/tq", sheet_id))
            .map_err(|e| SourceError::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("tqx", "out:csv")
            .append_pair("sheet", department.as_str());
        Ok(url)
    }
}

#[async_trait]
impl RecordSource for SheetSource {
    fn label(&self) -> &'static str {
        "sheets"
    }

    async fn fetch(&self, department: Department) -> Result<Vec<Record>, SourceError> {
        let url = self.export_url(department)?;
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }
        let text = resp.text().await?;
        let records = decode_csv(&text);
        debug!(department = %department, rows = records.len(), "decoded sheet export");
        Ok(records)
    }
}

/// Result of one load: the rows, or an empty set and a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Fetched {
    pub records: Vec<Record>,
    pub error: Option<String>,
}

/// Fetch and degrade: failures are logged and come back as an empty set
/// with a short message for the user.
pub async fn load_records(source: &dyn RecordSource, department: Department) -> Fetched {
    match source.fetch(department).await {
        Ok(records) => {
            info!(source = source.label(), department = %department, rows = records.len(), "loaded records");
            Fetched {
                records,
                error: None,
            }
        }
        Err(e) => {
            warn!(source = source.label(), department = %department, error = %e, "fetch failed");
            Fetched {
                records: Vec::new(),
                error: Some(e.to_string()),
            }
        }
    }
}
