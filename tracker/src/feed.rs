//! Allocation feed client.

use std::path::Path;
use std::time::Duration;

use allocsync::AllocationSnapshot;
use log::debug;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Source of allocation snapshots. Called once per cycle.
pub trait Feed {
    /// Fetch the current snapshot. Any failure is an [`Error::Fetch`].
    fn fetch(&self) -> Result<AllocationSnapshot>;
}

impl<F: Feed + ?Sized> Feed for &F {
    fn fetch(&self) -> Result<AllocationSnapshot> {
        (**self).fetch()
    }
}

/// GET a JSON feed over HTTP with a bounded timeout.
pub struct HttpFeed {
    client: Client,
    url: String,
}

impl HttpFeed {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Fetch(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Feed for HttpFeed {
    fn fetch(&self) -> Result<AllocationSnapshot> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| Error::Fetch(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Fetch(format!("feed returned {status}")));
        }

        let body = resp.text().map_err(|e| Error::Fetch(e.to_string()))?;
        debug!("feed: {} bytes", body.len());
        parse_envelope(&body)
    }
}

#[derive(Deserialize)]
struct Envelope {
    data: Option<AllocationSnapshot>,
}

/// Parse a feed response body: `{"data": {"record_items": [...], ...}}`.
///
/// A missing or null `data` field, malformed JSON, or a snapshot that fails
/// validation are all fetch failures.
pub fn parse_envelope(body: &str) -> Result<AllocationSnapshot> {
    let envelope: Envelope =
        serde_json::from_str(body).map_err(|e| Error::Fetch(format!("malformed feed body: {e}")))?;
    let snapshot = envelope
        .data
        .ok_or_else(|| Error::Fetch("feed body has no data field".into()))?;
    snapshot
        .validate()
        .map_err(|e| Error::Fetch(format!("invalid snapshot: {e}")))?;
    Ok(snapshot)
}

/// Parse a snapshot document from disk, accepting either the feed envelope
/// or a bare snapshot object.
pub fn load_document(path: &Path) -> Result<AllocationSnapshot> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::SnapshotRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_document(&contents)
}

/// Lenient counterpart of [`parse_envelope`] for offline use.
pub fn parse_document(contents: &str) -> Result<AllocationSnapshot> {
    let value: serde_json::Value = serde_json::from_str(contents)?;
    let inner = match value.get("data") {
        Some(data) if data.is_object() => data.clone(),
        _ => value,
    };
    let snapshot: AllocationSnapshot = serde_json::from_value(inner)?;
    snapshot.validate()?;
    Ok(snapshot)
}
