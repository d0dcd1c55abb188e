//! Feed Sources
//!
//! Adapters that fetch one raw JSON document per feed per cycle. They only
//! deal with transport; shape checks happen in the pipeline so every source
//! is judged by the same decoder.
//!
//! A location starting with `http://` or `https://` is fetched over HTTP,
//! anything else is read as a local file.

use crate::error::FeedKind;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Source of one feed document
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch the current document
    async fn fetch(&self) -> Result<Value>;

    /// Human-readable location for logging
    fn describe(&self) -> String;
}

/// JSON document on the local filesystem
pub struct JsonFileFeed {
    path: PathBuf,
}

impl JsonFileFeed {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FeedSource for JsonFileFeed {
    async fn fetch(&self) -> Result<Value> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read feed file {}", self.path.display()))?;
        let value = serde_json::from_str(&raw)
            .with_context(|| format!("Feed file {} is not valid JSON", self.path.display()))?;
        Ok(value)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// JSON document served over HTTP(S)
pub struct HttpFeed {
    url: String,
    client: reqwest::Client,
}

impl HttpFeed {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl FeedSource for HttpFeed {
    async fn fetch(&self) -> Result<Value> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("GET {} failed", self.url))?
            .error_for_status()
            .with_context(|| format!("GET {} returned an error status", self.url))?;

        let value = response
            .json::<Value>()
            .await
            .with_context(|| format!("Response from {} is not valid JSON", self.url))?;
        Ok(value)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Build the adapter for a configured location
pub fn feed_from_location(location: &str, http_timeout: Duration) -> Result<Arc<dyn FeedSource>> {
    let location = location.trim();
    if location.starts_with("http://") || location.starts_with("https://") {
        Ok(Arc::new(HttpFeed::new(location, http_timeout)?))
    } else {
        Ok(Arc::new(JsonFileFeed::new(location)))
    }
}

/// The feeds polled on every cycle. Only the base feed is mandatory.
#[derive(Clone)]
pub struct FeedSet {
    pub base: Arc<dyn FeedSource>,
    pub wallet: Option<Arc<dyn FeedSource>>,
    pub il: Option<Arc<dyn FeedSource>>,
}

impl FeedSet {
    pub fn new(base: Arc<dyn FeedSource>) -> Self {
        Self {
            base,
            wallet: None,
            il: None,
        }
    }

    pub fn with_wallet(mut self, wallet: Arc<dyn FeedSource>) -> Self {
        self.wallet = Some(wallet);
        self
    }

    pub fn with_il(mut self, il: Arc<dyn FeedSource>) -> Self {
        self.il = Some(il);
        self
    }

    pub fn source(&self, kind: FeedKind) -> Option<&Arc<dyn FeedSource>> {
        match kind {
            FeedKind::Base => Some(&self.base),
            FeedKind::Wallet => self.wallet.as_ref(),
            FeedKind::Il => self.il.as_ref(),
        }
    }

    /// Fetch one optional feed. `None` when disabled; a transport error is
    /// returned to the caller, which decides whether it is fatal.
    pub async fn fetch_optional(&self, kind: FeedKind) -> Option<Result<Value>> {
        let source = self.source(kind)?;
        debug!("Fetching {} feed from {}", kind, source.describe());
        Some(source.fetch().await)
    }
}

impl std::fmt::Debug for FeedSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedSet")
            .field("base", &self.base.describe())
            .field("wallet", &self.wallet.as_ref().map(|s| s.describe()))
            .field("il", &self.il.as_ref().map(|s| s.describe()))
            .finish()
    }
}
