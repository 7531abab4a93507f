//! Page metadata fetching.
//!
//! Real page fetching is out of scope; [`MockMetadataProvider`] returns
//! canned titles and descriptions after a simulated network delay. The fetch
//! lifecycle itself (validation, single in-flight request, merge on success)
//! lives on [`crate::SnippetModel`] and is driven by [`crate::Session`].

use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use log::debug;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

/// Metadata returned for a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResult {
    pub title: String,
    pub description: String,
    pub favicon: Option<String>,
}

/// Where the model is in the fetch lifecycle
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FetchState {
    #[default]
    Idle,
    Pending { url: Url, ticket: u64 },
    Succeeded { url: Url },
    Failed { url: Url, reason: String },
}

impl FetchState {
    pub fn is_pending(&self) -> bool {
        matches!(self, FetchState::Pending { .. })
    }
}

/// Proof that a fetch was started; handed back to complete it.
#[derive(Debug)]
pub struct FetchTicket {
    pub(crate) id: u64,
    pub(crate) url: Url,
}

impl FetchTicket {
    /// The normalized URL the request should be issued for.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// Trim the raw input, add `https://` when no scheme is present and parse it.
///
/// Blank input and URLs without a host are rejected with
/// [`Error::Validation`].
pub fn normalize_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation("URL is empty".into()));
    }
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    let url = Url::parse(&candidate)
        .map_err(|e| Error::Validation(format!("{}: {}", trimmed, e)))?;
    if url.host_str().map_or(true, str::is_empty) {
        return Err(Error::Validation(format!("{}: missing host", trimmed)));
    }
    Ok(url)
}

/// Source of page metadata
pub trait MetadataProvider: Send + Sync {
    /// Look up title, description and favicon for a normalized URL.
    fn fetch<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<FetchResult>>;
}

/// Deterministic provider with a fixed response table and simulated latency
#[derive(Debug, Clone)]
pub struct MockMetadataProvider {
    delay: Duration,
}

impl MockMetadataProvider {
    pub const DEFAULT_DELAY_MS: u64 = 1500;

    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Resolve the canned response synchronously (no delay).
    pub fn lookup(url: &Url) -> FetchResult {
        let favicon = format!("{}://{}/favicon.ico", url.scheme(), host_with_port(url));
        let key = url.as_str().trim_end_matches('/');
        let (title, description) = match key {
            "https://example.com" => (
                "Example Domain - Your Website Title Here",
                "This domain is for use in illustrative examples in documents. You may use this domain in literature without prior coordination or asking for permission.",
            ),
            "https://www.200oksolutions.co.uk" => (
                "200 OK Solutions - Professional Web Development Services",
                "Expert web development and digital solutions. We create modern, responsive websites and applications tailored to your business needs.",
            ),
            _ => (
                "Website Title - Professional Services",
                "This is a sample meta description that would be fetched from the actual website. It provides a brief overview of what the page contains.",
            ),
        };
        FetchResult {
            title: title.to_string(),
            description: description.to_string(),
            favicon: Some(favicon),
        }
    }
}

impl Default for MockMetadataProvider {
    fn default() -> Self {
        Self::new(Duration::from_millis(Self::DEFAULT_DELAY_MS))
    }
}

fn host_with_port(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

impl MetadataProvider for MockMetadataProvider {
    fn fetch<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<FetchResult>> {
        async move {
            debug!("Fetching metadata for {}", url);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(Self::lookup(url))
        }
        .boxed()
    }
}

/// Provider that always fails; useful for exercising the error path
#[derive(Debug, Clone)]
pub struct FailingMetadataProvider {
    reason: String,
}

impl FailingMetadataProvider {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl MetadataProvider for FailingMetadataProvider {
    fn fetch<'a>(&'a self, _url: &'a Url) -> BoxFuture<'a, Result<FetchResult>> {
        let reason = self.reason.clone();
        async move { Err(Error::Fetch(reason)) }.boxed()
    }
}
