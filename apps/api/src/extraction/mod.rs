//! Extraction Service: the hosted API that turns a URL into page content,
//! metadata and a schema-constrained JSON extraction, and that can enumerate
//! links reachable from a seed URL.
//!
//! The pipeline only sees the `ExtractionService` trait. `FirecrawlClient` is
//! the production backend; tests script their own.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

pub mod firecrawl;

pub use firecrawl::FirecrawlClient;

/// Upper bound on links returned by a single discover call.
pub const MAP_LINK_LIMIT: usize = 5;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Extraction service reported failure: {0}")]
    Unsuccessful(String),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },
}

/// Geographic hint forwarded with every scrape/map request.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Location {
    pub country: String,
    pub languages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeOptions {
    /// JSON schema the service should fill in alongside the markdown.
    pub json_schema: Value,
    pub only_main_content: bool,
    pub proxy: String,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapOptions {
    pub limit: usize,
    pub search: Option<String>,
    pub location: Location,
}

/// Decodes a field that the service does not always type consistently. A value
/// of the wrong shape (an author list, a numeric date) reads as absent rather
/// than failing the whole page.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// Schema-constrained extraction. Either field may be missing, null or mistyped.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedJson {
    #[serde(default, deserialize_with = "lenient")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub published_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub og_image: Option<String>,
}

/// The result of a scrape. Every part is optional.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ScrapedPage {
    #[serde(default, deserialize_with = "lenient")]
    pub markdown: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub json: Option<ExtractedJson>,
    #[serde(default, deserialize_with = "lenient")]
    pub metadata: Option<PageMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscoveredLink {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[async_trait]
pub trait ExtractionService: Send + Sync {
    async fn scrape(
        &self,
        url: &str,
        options: &ScrapeOptions,
    ) -> Result<ScrapedPage, ExtractionError>;

    async fn map(
        &self,
        url: &str,
        options: &MapOptions,
    ) -> Result<Vec<DiscoveredLink>, ExtractionError>;
}

/// JSON schema for the `author` / `publishedAt` extraction.
pub fn article_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "author": { "type": ["string", "null"] },
            "publishedAt": { "type": ["string", "null"] }
        },
        "required": ["author", "publishedAt"]
    })
}
