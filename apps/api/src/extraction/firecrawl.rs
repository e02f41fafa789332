use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{
    DiscoveredLink, ExtractionError, ExtractionService, MapOptions, ScrapeOptions, ScrapedPage,
};

const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT_SECS: u64 = 120;
const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    success: bool,
    #[serde(default)]
    data: Option<ScrapedPage>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MapResponse {
    success: bool,
    #[serde(default)]
    links: Vec<DiscoveredLink>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FirecrawlError {
    error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScrapeRequest<'a> {
    url: &'a str,
    formats: Vec<Value>,
    only_main_content: bool,
    proxy: &'a str,
    location: &'a super::Location,
}

#[derive(Debug, Serialize)]
struct MapRequest<'a> {
    url: &'a str,
    limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<&'a str>,
    location: &'a super::Location,
}

/// Client for a Firecrawl-compatible v2 REST API.
/// Retries on 429 and 5xx with exponential backoff; other failures return immediately.
#[derive(Clone)]
pub struct FirecrawlClient {
    client: Client,
    base_url: String,
    api_key: String,
    retry_delay: Duration,
}

impl FirecrawlClient {
    pub fn new(base_url: &str, api_key: String) -> Result<Self, ExtractionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self::with_client(client, base_url, api_key, RETRY_BASE_DELAY))
    }

    fn with_client(
        client: Client,
        base_url: &str,
        api_key: String,
        retry_delay: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            retry_delay,
        }
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ExtractionError> {
        let endpoint = format!("{}{}", self.base_url, path);
        let mut last_error: Option<ExtractionError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = backoff_delay(self.retry_delay, attempt);
                warn!(
                    "Extraction call to {} attempt {} failed, retrying after {}ms...",
                    path,
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&endpoint)
                .bearer_auth(&self.api_key)
                .json(body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(ExtractionError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Extraction API returned {}: {}", status, body);
                last_error = Some(ExtractionError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ExtractionError::Api {
                    status: status.as_u16(),
                    message: error_message(&body),
                });
            }

            let text = response.text().await?;
            debug!("Extraction call to {} succeeded ({} bytes)", path, text.len());
            return Ok(serde_json::from_str(&text)?);
        }

        Err(last_error.unwrap_or(ExtractionError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

#[async_trait]
impl ExtractionService for FirecrawlClient {
    async fn scrape(
        &self,
        url: &str,
        options: &ScrapeOptions,
    ) -> Result<ScrapedPage, ExtractionError> {
        let response: ScrapeResponse = self.post("/v2/scrape", &scrape_request(url, options)).await?;
        if !response.success {
            return Err(ExtractionError::Unsuccessful(
                response.error.unwrap_or_else(|| "scrape failed".to_string()),
            ));
        }
        Ok(response.data.unwrap_or_default())
    }

    async fn map(
        &self,
        url: &str,
        options: &MapOptions,
    ) -> Result<Vec<DiscoveredLink>, ExtractionError> {
        let response: MapResponse = self.post("/v2/map", &map_request(url, options)).await?;
        if !response.success {
            return Err(ExtractionError::Unsuccessful(
                response.error.unwrap_or_else(|| "map failed".to_string()),
            ));
        }
        Ok(response.links)
    }
}

fn scrape_request<'a>(url: &'a str, options: &'a ScrapeOptions) -> ScrapeRequest<'a> {
    ScrapeRequest {
        url,
        formats: vec![
            json!("markdown"),
            json!({ "type": "json", "schema": options.json_schema }),
        ],
        only_main_content: options.only_main_content,
        proxy: &options.proxy,
        location: &options.location,
    }
}

fn map_request<'a>(url: &'a str, options: &'a MapOptions) -> MapRequest<'a> {
    MapRequest {
        url,
        limit: options.limit,
        search: options.search.as_deref(),
        location: &options.location,
    }
}

/// Exponential backoff before retry `attempt` (1-based): base, 2 x base, ...
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base * (1 << (attempt - 1))
}

/// Pulls `error` out of a Firecrawl error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<FirecrawlError>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| body.to_string())
}
