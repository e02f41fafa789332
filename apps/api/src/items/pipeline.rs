//! Import pipeline: create a saved item, run it through the extraction
//! service, and record exactly one terminal outcome.
//!
//! Extraction failures never escape: they are logged and recorded as FAILED.
//! Store failures do escape, since nothing downstream can recover from them.

use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extraction::{
    article_schema, DiscoveredLink, ExtractionService, Location, MapOptions, ScrapeOptions,
    MAP_LINK_LIMIT,
};
use crate::items::normalize::extracted_fields;
use crate::items::store::ItemStore;
use crate::items::validation::{validate_url, validate_urls};
use crate::models::item::{ItemStatus, ItemUpdate, NewItem, SavedItem};

#[derive(Clone)]
pub struct ImportPipeline {
    store: Arc<dyn ItemStore>,
    extractor: Arc<dyn ExtractionService>,
    location: Location,
}

impl ImportPipeline {
    pub fn new(
        store: Arc<dyn ItemStore>,
        extractor: Arc<dyn ExtractionService>,
        location: Location,
    ) -> Self {
        Self {
            store,
            extractor,
            location,
        }
    }

    /// Imports one URL. Returns the item in its final COMPLETED or FAILED state.
    pub async fn import_url(&self, user_id: &str, url: &str) -> Result<SavedItem, AppError> {
        let url = validate_url(url)?;
        self.import_one(user_id, &url, ItemStatus::Processing).await
    }

    /// Imports URLs one after another. A failed extraction only fails its own
    /// item; the loop continues. All URLs are validated before anything is created.
    pub async fn import_bulk(&self, user_id: &str, urls: &[String]) -> Result<(), AppError> {
        let urls = validate_urls(urls)?;
        let total = urls.len();
        info!("Bulk import of {total} URLs for user {user_id}");

        for (index, url) in urls.iter().enumerate() {
            let item = self.import_one(user_id, url, ItemStatus::Pending).await?;
            info!(
                "Bulk import {}/{}: {} -> {}",
                index + 1,
                total,
                url,
                item.status
            );
        }
        Ok(())
    }

    /// Lists up to `MAP_LINK_LIMIT` candidate links from a seed URL. Persists
    /// nothing. A failing extraction service yields an empty list.
    pub async fn discover(
        &self,
        url: &str,
        search: Option<&str>,
    ) -> Result<Vec<DiscoveredLink>, AppError> {
        let url = validate_url(url)?;
        let options = MapOptions {
            limit: MAP_LINK_LIMIT,
            search: search
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
            location: self.location.clone(),
        };

        match self.extractor.map(&url, &options).await {
            Ok(mut links) => {
                links.truncate(MAP_LINK_LIMIT);
                info!("Discovered {} links from {url}", links.len());
                Ok(links)
            }
            Err(e) => {
                warn!("Link discovery for {url} failed: {e}");
                Ok(Vec::new())
            }
        }
    }

    pub async fn list_items(&self, user_id: &str) -> Result<Vec<SavedItem>, AppError> {
        self.store.list_for_user(user_id).await
    }

    pub async fn get_item(&self, user_id: &str, id: Uuid) -> Result<SavedItem, AppError> {
        self.store
            .find_for_user(id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Item {id} not found")))
    }

    async fn import_one(
        &self,
        user_id: &str,
        url: &str,
        initial: ItemStatus,
    ) -> Result<SavedItem, AppError> {
        let item = self
            .store
            .create(NewItem {
                user_id: user_id.to_string(),
                url: url.to_string(),
                status: initial,
            })
            .await?;
        info!("Created saved item {} ({initial}) for {url}", item.id);

        let update = match self.extractor.scrape(url, &self.scrape_options()).await {
            Ok(page) => {
                if page.json.is_none() {
                    warn!("No JSON extraction returned for {url}");
                }
                ItemUpdate::Completed(extracted_fields(page))
            }
            Err(e) => {
                error!("Error scraping {url} for item {}: {e}", item.id);
                ItemUpdate::Failed
            }
        };

        self.store.update(item.id, update).await
    }

    fn scrape_options(&self) -> ScrapeOptions {
        ScrapeOptions {
            json_schema: article_schema(),
            only_main_content: true,
            proxy: "auto".to_string(),
            location: self.location.clone(),
        }
    }
}
