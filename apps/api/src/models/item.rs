use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle of a saved item. Only PENDING and PROCESSING rows may be updated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "PENDING",
            ItemStatus::Processing => "PROCESSING",
            ItemStatus::Completed => "COMPLETED",
            ItemStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ItemStatus::Pending),
            "PROCESSING" => Ok(ItemStatus::Processing),
            "COMPLETED" => Ok(ItemStatus::Completed),
            "FAILED" => Ok(ItemStatus::Failed),
            other => Err(anyhow::anyhow!("unknown item status '{other}'")),
        }
    }
}

/// Raw `saved_items` row. Status is stored as text.
#[derive(Debug, Clone, FromRow)]
pub struct SavedItemRow {
    pub id: Uuid,
    pub user_id: String,
    pub url: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub og_image: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedItem {
    pub id: Uuid,
    pub user_id: String,
    pub url: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub og_image: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub status: ItemStatus,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<SavedItemRow> for SavedItem {
    type Error = anyhow::Error;

    fn try_from(row: SavedItemRow) -> Result<Self, Self::Error> {
        Ok(SavedItem {
            status: row.status.parse()?,
            id: row.id,
            user_id: row.user_id,
            url: row.url,
            title: row.title,
            content: row.content,
            author: row.author,
            og_image: row.og_image,
            published_at: row.published_at,
            created_at: row.created_at,
        })
    }
}

/// A row about to be inserted: only the URL, the owner and the starting status.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub user_id: String,
    pub url: String,
    pub status: ItemStatus,
}

/// Fields written when an extraction completes. Every one is independently optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedFields {
    pub title: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub og_image: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// The single update a pipeline run applies to an item.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemUpdate {
    Completed(ExtractedFields),
    /// Status only; extracted fields stay null.
    Failed,
}

impl ItemUpdate {
    pub fn status(&self) -> ItemStatus {
        match self {
            ItemUpdate::Completed(_) => ItemStatus::Completed,
            ItemUpdate::Failed => ItemStatus::Failed,
        }
    }
}
