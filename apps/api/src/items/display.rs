use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::item::{ItemStatus, SavedItem};

/// Badge colour for a status.
pub fn status_tone(status: ItemStatus) -> &'static str {
    match status {
        ItemStatus::Completed => "emerald",
        ItemStatus::Processing => "blue",
        ItemStatus::Pending => "amber",
        ItemStatus::Failed => "red",
    }
}

/// `Jan 15, 2024`
pub fn format_display_date(date: DateTime<Utc>) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// An item as returned by the API: the stored record plus display hints.
#[derive(Debug, Clone, Serialize)]
pub struct ItemView {
    #[serde(flatten)]
    pub item: SavedItem,
    pub status_tone: &'static str,
    pub published_label: Option<String>,
    pub created_label: String,
}

impl From<SavedItem> for ItemView {
    fn from(item: SavedItem) -> Self {
        ItemView {
            status_tone: status_tone(item.status),
            published_label: item.published_at.map(format_display_date),
            created_label: format_display_date(item.created_at),
            item,
        }
    }
}
