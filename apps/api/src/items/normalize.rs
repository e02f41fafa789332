//! Normalization of a scrape result into the fields persisted on completion.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::extraction::ScrapedPage;
use crate::models::item::ExtractedFields;

/// ISO datetimes carrying a numeric offset without a colon (`+0530`) or
/// without seconds. RFC 3339 rejects both.
const OFFSET_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%dT%H:%M%z",
];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%MZ",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%A, %B %d, %Y",
    "%d %B %Y",
];

/// Maps a successful scrape onto the persisted fields. Empty strings become `None`.
pub fn extracted_fields(page: ScrapedPage) -> ExtractedFields {
    let metadata = page.metadata.unwrap_or_default();
    let json = page.json.unwrap_or_default();

    ExtractedFields {
        title: non_empty(metadata.title),
        content: non_empty(page.markdown),
        author: non_empty(json.author),
        og_image: non_empty(metadata.og_image),
        published_at: json.published_at.as_deref().and_then(parse_published_at),
    }
}

/// Best-effort date parsing. Unparseable input yields `None`, never an error.
/// Dates without a time are midnight UTC; naive datetimes are taken as UTC.
pub fn parse_published_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return midnight_utc(date);
        }
    }

    partial_date(raw).and_then(midnight_utc)
}

/// A bare year ("2024") or year and month ("2024-01"), pinned to the first day.
fn partial_date(raw: &str) -> Option<NaiveDate> {
    let (year, month) = match raw.split_once('-') {
        Some((year, month)) if month.len() == 2 => (year, month),
        Some(_) => return None,
        None => (raw, "01"),
    };
    if year.len() != 4 || !year.chars().chain(month.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)
}

fn midnight_utc(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
