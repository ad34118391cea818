//! Normalized catalog records
//!
//! The listing API returns items with source-specific field names; a
//! [`RecordNormalizer`] maps each one onto the fixed [`Record`] schema and tags
//! it with the page it came from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Column order used by tabular output
pub const RECORD_COLUMNS: [&str; 16] = [
    "id",
    "aid",
    "title",
    "description",
    "duration",
    "views",
    "danmaku",
    "comments",
    "favorites",
    "coins",
    "shares",
    "likes",
    "created",
    "cover_url",
    "url",
    "page",
];

/// One content item of a catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Stable identifier (bvid)
    pub id: String,
    /// Numeric archive id
    pub aid: u64,
    pub title: String,
    pub description: String,
    /// Duration as reported by the API, e.g. `"12:34"`
    pub duration: String,
    pub views: u64,
    pub danmaku: u64,
    pub comments: u64,
    pub favorites: u64,
    pub coins: u64,
    pub shares: u64,
    pub likes: u64,
    /// Creation time as a Unix timestamp in seconds
    pub created: i64,
    pub cover_url: String,
    /// Canonical URL of the item
    pub url: String,
    /// Page the item was returned on (1-based)
    pub page: u32,
}

impl Record {
    /// Creation time, if the timestamp is representable
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.created, 0)
    }

    /// Field values in [`RECORD_COLUMNS`] order
    pub fn fields(&self) -> [String; 16] {
        [
            self.id.clone(),
            self.aid.to_string(),
            self.title.clone(),
            self.description.clone(),
            self.duration.clone(),
            self.views.to_string(),
            self.danmaku.to_string(),
            self.comments.to_string(),
            self.favorites.to_string(),
            self.coins.to_string(),
            self.shares.to_string(),
            self.likes.to_string(),
            self.created.to_string(),
            self.cover_url.clone(),
            self.url.clone(),
            self.page.to_string(),
        ]
    }
}

/// Maps raw listing items onto [`Record`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordNormalizer {
    url_base: String,
}

impl Default for RecordNormalizer {
    fn default() -> Self {
        Self::new("https://www.bilibili.com/video/")
    }
}

impl RecordNormalizer {
    /// Create a normalizer that builds canonical URLs from `url_base`
    pub fn new(url_base: impl Into<String>) -> Self {
        Self {
            url_base: url_base.into(),
        }
    }

    /// Normalize one raw item returned on `page`
    pub fn normalize(&self, item: &Value, page: u32) -> Record {
        let id = text(item, "bvid");
        let url = format!("{}{}", self.url_base, id);

        Record {
            aid: count(item, "aid"),
            title: text(item, "title"),
            description: text(item, "description"),
            duration: ["length", "duration"]
                .iter()
                .map(|key| text(item, key))
                .find(|value| !value.is_empty())
                .unwrap_or_default(),
            views: count(item, "play"),
            danmaku: count(item, "video_review"),
            comments: count(item, "comment"),
            favorites: count(item, "favorites"),
            coins: count(item, "coins"),
            shares: count(item, "share"),
            likes: count(item, "like"),
            created: item.get("created").and_then(Value::as_i64).unwrap_or(0),
            cover_url: text(item, "pic"),
            id,
            url,
            page,
        }
    }
}

/// String field; numbers are rendered, anything else is empty
fn text(item: &Value, key: &str) -> String {
    match item.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Counter field; hidden counters (e.g. `"--"`) read as zero
fn count(item: &Value, key: &str) -> u64 {
    match item.get(key) {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}
