//! Archive snapshot records as they appear in the JSON files.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of `{board}/index.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadSummary {
    pub thread_id: u64,
    pub title: String,
    pub username: String,
    pub size: u32,
    pub created_at: String,
    pub updated_at: String,
}

/// Contents of `{board}/{thread}.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadDetail {
    pub thread_id: u64,
    pub title: String,
    pub username: String,
    pub size: u32,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub responses: Vec<Response>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub sequence: u32,
    pub username: String,
    #[serde(default)]
    pub user_id: String,
    pub created_at: String,
    /// HTML fragment as archived
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube: Option<String>,
}

impl ThreadDetail {
    pub fn response(&self, sequence: u32) -> Option<&Response> {
        self.responses.iter().find(|r| r.sequence == sequence)
    }
}

/// Parse an archived timestamp.
///
/// Snapshots carry RFC 3339 strings; older dumps use naive `YYYY-MM-DD HH:MM:SS`
/// (read as UTC) or just a date.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Most recently updated first. Threads with unreadable timestamps sink to the end,
/// and ties keep their snapshot order.
pub fn sort_by_updated_desc(threads: &mut [ThreadSummary]) {
    threads.sort_by_cached_key(|t| std::cmp::Reverse(parse_timestamp(&t.updated_at)));
}
