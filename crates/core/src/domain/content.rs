// Saved content (posts, videos, playlists) and its export snapshot

use crate::domain::Platform;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Export document format version
pub const CONTENT_SNAPSHOT_VERSION: &str = "2.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Post,
    Video,
    Playlist,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: String,
    /// Platform fullname used by mutation endpoints (e.g. Reddit `t3_abc`)
    pub name: String,
    pub title: String,
    pub url: String,
    pub platform: Platform,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// Flat JSON export of an account's saved content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSnapshot {
    pub version: String,
    pub platform: Platform,
    pub exported_at: DateTime<Utc>,
    pub username: String,
    pub content: Vec<ContentItem>,
}

impl ContentSnapshot {
    pub fn new(
        platform: Platform,
        username: impl Into<String>,
        exported_at: DateTime<Utc>,
        content: Vec<ContentItem>,
    ) -> Self {
        Self {
            version: CONTENT_SNAPSHOT_VERSION.to_string(),
            platform,
            exported_at,
            username: username.into(),
            content,
        }
    }

    /// Suggested download name: `<platform>-content-<user>-<date>.json`
    pub fn file_name(&self) -> String {
        format!(
            "{}-content-{}-{}.json",
            self.platform,
            self.username,
            self.exported_at.format("%Y-%m-%d")
        )
    }
}
