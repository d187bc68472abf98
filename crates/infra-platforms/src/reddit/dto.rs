// Reddit JSON shapes

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use subsync_core::domain::{ContentItem, ContentKind, Platform, Subscription};

#[derive(Debug, Deserialize)]
pub(super) struct ListingDto<T> {
    pub(super) data: ListingDataDto<T>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ListingDataDto<T> {
    #[serde(default = "Vec::new")]
    pub(super) children: Vec<ChildDto<T>>,
    #[serde(default)]
    pub(super) after: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChildDto<T> {
    pub(super) data: T,
}

#[derive(Debug, Deserialize)]
pub(super) struct SubredditDto {
    pub(super) display_name: String,
    pub(super) url: String,
    #[serde(default)]
    pub(super) subscribers: Option<u64>,
    #[serde(default)]
    pub(super) public_description: Option<String>,
    #[serde(default)]
    pub(super) icon_img: Option<String>,
    #[serde(default)]
    pub(super) community_icon: Option<String>,
}

impl SubredditDto {
    pub(super) fn into_subscription(self) -> Subscription {
        let thumbnail_url = [self.icon_img, self.community_icon]
            .into_iter()
            .flatten()
            .find(|url| !url.is_empty());

        Subscription {
            id: self.display_name.clone(),
            name: self.display_name.clone(),
            display_name: format!("r/{}", self.display_name),
            url: format!("https://reddit.com{}", self.url),
            subscriber_count: self.subscribers,
            description: self.public_description.filter(|d| !d.is_empty()),
            platform: Platform::Reddit,
            thumbnail_url,
        }
    }
}

/// Saved listing entry (posts `t3_*`; comments `t1_*` carry `link_*` fields)
#[derive(Debug, Deserialize)]
pub(super) struct SavedDto {
    pub(super) id: String,
    pub(super) name: String,
    #[serde(default)]
    pub(super) title: Option<String>,
    #[serde(default)]
    pub(super) link_title: Option<String>,
    #[serde(default)]
    pub(super) url: Option<String>,
    #[serde(default)]
    pub(super) permalink: Option<String>,
    #[serde(default)]
    pub(super) created_utc: f64,
    #[serde(default)]
    pub(super) author: Option<String>,
}

impl SavedDto {
    pub(super) fn into_content(self) -> ContentItem {
        let title = self
            .title
            .or(self.link_title)
            .unwrap_or_else(|| self.name.clone());
        let url = self
            .url
            .or_else(|| self.permalink.map(|p| format!("https://reddit.com{}", p)))
            .unwrap_or_default();
        let created_at = DateTime::<Utc>::from_timestamp(self.created_utc as i64, 0)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

        ContentItem {
            id: self.id,
            name: self.name,
            title,
            url,
            platform: Platform::Reddit,
            kind: ContentKind::Post,
            created_at,
            author: self.author,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct AboutDto {
    #[serde(default)]
    pub(super) data: Option<AboutDataDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct AboutDataDto {
    #[serde(default)]
    pub(super) user_is_subscriber: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(super) struct MeDto {
    pub(super) name: String,
}

/// Every error code a Reddit error body can carry
///
/// Covers `{"reason": ..}`, `{"error": ..}`, `{"message": ..}` and the
/// `{"json": {"errors": [["CODE", "text", "field"]]}}` form.
/// Returns `None` when the body is not JSON.
pub(super) fn error_codes(body: &[u8]) -> Option<Vec<String>> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let mut codes = Vec::new();

    for key in ["reason", "error", "message", "explanation"] {
        if let Some(code) = value.get(key).and_then(Value::as_str) {
            codes.push(code.to_string());
        }
    }
    if let Some(errors) = value
        .get("json")
        .and_then(|j| j.get("errors"))
        .and_then(Value::as_array)
    {
        for entry in errors {
            if let Some(code) = entry.get(0).and_then(Value::as_str) {
                codes.push(code.to_string());
            }
        }
    }
    Some(codes)
}
