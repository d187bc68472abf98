// YouTube Data API v3 / Google OAuth JSON shapes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use subsync_core::domain::{ContentItem, ContentKind, Platform, Subscription};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PageDto<T> {
    #[serde(default = "Vec::new")]
    pub(super) items: Vec<T>,
    #[serde(default)]
    pub(super) next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct ThumbnailsDto {
    #[serde(default)]
    pub(super) default: Option<ThumbnailDto>,
    #[serde(default)]
    pub(super) medium: Option<ThumbnailDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ThumbnailDto {
    pub(super) url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SubscriptionDto {
    #[serde(default)]
    pub(super) id: String,
    #[serde(default)]
    pub(super) snippet: Option<SubscriptionSnippetDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SubscriptionSnippetDto {
    #[serde(default)]
    pub(super) title: String,
    #[serde(default)]
    pub(super) description: Option<String>,
    pub(super) resource_id: ResourceIdDto,
    #[serde(default)]
    pub(super) thumbnails: ThumbnailsDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ResourceIdDto {
    pub(super) channel_id: String,
}

impl SubscriptionSnippetDto {
    pub(super) fn into_subscription(self, stats: &HashMap<String, u64>) -> Subscription {
        let channel_id = self.resource_id.channel_id;
        let thumbnail_url = self
            .thumbnails
            .medium
            .or(self.thumbnails.default)
            .map(|t| t.url);

        Subscription {
            id: channel_id.clone(),
            name: self.title.clone(),
            display_name: self.title,
            url: format!("https://www.youtube.com/channel/{}", channel_id),
            subscriber_count: stats.get(&channel_id).copied(),
            description: self.description.filter(|d| !d.is_empty()),
            platform: Platform::Youtube,
            thumbnail_url,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ChannelStatsDto {
    pub(super) id: String,
    #[serde(default)]
    pub(super) statistics: Option<StatisticsDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct StatisticsDto {
    /// Sent as a decimal string
    #[serde(default)]
    pub(super) subscriber_count: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ChannelDto {
    pub(super) id: String,
    #[serde(default)]
    pub(super) snippet: Option<ChannelSnippetDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ChannelSnippetDto {
    #[serde(default)]
    pub(super) title: Option<String>,
    #[serde(default)]
    pub(super) custom_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UserInfoDto {
    #[serde(default)]
    pub(super) name: Option<String>,
    #[serde(default)]
    pub(super) email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PlaylistDto {
    pub(super) id: String,
    pub(super) snippet: PlaylistSnippetDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PlaylistSnippetDto {
    pub(super) title: String,
    #[serde(default)]
    pub(super) channel_title: Option<String>,
    #[serde(default)]
    pub(super) published_at: Option<DateTime<Utc>>,
}

impl PlaylistDto {
    pub(super) fn into_content(self) -> ContentItem {
        ContentItem {
            url: format!("https://www.youtube.com/playlist?list={}", self.id),
            id: self.id,
            name: self.snippet.title.clone(),
            title: self.snippet.title,
            platform: Platform::Youtube,
            kind: ContentKind::Playlist,
            created_at: self
                .snippet
                .published_at
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            author: self.snippet.channel_title,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SubscribeRequestDto<'a> {
    pub(super) snippet: SubscribeSnippetDto<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SubscribeSnippetDto<'a> {
    pub(super) resource_id: SubscribeResourceDto<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SubscribeResourceDto<'a> {
    pub(super) kind: &'static str,
    pub(super) channel_id: &'a str,
}

impl<'a> SubscribeRequestDto<'a> {
    pub(super) fn channel(channel_id: &'a str) -> Self {
        Self {
            snippet: SubscribeSnippetDto {
                resource_id: SubscribeResourceDto {
                    kind: "youtube#channel",
                    channel_id,
                },
            },
        }
    }
}

/// Google API error envelope fields
pub(super) struct ApiError {
    pub(super) reasons: Vec<String>,
    pub(super) message: Option<String>,
}

/// `error.errors[*].reason` and `error.message`; `None` when not JSON
pub(super) fn api_error(body: &[u8]) -> Option<ApiError> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let error = value.get("error");
    let reasons = error
        .and_then(|e| e.get("errors"))
        .and_then(Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| e.get("reason").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let message = error
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string);
    Some(ApiError { reasons, message })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_request_shape() {
        let body = serde_json::to_value(SubscribeRequestDto::channel("UC123")).unwrap();
        assert_eq!(body["snippet"]["resourceId"]["kind"], "youtube#channel");
        assert_eq!(body["snippet"]["resourceId"]["channelId"], "UC123");
    }

    #[test]
    fn test_api_error_reads_reason() {
        let body = br#"{"error": {"code": 400, "message": "dup", "errors": [{"reason": "subscriptionDuplicate"}]}}"#;
        let error = api_error(body).unwrap();
        assert_eq!(error.reasons, vec!["subscriptionDuplicate".to_string()]);
        assert_eq!(error.message.as_deref(), Some("dup"));
        assert!(api_error(b"not json").is_none());
    }
}
