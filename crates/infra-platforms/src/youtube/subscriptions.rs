// YouTube channel subscriptions

use super::dto::{
    api_error, ChannelStatsDto, PageDto, SubscribeRequestDto, SubscriptionDto,
};
use super::{YouTubeProvider, QUOTA_EXCEEDED_MESSAGE};
use crate::http::{
    has_error_code, map_transport_error, pause_between_pages, RawResponse, AUTH_EXPIRED_MESSAGE,
};
use reqwest::StatusCode;
use std::collections::HashMap;
use subsync_core::domain::{FailureKind, Subscription, TransferResult};
use subsync_core::port::ProviderError;
use tracing::{debug, info, warn};

const PAGE_SIZE: &str = "50";

fn is_quota_exceeded(raw: &RawResponse) -> bool {
    let reasons = api_error(&raw.body).map(|e| e.reasons);
    has_error_code(&raw.body, reasons, "quotaExceeded")
}

impl YouTubeProvider {
    pub(super) async fn list_subscriptions(
        &self,
        access_token: &str,
    ) -> Result<Vec<Subscription>, ProviderError> {
        let mut subscriptions = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![
                ("part", "snippet".to_string()),
                ("mine", "true".to_string()),
                ("maxResults", PAGE_SIZE.to_string()),
            ];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let response = self
                .client
                .get(self.endpoints.api("/youtube/v3/subscriptions"))
                .bearer_auth(access_token)
                .query(&query)
                .send()
                .await
                .map_err(map_transport_error)?;

            let raw = RawResponse::read(response).await?;
            if raw.status == StatusCode::UNAUTHORIZED {
                return Err(ProviderError::AuthExpired);
            }
            if raw.status == StatusCode::FORBIDDEN && is_quota_exceeded(&raw) {
                return Err(ProviderError::QuotaExceeded(
                    QUOTA_EXCEEDED_MESSAGE.to_string(),
                ));
            }
            if !raw.is_success() {
                return Err(raw.unknown());
            }

            let page: PageDto<SubscriptionDto> = raw.decode("subscription listing")?;
            let snippets: Vec<_> = page
                .items
                .into_iter()
                .filter_map(|item| item.snippet)
                .collect();

            let channel_ids: Vec<&str> = snippets
                .iter()
                .map(|s| s.resource_id.channel_id.as_str())
                .collect();
            let stats = self.subscriber_counts(access_token, &channel_ids).await;

            subscriptions.extend(snippets.into_iter().map(|s| s.into_subscription(&stats)));

            page_token = page.next_page_token.filter(|t| !t.is_empty());
            debug!(fetched = subscriptions.len(), has_more = page_token.is_some(), "Subscription page fetched");
            if page_token.is_none() {
                break;
            }
            pause_between_pages(self.settings.page_delay).await;
        }

        info!(platform = "youtube", count = subscriptions.len(), "Subscriptions fetched");
        Ok(subscriptions)
    }

    /// Best effort: missing counts only leave `subscriberCount` empty
    async fn subscriber_counts(
        &self,
        access_token: &str,
        channel_ids: &[&str],
    ) -> HashMap<String, u64> {
        if channel_ids.is_empty() {
            return HashMap::new();
        }

        let ids = channel_ids.join(",");
        let response = match self
            .client
            .get(self.endpoints.api("/youtube/v3/channels"))
            .bearer_auth(access_token)
            .query(&[("part", "statistics"), ("id", ids.as_str())])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Failed to fetch channel statistics");
                return HashMap::new();
            }
        };

        let page = match RawResponse::read(response).await {
            Ok(raw) if raw.is_success() => raw.decode::<PageDto<ChannelStatsDto>>("channel statistics"),
            Ok(raw) => Err(raw.unknown()),
            Err(e) => Err(e),
        };

        match page {
            Ok(page) => page
                .items
                .into_iter()
                .filter_map(|channel| {
                    let count = channel
                        .statistics?
                        .subscriber_count?
                        .parse::<u64>()
                        .ok()?;
                    Some((channel.id, count))
                })
                .collect(),
            Err(e) => {
                warn!(error = %e, "Failed to fetch channel statistics");
                HashMap::new()
            }
        }
    }

    pub(super) async fn subscribe_channel(
        &self,
        access_token: &str,
        channel_id: &str,
    ) -> Result<TransferResult, ProviderError> {
        let response = self
            .client
            .post(self.endpoints.api("/youtube/v3/subscriptions"))
            .bearer_auth(access_token)
            .query(&[("part", "snippet")])
            .json(&SubscribeRequestDto::channel(channel_id))
            .send()
            .await
            .map_err(map_transport_error)?;

        let raw = RawResponse::read(response).await?;
        if raw.is_success() {
            let title = raw
                .decode::<SubscriptionDto>("subscription")
                .ok()
                .and_then(|s| s.snippet)
                .map(|s| s.title)
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| channel_id.to_string());
            return Ok(TransferResult::succeeded(channel_id, title));
        }

        warn!(target_id = %channel_id, status = raw.status.as_u16(), body = %raw.preview(), "Subscribe rejected");
        let error = api_error(&raw.body);
        let reasons = error.as_ref().map(|e| e.reasons.clone());

        let result = match raw.status {
            StatusCode::BAD_REQUEST
                if has_error_code(&raw.body, reasons, "subscriptionDuplicate") =>
            {
                TransferResult::already_exists(channel_id, channel_id)
            }
            StatusCode::BAD_REQUEST => TransferResult::failed(
                channel_id,
                channel_id,
                FailureKind::Unknown,
                error
                    .and_then(|e| e.message)
                    .unwrap_or_else(|| "Bad request".to_string()),
            ),
            StatusCode::FORBIDDEN if is_quota_exceeded(&raw) => TransferResult::failed(
                channel_id,
                channel_id,
                FailureKind::QuotaExceeded,
                QUOTA_EXCEEDED_MESSAGE,
            ),
            StatusCode::FORBIDDEN => TransferResult::failed(
                channel_id,
                channel_id,
                FailureKind::AccessDenied,
                "Access denied - unable to subscribe",
            ),
            StatusCode::NOT_FOUND => TransferResult::failed(
                channel_id,
                channel_id,
                FailureKind::NotFound,
                "Channel not found",
            ),
            StatusCode::UNAUTHORIZED => TransferResult::failed(
                channel_id,
                channel_id,
                FailureKind::AuthExpired,
                AUTH_EXPIRED_MESSAGE,
            ),
            _ => raw.unknown_failure(channel_id, channel_id),
        };
        Ok(result)
    }

    /// Resolve the subscription resource id, then delete it
    pub(super) async fn unsubscribe_channel(
        &self,
        access_token: &str,
        channel_id: &str,
    ) -> Result<TransferResult, ProviderError> {
        let response = self
            .client
            .get(self.endpoints.api("/youtube/v3/subscriptions"))
            .bearer_auth(access_token)
            .query(&[
                ("part", "id,snippet"),
                ("forChannelId", channel_id),
                ("mine", "true"),
            ])
            .send()
            .await
            .map_err(map_transport_error)?;

        let raw = RawResponse::read(response).await?;
        if !raw.is_success() {
            let (kind, message) = match raw.status {
                StatusCode::UNAUTHORIZED => (FailureKind::AuthExpired, AUTH_EXPIRED_MESSAGE.to_string()),
                StatusCode::FORBIDDEN if is_quota_exceeded(&raw) => {
                    (FailureKind::QuotaExceeded, QUOTA_EXCEEDED_MESSAGE.to_string())
                }
                status => (
                    FailureKind::Unknown,
                    format!("Failed to find subscription: {}", status.as_u16()),
                ),
            };
            return Ok(TransferResult::failed(channel_id, channel_id, kind, message));
        }

        let page: PageDto<SubscriptionDto> = raw.decode("subscription lookup")?;
        let Some(existing) = page.items.into_iter().next() else {
            debug!(target_id = %channel_id, "Not subscribed, nothing to remove");
            let mut result = TransferResult::succeeded(channel_id, channel_id);
            result.already_exists = Some(false);
            return Ok(result);
        };

        let name = existing
            .snippet
            .map(|s| s.title)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| channel_id.to_string());

        let response = self
            .client
            .delete(self.endpoints.api("/youtube/v3/subscriptions"))
            .bearer_auth(access_token)
            .query(&[("id", existing.id.as_str())])
            .send()
            .await
            .map_err(map_transport_error)?;

        let raw = RawResponse::read(response).await?;
        let result = match raw.status {
            status if status.is_success() => TransferResult::succeeded(channel_id, name),
            StatusCode::FORBIDDEN => TransferResult::failed(
                channel_id,
                name,
                FailureKind::AccessDenied,
                "Access denied - unable to unsubscribe",
            ),
            StatusCode::NOT_FOUND => TransferResult::failed(
                channel_id,
                name,
                FailureKind::NotFound,
                "Subscription not found",
            ),
            _ => raw.unknown_failure(channel_id, &name),
        };
        Ok(result)
    }

    pub(super) async fn is_subscribed(&self, access_token: &str, channel_id: &str) -> bool {
        let response = match self
            .client
            .get(self.endpoints.api("/youtube/v3/subscriptions"))
            .bearer_auth(access_token)
            .query(&[("part", "id"), ("forChannelId", channel_id), ("mine", "true")])
            .send()
            .await
        {
            Ok(response) => response,
            Err(_) => return false,
        };

        match RawResponse::read(response).await {
            Ok(raw) if raw.is_success() => raw
                .decode::<PageDto<SubscriptionDto>>("subscription lookup")
                .map(|page| !page.items.is_empty())
                .unwrap_or(false),
            _ => false,
        }
    }
}
