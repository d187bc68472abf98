// Reddit subreddit listing & (un)subscribe

use super::dto::{error_codes, AboutDto, ListingDto, SubredditDto};
use super::{display_name, RedditProvider};
use crate::http::{
    has_error_code, map_transport_error, pause_between_pages, RawResponse, AUTH_EXPIRED_MESSAGE,
};
use reqwest::StatusCode;
use subsync_core::domain::{FailureKind, Subscription, TransferResult};
use subsync_core::port::ProviderError;
use tracing::{debug, info, warn};

const PAGE_SIZE: &str = "100";

impl RedditProvider {
    pub(super) async fn list_subscriptions(
        &self,
        access_token: &str,
    ) -> Result<Vec<Subscription>, ProviderError> {
        let mut subscriptions = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let mut query = vec![("limit", PAGE_SIZE.to_string())];
            if let Some(cursor) = &after {
                query.push(("after", cursor.clone()));
            }

            let response = self
                .client
                .get(self.endpoints.api("/subreddits/mine/subscriber"))
                .bearer_auth(access_token)
                .query(&query)
                .send()
                .await
                .map_err(map_transport_error)?;

            let raw = RawResponse::read(response).await?;
            if raw.status == StatusCode::UNAUTHORIZED {
                return Err(ProviderError::AuthExpired);
            }
            if !raw.is_success() {
                return Err(raw.unknown());
            }

            let page: ListingDto<SubredditDto> = raw.decode("subreddit listing")?;
            subscriptions.extend(
                page.data
                    .children
                    .into_iter()
                    .map(|child| child.data.into_subscription()),
            );

            after = page.data.after.filter(|cursor| !cursor.is_empty());
            debug!(fetched = subscriptions.len(), has_more = after.is_some(), "Subreddit page fetched");
            if after.is_none() {
                break;
            }
            pause_between_pages(self.settings.page_delay).await;
        }

        info!(platform = "reddit", count = subscriptions.len(), "Subscriptions fetched");
        Ok(subscriptions)
    }

    pub(super) async fn subscribe_subreddit(
        &self,
        access_token: &str,
        subreddit: &str,
    ) -> Result<TransferResult, ProviderError> {
        let name = display_name(subreddit);

        if self.is_subscribed(access_token, subreddit).await {
            debug!(target_id = %subreddit, "Already subscribed, skipping");
            return Ok(TransferResult::already_exists(subreddit, name));
        }

        let response = self
            .client
            .post(self.endpoints.api("/api/subscribe"))
            .bearer_auth(access_token)
            .form(&[
                ("action", "sub"),
                ("sr_name", subreddit),
                ("skip_initial_defaults", "true"),
            ])
            .send()
            .await
            .map_err(map_transport_error)?;

        let raw = RawResponse::read(response).await?;
        if raw.is_success() {
            return Ok(TransferResult::succeeded(subreddit, name));
        }

        warn!(target_id = %subreddit, status = raw.status.as_u16(), body = %raw.preview(), "Subscribe rejected");
        let result = match raw.status {
            StatusCode::BAD_REQUEST
                if has_error_code(&raw.body, error_codes(&raw.body), "already_subscribed") =>
            {
                TransferResult::already_exists(subreddit, name)
            }
            StatusCode::FORBIDDEN => TransferResult::failed(
                subreddit,
                name,
                FailureKind::AccessDenied,
                "Access denied - private subreddit or banned user",
            ),
            StatusCode::NOT_FOUND => TransferResult::failed(
                subreddit,
                name,
                FailureKind::NotFound,
                "Subreddit not found or deleted",
            ),
            StatusCode::UNAUTHORIZED => TransferResult::failed(
                subreddit,
                name,
                FailureKind::AuthExpired,
                AUTH_EXPIRED_MESSAGE,
            ),
            _ => raw.unknown_failure(subreddit, &name),
        };
        Ok(result)
    }

    pub(super) async fn unsubscribe_subreddit(
        &self,
        access_token: &str,
        subreddit: &str,
    ) -> Result<TransferResult, ProviderError> {
        let name = display_name(subreddit);

        let response = self
            .client
            .post(self.endpoints.api("/api/subscribe"))
            .bearer_auth(access_token)
            .form(&[("action", "unsub"), ("sr_name", subreddit)])
            .send()
            .await
            .map_err(map_transport_error)?;

        let raw = RawResponse::read(response).await?;
        let result = match raw.status {
            status if status.is_success() => TransferResult::succeeded(subreddit, name),
            StatusCode::FORBIDDEN => TransferResult::failed(
                subreddit,
                name,
                FailureKind::AccessDenied,
                "Access denied - unable to unsubscribe",
            ),
            StatusCode::NOT_FOUND => TransferResult::failed(
                subreddit,
                name,
                FailureKind::NotFound,
                "Subreddit not found",
            ),
            StatusCode::UNAUTHORIZED => TransferResult::failed(
                subreddit,
                name,
                FailureKind::AuthExpired,
                AUTH_EXPIRED_MESSAGE,
            ),
            _ => raw.unknown_failure(subreddit, &name),
        };
        Ok(result)
    }

    /// `user_is_subscriber` from `/r/{name}/about`; `false` on any failure
    pub(super) async fn is_subscribed(&self, access_token: &str, subreddit: &str) -> bool {
        let response = match self
            .client
            .get(self.endpoints.api(&format!("/r/{}/about", subreddit)))
            .bearer_auth(access_token)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                debug!(target_id = %subreddit, error = %e, "Status check failed");
                return false;
            }
        };

        let raw = match RawResponse::read(response).await {
            Ok(raw) if raw.is_success() => raw,
            _ => return false,
        };

        raw.decode::<AboutDto>("subreddit about")
            .ok()
            .and_then(|about| about.data)
            .and_then(|data| data.user_is_subscriber)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::provider;
    use httpmock::prelude::*;
    use serde_json::json;
    use subsync_core::domain::FailureKind;
    use subsync_core::port::{PlatformProvider, ProviderError};

    fn subreddit(name: &str) -> serde_json::Value {
        json!({
            "kind": "t5",
            "data": {
                "display_name": name,
                "url": format!("/r/{}/", name),
                "subscribers": 1000,
                "public_description": "desc",
                "icon_img": "",
                "community_icon": "https://img/icon.png"
            }
        })
    }

    #[tokio::test]
    async fn test_listing_follows_after_cursor() {
        let server = MockServer::start_async().await;
        let first = server.mock(|when, then| {
            when.method(GET)
                .path("/subreddits/mine/subscriber")
                .query_param("limit", "100")
                .query_param_missing("after");
            then.status(200).json_body(json!({
                "data": { "children": [subreddit("rust")], "after": "t5_next" }
            }));
        });
        let second = server.mock(|when, then| {
            when.method(GET)
                .path("/subreddits/mine/subscriber")
                .query_param("after", "t5_next");
            then.status(200).json_body(json!({
                "data": { "children": [subreddit("tokio")], "after": null }
            }));
        });

        let subs = provider(&server).get_subscriptions("token").await.unwrap();

        first.assert();
        second.assert();
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].id, "rust");
        assert_eq!(subs[0].display_name, "r/rust");
        assert_eq!(subs[0].url, "https://reddit.com/r/rust/");
        assert_eq!(subs[0].subscriber_count, Some(1000));
        assert_eq!(
            subs[0].thumbnail_url.as_deref(),
            Some("https://img/icon.png")
        );
        assert_eq!(subs[1].id, "tokio");
    }

    #[tokio::test]
    async fn test_listing_401_is_auth_expired() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/subreddits/mine/subscriber");
            then.status(401).body("unauthorized");
        });

        let err = provider(&server).get_subscriptions("stale").await.unwrap_err();
        assert_eq!(err, ProviderError::AuthExpired);
    }

    #[tokio::test]
    async fn test_subscribe_short_circuits_when_already_member() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/r/rust/about");
            then.status(200)
                .json_body(json!({"data": {"user_is_subscriber": true}}));
        });
        let subscribe = server.mock(|when, then| {
            when.method(POST).path("/api/subscribe");
            then.status(200).json_body(json!({}));
        });

        let result = provider(&server).subscribe("token", "rust").await.unwrap();

        subscribe.assert_hits(0);
        assert!(result.success);
        assert_eq!(result.already_exists, Some(true));
        assert_eq!(result.target_name, "r/rust");
    }

    #[tokio::test]
    async fn test_subscribe_404_reports_missing_subreddit() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/subscribe");
            then.status(404).body("{}");
        });

        let result = provider(&server).subscribe("token", "gone").await.unwrap();

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Subreddit not found or deleted"));
        assert_eq!(result.error_code, Some(FailureKind::NotFound));
    }

    #[tokio::test]
    async fn test_subscribe_duplicate_code_normalizes_to_success() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/subscribe");
            then.status(400).json_body(json!({
                "json": { "errors": [["ALREADY_SUBSCRIBED", "you are already subscribed", "sr_name"]] }
            }));
        });

        let result = provider(&server).subscribe("token", "rust").await.unwrap();

        assert!(result.success);
        assert_eq!(result.already_exists, Some(true));
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_subscribe_403_is_access_denied() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/subscribe");
            then.status(403).body("{\"message\": \"Forbidden\"}");
        });

        let result = provider(&server).subscribe("token", "private").await.unwrap();
        assert_eq!(
            result.error.as_deref(),
            Some("Access denied - private subreddit or banned user")
        );
        assert_eq!(result.error_code, Some(FailureKind::AccessDenied));
    }

    #[tokio::test]
    async fn test_unsubscribe_maps_statuses() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/subscribe");
            then.status(404);
        });

        let result = provider(&server).unsubscribe("token", "gone").await.unwrap();
        assert_eq!(result.error.as_deref(), Some("Subreddit not found"));
    }

    #[tokio::test]
    async fn test_status_check_is_false_on_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/r/rust/about");
            then.status(500);
        });

        assert!(!provider(&server).check_subscription_status("token", "rust").await);
    }
}
