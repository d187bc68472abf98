// Reddit saved posts: listing & save

use super::dto::{error_codes, ListingDto, SavedDto};
use super::RedditProvider;
use crate::http::{has_error_code, map_transport_error, pause_between_pages, RawResponse};
use reqwest::StatusCode;
use subsync_core::domain::{ContentItem, FailureKind, TransferResult};
use subsync_core::port::ProviderError;
use tracing::{debug, info, warn};

impl RedditProvider {
    pub(super) async fn list_saved(
        &self,
        access_token: &str,
        username: Option<&str>,
    ) -> Result<Vec<ContentItem>, ProviderError> {
        let user = username.filter(|u| !u.is_empty()).unwrap_or("me");
        let path = format!("/user/{}/saved.json", user);
        let mut items = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let mut query = vec![("limit", "100".to_string())];
            if let Some(cursor) = &after {
                query.push(("after", cursor.clone()));
            }

            let response = self
                .client
                .get(self.endpoints.api(&path))
                .bearer_auth(access_token)
                .query(&query)
                .send()
                .await
                .map_err(map_transport_error)?;

            let raw = RawResponse::read(response).await?;
            match raw.status {
                status if status.is_success() => {}
                StatusCode::UNAUTHORIZED => return Err(ProviderError::AuthExpired),
                StatusCode::FORBIDDEN => {
                    return Err(ProviderError::AccessDenied(
                        "Access denied - insufficient permissions to access saved posts"
                            .to_string(),
                    ))
                }
                StatusCode::NOT_FOUND => {
                    return Err(ProviderError::NotFound(
                        "User not found or saved posts endpoint not available".to_string(),
                    ))
                }
                _ => return Err(raw.unknown()),
            }

            let page: ListingDto<SavedDto> = raw.decode("saved listing")?;
            items.extend(
                page.data
                    .children
                    .into_iter()
                    .map(|child| child.data.into_content()),
            );

            after = page.data.after.filter(|cursor| !cursor.is_empty());
            if after.is_none() {
                break;
            }
            pause_between_pages(self.settings.page_delay).await;
        }

        info!(platform = "reddit", count = items.len(), "Saved posts fetched");
        Ok(items)
    }

    /// Save one post by fullname (`t3_*`)
    pub(super) async fn save_post(
        &self,
        access_token: &str,
        fullname: &str,
    ) -> Result<TransferResult, ProviderError> {
        let response = self
            .client
            .post(self.endpoints.api("/api/save"))
            .bearer_auth(access_token)
            .form(&[("id", fullname)])
            .send()
            .await
            .map_err(map_transport_error)?;

        let raw = RawResponse::read(response).await?;
        if raw.is_success() {
            debug!(target_id = %fullname, "Post saved");
            return Ok(TransferResult::succeeded(fullname, fullname));
        }

        warn!(target_id = %fullname, status = raw.status.as_u16(), body = %raw.preview(), "Save rejected");
        let result = match raw.status {
            StatusCode::BAD_REQUEST => bad_request(fullname, &raw),
            StatusCode::FORBIDDEN => TransferResult::failed(
                fullname,
                fullname,
                FailureKind::AccessDenied,
                "Access denied - unable to save post (may be private or restricted)",
            ),
            StatusCode::NOT_FOUND => TransferResult::failed(
                fullname,
                fullname,
                FailureKind::NotFound,
                "Post not found or deleted",
            ),
            StatusCode::UNAUTHORIZED => TransferResult::failed(
                fullname,
                fullname,
                FailureKind::AuthExpired,
                "Authentication expired - please reconnect your account",
            ),
            _ => raw.unknown_failure(fullname, fullname),
        };
        Ok(result)
    }
}

fn bad_request(fullname: &str, raw: &RawResponse) -> TransferResult {
    let codes = error_codes(&raw.body);
    if has_error_code(&raw.body, codes.clone(), "already_saved") {
        return TransferResult::already_exists(fullname, fullname);
    }

    let invalid = match &codes {
        Some(codes) => codes
            .iter()
            .any(|c| c.to_ascii_lowercase().contains("invalid")),
        None => raw.preview().to_ascii_lowercase().contains("invalid"),
    };
    if invalid {
        return TransferResult::failed(
            fullname,
            fullname,
            FailureKind::NotFound,
            "Invalid post ID or post no longer exists",
        );
    }

    let detail = codes
        .and_then(|c| c.into_iter().next())
        .unwrap_or_else(|| raw.preview());
    TransferResult::failed(
        fullname,
        fullname,
        FailureKind::Unknown,
        format!("Bad request: {}", detail),
    )
}
