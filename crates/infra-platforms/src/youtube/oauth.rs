// Google OAuth for YouTube

use super::dto::{ChannelDto, PageDto, UserInfoDto};
use super::{YouTubeProvider, YOUTUBE_SCOPES};
use crate::http::{map_transport_error, RawResponse};
use chrono::Utc;
use reqwest::StatusCode;
use subsync_core::domain::{Account, AuthorizationRequest, Platform, PlatformTokens};
use subsync_core::port::ProviderError;
use tracing::debug;
use url::Url;

impl YouTubeProvider {
    pub(super) fn build_auth_url(&self) -> Result<AuthorizationRequest, ProviderError> {
        let state = uuid::Uuid::new_v4().to_string();
        let scope = YOUTUBE_SCOPES.join(" ");
        let url = Url::parse_with_params(
            &self.endpoints.authorize_url,
            &[
                ("client_id", self.credentials.client_id.as_str()),
                ("response_type", "code"),
                ("state", state.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", scope.as_str()),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .map_err(|e| ProviderError::Configuration(format!("invalid authorize URL: {}", e)))?;

        Ok(AuthorizationRequest {
            auth_url: url.into(),
            state,
        })
    }

    pub(super) async fn request_tokens(
        &self,
        form: &[(&str, &str)],
    ) -> Result<PlatformTokens, ProviderError> {
        let response = self
            .client
            .post(&self.endpoints.token_url)
            .form(form)
            .send()
            .await
            .map_err(map_transport_error)?;

        let raw = RawResponse::read(response).await?;
        if !raw.is_success() {
            return Err(ProviderError::Unknown {
                status: raw.status.as_u16(),
                body: format!("OAuth token request failed: {}", raw.preview()),
            });
        }
        debug!(platform = "youtube", "Token grant succeeded");
        raw.decode("token")
    }

    /// Google profile first, then the channel for handle and title
    pub(super) async fn fetch_identity(&self, access_token: &str) -> Result<Account, ProviderError> {
        let response = self
            .client
            .get(self.endpoints.api("/oauth2/v2/userinfo"))
            .bearer_auth(access_token)
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
        let user: UserInfoDto = raw.decode("userinfo")?;

        let mut username = user.email.clone().unwrap_or_default();
        let mut display_name = user.name.clone().unwrap_or_else(|| username.clone());

        if let Some(channel) = self.own_channel(access_token).await {
            let snippet = channel.snippet;
            username = snippet
                .as_ref()
                .and_then(|s| s.custom_url.clone())
                .unwrap_or(channel.id);
            if let Some(title) = snippet.and_then(|s| s.title) {
                display_name = title;
            }
        }

        Ok(Account {
            username,
            display_name,
            access_token: access_token.to_string(),
            refresh_token: String::new(),
            expires_at: Utc::now(),
            platform: Platform::Youtube,
        })
    }

    async fn own_channel(&self, access_token: &str) -> Option<ChannelDto> {
        let response = self
            .client
            .get(self.endpoints.api("/youtube/v3/channels"))
            .bearer_auth(access_token)
            .query(&[("part", "snippet"), ("mine", "true")])
            .send()
            .await
            .ok()?;
        let raw = RawResponse::read(response).await.ok()?;
        if !raw.is_success() {
            debug!(status = raw.status.as_u16(), "Channel lookup failed, using profile");
            return None;
        }
        raw.decode::<PageDto<ChannelDto>>("channel")
            .ok()?
            .items
            .into_iter()
            .next()
    }
}
