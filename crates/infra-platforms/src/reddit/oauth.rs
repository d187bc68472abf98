// Reddit OAuth: authorize URL, token grant, identity

use super::dto::MeDto;
use super::{RedditProvider, REDDIT_SCOPES};
use crate::http::{map_transport_error, RawResponse};
use chrono::Utc;
use reqwest::StatusCode;
use subsync_core::domain::{Account, AuthorizationRequest, Platform, PlatformTokens};
use subsync_core::port::ProviderError;
use tracing::debug;
use url::Url;

impl RedditProvider {
    pub(super) fn build_auth_url(&self) -> Result<AuthorizationRequest, ProviderError> {
        let state = uuid::Uuid::new_v4().to_string();
        let scope = REDDIT_SCOPES.join(" ");
        let url = Url::parse_with_params(
            &self.endpoints.www("/api/v1/authorize"),
            &[
                ("client_id", self.credentials.client_id.as_str()),
                ("response_type", "code"),
                ("state", state.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("duration", "permanent"),
                ("scope", scope.as_str()),
            ],
        )
        .map_err(|e| ProviderError::Configuration(format!("invalid authorize URL: {}", e)))?;

        Ok(AuthorizationRequest {
            auth_url: url.into(),
            state,
        })
    }

    /// POST the token endpoint with HTTP Basic client credentials
    pub(super) async fn request_tokens(
        &self,
        form: &[(&str, &str)],
    ) -> Result<PlatformTokens, ProviderError> {
        let response = self
            .client
            .post(self.endpoints.www("/api/v1/access_token"))
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
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
        debug!(platform = "reddit", "Token grant succeeded");
        raw.decode("token")
    }

    pub(super) async fn fetch_identity(&self, access_token: &str) -> Result<Account, ProviderError> {
        let response = self
            .client
            .get(self.endpoints.api("/api/v1/me"))
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
        let me: MeDto = raw.decode("identity")?;

        Ok(Account {
            username: me.name.clone(),
            display_name: me.name,
            access_token: access_token.to_string(),
            refresh_token: String::new(),
            expires_at: Utc::now(),
            platform: Platform::Reddit,
        })
    }
}
