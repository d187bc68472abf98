// YouTube PlatformProvider
// Channel subscriptions (Data API v3) + playlist export

mod dto;
mod oauth;
mod playlists;
mod subscriptions;

use crate::config::{HttpSettings, PlatformCredentials};
use crate::http::build_client;
use async_trait::async_trait;
use reqwest::Client;
use subsync_core::domain::{
    Account, AuthorizationRequest, ContentItem, Platform, PlatformTokens, Subscription,
    TransferResult,
};
use subsync_core::port::{PlatformProvider, ProviderCapabilities, ProviderError};

pub const YOUTUBE_SCOPES: [&str; 3] = [
    "https://www.googleapis.com/auth/youtube.readonly",
    "https://www.googleapis.com/auth/youtube.force-ssl",
    "https://www.googleapis.com/auth/userinfo.profile",
];

pub(crate) const QUOTA_EXCEEDED_MESSAGE: &str =
    "YouTube API quota exceeded. Please wait 24 hours before trying again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YouTubeEndpoints {
    /// Serves `/youtube/v3/*` and `/oauth2/v2/userinfo`
    pub api_base: String,
    pub authorize_url: String,
    pub token_url: String,
}

impl Default for YouTubeEndpoints {
    fn default() -> Self {
        Self {
            api_base: "https://www.googleapis.com".to_string(),
            authorize_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
        }
    }
}

impl YouTubeEndpoints {
    pub fn single_host(base: impl Into<String>) -> Self {
        let base = base.into();
        let base = base.trim_end_matches('/');
        Self {
            api_base: base.to_string(),
            authorize_url: format!("{}/o/oauth2/v2/auth", base),
            token_url: format!("{}/token", base),
        }
    }

    fn api(&self, path: &str) -> String {
        format!("{}{}", self.api_base.trim_end_matches('/'), path)
    }
}

pub struct YouTubeProvider {
    client: Client,
    credentials: PlatformCredentials,
    redirect_uri: String,
    endpoints: YouTubeEndpoints,
    settings: HttpSettings,
}

impl YouTubeProvider {
    /// # Errors
    /// `ProviderError::Configuration` naming the missing environment variable
    pub fn new(
        credentials: PlatformCredentials,
        endpoints: YouTubeEndpoints,
        settings: HttpSettings,
    ) -> Result<Self, ProviderError> {
        Self::with_client(build_client(&settings)?, credentials, endpoints, settings)
    }

    /// Reuse an existing client (and its connection pool)
    ///
    /// `settings.timeout` is only honoured by clients built with it.
    pub fn with_client(
        client: Client,
        credentials: PlatformCredentials,
        endpoints: YouTubeEndpoints,
        settings: HttpSettings,
    ) -> Result<Self, ProviderError> {
        let redirect_uri = credentials.validate(Platform::Youtube)?.to_string();
        Ok(Self {
            client,
            credentials,
            redirect_uri,
            endpoints,
            settings,
        })
    }
}

#[async_trait]
impl PlatformProvider for YouTubeProvider {
    fn platform(&self) -> Platform {
        Platform::Youtube
    }

    // Playlists can be exported but not replayed
    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            check_status: true,
            list_content: true,
            save_content: false,
        }
    }

    fn auth_url(&self) -> Result<AuthorizationRequest, ProviderError> {
        self.build_auth_url()
    }

    async fn exchange_code_for_tokens(&self, code: &str) -> Result<PlatformTokens, ProviderError> {
        self.request_tokens(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
        ])
        .await
    }

    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<PlatformTokens, ProviderError> {
        self.request_tokens(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
        ])
        .await
    }

    async fn get_user_info(&self, access_token: &str) -> Result<Account, ProviderError> {
        self.fetch_identity(access_token).await
    }

    async fn get_subscriptions(
        &self,
        access_token: &str,
    ) -> Result<Vec<Subscription>, ProviderError> {
        self.list_subscriptions(access_token).await
    }

    async fn subscribe(
        &self,
        access_token: &str,
        target_id: &str,
    ) -> Result<TransferResult, ProviderError> {
        self.subscribe_channel(access_token, target_id).await
    }

    async fn unsubscribe(
        &self,
        access_token: &str,
        target_id: &str,
    ) -> Result<TransferResult, ProviderError> {
        self.unsubscribe_channel(access_token, target_id).await
    }

    async fn check_subscription_status(&self, access_token: &str, target_id: &str) -> bool {
        self.is_subscribed(access_token, target_id).await
    }

    async fn get_content(
        &self,
        access_token: &str,
        _username: Option<&str>,
    ) -> Result<Vec<ContentItem>, ProviderError> {
        self.list_playlists(access_token).await
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use httpmock::MockServer;
    use std::time::Duration;

    pub(crate) fn provider(server: &MockServer) -> YouTubeProvider {
        YouTubeProvider::new(
            PlatformCredentials {
                client_id: "client".to_string(),
                client_secret: "secret".to_string(),
                redirect_uri: Some("http://localhost:3000/auth/youtube/callback".to_string()),
            },
            YouTubeEndpoints::single_host(server.base_url()),
            HttpSettings {
                timeout: Duration::from_secs(5),
                page_delay: Duration::ZERO,
            },
        )
        .unwrap()
    }
}
