// Reddit PlatformProvider
// Subreddit subscriptions + saved posts over the OAuth REST API

mod dto;
mod oauth;
mod saved;
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

/// Scopes requested at authorization time
pub const REDDIT_SCOPES: [&str; 5] = ["mysubreddits", "subscribe", "identity", "history", "save"];

/// Base URLs (overridable for tests)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedditEndpoints {
    /// Authenticated API host
    pub api_base: String,
    /// Host serving `/api/v1/authorize` and `/api/v1/access_token`
    pub www_base: String,
}

impl Default for RedditEndpoints {
    fn default() -> Self {
        Self {
            api_base: "https://oauth.reddit.com".to_string(),
            www_base: "https://www.reddit.com".to_string(),
        }
    }
}

impl RedditEndpoints {
    /// Point every endpoint at one host
    pub fn single_host(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            api_base: base.clone(),
            www_base: base,
        }
    }

    fn api(&self, path: &str) -> String {
        format!("{}{}", self.api_base.trim_end_matches('/'), path)
    }

    fn www(&self, path: &str) -> String {
        format!("{}{}", self.www_base.trim_end_matches('/'), path)
    }
}

pub struct RedditProvider {
    client: Client,
    credentials: PlatformCredentials,
    redirect_uri: String,
    endpoints: RedditEndpoints,
    settings: HttpSettings,
}

impl RedditProvider {
    /// # Errors
    /// `ProviderError::Configuration` naming the missing environment variable,
    /// or when the HTTP client cannot be built
    pub fn new(
        credentials: PlatformCredentials,
        endpoints: RedditEndpoints,
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
        endpoints: RedditEndpoints,
        settings: HttpSettings,
    ) -> Result<Self, ProviderError> {
        let redirect_uri = credentials.validate(Platform::Reddit)?.to_string();
        Ok(Self {
            client,
            credentials,
            redirect_uri,
            endpoints,
            settings,
        })
    }
}

fn display_name(subreddit: &str) -> String {
    format!("r/{}", subreddit)
}

#[async_trait]
impl PlatformProvider for RedditProvider {
    fn platform(&self) -> Platform {
        Platform::Reddit
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            check_status: true,
            list_content: true,
            save_content: true,
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
        self.subscribe_subreddit(access_token, target_id).await
    }

    async fn unsubscribe(
        &self,
        access_token: &str,
        target_id: &str,
    ) -> Result<TransferResult, ProviderError> {
        self.unsubscribe_subreddit(access_token, target_id).await
    }

    async fn check_subscription_status(&self, access_token: &str, target_id: &str) -> bool {
        self.is_subscribed(access_token, target_id).await
    }

    async fn get_content(
        &self,
        access_token: &str,
        username: Option<&str>,
    ) -> Result<Vec<ContentItem>, ProviderError> {
        self.list_saved(access_token, username).await
    }

    async fn save_content(
        &self,
        access_token: &str,
        content_id: &str,
    ) -> Result<TransferResult, ProviderError> {
        self.save_post(access_token, content_id).await
    }
}
