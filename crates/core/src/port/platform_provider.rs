// Platform Provider Port
// Uniform capability contract over one platform's REST surface

use crate::domain::{
    Account, AuthorizationRequest, ContentItem, FailureKind, Platform, PlatformTokens,
    Subscription, TransferResult,
};
use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by a provider
///
/// Mutations (`subscribe`, `unsubscribe`, `save_content`) translate expected
/// remote rejections into failed [`TransferResult`]s; only unexpected faults
/// come back as `Err`. Listing calls may return any variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Access token expired or invalid")]
    AuthExpired,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Long-window platform quota, independent of the short-window limiter
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("{operation} is not supported by {platform}")]
    Unsupported {
        platform: Platform,
        operation: &'static str,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("HTTP {status}: {body}")]
    Unknown { status: u16, body: String },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ProviderError {
    pub fn unsupported(platform: Platform, operation: &'static str) -> Self {
        ProviderError::Unsupported {
            platform,
            operation,
        }
    }

    /// Failure kind recorded on a failed item
    pub fn kind(&self) -> FailureKind {
        match self {
            ProviderError::AuthExpired => FailureKind::AuthExpired,
            ProviderError::AccessDenied(_) => FailureKind::AccessDenied,
            ProviderError::NotFound(_) => FailureKind::NotFound,
            ProviderError::QuotaExceeded(_) => FailureKind::QuotaExceeded,
            ProviderError::Unsupported { .. } => FailureKind::Unsupported,
            ProviderError::Transport(_) => FailureKind::Transport,
            ProviderError::Decode(_)
            | ProviderError::Unknown { .. }
            | ProviderError::Configuration(_) => FailureKind::Unknown,
        }
    }

    /// Convert into a failed item result (used when a mutation raises)
    pub fn into_result(self, target_id: &str) -> TransferResult {
        TransferResult::failed(target_id, target_id, self.kind(), self.to_string())
    }
}

/// Optional capabilities declared up front by each provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProviderCapabilities {
    /// `check_subscription_status` is meaningful
    pub check_status: bool,
    /// `get_content` lists saved content
    pub list_content: bool,
    /// `save_content` replays saved content
    pub save_content: bool,
}

/// Platform Provider trait
///
/// Implementations:
/// - RedditProvider: subreddits + saved posts
/// - YouTubeProvider: channels + playlists (list only)
#[async_trait]
pub trait PlatformProvider: Send + Sync {
    fn platform(&self) -> Platform;

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::default()
    }

    /// Both halves of content replay are available on this provider
    fn supports_content_transfer(&self) -> bool {
        let caps = self.capabilities();
        caps.list_content && caps.save_content
    }

    /// Build the OAuth authorization redirect with a fresh state token
    fn auth_url(&self) -> Result<AuthorizationRequest, ProviderError>;

    async fn exchange_code_for_tokens(&self, code: &str) -> Result<PlatformTokens, ProviderError>;

    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<PlatformTokens, ProviderError>;

    /// Resolve the authenticated identity
    ///
    /// The returned account carries `access_token` only; the caller fills
    /// refresh token and expiry from the token response.
    async fn get_user_info(&self, access_token: &str) -> Result<Account, ProviderError>;

    /// Fetch the complete subscription list, following pagination cursors
    ///
    /// # Errors
    /// - `ProviderError::AuthExpired` on HTTP 401
    /// - `ProviderError::QuotaExceeded` when the platform quota is exhausted
    async fn get_subscriptions(&self, access_token: &str)
        -> Result<Vec<Subscription>, ProviderError>;

    /// Best-effort idempotent subscribe
    async fn subscribe(
        &self,
        access_token: &str,
        target_id: &str,
    ) -> Result<TransferResult, ProviderError>;

    /// Best-effort removal
    async fn unsubscribe(
        &self,
        access_token: &str,
        target_id: &str,
    ) -> Result<TransferResult, ProviderError>;

    /// Heuristic only: `false` on any non-success response
    async fn check_subscription_status(&self, _access_token: &str, _target_id: &str) -> bool {
        false
    }

    async fn get_content(
        &self,
        _access_token: &str,
        _username: Option<&str>,
    ) -> Result<Vec<ContentItem>, ProviderError> {
        Err(ProviderError::unsupported(self.platform(), "get_content"))
    }

    async fn save_content(
        &self,
        _access_token: &str,
        _content_id: &str,
    ) -> Result<TransferResult, ProviderError> {
        Err(ProviderError::unsupported(self.platform(), "save_content"))
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use chrono::Utc;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Scripted outcome for one target id
    #[derive(Debug, Clone)]
    pub enum MockOutcome {
        /// Return `success: true`
        Succeed,
        /// Return `success: true, alreadyExists: true`
        AlreadyExists,
        /// Return a typed `success: false`
        Fail(FailureKind, String),
        /// Raise (unexpected fault)
        Error(ProviderError),
        /// Panic inside the provider call
        Panic(String),
        /// Sleep, then apply the inner outcome
        Delayed(Duration, Box<MockOutcome>),
    }

    /// In-memory provider with scripted per-target behaviour
    ///
    /// Unscripted `subscribe` calls behave statefully: the first call for an
    /// id succeeds, later calls report `alreadyExists`.
    pub struct MockPlatformProvider {
        platform: Platform,
        capabilities: ProviderCapabilities,
        subscriptions: Vec<Subscription>,
        content: Vec<ContentItem>,
        listing_error: Option<ProviderError>,
        outcomes: Mutex<HashMap<String, MockOutcome>>,
        subscribed: Mutex<HashSet<String>>,
        calls: Mutex<Vec<String>>,
    }

    impl MockPlatformProvider {
        pub fn new(platform: Platform) -> Self {
            Self {
                platform,
                capabilities: ProviderCapabilities {
                    check_status: true,
                    ..ProviderCapabilities::default()
                },
                subscriptions: Vec::new(),
                content: Vec::new(),
                listing_error: None,
                outcomes: Mutex::new(HashMap::new()),
                subscribed: Mutex::new(HashSet::new()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn with_outcome(self, target_id: impl Into<String>, outcome: MockOutcome) -> Self {
            self.outcomes
                .lock()
                .unwrap()
                .insert(target_id.into(), outcome);
            self
        }

        /// Seed the remote subscription list (also marks them subscribed)
        pub fn with_subscriptions(mut self, ids: &[&str]) -> Self {
            for id in ids {
                self.subscribed.lock().unwrap().insert(id.to_string());
                self.subscriptions.push(mock_subscription(self.platform, id));
            }
            self
        }

        pub fn with_listing_error(mut self, error: ProviderError) -> Self {
            self.listing_error = Some(error);
            self
        }

        pub fn with_content_support(mut self, list: bool, save: bool) -> Self {
            self.capabilities.list_content = list;
            self.capabilities.save_content = save;
            self
        }

        pub fn with_content(mut self, items: Vec<ContentItem>) -> Self {
            self.content = items;
            self
        }

        /// Recorded calls as `"<operation>:<id>"`
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, operation: &str, id: &str) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{}:{}", operation, id));
        }

        fn scripted(&self, id: &str) -> Option<MockOutcome> {
            self.outcomes.lock().unwrap().get(id).cloned()
        }

        async fn apply(
            &self,
            id: &str,
            outcome: MockOutcome,
        ) -> Result<TransferResult, ProviderError> {
            let mut outcome = outcome;
            while let MockOutcome::Delayed(delay, inner) = outcome {
                tokio::time::sleep(delay).await;
                outcome = *inner;
            }
            match outcome {
                MockOutcome::Succeed => Ok(TransferResult::succeeded(id, id)),
                MockOutcome::AlreadyExists => Ok(TransferResult::already_exists(id, id)),
                MockOutcome::Fail(kind, message) => {
                    Ok(TransferResult::failed(id, id, kind, message))
                }
                MockOutcome::Error(err) => Err(err),
                MockOutcome::Panic(msg) => panic!("{}", msg),
                MockOutcome::Delayed(..) => unreachable!("delays unwrapped above"),
            }
        }
    }

    pub fn mock_subscription(platform: Platform, id: &str) -> Subscription {
        Subscription {
            id: id.to_string(),
            name: id.to_string(),
            display_name: id.to_string(),
            url: format!("https://example.invalid/{}", id),
            subscriber_count: None,
            description: None,
            platform,
            thumbnail_url: None,
        }
    }

    #[async_trait]
    impl PlatformProvider for MockPlatformProvider {
        fn platform(&self) -> Platform {
            self.platform
        }

        fn capabilities(&self) -> ProviderCapabilities {
            self.capabilities
        }

        fn auth_url(&self) -> Result<AuthorizationRequest, ProviderError> {
            Ok(AuthorizationRequest {
                auth_url: format!("https://example.invalid/{}/authorize", self.platform),
                state: uuid::Uuid::new_v4().to_string(),
            })
        }

        async fn exchange_code_for_tokens(
            &self,
            code: &str,
        ) -> Result<PlatformTokens, ProviderError> {
            Ok(PlatformTokens {
                access_token: format!("access-{}", code),
                refresh_token: Some(format!("refresh-{}", code)),
                expires_in: 3600,
                token_type: "bearer".to_string(),
                scope: None,
            })
        }

        async fn refresh_access_token(
            &self,
            refresh_token: &str,
        ) -> Result<PlatformTokens, ProviderError> {
            self.exchange_code_for_tokens(refresh_token).await
        }

        async fn get_user_info(&self, access_token: &str) -> Result<Account, ProviderError> {
            Ok(Account {
                username: "mock-user".to_string(),
                display_name: "Mock User".to_string(),
                access_token: access_token.to_string(),
                refresh_token: String::new(),
                expires_at: Utc::now(),
                platform: self.platform,
            })
        }

        async fn get_subscriptions(
            &self,
            _access_token: &str,
        ) -> Result<Vec<Subscription>, ProviderError> {
            if let Some(err) = &self.listing_error {
                return Err(err.clone());
            }
            Ok(self.subscriptions.clone())
        }

        async fn subscribe(
            &self,
            access_token: &str,
            target_id: &str,
        ) -> Result<TransferResult, ProviderError> {
            self.record("subscribe", target_id);
            if let Some(outcome) = self.scripted(target_id) {
                return self.apply(target_id, outcome).await;
            }
            if self.check_subscription_status(access_token, target_id).await {
                return Ok(TransferResult::already_exists(target_id, target_id));
            }
            self.subscribed
                .lock()
                .unwrap()
                .insert(target_id.to_string());
            Ok(TransferResult::succeeded(target_id, target_id))
        }

        async fn unsubscribe(
            &self,
            _access_token: &str,
            target_id: &str,
        ) -> Result<TransferResult, ProviderError> {
            self.record("unsubscribe", target_id);
            if let Some(outcome) = self.scripted(target_id) {
                return self.apply(target_id, outcome).await;
            }
            self.subscribed.lock().unwrap().remove(target_id);
            Ok(TransferResult::succeeded(target_id, target_id))
        }

        async fn check_subscription_status(&self, _access_token: &str, target_id: &str) -> bool {
            self.subscribed.lock().unwrap().contains(target_id)
        }

        async fn get_content(
            &self,
            _access_token: &str,
            _username: Option<&str>,
        ) -> Result<Vec<ContentItem>, ProviderError> {
            if !self.capabilities.list_content {
                return Err(ProviderError::unsupported(self.platform, "get_content"));
            }
            Ok(self.content.clone())
        }

        async fn save_content(
            &self,
            _access_token: &str,
            content_id: &str,
        ) -> Result<TransferResult, ProviderError> {
            if !self.capabilities.save_content {
                return Err(ProviderError::unsupported(self.platform, "save_content"));
            }
            self.record("save", content_id);
            match self.scripted(content_id) {
                Some(outcome) => self.apply(content_id, outcome).await,
                None => Ok(TransferResult::succeeded(content_id, content_id)),
            }
        }
    }
}
