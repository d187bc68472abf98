//! RPC Request/Response Types
//!
//! Parameters use snake_case field names; domain values embedded in results
//! (`Subscription`, `ContentSnapshot`, `TransferJob`) keep their own casing.

use serde::{Deserialize, Serialize};
use subsync_core::domain::{Account, AccountRole, ContentSnapshot, Platform};

/// Shared by every method that only needs a session
#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub session_id: String,
}

/// platforms.list.v1
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformInfo {
    pub id: Platform,
    pub name: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformsResponse {
    pub platforms: Vec<PlatformInfo>,
}

/// session.create.v1
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCreatedResponse {
    pub session_id: String,
}

/// session.delete.v1
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDeletedResponse {
    pub deleted: bool,
}

/// Connected account without its credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub username: String,
    pub display_name: String,
    pub platform: Platform,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        Self {
            username: account.username.clone(),
            display_name: account.display_name.clone(),
            platform: account.platform,
        }
    }
}

/// session.status.v1
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatusResponse {
    pub session_id: String,
    pub source: Option<AccountSummary>,
    pub target: Option<AccountSummary>,
    pub enabled_platforms: Vec<Platform>,
}

/// auth.begin.v1
#[derive(Debug, Deserialize)]
pub struct AuthBeginRequest {
    pub session_id: String,
    pub platform: Platform,
    pub role: AccountRole,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthBeginResponse {
    pub auth_url: String,
    pub state: String,
}

/// auth.complete.v1
#[derive(Debug, Deserialize)]
pub struct AuthCompleteRequest {
    pub session_id: String,
    pub state: String,
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthCompleteResponse {
    pub role: AccountRole,
    pub username: String,
    pub display_name: String,
    pub platform: Platform,
}

/// transfer.start.v1
#[derive(Debug, Deserialize)]
pub struct TransferStartRequest {
    pub session_id: String,
    pub subscriptions: Vec<String>,
    #[serde(default)]
    pub transfer_saved_posts: bool,
    #[serde(default)]
    pub saved_posts_data: Option<ContentSnapshot>,
}

/// transfer.start.v1 / transfer.clear_all.v1
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferStartedResponse {
    pub transfer_id: String,
    pub status: String,
}

/// transfer.status.v1
#[derive(Debug, Deserialize)]
pub struct TransferStatusRequest {
    pub transfer_id: String,
}
