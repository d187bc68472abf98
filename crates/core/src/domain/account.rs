// Account & OAuth token shapes

use crate::domain::error::DomainError;
use crate::domain::Platform;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Authenticated platform account (credentials are opaque bearer tokens)
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub username: String,
    pub display_name: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub platform: Platform,
}

// Tokens stay out of logs
impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("username", &self.username)
            .field("display_name", &self.display_name)
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("platform", &self.platform)
            .finish()
    }
}

impl Account {
    /// Fill in credentials from a token response, computing expiry from `now`
    pub fn with_tokens(mut self, tokens: &PlatformTokens, now: DateTime<Utc>) -> Self {
        self.access_token = tokens.access_token.clone();
        if let Some(refresh) = &tokens.refresh_token {
            self.refresh_token = refresh.clone();
        }
        self.expires_at = now + chrono::Duration::seconds(tokens.expires_in);
        self
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// OAuth token response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformTokens {
    pub access_token: String,
    /// Absent on some refresh responses (Google keeps the original refresh token)
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    pub token_type: String,
    #[serde(default)]
    pub scope: Option<String>,
}

/// OAuth authorization redirect plus its anti-forgery state token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationRequest {
    pub auth_url: String,
    pub state: String,
}

/// Which side of a transfer an account plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    Source,
    Target,
}

impl std::fmt::Display for AccountRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountRole::Source => write!(f, "source"),
            AccountRole::Target => write!(f, "target"),
        }
    }
}

impl FromStr for AccountRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "source" => Ok(AccountRole::Source),
            "target" => Ok(AccountRole::Target),
            other => Err(DomainError::UnknownRole(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Account {
        Account {
            username: "alice".to_string(),
            display_name: "Alice".to_string(),
            access_token: String::new(),
            refresh_token: "old-refresh".to_string(),
            expires_at: DateTime::<Utc>::from_timestamp(0, 0).unwrap(),
            platform: Platform::Reddit,
        }
    }

    #[test]
    fn test_with_tokens_sets_expiry_and_keeps_refresh_when_absent() {
        let now = DateTime::<Utc>::from_timestamp(1_000, 0).unwrap();
        let tokens = PlatformTokens {
            access_token: "new-access".to_string(),
            refresh_token: None,
            expires_in: 3600,
            token_type: "bearer".to_string(),
            scope: None,
        };

        let updated = account().with_tokens(&tokens, now);

        assert_eq!(updated.access_token, "new-access");
        assert_eq!(updated.refresh_token, "old-refresh");
        assert_eq!(updated.expires_at.timestamp(), 4_600);
        assert!(!updated.is_expired(now));
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let mut acc = account();
        acc.access_token = "secret-token".to_string();
        let rendered = format!("{:?}", acc);
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("REDACTED"));
    }
}
