// Session & pending OAuth state

use crate::domain::{Account, AccountRole, Platform};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type SessionId = String;

/// A browser/CLI session holding up to two authenticated accounts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub source: Option<Account>,
    pub target: Option<Account>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            source: None,
            target: None,
            created_at,
        }
    }

    pub fn account(&self, role: AccountRole) -> Option<&Account> {
        match role {
            AccountRole::Source => self.source.as_ref(),
            AccountRole::Target => self.target.as_ref(),
        }
    }

    pub fn set_account(&mut self, role: AccountRole, account: Account) {
        match role {
            AccountRole::Source => self.source = Some(account),
            AccountRole::Target => self.target = Some(account),
        }
    }
}

/// OAuth round-trip correlation, keyed by the `state` token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAuth {
    pub role: AccountRole,
    pub session_id: SessionId,
    pub platform: Platform,
    pub created_at: DateTime<Utc>,
}
