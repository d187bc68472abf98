// Transfer Job Domain Model

use crate::domain::error::{DomainError, Result};
use crate::domain::{Account, Platform};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Job ID (UUID v4)
pub type JobId = String;

/// Job Status: started -> in_progress -> {completed | failed}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Started,
    InProgress,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Started => write!(f, "started"),
            JobStatus::InProgress => write!(f, "in_progress"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// What a job does to each item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Subscribe the target account to each item
    Transfer,
    /// Unsubscribe the target account from each item
    ClearAll,
}

/// Structured reason for a failed item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    AuthExpired,
    AccessDenied,
    NotFound,
    QuotaExceeded,
    Unsupported,
    Transport,
    Unknown,
}

/// Outcome of one attempted item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResult {
    pub target_id: String,
    pub target_name: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<FailureKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub already_exists: Option<bool>,
}

impl TransferResult {
    pub fn succeeded(target_id: impl Into<String>, target_name: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            target_name: target_name.into(),
            success: true,
            error: None,
            error_code: None,
            already_exists: None,
        }
    }

    /// Duplicate subscribe/save: normalized to success
    pub fn already_exists(target_id: impl Into<String>, target_name: impl Into<String>) -> Self {
        Self {
            already_exists: Some(true),
            ..Self::succeeded(target_id, target_name)
        }
    }

    pub fn failed(
        target_id: impl Into<String>,
        target_name: impl Into<String>,
        kind: FailureKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            target_id: target_id.into(),
            target_name: target_name.into(),
            success: false,
            error: Some(message.into()),
            error_code: Some(kind),
            already_exists: None,
        }
    }

    pub fn is_quota_exceeded(&self) -> bool {
        self.error_code == Some(FailureKind::QuotaExceeded)
    }
}

/// Cumulative counters for a list of items
///
/// `processed == successful + failed` and `results.len() == processed` hold
/// after every call to [`TransferProgress::record`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferProgress {
    pub total: usize,
    pub processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub results: Vec<TransferResult>,
}

impl TransferProgress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            results: Vec::with_capacity(total),
            ..Self::default()
        }
    }

    /// Append one item outcome
    pub fn record(&mut self, result: TransferResult) -> Result<()> {
        if self.processed >= self.total {
            return Err(DomainError::ValidationError(format!(
                "progress already at {}/{}",
                self.processed, self.total
            )));
        }
        if result.success {
            self.successful += 1;
        } else {
            self.failed += 1;
        }
        self.processed += 1;
        self.results.push(result);
        Ok(())
    }

    pub fn is_finished(&self) -> bool {
        self.processed == self.total
    }

    pub fn is_consistent(&self) -> bool {
        self.processed <= self.total
            && self.processed == self.successful + self.failed
            && self.results.len() == self.processed
    }
}

/// Nested saved-content replay sub-record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentTransfer {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(flatten)]
    pub progress: TransferProgress,
}

impl ContentTransfer {
    pub fn new(total: usize) -> Self {
        Self {
            enabled: true,
            warning: None,
            progress: TransferProgress::new(total),
        }
    }

    /// Disable the sub-record when the platforms cannot replay content
    pub fn skip(&mut self, warning: impl Into<String>) {
        self.enabled = false;
        self.warning = Some(warning.into());
        self.progress = TransferProgress::new(0);
    }
}

/// Transfer Job Entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferJob {
    pub id: JobId,
    pub kind: JobKind,
    pub status: JobStatus,
    #[serde(flatten)]
    pub progress: TransferProgress,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub source_platform: Platform,
    pub target_platform: Platform,
    pub source_account: String,
    pub target_account: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_transfer: Option<ContentTransfer>,
    /// Abort reason when `status == failed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TransferJob {
    /// Create a new job in `started` state
    ///
    /// # Arguments
    ///
    /// * `id` - Unique job ID (injected, not generated)
    /// * `kind` - Subscribe or unsubscribe each item
    /// * `source` / `target` - Accounts involved (only display names are kept)
    /// * `total` - Number of items; fixed for the life of the job
    /// * `started_at` - Creation timestamp (injected, not system time)
    pub fn new(
        id: impl Into<String>,
        kind: JobKind,
        source: &Account,
        target: &Account,
        total: usize,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            status: JobStatus::Started,
            progress: TransferProgress::new(total),
            started_at,
            completed_at: None,
            source_platform: source.platform,
            target_platform: target.platform,
            source_account: source.display_name.clone(),
            target_account: target.display_name.clone(),
            content_transfer: None,
            error: None,
        }
    }

    pub fn with_content(mut self, total: usize) -> Self {
        self.content_transfer = Some(ContentTransfer::new(total));
        self
    }

    /// Transition to `in_progress`
    pub fn start(&mut self) -> Result<()> {
        if self.status != JobStatus::Started {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: JobStatus::InProgress.to_string(),
            });
        }
        self.status = JobStatus::InProgress;
        Ok(())
    }

    /// Transition to `completed` with explicit timestamp
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.status != JobStatus::InProgress {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: JobStatus::Completed.to_string(),
            });
        }
        self.status = JobStatus::Completed;
        self.completed_at = Some(now);
        Ok(())
    }

    /// Mark as `failed`, keeping whatever results accumulated
    pub fn fail(&mut self, now: DateTime<Utc>, reason: impl Into<String>) {
        self.status = JobStatus::Failed;
        self.completed_at = Some(now);
        self.error = Some(reason.into());
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
