// Domain Layer - Pure business logic and entities

pub mod account;
pub mod content;
pub mod error;
pub mod platform;
pub mod session;
pub mod subscription;
pub mod transfer;

// Re-exports
pub use account::{Account, AccountRole, AuthorizationRequest, PlatformTokens};
pub use content::{ContentItem, ContentKind, ContentSnapshot, CONTENT_SNAPSHOT_VERSION};
pub use error::DomainError;
pub use platform::Platform;
pub use session::{PendingAuth, Session, SessionId};
pub use subscription::Subscription;
pub use transfer::{
    ContentTransfer, FailureKind, JobId, JobKind, JobStatus, TransferJob, TransferProgress,
    TransferResult,
};
