// Port Layer - Interfaces for external dependencies

pub mod id_provider; // For deterministic testing
pub mod job_repository;
pub mod platform_provider;
pub mod session_store;
pub mod time_provider;

// Re-exports
pub use id_provider::IdProvider;
pub use job_repository::TransferJobRepository;
pub use platform_provider::{PlatformProvider, ProviderCapabilities, ProviderError};
pub use session_store::{PendingAuthStore, SessionStore};
pub use time_provider::TimeProvider;
