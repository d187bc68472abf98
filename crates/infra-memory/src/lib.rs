// SubSync Infrastructure - In-Memory Adapters
// Implements: TransferJobRepository, SessionStore, PendingAuthStore

mod job_repository;
mod session_store;

pub use job_repository::InMemoryTransferJobRepository;
pub use session_store::{InMemoryPendingAuthStore, InMemorySessionStore};
