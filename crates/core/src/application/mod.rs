// Application Layer - Use Cases

pub mod rate_limiter;
pub mod reaper;
pub mod registry;
pub mod shutdown;
pub mod transfer;

// Re-exports
pub use rate_limiter::{RateLimitConfig, RateLimitError, RateLimiter, RateLimits};
pub use reaper::{JobReaper, ReaperConfig};
pub use registry::{ProviderFactory, ProviderRegistry};
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
pub use transfer::{TransferEngine, TransferOptions};
