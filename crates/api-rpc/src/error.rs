//! RPC Error Types
//!
//! Maps application errors to JSON-RPC error codes.

use jsonrpsee::types::ErrorObjectOwned;
use subsync_core::error::AppError;
use subsync_core::port::ProviderError;

/// RPC Error Codes
pub mod code {
    pub const VALIDATION_ERROR: i32 = 4000;
    pub const NOT_FOUND: i32 = 4001;
    pub const UNAUTHENTICATED: i32 = 4010;
    pub const QUOTA_EXCEEDED: i32 = 4290;
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const UPSTREAM_ERROR: i32 = 5020;
}

const RECONNECT_MESSAGE: &str = "Authentication expired. Please reconnect your account.";

/// Convert AppError to JSON-RPC ErrorObject
pub fn to_rpc_error(err: AppError) -> ErrorObjectOwned {
    match err {
        AppError::Validation(msg) => {
            ErrorObjectOwned::owned(code::VALIDATION_ERROR, msg, None::<()>)
        }
        AppError::Domain(e) => {
            ErrorObjectOwned::owned(code::VALIDATION_ERROR, e.to_string(), None::<()>)
        }
        AppError::Serialization(e) => {
            ErrorObjectOwned::owned(code::VALIDATION_ERROR, e.to_string(), None::<()>)
        }
        AppError::NotFound(msg) => ErrorObjectOwned::owned(code::NOT_FOUND, msg, None::<()>),
        AppError::Unauthenticated(msg) => {
            ErrorObjectOwned::owned(code::UNAUTHENTICATED, msg, None::<()>)
        }
        AppError::Provider(e) => provider_error(e),
        AppError::Config(msg) => ErrorObjectOwned::owned(code::INTERNAL_ERROR, msg, None::<()>),
        AppError::RateLimit(e) => {
            ErrorObjectOwned::owned(code::INTERNAL_ERROR, e.to_string(), None::<()>)
        }
        AppError::Internal(msg) => ErrorObjectOwned::owned(code::INTERNAL_ERROR, msg, None::<()>),
    }
}

fn provider_error(err: ProviderError) -> ErrorObjectOwned {
    match err {
        ProviderError::AuthExpired => {
            ErrorObjectOwned::owned(code::UNAUTHENTICATED, RECONNECT_MESSAGE, None::<()>)
        }
        ProviderError::QuotaExceeded(msg) => {
            ErrorObjectOwned::owned(code::QUOTA_EXCEEDED, msg, None::<()>)
        }
        ProviderError::Configuration(msg) => {
            ErrorObjectOwned::owned(code::INTERNAL_ERROR, msg, None::<()>)
        }
        other => ErrorObjectOwned::owned(code::UPSTREAM_ERROR, other.to_string(), None::<()>),
    }
}
