// Shared reqwest plumbing: client construction, error mapping, decoding

use crate::config::HttpSettings;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use subsync_core::domain::{FailureKind, TransferResult};
use subsync_core::port::ProviderError;

pub(crate) const USER_AGENT: &str = "subsync-app/1.0.0";

pub(crate) const AUTH_EXPIRED_MESSAGE: &str = "Access token expired or invalid";

pub(crate) fn build_client(settings: &HttpSettings) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(settings.timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| ProviderError::Configuration(format!("HTTP client setup failed: {}", e)))
}

/// Status plus fully read body
pub(crate) struct RawResponse {
    pub(crate) status: StatusCode,
    pub(crate) body: Vec<u8>,
}

impl RawResponse {
    pub(crate) async fn read(response: Response) -> Result<Self, ProviderError> {
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        Ok(Self {
            status,
            body: body.to_vec(),
        })
    }

    pub(crate) fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub(crate) fn decode<T: DeserializeOwned>(&self, what: &str) -> Result<T, ProviderError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| ProviderError::Decode(format!("invalid {} payload: {}", what, e)))
    }

    pub(crate) fn preview(&self) -> String {
        body_preview(&self.body)
    }

    /// Fallback error for a status with no dedicated mapping
    pub(crate) fn unknown(&self) -> ProviderError {
        ProviderError::Unknown {
            status: self.status.as_u16(),
            body: self.preview(),
        }
    }

    /// `HTTP <status>: <body>` failure for a mutation
    pub(crate) fn unknown_failure(&self, target_id: &str, target_name: &str) -> TransferResult {
        let preview = self.preview();
        let message = if preview.is_empty() {
            format!("HTTP {}", self.status.as_u16())
        } else {
            format!("HTTP {}: {}", self.status.as_u16(), preview)
        };
        TransferResult::failed(target_id, target_name, FailureKind::Unknown, message)
    }
}

pub(crate) fn map_transport_error(error: reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Transport(format!("request timed out: {}", error))
    } else {
        ProviderError::Transport(error.to_string())
    }
}

pub(crate) fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 200;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{}...", preview)
    } else {
        preview
    }
}

/// Match a platform error code: structured codes when the body is JSON,
/// raw substring only when it is not
pub(crate) fn has_error_code(body: &[u8], structured: Option<Vec<String>>, code: &str) -> bool {
    match structured {
        Some(codes) => codes.iter().any(|c| c.eq_ignore_ascii_case(code)),
        None => String::from_utf8_lossy(body)
            .to_ascii_lowercase()
            .contains(&code.to_ascii_lowercase()),
    }
}

pub(crate) async fn pause_between_pages(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_body_preview_compacts_and_truncates() {
        assert_eq!(body_preview(b"  {\n  \"a\":   1 }\n"), "{ \"a\": 1 }");

        let long = "x".repeat(500);
        let preview = body_preview(long.as_bytes());
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), 203);
    }

    #[rstest]
    #[case::structured_match(b"{}".as_slice(), Some(vec!["ALREADY_SUBSCRIBED".to_string()]), true)]
    #[case::structured_miss(b"{\"m\":\"already_subscribed\"}".as_slice(), Some(vec![]), false)]
    #[case::plain_text(b"error: already_subscribed".as_slice(), None, true)]
    #[case::plain_text_miss(b"Bad Request".as_slice(), None, false)]
    fn test_has_error_code(
        #[case] body: &[u8],
        #[case] structured: Option<Vec<String>>,
        #[case] expected: bool,
    ) {
        assert_eq!(
            has_error_code(body, structured, "already_subscribed"),
            expected
        );
    }

    #[test]
    fn test_unknown_failure_message() {
        let raw = RawResponse {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: b"upstream down".to_vec(),
        };
        let result = raw.unknown_failure("rust", "r/rust");
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("HTTP 500: upstream down"));
        assert_eq!(result.error_code, Some(FailureKind::Unknown));
    }
}
