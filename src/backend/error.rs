//! Typed errors for backend calls
//!
//! Separates transport failures (network, timeout, non-2xx, undecodable body)
//! from backend-reported failures (`success: false` in a well-formed reply).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    /// Connection refused, DNS failure, reset, etc.
    #[error("Network error: {0}")]
    Network(String),

    /// The request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,

    /// Non-2xx HTTP status
    #[error("Backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The body was not the expected JSON shape
    #[error("Invalid response body: {0}")]
    Decode(String),

    /// Well-formed response carrying `success: false`
    #[error("Backend reported failure: {}", .error.as_deref().unwrap_or("no details"))]
    Rejected { error: Option<String> },

    /// A staged file could not be read while building the upload
    #[error("Failed to read upload {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

impl BackendError {
    /// True for failures that never reached a well-formed backend answer
    pub fn is_transport(&self) -> bool {
        !matches!(self, BackendError::Rejected { .. })
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BackendError::Timeout
        } else if err.is_decode() {
            BackendError::Decode(err.to_string())
        } else {
            BackendError::Network(err.to_string())
        }
    }

    /// Build a status error, preferring the backend's `error` field over the raw body
    pub(crate) fn from_status(status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
            .unwrap_or_else(|| body.trim().to_string());
        BackendError::Status {
            status,
            body: detail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_is_not_transport() {
        let err = BackendError::Rejected {
            error: Some("Internal server error occurred".into()),
        };
        assert!(!err.is_transport());
        assert!(err.to_string().contains("Internal server error occurred"));
    }

    #[test]
    fn test_status_prefers_error_field() {
        let err = BackendError::from_status(
            400,
            r#"{"success": false, "error": "No valid PDF files uploaded"}"#,
        );
        assert!(err.is_transport());
        match err {
            BackendError::Status { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "No valid PDF files uploaded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_status_falls_back_to_raw_body() {
        let err = BackendError::from_status(502, "  Bad Gateway\n");
        assert_eq!(err.to_string(), "Backend returned HTTP 502: Bad Gateway");
    }
}
