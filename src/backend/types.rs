//! Wire types for the chat backend contracts

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::BackendError;

/// Body of `POST /api/rag-chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RagChatRequest {
    pub message: String,
    pub timestamp: String,
}

/// Fields of the multipart `POST /api/pdf-rag-chat` request
#[derive(Debug, Clone)]
pub struct PdfChatRequest {
    pub message: String,
    pub timestamp: String,
    /// Sent as `pdf_0..pdf_N`, in this order
    pub files: Vec<UploadPart>,
}

/// One binary part of a document upload
#[derive(Debug, Clone)]
pub struct UploadPart {
    pub name: String,
    pub source: FileSource,
}

/// Where a staged file's bytes live
#[derive(Debug, Clone)]
pub enum FileSource {
    /// In-memory content (drag-and-drop, tests)
    Bytes(Arc<[u8]>),
    /// File on disk, read when the request is built
    Path(PathBuf),
}

impl FileSource {
    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        match self {
            FileSource::Bytes(bytes) => Ok(bytes.to_vec()),
            FileSource::Path(path) => tokio::fs::read(path).await,
        }
    }
}

/// Raw response body shared by both chat endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub source_urls: Option<Vec<String>>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ChatResponse {
    /// Normalize into an answer, or a `Rejected` error when `success` is false
    pub fn into_answer(self) -> Result<ChatAnswer, BackendError> {
        if !self.success {
            return Err(BackendError::Rejected { error: self.error });
        }
        Ok(ChatAnswer {
            answer: self.answer.unwrap_or_default(),
            source_urls: self.source_urls.unwrap_or_default(),
        })
    }
}

/// A successful backend answer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChatAnswer {
    pub answer: String,
    pub source_urls: Vec<String>,
}

/// Body of `GET /api/health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub services: BTreeMap<String, bool>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy" && self.services.values().all(|up| *up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_response_normalizes_missing_urls() {
        let resp: ChatResponse =
            serde_json::from_str(r#"{"success": true, "answer": "Năm 938"}"#).unwrap();
        let answer = resp.into_answer().unwrap();
        assert_eq!(answer.answer, "Năm 938");
        assert!(answer.source_urls.is_empty());
    }

    #[test]
    fn test_null_urls_are_empty() {
        let resp: ChatResponse =
            serde_json::from_str(r#"{"success": true, "answer": "x", "source_urls": null}"#)
                .unwrap();
        assert!(resp.into_answer().unwrap().source_urls.is_empty());
    }

    #[test]
    fn test_failure_response_is_rejected() {
        let resp: ChatResponse =
            serde_json::from_str(r#"{"success": false, "error": "Message cannot be empty"}"#)
                .unwrap();
        match resp.into_answer() {
            Err(BackendError::Rejected { error }) => {
                assert_eq!(error.as_deref(), Some("Message cannot be empty"))
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_health_requires_all_services() {
        let health: HealthStatus = serde_json::from_str(
            r#"{"status": "healthy", "services": {"rag_service": true, "pdf_rag_service": false}}"#,
        )
        .unwrap();
        assert!(!health.is_healthy());
    }

    #[tokio::test]
    async fn test_file_source_reads_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();
        let bytes = FileSource::Path(path).read().await.unwrap();
        assert_eq!(bytes, b"%PDF-1.4");
    }
}
