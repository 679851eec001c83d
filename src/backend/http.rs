//! HTTP implementation of the chat backend

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use super::error::BackendError;
use super::types::{ChatAnswer, ChatResponse, HealthStatus, PdfChatRequest, RagChatRequest};
use super::ChatBackend;
use crate::config::Config;

const PDF_MIME: &str = "application/pdf";

pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    health_timeout: Duration,
}

impl HttpBackend {
    /// Create a client for `base_url` with a per-request timeout
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(BackendError::from_reqwest)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            health_timeout: Duration::from_secs(5),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, BackendError> {
        let backend = Self::new(
            config.base_url(),
            Duration::from_secs(config.backend.request_timeout_secs),
        )?;
        Ok(backend.with_health_timeout(Duration::from_secs(config.backend.health_timeout_secs)))
    }

    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read_chat_response(response: reqwest::Response) -> Result<ChatAnswer, BackendError> {
        let status = response.status();
        let body = response.text().await.map_err(BackendError::from_reqwest)?;

        if !status.is_success() {
            return Err(BackendError::from_status(status.as_u16(), &body));
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| BackendError::Decode(e.to_string()))?;
        parsed.into_answer()
    }

    async fn build_pdf_form(request: &PdfChatRequest) -> Result<Form, BackendError> {
        let mut form = Form::new()
            .text("message", request.message.clone())
            .text("timestamp", request.timestamp.clone());

        for (index, file) in request.files.iter().enumerate() {
            let bytes = file.source.read().await.map_err(|source| BackendError::Io {
                name: file.name.clone(),
                source,
            })?;
            let part = Part::bytes(bytes)
                .file_name(file.name.clone())
                .mime_str(PDF_MIME)
                .map_err(BackendError::from_reqwest)?;
            form = form.part(format!("pdf_{}", index), part);
        }

        Ok(form)
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn rag_chat(&self, request: &RagChatRequest) -> Result<ChatAnswer, BackendError> {
        let url = self.endpoint("/api/rag-chat");
        tracing::debug!(%url, message_len = request.message.len(), "POST rag-chat");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(BackendError::from_reqwest)?;

        Self::read_chat_response(response).await
    }

    async fn pdf_rag_chat(&self, request: &PdfChatRequest) -> Result<ChatAnswer, BackendError> {
        let url = self.endpoint("/api/pdf-rag-chat");
        tracing::debug!(
            %url,
            message_len = request.message.len(),
            files = request.files.len(),
            "POST pdf-rag-chat"
        );

        let form = Self::build_pdf_form(request).await?;
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(BackendError::from_reqwest)?;

        Self::read_chat_response(response).await
    }

    async fn health(&self) -> Result<HealthStatus, BackendError> {
        let url = self.endpoint("/api/health");
        let response = self
            .client
            .get(&url)
            .timeout(self.health_timeout)
            .send()
            .await
            .map_err(BackendError::from_reqwest)?;

        let status = response.status();
        let body = response.text().await.map_err(BackendError::from_reqwest)?;
        if !status.is_success() {
            return Err(BackendError::from_status(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| BackendError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let backend = HttpBackend::new("http://localhost:5000/", Duration::from_secs(1)).unwrap();
        assert_eq!(backend.base_url(), "http://localhost:5000");
        assert_eq!(
            backend.endpoint("/api/rag-chat"),
            "http://localhost:5000/api/rag-chat"
        );
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        // Port 9 (discard) is almost never listening on loopback
        let backend = HttpBackend::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = backend
            .rag_chat(&RagChatRequest {
                message: "hi".into(),
                timestamp: "2024-01-01T00:00:00Z".into(),
            })
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }
}
