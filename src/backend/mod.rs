//! Chat backend client
//!
//! The retrieval/generation service is opaque; only its HTTP contracts are
//! modeled here. `ChatBackend` is the seam the dispatcher talks to, so tests
//! and alternative transports can stand in for the HTTP client.

mod error;
mod http;
mod types;

pub use error::BackendError;
pub use http::HttpBackend;
pub use types::{
    ChatAnswer, ChatResponse, FileSource, HealthStatus, PdfChatRequest, RagChatRequest,
    UploadPart,
};

use async_trait::async_trait;

/// Trait for chat backends
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Ask the general knowledge base (`/api/rag-chat`)
    async fn rag_chat(&self, request: &RagChatRequest) -> Result<ChatAnswer, BackendError>;

    /// Ask about uploaded documents (`/api/pdf-rag-chat`)
    async fn pdf_rag_chat(&self, request: &PdfChatRequest) -> Result<ChatAnswer, BackendError>;

    /// Service liveness (`/api/health`)
    async fn health(&self) -> Result<HealthStatus, BackendError>;
}
