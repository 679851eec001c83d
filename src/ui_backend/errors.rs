//! Typed errors for the session controller
//!
//! Validation failures are detected before any network call and surface as
//! toasts; their `Display` text is what the user sees.

use thiserror::Error;

use super::types::format_size;

/// Input rejected before anything is sent
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Vui lòng nhập câu hỏi")]
    EmptyMessage,

    #[error("Đang xử lý câu hỏi trước, vui lòng đợi")]
    Busy,

    #[error("Vui lòng tải lên ít nhất một tệp PDF")]
    NoDocuments,

    #[error("{name}: chỉ chấp nhận tệp PDF")]
    NotPdf { name: String },

    #[error("{name}: tệp quá lớn ({}, tối đa {})", size_label(.size), size_label(.max))]
    TooLarge { name: String, size: u64, max: u64 },

    #[error("{name}: tệp đã được thêm trước đó")]
    Duplicate { name: String },
}

fn size_label(bytes: &u64) -> String {
    format_size(*bytes)
}

/// Discriminant of a `ValidationError`, for callers that only branch on kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationKind {
    EmptyMessage,
    Busy,
    NoDocuments,
    NotPdf,
    TooLarge,
    Duplicate,
}

impl ValidationError {
    pub fn kind(&self) -> ValidationKind {
        match self {
            ValidationError::EmptyMessage => ValidationKind::EmptyMessage,
            ValidationError::Busy => ValidationKind::Busy,
            ValidationError::NoDocuments => ValidationKind::NoDocuments,
            ValidationError::NotPdf { .. } => ValidationKind::NotPdf,
            ValidationError::TooLarge { .. } => ValidationKind::TooLarge,
            ValidationError::Duplicate { .. } => ValidationKind::Duplicate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_large_message_shows_sizes() {
        let err = ValidationError::TooLarge {
            name: "scan.pdf".into(),
            size: 12 * 1024 * 1024,
            max: 10 * 1024 * 1024,
        };
        let text = err.to_string();
        assert!(text.starts_with("scan.pdf"));
        assert!(text.contains("12.0MB"));
        assert!(text.contains("10.0MB"));
        assert_eq!(err.kind(), ValidationKind::TooLarge);
    }
}
