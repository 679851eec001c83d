//! Configuration management for docchat

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding `backend.base_url`
pub const ENV_BASE_URL: &str = "DOCCHAT_BASE_URL";
/// Environment variable overriding `uploads.max_file_size_bytes`
pub const ENV_MAX_FILE_SIZE: &str = "DOCCHAT_MAX_FILE_SIZE";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub uploads: UploadConfig,
    pub notifications: NotificationConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub health_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            request_timeout_secs: 120,
            health_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Maximum size of a single staged file in bytes (default: 10MB).
    ///
    /// The backend advertises 50MB for the same route; the client limit is
    /// the one enforced here.
    pub max_file_size_bytes: u64,
    /// Declared type a candidate must carry to be staged
    pub accepted_mime_type: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: 10 * 1024 * 1024, // 10MB
            accepted_mime_type: "application/pdf".to_string(),
        }
    }
}

/// Toast timings, in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub show_delay_ms: u64,
    pub display_ms: u64,
    pub exit_transition_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            show_delay_ms: 100,
            display_ms: 3000,
            exit_transition_ms: 300,
        }
    }
}

/// User-facing texts and view timings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub scroll_delay_ms: u64,
    /// AI message substituted for a real answer on any failure
    pub fallback_message: String,
    /// Reference label used when a source URL cannot be parsed
    pub unknown_source_label: String,
    pub history_prompt: String,
    pub pdf_prompt: String,
    pub history_footer: String,
    pub pdf_footer: String,
    pub clear_history_title: String,
    pub clear_history_message: String,
    pub clear_pdf_title: String,
    pub clear_pdf_message: String,
    pub history_cleared_toast: String,
    pub pdf_cleared_toast: String,
    pub files_staged_toast: String,
    pub copy_success_toast: String,
    pub copy_failed_toast: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            scroll_delay_ms: 100,
            fallback_message: "Xin lỗi, đã có lỗi xảy ra khi xử lý câu hỏi của bạn. Vui lòng thử lại sau.".to_string(),
            unknown_source_label: "Nguồn tham khảo".to_string(),
            history_prompt: "Hỏi bất cứ điều gì về lịch sử Việt Nam...".to_string(),
            pdf_prompt: "Đặt câu hỏi về tài liệu PDF của bạn...".to_string(),
            history_footer: "Trả lời dựa trên cơ sở tri thức lịch sử Việt Nam.".to_string(),
            pdf_footer: "Trả lời dựa trên các tài liệu PDF bạn đã tải lên.".to_string(),
            clear_history_title: "Xóa lịch sử trò chuyện".to_string(),
            clear_history_message: "Bạn có chắc chắn muốn xóa toàn bộ cuộc trò chuyện này không?".to_string(),
            clear_pdf_title: "Xóa trò chuyện PDF".to_string(),
            clear_pdf_message: "Toàn bộ cuộc trò chuyện và các tệp PDF đã tải lên sẽ bị xóa. Tiếp tục?".to_string(),
            history_cleared_toast: "Đã xóa lịch sử trò chuyện".to_string(),
            pdf_cleared_toast: "Đã xóa cuộc trò chuyện và tệp PDF".to_string(),
            files_staged_toast: "Đã thêm {count} tệp PDF".to_string(),
            copy_success_toast: "Đã sao chép liên kết".to_string(),
            copy_failed_toast: "Không thể sao chép liên kết".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from default location or create default
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from an explicit path, falling back to defaults if absent
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Invalid config file {}", path.display()))?;
            tracing::debug!(path = %path.display(), "Loaded configuration");
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Apply `DOCCHAT_*` environment overrides on top of file values
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(ENV_BASE_URL) {
            if !url.trim().is_empty() {
                self.backend.base_url = url.trim().to_string();
            }
        }
        if let Ok(raw) = std::env::var(ENV_MAX_FILE_SIZE) {
            match raw.trim().parse::<u64>() {
                Ok(size) => self.uploads.max_file_size_bytes = size,
                Err(_) => tracing::warn!(value = %raw, "Ignoring invalid {}", ENV_MAX_FILE_SIZE),
            }
        }
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "docchat") {
            let config_dir = proj_dirs.config_dir();
            std::fs::create_dir_all(config_dir)?;
            Ok(config_dir.join("config.toml"))
        } else {
            Ok(PathBuf::from("config.toml"))
        }
    }

    /// Save configuration to default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.backend.base_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.uploads.max_file_size_bytes, 10 * 1024 * 1024);
        assert_eq!(config.uploads.accepted_mime_type, "application/pdf");
        assert_eq!(config.backend.base_url, "http://localhost:5000");
        assert_eq!(config.notifications.display_ms, 3000);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[backend]\nbase_url = \"http://rag.local:8080/\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.base_url(), "http://rag.local:8080");
        assert_eq!(config.backend.request_timeout_secs, 120);
        assert_eq!(config.ui.scroll_delay_ms, 100);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.backend.base_url, "http://localhost:5000");
    }

    #[test]
    fn test_save_roundtrip_preserves_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.uploads.max_file_size_bytes = 50 * 1024 * 1024;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.uploads.max_file_size_bytes, 50 * 1024 * 1024);
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[backend\nbase_url = 1").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
