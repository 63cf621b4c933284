//! Error types / 错误类型
//!
//! One enum per concern. The binary collapses them into `anyhow::Error`.

use thiserror::Error;

/// Configuration loading and validation errors / 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("missing required key: '{0}'")]
    MissingKey(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        ConfigError::Invalid(msg.into())
    }
}

/// Per-item validation error raised before scoring / 条目校验错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemError {
    #[error("item is missing required field '{0}'")]
    MissingField(&'static str),
}

/// arXiv retrieval errors / 抓取错误
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid arXiv category: {0}")]
    InvalidCategory(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("failed to parse arXiv feed: {0}")]
    Feed(String),
}

impl FetchError {
    /// Only transport-level failures are worth another attempt / 仅网络层错误重试
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            FetchError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Text extraction errors / 文本提取错误
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read source archive: {0}")]
    Archive(#[from] std::io::Error),

    #[error("failed to extract PDF text: {0}")]
    Pdf(String),
}

/// Summarization errors / 摘要生成错误
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("LLM request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("LLM response had no text content")]
    EmptyResponse,
}

impl AnalyzerError {
    /// Transport errors, rate limits and server errors are retried / 可重试的错误
    pub fn is_retryable(&self) -> bool {
        match self {
            AnalyzerError::Http(_) => true,
            AnalyzerError::Status { status, .. } => *status == 429 || *status >= 500,
            AnalyzerError::EmptyResponse => false,
        }
    }
}

/// Email delivery errors / 邮件发送错误
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid email address '{address}': {reason}")]
    Address { address: String, reason: String },

    #[error("failed to build email: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("failed to send email: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Watermark persistence errors / 水位记录错误
#[derive(Debug, Error)]
pub enum WatermarkError {
    #[error("failed to access watermark file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid watermark date '{0}'")]
    Date(String),
}
