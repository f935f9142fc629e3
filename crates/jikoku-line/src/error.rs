//! エラー型定義 (jikoku-line)

use thiserror::Error;

/// jikoku-line のエラー型
#[derive(Error, Debug)]
pub enum LineError {
    #[error("LINE API error: {0}")]
    ApiError(String),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Webhook error: {0}")]
    Webhook(String),

    #[error(transparent)]
    Core(#[from] jikoku_core::Error),
}

/// Result 型エイリアス
pub type Result<T> = std::result::Result<T, LineError>;
