//! LINE Messaging API client
//!
//! Sends replies through the LINE reply API.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error};

use crate::error::{LineError, Result};
use crate::types::*;

const LINE_API_BASE_URL: &str = "https://api.line.me/v2";

/// Delivers reply messages for a reply token
#[async_trait]
pub trait ReplySender: Send + Sync {
    async fn reply(&self, reply_token: &str, messages: Vec<MessageContent>) -> Result<()>;
}

/// LINE Messaging API client
#[derive(Clone)]
pub struct LineApiClient {
    client: Client,
    channel_access_token: String,
    base_url: String,
}

impl LineApiClient {
    /// Create a new LINE API client
    pub fn new(channel_access_token: &str) -> Result<Self> {
        Self::with_base_url(channel_access_token, LINE_API_BASE_URL)
    }

    /// Create a client against a custom endpoint
    pub fn with_base_url(channel_access_token: &str, base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(LineError::HttpError)?;

        Ok(Self {
            client,
            channel_access_token: channel_access_token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Reply to a message
    pub async fn reply_message(&self, reply_token: &str, messages: Vec<MessageContent>) -> Result<()> {
        let url = format!("{}/bot/message/reply", self.base_url);

        let body = ReplyMessage {
            reply_token: reply_token.to_string(),
            messages,
        };

        debug!("Replying with {} message(s)", body.messages.len());

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.channel_access_token)
            .json(&body)
            .send()
            .await
            .map_err(LineError::HttpError)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Reply message failed: {} - {}", status, error_text);
            log_error_details(&error_text);
            return Err(LineError::ApiError(format!("{}: {}", status, error_text)));
        }

        Ok(())
    }
}

#[async_trait]
impl ReplySender for LineApiClient {
    async fn reply(&self, reply_token: &str, messages: Vec<MessageContent>) -> Result<()> {
        self.reply_message(reply_token, messages).await
    }
}

fn log_error_details(error_text: &str) {
    let Ok(response) = serde_json::from_str::<LineApiResponse>(error_text) else {
        return;
    };
    for detail in response.details.unwrap_or_default() {
        error!(
            "{}: {}",
            detail.property.as_deref().unwrap_or("-"),
            detail.message
        );
    }
}
