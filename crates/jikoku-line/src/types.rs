//! LINE Messaging API types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// LINE message event payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineMessage {
    #[serde(rename = "type")]
    pub message_type: String,
    pub id: String,
    #[serde(default)]
    pub text: Option<String>,
}

/// LINE source (user, group, or room)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineSource {
    #[serde(rename = "type")]
    pub source_type: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub room_id: Option<String>,
}

/// LINE event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(rename = "replyToken", default)]
    pub reply_token: Option<String>,
    #[serde(default)]
    pub timestamp: i64,
    pub source: LineSource,
    #[serde(default)]
    pub message: Option<LineMessage>,
}

impl LineEvent {
    /// Text of a text-message event
    pub fn text(&self) -> Option<&str> {
        if self.event_type != "message" {
            return None;
        }
        self.message
            .as_ref()
            .filter(|m| m.message_type == "text")
            .and_then(|m| m.text.as_deref())
    }
}

/// Webhook request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookBody {
    #[serde(default)]
    pub destination: String,
    pub events: Vec<LineEvent>,
}

/// Reply message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyMessage {
    #[serde(rename = "replyToken")]
    pub reply_token: String,
    pub messages: Vec<MessageContent>,
}

/// Message content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "lowercase")]
pub enum MessageContent {
    Text {
        text: String,
    },
    Flex {
        #[serde(rename = "altText")]
        alt_text: String,
        contents: Value,
    },
}

/// Error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineApiResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<Vec<ErrorDetail>>,
}

/// Error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    pub property: Option<String>,
}
