//! Webhook server for LINE Bot
//!
//! Handles incoming webhooks from LINE Messaging API

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, warn};

use crate::error::{LineError, Result};
use crate::handler::MessageHandler;
use crate::types::WebhookBody;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-line-signature";

/// Webhook server state
#[derive(Clone)]
pub struct WebhookState {
    pub channel_secret: String,
    pub handler: Arc<MessageHandler>,
}

/// Create webhook router
pub fn create_webhook_router(state: WebhookState, path: &str) -> Router {
    Router::new()
        .route(path, post(handle_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Handle incoming webhook
///
/// Signature problems are answered with 400 and nothing is processed.
/// Failures while handling individual events are logged; the response is still `OK`.
async fn handle_webhook(
    State(state): State<Arc<WebhookState>>,
    headers: HeaderMap,
    body: Bytes,
) -> std::result::Result<(StatusCode, &'static str), StatusCode> {
    let body = String::from_utf8(body.to_vec()).map_err(|_| StatusCode::BAD_REQUEST)?;
    debug!("Request body: {}", body);

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            warn!("Missing x-line-signature header");
            StatusCode::BAD_REQUEST
        })?;

    if let Err(e) = verify_signature(&state.channel_secret, &body, signature) {
        warn!("{}", e);
        return Err(StatusCode::BAD_REQUEST);
    }

    let webhook: WebhookBody = serde_json::from_str(&body).map_err(|e| {
        error!("Failed to parse webhook body: {:?}", e);
        StatusCode::BAD_REQUEST
    })?;

    debug!(
        "Received {} event(s) for destination: {}",
        webhook.events.len(),
        webhook.destination
    );

    for event in &webhook.events {
        if let Err(e) = state.handler.process_event(event).await {
            error!("Error processing event: {}", e);
        }
    }

    Ok((StatusCode::OK, "OK"))
}

/// Verify LINE signature (base64 HMAC-SHA256 of the raw body)
pub fn verify_signature(channel_secret: &str, body: &str, signature: &str) -> Result<()> {
    let expected = STANDARD
        .decode(signature)
        .map_err(|_| LineError::InvalidSignature)?;

    let mut mac = HmacSha256::new_from_slice(channel_secret.as_bytes())
        .map_err(|_| LineError::InvalidSignature)?;
    mac.update(body.as_bytes());

    mac.verify_slice(&expected)
        .map_err(|_| LineError::InvalidSignature)
}
