//! LINE Bot implementation
//!
//! Main entry point for the LINE Gateway

use std::sync::Arc;

use tracing::info;

use jikoku_core::{CardTemplate, Config, IconMap, ReplyStyle, ScheduleFetcher, UserRouteStore};

use crate::api::LineApiClient;
use crate::error::{LineError, Result};
use crate::handler::{HandlerConfig, MessageHandler};
use crate::webhook::{create_webhook_router, WebhookState};

/// LINE Bot configuration
#[derive(Clone, Debug, Default)]
pub struct LineBotConfig {
    /// Channel secret
    pub channel_secret: String,
    /// Channel access token
    pub channel_access_token: String,
    /// Webhook server port
    pub webhook_port: u16,
    /// Webhook path
    pub webhook_path: String,
    /// Card or plain-text replies
    pub reply_style: ReplyStyle,
}

impl From<&Config> for LineBotConfig {
    fn from(config: &Config) -> Self {
        Self {
            channel_secret: config.line.channel_secret.clone(),
            channel_access_token: config.line.channel_access_token.clone(),
            webhook_port: config.line.port,
            webhook_path: config.line.webhook_path.clone(),
            reply_style: config.reply.style,
        }
    }
}

/// LINE Bot for the time-table gateway
pub struct LineBot {
    bot_config: LineBotConfig,
    handler: Arc<MessageHandler>,
}

impl LineBot {
    /// Create a new LINE bot
    pub fn new(
        bot_config: LineBotConfig,
        schedules: Arc<dyn ScheduleFetcher>,
        routes: Arc<dyn UserRouteStore>,
        template: Arc<CardTemplate>,
        icons: Arc<IconMap>,
    ) -> Result<Self> {
        if bot_config.channel_secret.is_empty() {
            return Err(LineError::Config("Channel secret not configured".to_string()));
        }
        if bot_config.channel_access_token.is_empty() {
            return Err(LineError::Config("Channel access token not configured".to_string()));
        }

        let api_client = LineApiClient::new(&bot_config.channel_access_token)?;

        let handler = Arc::new(MessageHandler::new(
            Arc::new(api_client),
            schedules,
            routes,
            template,
            icons,
            HandlerConfig {
                reply_style: bot_config.reply_style,
            },
        ));

        Ok(Self {
            bot_config,
            handler,
        })
    }

    fn webhook_state(&self) -> WebhookState {
        WebhookState {
            channel_secret: self.bot_config.channel_secret.clone(),
            handler: self.handler.clone(),
        }
    }

    /// Run the bot with shutdown signal
    pub async fn run(&self, mut shutdown: tokio::sync::broadcast::Receiver<()>) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.bot_config.webhook_port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| LineError::Webhook(e.to_string()))?;

        info!(
            "LINE webhook server listening on {}{}",
            addr, self.bot_config.webhook_path
        );

        let app = create_webhook_router(self.webhook_state(), &self.bot_config.webhook_path);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                info!("LINE bot shutting down");
            })
            .await
            .map_err(|e| LineError::Webhook(e.to_string()))?;

        Ok(())
    }
}
