//! LINE message handler implementation
//!
//! テキストメッセージを以下のように振り分けます:
//! - `区間登録 AからB` : 定期区間を保存
//! - `定期`            : 保存済みの定期区間で時刻表を検索
//! - それ以外          : `AからB` として時刻表を検索

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use jikoku_core::{
    render_card, render_text, CardDocument, CardTemplate, Error as CoreError, IconMap,
    ReplyStyle, Route, RouteParser, ScheduleFetcher, UserRouteStore,
};

use crate::api::ReplySender;
use crate::error::Result;
use crate::types::{LineEvent, MessageContent};

pub const REGISTER_COMMAND: &str = "区間登録";
pub const COMMUTE_COMMAND: &str = "定期";

const USAGE_MESSAGE: &str = "「渋谷から新宿」のように出発駅と到着駅を送ってください。\n\
定期区間の登録は「区間登録 渋谷から新宿」、検索は「定期」です。";
const NOT_REGISTERED_MESSAGE: &str =
    "定期区間が登録されていません。「区間登録 渋谷から新宿」のように登録してください。";
const NO_USER_MESSAGE: &str = "定期区間はボットとの個別トークでのみ利用できます。";
const SCRAPING_FAILED_MESSAGE: &str =
    "時刻表を取得できませんでした。しばらくしてから再度お試しください。";
const INTERNAL_ERROR_MESSAGE: &str = "エラーが発生しました。";

/// LINE のテキストメッセージ上限 (文字数)
pub const MAX_TEXT_CHARS: usize = 5000;
/// 1 回の reply で送れるメッセージ数
pub const MAX_REPLY_MESSAGES: usize = 5;

/// Configuration for the message handler
#[derive(Clone, Debug, Default)]
pub struct HandlerConfig {
    /// Card or plain-text replies
    pub reply_style: ReplyStyle,
}

/// A reply ready to be sent
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    Card(CardDocument),
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Reply::Text(text.into())
    }

    /// Long text is split on line boundaries, at most `MAX_REPLY_MESSAGES` chunks
    pub fn into_messages(self) -> Vec<MessageContent> {
        match self {
            Reply::Text(text) => {
                let mut chunks = split_message(&text, MAX_TEXT_CHARS);
                if chunks.len() > MAX_REPLY_MESSAGES {
                    warn!(
                        "Reply split into {} messages, sending the first {}",
                        chunks.len(),
                        MAX_REPLY_MESSAGES
                    );
                    chunks.truncate(MAX_REPLY_MESSAGES);
                }
                chunks
                    .into_iter()
                    .map(|text| MessageContent::Text { text })
                    .collect()
            }
            Reply::Card(card) => vec![MessageContent::Flex {
                alt_text: card.alt_text,
                contents: card.contents,
            }],
        }
    }
}

/// Split text into chunks of at most `max_chars` characters, preferring line breaks
fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        let Some((limit, _)) = remaining.char_indices().nth(max_chars) else {
            chunks.push(remaining.to_string());
            break;
        };

        let window = &remaining[..limit];
        let break_point = match window.rfind('\n') {
            Some(i) if i > 0 => i,
            _ => limit,
        };

        chunks.push(remaining[..break_point].to_string());
        let rest = &remaining[break_point..];
        remaining = rest.strip_prefix('\n').unwrap_or(rest);
    }

    chunks
}

/// Message handler for LINE
pub struct MessageHandler {
    replier: Arc<dyn ReplySender>,
    schedules: Arc<dyn ScheduleFetcher>,
    routes: Arc<dyn UserRouteStore>,
    template: Arc<CardTemplate>,
    icons: Arc<IconMap>,
    parser: RouteParser,
    config: HandlerConfig,
}

impl MessageHandler {
    /// Create a new message handler
    pub fn new(
        replier: Arc<dyn ReplySender>,
        schedules: Arc<dyn ScheduleFetcher>,
        routes: Arc<dyn UserRouteStore>,
        template: Arc<CardTemplate>,
        icons: Arc<IconMap>,
        config: HandlerConfig,
    ) -> Self {
        Self {
            replier,
            schedules,
            routes,
            template,
            icons,
            parser: RouteParser::default(),
            config,
        }
    }

    /// Process an incoming event
    ///
    /// Anything other than a text message is ignored. When building the reply
    /// fails, a short error text is still sent and the handling error is returned.
    pub async fn process_event(&self, event: &LineEvent) -> Result<()> {
        let Some(text) = event.text() else {
            return Ok(());
        };

        let Some(reply_token) = event.reply_token.as_deref() else {
            debug!("Text event without reply token, skipping");
            return Ok(());
        };

        let user_id = event.source.user_id.as_deref();

        match self.respond(user_id, text).await {
            Ok(reply) => self.replier.reply(reply_token, reply.into_messages()).await,
            Err(e) => {
                error!("Failed to build reply: {}", e);
                let fallback = Reply::text(INTERNAL_ERROR_MESSAGE).into_messages();
                if let Err(send_err) = self.replier.reply(reply_token, fallback).await {
                    error!("Failed to send error reply: {}", send_err);
                }
                Err(e)
            }
        }
    }

    /// Build the reply for one text message
    pub async fn respond(&self, user_id: Option<&str>, text: &str) -> Result<Reply> {
        let content = text.trim();

        if let Some(rest) = content.strip_prefix(REGISTER_COMMAND) {
            return self.register(user_id, rest.trim_start()).await;
        }

        if content == COMMUTE_COMMAND {
            return self.commute(user_id).await;
        }

        match self.parse_route(content) {
            Some(route) => self.schedule_reply(&route).await,
            None => Ok(Reply::text(USAGE_MESSAGE)),
        }
    }

    /// `区間登録 AからB`
    async fn register(&self, user_id: Option<&str>, route_text: &str) -> Result<Reply> {
        let Some(user_id) = user_id else {
            return Ok(Reply::text(NO_USER_MESSAGE));
        };

        let Some(route) = self.parse_route(route_text) else {
            return Ok(Reply::text(USAGE_MESSAGE));
        };

        self.routes.put(user_id, &route).await?;
        info!("Registered commuter pass for {}: {}", user_id, route.summary());

        Ok(Reply::text(format!(
            "定期区間を「{}」で登録しました。",
            route.summary()
        )))
    }

    /// `定期`
    async fn commute(&self, user_id: Option<&str>) -> Result<Reply> {
        let Some(user_id) = user_id else {
            return Ok(Reply::text(NO_USER_MESSAGE));
        };

        match self.routes.get(user_id).await? {
            Some(route) => self.schedule_reply(&route).await,
            None => {
                debug!("No commuter pass registered for {}", user_id);
                Ok(Reply::text(NOT_REGISTERED_MESSAGE))
            }
        }
    }

    async fn schedule_reply(&self, route: &Route) -> Result<Reply> {
        let schedule = match self.schedules.fetch(route).await {
            Ok(schedule) => schedule,
            Err(CoreError::ScrapingUnavailable(e)) => {
                warn!("Time table unavailable for {}: {}", route.summary(), e);
                return Ok(Reply::text(SCRAPING_FAILED_MESSAGE));
            }
            Err(e) => return Err(e.into()),
        };

        if schedule.time_table.is_empty() {
            return Ok(Reply::text(format!(
                "{}の列車が見つかりませんでした。",
                route.summary()
            )));
        }

        let reply = match self.config.reply_style {
            ReplyStyle::Card => Reply::Card(render_card(
                route,
                &schedule.time_table,
                schedule.url.as_deref(),
                &self.icons,
                &self.template,
            )),
            ReplyStyle::Text => Reply::Text(render_text(route, &schedule.time_table)),
        };

        Ok(reply)
    }

    /// Malformed text and empty station names yield `None`
    fn parse_route(&self, text: &str) -> Option<Route> {
        match self.parser.parse(text) {
            Ok(route) if route.is_complete() => Some(route),
            Ok(_) => None,
            Err(e) => {
                debug!("{}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use jikoku_core::{
        InMemoryUserRouteStore, Schedule, TimeTableEntry, TrainType,
    };

    use crate::error::LineError;
    use crate::types::{LineMessage, LineSource};

    #[derive(Default)]
    struct RecordingReplier {
        sent: Mutex<Vec<(String, Vec<MessageContent>)>>,
        fail: bool,
    }

    #[async_trait]
    impl ReplySender for RecordingReplier {
        async fn reply(&self, reply_token: &str, messages: Vec<MessageContent>) -> Result<()> {
            if self.fail {
                return Err(LineError::ApiError("400: invalid reply token".to_string()));
            }
            self.sent
                .lock()
                .unwrap()
                .push((reply_token.to_string(), messages));
            Ok(())
        }
    }

    struct FakeSchedules {
        schedule: Option<Schedule>,
        requested: Mutex<Vec<Route>>,
    }

    impl FakeSchedules {
        fn returning(schedule: Option<Schedule>) -> Self {
            Self {
                schedule,
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ScheduleFetcher for FakeSchedules {
        async fn fetch(&self, route: &Route) -> jikoku_core::Result<Schedule> {
            self.requested.lock().unwrap().push(route.clone());
            self.schedule
                .clone()
                .ok_or_else(|| CoreError::ScrapingUnavailable("503".to_string()))
        }
    }

    fn sample_schedule() -> Schedule {
        Schedule {
            time_table: vec![
                TimeTableEntry::new("10:00", "10:15", TrainType::Rapid, 0),
                TimeTableEntry::new("10:05", "10:30", TrainType::Local, 1),
            ],
            url: Some("https://delay.example.com".to_string()),
        }
    }

    struct Fixture {
        handler: MessageHandler,
        replier: Arc<RecordingReplier>,
        schedules: Arc<FakeSchedules>,
    }

    fn fixture(schedule: Option<Schedule>, style: ReplyStyle) -> Fixture {
        let replier = Arc::new(RecordingReplier::default());
        let schedules = Arc::new(FakeSchedules::returning(schedule));
        let handler = MessageHandler::new(
            replier.clone(),
            schedules.clone(),
            Arc::new(InMemoryUserRouteStore::new()),
            Arc::new(CardTemplate::bundled().unwrap()),
            Arc::new(IconMap::bundled().unwrap()),
            HandlerConfig { reply_style: style },
        );
        Fixture {
            handler,
            replier,
            schedules,
        }
    }

    fn text_event(user_id: Option<&str>, text: &str) -> LineEvent {
        LineEvent {
            event_type: "message".to_string(),
            reply_token: Some("reply-token".to_string()),
            timestamp: 0,
            source: LineSource {
                source_type: "user".to_string(),
                user_id: user_id.map(str::to_string),
                group_id: None,
                room_id: None,
            },
            message: Some(LineMessage {
                message_type: "text".to_string(),
                id: "1".to_string(),
                text: Some(text.to_string()),
            }),
        }
    }

    #[tokio::test]
    async fn test_route_query_renders_card() {
        let fx = fixture(Some(sample_schedule()), ReplyStyle::Card);

        let reply = fx.handler.respond(Some("U1"), "渋谷から新宿").await.unwrap();

        let Reply::Card(card) = reply else {
            panic!("expected a card reply");
        };
        assert_eq!(card.alt_text, "渋谷から新宿");
        assert_eq!(card.contents["body"]["contents"].as_array().unwrap().len(), 3);
        assert_eq!(
            fx.schedules.requested.lock().unwrap().as_slice(),
            &[Route::new("渋谷", "新宿")]
        );
    }

    #[tokio::test]
    async fn test_route_query_text_style() {
        let fx = fixture(Some(sample_schedule()), ReplyStyle::Text);

        let reply = fx.handler.respond(Some("U1"), "渋谷から新宿").await.unwrap();
        assert_eq!(
            reply,
            Reply::Text("◯渋谷から新宿\n10:00 -> 10:15 , 特急\n10:05 -> 10:30 , 普通".to_string())
        );
    }

    #[tokio::test]
    async fn test_malformed_text_replies_usage() {
        let fx = fixture(Some(sample_schedule()), ReplyStyle::Card);

        let reply = fx.handler.respond(Some("U1"), "こんにちは").await.unwrap();
        assert_eq!(reply, Reply::text(USAGE_MESSAGE));

        let reply = fx.handler.respond(Some("U1"), "渋谷から").await.unwrap();
        assert_eq!(reply, Reply::text(USAGE_MESSAGE));

        assert!(fx.schedules.requested.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scraping_failure_replies_fallback() {
        let fx = fixture(None, ReplyStyle::Card);

        let reply = fx.handler.respond(Some("U1"), "渋谷から新宿").await.unwrap();
        assert_eq!(reply, Reply::text(SCRAPING_FAILED_MESSAGE));
    }

    #[tokio::test]
    async fn test_empty_time_table_replies_text() {
        let fx = fixture(
            Some(Schedule {
                time_table: vec![],
                url: None,
            }),
            ReplyStyle::Card,
        );

        let reply = fx.handler.respond(Some("U1"), "渋谷から新宿").await.unwrap();
        assert_eq!(reply, Reply::text("渋谷から新宿の列車が見つかりませんでした。"));
    }

    #[tokio::test]
    async fn test_register_then_commute() {
        let fx = fixture(Some(sample_schedule()), ReplyStyle::Card);

        let reply = fx.handler.respond(Some("U1"), "区間登録 東京から品川").await.unwrap();
        assert_eq!(reply, Reply::text("定期区間を「東京から品川」で登録しました。"));

        let reply = fx.handler.respond(Some("U1"), "定期").await.unwrap();
        assert!(matches!(reply, Reply::Card(ref card) if card.alt_text == "東京から品川"));
        assert_eq!(
            fx.schedules.requested.lock().unwrap().as_slice(),
            &[Route::new("東京", "品川")]
        );
    }

    #[tokio::test]
    async fn test_register_accepts_fullwidth_space_and_overwrites() {
        let fx = fixture(Some(sample_schedule()), ReplyStyle::Card);

        fx.handler.respond(Some("U1"), "区間登録 東京から品川").await.unwrap();
        fx.handler.respond(Some("U1"), "区間登録\u{3000}渋谷から新宿").await.unwrap();
        fx.handler.respond(Some("U1"), "定期").await.unwrap();

        assert_eq!(
            fx.schedules.requested.lock().unwrap().as_slice(),
            &[Route::new("渋谷", "新宿")]
        );
    }

    #[tokio::test]
    async fn test_register_malformed_route() {
        let fx = fixture(Some(sample_schedule()), ReplyStyle::Card);

        let reply = fx.handler.respond(Some("U1"), "区間登録 東京").await.unwrap();
        assert_eq!(reply, Reply::text(USAGE_MESSAGE));

        let reply = fx.handler.respond(Some("U1"), "定期").await.unwrap();
        assert_eq!(reply, Reply::text(NOT_REGISTERED_MESSAGE));
    }

    #[tokio::test]
    async fn test_commute_unregistered() {
        let fx = fixture(Some(sample_schedule()), ReplyStyle::Card);

        let reply = fx.handler.respond(Some("U9"), "定期").await.unwrap();
        assert_eq!(reply, Reply::text(NOT_REGISTERED_MESSAGE));
        assert!(fx.schedules.requested.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_commands_need_user_id() {
        let fx = fixture(Some(sample_schedule()), ReplyStyle::Card);

        let reply = fx.handler.respond(None, "定期").await.unwrap();
        assert_eq!(reply, Reply::text(NO_USER_MESSAGE));

        let reply = fx.handler.respond(None, "区間登録 AからB").await.unwrap();
        assert_eq!(reply, Reply::text(NO_USER_MESSAGE));
    }

    #[tokio::test]
    async fn test_process_event_sends_flex_reply() {
        let fx = fixture(Some(sample_schedule()), ReplyStyle::Card);

        fx.handler
            .process_event(&text_event(Some("U1"), "渋谷から新宿"))
            .await
            .unwrap();

        let sent = fx.replier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "reply-token");
        assert!(matches!(
            &sent[0].1[0],
            MessageContent::Flex { alt_text, .. } if alt_text == "渋谷から新宿"
        ));
    }

    #[test]
    fn test_split_message() {
        assert_eq!(split_message("short", 100), vec!["short".to_string()]);

        let text = "10:00 -> 10:15\n10:05 -> 10:30\n10:10 -> 10:45";
        assert_eq!(
            split_message(text, 30),
            vec!["10:00 -> 10:15\n10:05 -> 10:30".to_string(), "10:10 -> 10:45".to_string()]
        );

        let chunks = split_message(&"駅".repeat(25), 10);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert_eq!(chunks.concat(), "駅".repeat(25));
    }

    #[test]
    fn test_long_text_reply_is_split_within_limits() {
        let line = format!("{}\n", "あ".repeat(99));
        let reply = Reply::Text(line.repeat(120));

        let messages = reply.into_messages();
        assert_eq!(messages.len(), 3);
        for message in &messages {
            let MessageContent::Text { text } = message else {
                panic!("expected text messages");
            };
            assert!(text.chars().count() <= MAX_TEXT_CHARS);
        }

        let huge = Reply::Text("い".repeat(MAX_TEXT_CHARS * 7));
        assert_eq!(huge.into_messages().len(), MAX_REPLY_MESSAGES);
    }

    #[tokio::test]
    async fn test_process_event_ignores_non_text() {
        let fx = fixture(Some(sample_schedule()), ReplyStyle::Card);

        let mut event = text_event(Some("U1"), "渋谷から新宿");
        event.message = Some(LineMessage {
            message_type: "sticker".to_string(),
            id: "1".to_string(),
            text: None,
        });
        fx.handler.process_event(&event).await.unwrap();

        let mut event = text_event(Some("U1"), "渋谷から新宿");
        event.event_type = "follow".to_string();
        fx.handler.process_event(&event).await.unwrap();

        assert!(fx.replier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_process_event_surfaces_delivery_error() {
        let handler = MessageHandler::new(
            Arc::new(RecordingReplier {
                sent: Mutex::new(Vec::new()),
                fail: true,
            }),
            Arc::new(FakeSchedules::returning(Some(sample_schedule()))),
            Arc::new(InMemoryUserRouteStore::new()),
            Arc::new(CardTemplate::bundled().unwrap()),
            Arc::new(IconMap::bundled().unwrap()),
            HandlerConfig::default(),
        );

        let result = handler
            .process_event(&text_event(Some("U1"), "渋谷から新宿"))
            .await;
        assert!(matches!(result, Err(LineError::ApiError(_))));
    }
}
