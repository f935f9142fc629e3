//! jikoku-line: LINE Gateway for the time-table bot
//!
//! LINE Messaging API の Webhook を受け取り、区間の時刻表を Flex Message で返信します。
//! 「区間登録」「定期」コマンドでユーザーごとの定期区間を扱います。

pub mod api;
pub mod bot;
pub mod error;
pub mod handler;
pub mod types;
pub mod webhook;

pub use api::{LineApiClient, ReplySender};
pub use bot::{LineBot, LineBotConfig};
pub use error::{LineError, Result};
pub use handler::{HandlerConfig, MessageHandler, Reply};
