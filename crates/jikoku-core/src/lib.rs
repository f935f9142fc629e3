//! jikoku-core: 時刻表ボットのコアライブラリ
//!
//! 「AからB」形式の区間解析、スクレイピングサーバーからの時刻表取得、
//! Flex カード / テキストへの描画、ユーザーごとの定期区間の永続化を提供します。

pub mod config;
pub mod error;
pub mod render;
pub mod route;
pub mod schedule;
pub mod store;
pub mod timetable;

pub use config::{Config, DesignConfig, LineConfig, ReplyConfig, ReplyStyle, ScraperConfig, StoreConfig};
pub use error::{Error, Result};
pub use render::{CardDocument, CardTemplate, IconMap, render_card, render_text};
pub use route::{Route, RouteParser, ROUTE_SEPARATOR};
pub use schedule::{Schedule, ScheduleClient, ScheduleFetcher};
pub use store::{InMemoryUserRouteStore, SqliteUserRouteStore, UserRoutePreference, UserRouteStore};
pub use timetable::{TimeTable, TimeTableEntry, TrainType};
