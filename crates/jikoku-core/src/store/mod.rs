//! User route preferences
//!
//! ユーザーごとに一件だけ定期区間を保持します。登録はユーザー ID をキーにした
//! 上書き (upsert) で、未登録は `None` で表します。

mod memory;
mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::route::Route;
use crate::Result;

pub use memory::InMemoryUserRouteStore;
pub use sqlite::SqliteUserRouteStore;

/// 保存される一件分のレコード
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRoutePreference {
    pub user_id: String,
    pub commuter_pass: Route,
    pub updated_at: DateTime<Utc>,
}

impl UserRoutePreference {
    pub fn new(user_id: impl Into<String>, commuter_pass: Route) -> Self {
        Self {
            user_id: user_id.into(),
            commuter_pass,
            updated_at: Utc::now(),
        }
    }
}

/// Storage backend for commuter-pass routes
#[async_trait]
pub trait UserRouteStore: Send + Sync {
    /// Insert or overwrite the route for `user_id`
    async fn put(&self, user_id: &str, route: &Route) -> Result<()>;

    /// Saved route, or `None` when the user never registered one
    async fn get(&self, user_id: &str) -> Result<Option<Route>>;
}
