//! Route store backed by SQLite

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use tracing::{debug, info};

use super::{UserRoutePreference, UserRouteStore};
use crate::route::Route;
use crate::{Error, Result};

/// One row per user; `commuter_pass` holds the route as a JSON document.
pub struct SqliteUserRouteStore {
    conn: Mutex<Connection>,
}

impl SqliteUserRouteStore {
    /// Open (or create) the database at `db_path`
    pub fn new(db_path: &str) -> Result<Self> {
        debug!("Opening route database at: {}", db_path);

        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_tables()?;
        info!("Route store initialized");
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_tables()?;
        Ok(store)
    }

    fn conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::Store(format!("connection lock poisoned: {}", e)))
    }

    fn init_tables(&self) -> Result<()> {
        self.conn()?.execute(
            "CREATE TABLE IF NOT EXISTS user_preferences (
                user_id TEXT PRIMARY KEY,
                commuter_pass TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Save a preference, replacing any previous one for the same user
    pub fn save(&self, preference: &UserRoutePreference) -> Result<()> {
        let commuter_pass = serde_json::to_string(&preference.commuter_pass)?;
        self.conn()?.execute(
            "INSERT OR REPLACE INTO user_preferences (user_id, commuter_pass, updated_at)
             VALUES (?1, ?2, ?3)",
            params![
                preference.user_id,
                commuter_pass,
                preference.updated_at.to_rfc3339(),
            ],
        )?;
        debug!("Saved commuter pass for user: {}", preference.user_id);
        Ok(())
    }

    /// Load the full record for a user
    pub fn load(&self, user_id: &str) -> Result<Option<UserRoutePreference>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT user_id, commuter_pass, updated_at FROM user_preferences WHERE user_id = ?1",
        )?;

        let result = stmt.query_row(params![user_id], |row| {
            let user_id: String = row.get(0)?;
            let commuter_pass: String = row.get(1)?;
            let updated_at: String = row.get(2)?;
            Ok((user_id, commuter_pass, updated_at))
        });

        let (user_id, commuter_pass, updated_at) = match result {
            Ok(row) => row,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let commuter_pass: Route = serde_json::from_str(&commuter_pass)?;
        let updated_at = DateTime::parse_from_rfc3339(&updated_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(Some(UserRoutePreference {
            user_id,
            commuter_pass,
            updated_at,
        }))
    }

    /// Count stored preferences
    pub fn count(&self) -> Result<usize> {
        let count: i64 =
            self.conn()?
                .query_row("SELECT COUNT(*) FROM user_preferences", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[async_trait]
impl UserRouteStore for SqliteUserRouteStore {
    async fn put(&self, user_id: &str, route: &Route) -> Result<()> {
        self.save(&UserRoutePreference::new(user_id, route.clone()))
    }

    async fn get(&self, user_id: &str) -> Result<Option<Route>> {
        Ok(self.load(user_id)?.map(|pref| pref.commuter_pass))
    }
}
