//! Scraping server client
//!
//! 区間をクエリパラメータとしてスクレイピングサーバーへ GET し、
//! 返ってきた JSON を時刻表として読み込みます。再試行は行いません。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::ScraperConfig;
use crate::route::Route;
use crate::timetable::TimeTable;
use crate::{Error, Result};

/// Scraping server response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub time_table: TimeTable,
    /// 遅延・乗換情報ページ
    #[serde(default)]
    pub url: Option<String>,
}

/// 時刻表の取得元
#[async_trait]
pub trait ScheduleFetcher: Send + Sync {
    async fn fetch(&self, route: &Route) -> Result<Schedule>;
}

/// HTTP client for the scraping server
#[derive(Clone)]
pub struct ScheduleClient {
    client: Client,
    endpoint: String,
}

impl ScheduleClient {
    /// Create a new client from configuration
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        if config.base_url.is_empty() {
            return Err(Error::Config("scraper base URL not configured".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/{}",
                config.base_url.trim_end_matches('/'),
                config.path_name.trim_start_matches('/')
            ),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ScheduleFetcher for ScheduleClient {
    async fn fetch(&self, route: &Route) -> Result<Schedule> {
        debug!("Fetching time table for {}", route.summary());

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("starting_point", route.starting_point.as_str()),
                ("end_point", route.end_point.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                error!("Scraping request failed: {}", e);
                Error::ScrapingUnavailable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Scraping server returned {}: {}", status, error_text);
            return Err(Error::ScrapingUnavailable(format!("{}: {}", status, error_text)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::ScrapingUnavailable(e.to_string()))?;

        let schedule: Schedule = serde_json::from_str(&body).map_err(|e| {
            error!("Malformed scraping response: {}", e);
            Error::ScrapingUnavailable(format!("malformed response: {}", e))
        })?;

        info!(
            "Fetched {} entries for {}",
            schedule.time_table.len(),
            route.summary()
        );
        Ok(schedule)
    }
}
