//! In-memory route store

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use super::{UserRoutePreference, UserRouteStore};
use crate::route::Route;
use crate::Result;

/// Process-local store, lost on restart
#[derive(Debug, Default)]
pub struct InMemoryUserRouteStore {
    preferences: DashMap<String, UserRoutePreference>,
}

impl InMemoryUserRouteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.preferences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.preferences.is_empty()
    }
}

#[async_trait]
impl UserRouteStore for InMemoryUserRouteStore {
    async fn put(&self, user_id: &str, route: &Route) -> Result<()> {
        debug!("Saving commuter pass for user: {}", user_id);
        self.preferences.insert(
            user_id.to_string(),
            UserRoutePreference::new(user_id, route.clone()),
        );
        Ok(())
    }

    async fn get(&self, user_id: &str) -> Result<Option<Route>> {
        Ok(self
            .preferences
            .get(user_id)
            .map(|pref| pref.commuter_pass.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get() -> Result<()> {
        let store = InMemoryUserRouteStore::new();
        let route = Route::new("渋谷", "新宿");

        store.put("U1", &route).await?;
        assert_eq!(store.get("U1").await?, Some(route));
        Ok(())
    }

    #[tokio::test]
    async fn test_get_unregistered() -> Result<()> {
        let store = InMemoryUserRouteStore::new();
        assert_eq!(store.get("nobody").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_put_overwrites() -> Result<()> {
        let store = InMemoryUserRouteStore::new();
        store.put("U1", &Route::new("渋谷", "新宿")).await?;
        store.put("U1", &Route::new("東京", "品川")).await?;
        store.put("U1", &Route::new("東京", "品川")).await?;

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("U1").await?, Some(Route::new("東京", "品川")));
        Ok(())
    }
}
