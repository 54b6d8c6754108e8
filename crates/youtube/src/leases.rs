use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use common::store::{StoreError, StoreResult};
use redis::AsyncCommands;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Sorted set of subscribed channels, scored by unix time of the next renewal.
pub const REDIS_KEY_WEBSUB_CHANNELS: &str = "youtube_registered_websub_channels";

/// When each hub subscription has to be renewed.
#[async_trait]
pub trait LeaseBook: Send + Sync {
    async fn renew_at(&self, youtube_channel_id: &str) -> StoreResult<Option<DateTime<Utc>>>;
    async fn record(&self, youtube_channel_id: &str, renew_at: DateTime<Utc>) -> StoreResult<()>;
    async fn forget(&self, youtube_channel_id: &str) -> StoreResult<()>;
    async fn all(&self) -> StoreResult<HashMap<String, DateTime<Utc>>>;
}

#[async_trait]
impl<T: LeaseBook + ?Sized> LeaseBook for Arc<T> {
    async fn renew_at(&self, youtube_channel_id: &str) -> StoreResult<Option<DateTime<Utc>>> {
        (**self).renew_at(youtube_channel_id).await
    }

    async fn record(&self, youtube_channel_id: &str, renew_at: DateTime<Utc>) -> StoreResult<()> {
        (**self).record(youtube_channel_id, renew_at).await
    }

    async fn forget(&self, youtube_channel_id: &str) -> StoreResult<()> {
        (**self).forget(youtube_channel_id).await
    }

    async fn all(&self) -> StoreResult<HashMap<String, DateTime<Utc>>> {
        (**self).all().await
    }
}

#[derive(Clone)]
pub struct RedisLeases {
    client: redis::Client,
}

impl RedisLeases {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    async fn conn(&self) -> StoreResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(StoreError::backend)
    }
}

fn from_score(score: f64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(score as i64, 0).single()
}

fn from_scored(entries: Vec<(String, f64)>) -> HashMap<String, DateTime<Utc>> {
    entries
        .into_iter()
        .filter_map(|(channel, score)| from_score(score).map(|at| (channel, at)))
        .collect()
}

#[async_trait]
impl LeaseBook for RedisLeases {
    async fn renew_at(&self, youtube_channel_id: &str) -> StoreResult<Option<DateTime<Utc>>> {
        let mut conn = self.conn().await?;
        let score: Option<f64> = conn
            .zscore(REDIS_KEY_WEBSUB_CHANNELS, youtube_channel_id)
            .await
            .map_err(StoreError::backend)?;
        Ok(score.and_then(from_score))
    }

    async fn record(&self, youtube_channel_id: &str, renew_at: DateTime<Utc>) -> StoreResult<()> {
        let mut conn = self.conn().await?;
        let _: () = conn
            .zadd(REDIS_KEY_WEBSUB_CHANNELS, youtube_channel_id, renew_at.timestamp())
            .await
            .map_err(StoreError::backend)?;
        Ok(())
    }

    async fn forget(&self, youtube_channel_id: &str) -> StoreResult<()> {
        let mut conn = self.conn().await?;
        let _: () = conn
            .zrem(REDIS_KEY_WEBSUB_CHANNELS, youtube_channel_id)
            .await
            .map_err(StoreError::backend)?;
        Ok(())
    }

    async fn all(&self) -> StoreResult<HashMap<String, DateTime<Utc>>> {
        let mut conn = self.conn().await?;
        let entries: Vec<(String, f64)> = conn
            .zrange_withscores(REDIS_KEY_WEBSUB_CHANNELS, 0, -1)
            .await
            .map_err(StoreError::backend)?;
        Ok(from_scored(entries))
    }
}

#[derive(Default)]
pub struct MemoryLeases {
    leases: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl MemoryLeases {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LeaseBook for MemoryLeases {
    async fn renew_at(&self, youtube_channel_id: &str) -> StoreResult<Option<DateTime<Utc>>> {
        Ok(self.leases.read().await.get(youtube_channel_id).copied())
    }

    async fn record(&self, youtube_channel_id: &str, renew_at: DateTime<Utc>) -> StoreResult<()> {
        self.leases
            .write()
            .await
            .insert(youtube_channel_id.to_string(), renew_at);
        Ok(())
    }

    async fn forget(&self, youtube_channel_id: &str) -> StoreResult<()> {
        self.leases.write().await.remove(youtube_channel_id);
        Ok(())
    }

    async fn all(&self) -> StoreResult<HashMap<String, DateTime<Utc>>> {
        Ok(self.leases.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_score_truncates_to_seconds() {
        let at = from_score(1_714_590_000.75).unwrap();
        assert_eq!(at.timestamp(), 1_714_590_000);
    }

    #[test]
    fn test_from_scored_skips_unrepresentable_scores() {
        let leases = from_scored(vec![
            ("UC1".to_string(), 1_714_590_000.0),
            ("UC2".to_string(), 1_714_590_000.9),
            ("UCbad".to_string(), f64::MAX),
        ]);

        assert_eq!(leases.len(), 2);
        assert_eq!(leases["UC1"].timestamp(), 1_714_590_000);
        assert_eq!(leases["UC2"].timestamp(), 1_714_590_000);
        assert!(!leases.contains_key("UCbad"));
    }

    #[tokio::test]
    async fn test_memory_leases_roundtrip() {
        let leases = MemoryLeases::new();
        let at = Utc::now();

        leases.record("UC1", at).await.unwrap();
        assert_eq!(leases.renew_at("UC1").await.unwrap(), Some(at));
        assert_eq!(leases.all().await.unwrap().len(), 1);

        leases.forget("UC1").await.unwrap();
        assert_eq!(leases.renew_at("UC1").await.unwrap(), None);
    }
}
