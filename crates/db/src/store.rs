use async_trait::async_trait;
use common::store::{StoreError, StoreResult, SubscriptionStore};
use common::types::{
    new_subscription_id, ChannelSubscription, NewChannelSubscription, YoutubeAnnouncements,
};
use sqlx::PgPool;

use crate::queries::{announcements, channel_subscriptions};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SubscriptionStore for PgStore {
    async fn insert(&self, new: NewChannelSubscription) -> StoreResult<ChannelSubscription> {
        let new = new.normalized();
        let row = channel_subscriptions::create(&self.pool, &new_subscription_id(), &new)
            .await
            .map_err(StoreError::backend)?;
        Ok(row.into())
    }

    async fn get(&self, id: &str) -> StoreResult<Option<ChannelSubscription>> {
        let row = channel_subscriptions::get_by_id(&self.pool, id)
            .await
            .map_err(StoreError::backend)?;
        Ok(row.map(Into::into))
    }

    async fn list_by_guild(&self, guild_id: &str) -> StoreResult<Vec<ChannelSubscription>> {
        let rows = channel_subscriptions::list_by_guild(&self.pool, guild_id)
            .await
            .map_err(StoreError::backend)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_by_youtube_channel(
        &self,
        youtube_channel_id: &str,
    ) -> StoreResult<Vec<ChannelSubscription>> {
        let rows = channel_subscriptions::list_by_youtube_channel(&self.pool, youtube_channel_id)
            .await
            .map_err(StoreError::backend)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count_by_guild(&self, guild_id: &str) -> StoreResult<i64> {
        channel_subscriptions::count_by_guild(&self.pool, guild_id)
            .await
            .map_err(StoreError::backend)
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        channel_subscriptions::delete(&self.pool, id)
            .await
            .map_err(StoreError::backend)
    }

    async fn disable_by_channel(&self, channel_id: &str) -> StoreResult<u64> {
        channel_subscriptions::disable_by_channel(&self.pool, channel_id)
            .await
            .map_err(StoreError::backend)
    }

    async fn set_youtube_channel_name(
        &self,
        youtube_channel_id: &str,
        name: &str,
    ) -> StoreResult<u64> {
        channel_subscriptions::update_youtube_channel_name(&self.pool, youtube_channel_id, name)
            .await
            .map_err(StoreError::backend)
    }

    async fn youtube_channel_ids(&self) -> StoreResult<Vec<String>> {
        channel_subscriptions::distinct_youtube_channel_ids(&self.pool)
            .await
            .map_err(StoreError::backend)
    }

    async fn announcement(&self, guild_id: i64) -> StoreResult<Option<YoutubeAnnouncements>> {
        let row = announcements::get_by_guild(&self.pool, guild_id)
            .await
            .map_err(StoreError::backend)?;
        Ok(row.map(Into::into))
    }

    async fn upsert_announcement(
        &self,
        announcement: YoutubeAnnouncements,
    ) -> StoreResult<YoutubeAnnouncements> {
        let row = announcements::upsert(
            &self.pool,
            announcement.guild_id,
            &announcement.message,
            announcement.enabled,
        )
        .await
        .map_err(StoreError::backend)?;
        Ok(row.into())
    }
}
