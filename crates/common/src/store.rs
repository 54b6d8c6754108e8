use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeSet, HashMap};
use std::error::Error as StdError;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::types::{
    new_subscription_id, ChannelSubscription, NewChannelSubscription, YoutubeAnnouncements,
};

#[derive(Debug, thiserror::Error)]
#[error("subscription store: {0}")]
pub struct StoreError(#[source] pub Box<dyn StdError + Send + Sync>);

impl StoreError {
    pub fn backend<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self(Box::new(err))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence for feed subscriptions and per-guild announcement templates.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn insert(&self, new: NewChannelSubscription) -> StoreResult<ChannelSubscription>;
    async fn get(&self, id: &str) -> StoreResult<Option<ChannelSubscription>>;
    async fn list_by_guild(&self, guild_id: &str) -> StoreResult<Vec<ChannelSubscription>>;
    async fn list_by_youtube_channel(
        &self,
        youtube_channel_id: &str,
    ) -> StoreResult<Vec<ChannelSubscription>>;
    async fn count_by_guild(&self, guild_id: &str) -> StoreResult<i64>;
    async fn delete(&self, id: &str) -> StoreResult<bool>;
    /// Sets `enabled = false` on every subscription posting to `channel_id`.
    async fn disable_by_channel(&self, channel_id: &str) -> StoreResult<u64>;
    async fn set_youtube_channel_name(
        &self,
        youtube_channel_id: &str,
        name: &str,
    ) -> StoreResult<u64>;
    /// Distinct YouTube channels referenced by at least one subscription.
    async fn youtube_channel_ids(&self) -> StoreResult<Vec<String>>;
    async fn announcement(&self, guild_id: i64) -> StoreResult<Option<YoutubeAnnouncements>>;
    async fn upsert_announcement(
        &self,
        announcement: YoutubeAnnouncements,
    ) -> StoreResult<YoutubeAnnouncements>;
}

#[async_trait]
impl<T: SubscriptionStore + ?Sized> SubscriptionStore for Arc<T> {
    async fn insert(&self, new: NewChannelSubscription) -> StoreResult<ChannelSubscription> {
        (**self).insert(new).await
    }

    async fn get(&self, id: &str) -> StoreResult<Option<ChannelSubscription>> {
        (**self).get(id).await
    }

    async fn list_by_guild(&self, guild_id: &str) -> StoreResult<Vec<ChannelSubscription>> {
        (**self).list_by_guild(guild_id).await
    }

    async fn list_by_youtube_channel(
        &self,
        youtube_channel_id: &str,
    ) -> StoreResult<Vec<ChannelSubscription>> {
        (**self).list_by_youtube_channel(youtube_channel_id).await
    }

    async fn count_by_guild(&self, guild_id: &str) -> StoreResult<i64> {
        (**self).count_by_guild(guild_id).await
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        (**self).delete(id).await
    }

    async fn disable_by_channel(&self, channel_id: &str) -> StoreResult<u64> {
        (**self).disable_by_channel(channel_id).await
    }

    async fn set_youtube_channel_name(
        &self,
        youtube_channel_id: &str,
        name: &str,
    ) -> StoreResult<u64> {
        (**self).set_youtube_channel_name(youtube_channel_id, name).await
    }

    async fn youtube_channel_ids(&self) -> StoreResult<Vec<String>> {
        (**self).youtube_channel_ids().await
    }

    async fn announcement(&self, guild_id: i64) -> StoreResult<Option<YoutubeAnnouncements>> {
        (**self).announcement(guild_id).await
    }

    async fn upsert_announcement(
        &self,
        announcement: YoutubeAnnouncements,
    ) -> StoreResult<YoutubeAnnouncements> {
        (**self).upsert_announcement(announcement).await
    }
}

/// Hook the delivery queue calls when a destination channel is gone for good.
#[async_trait]
pub trait SourceDisabler: Send + Sync {
    async fn disable_feed(&self, channel_id: &str, err: &(dyn StdError + Send + Sync));
}

#[derive(Default)]
pub struct MemoryStore {
    subscriptions: RwLock<HashMap<String, ChannelSubscription>>,
    announcements: RwLock<HashMap<i64, YoutubeAnnouncements>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a fully formed row as is, keeping its id and flags.
    pub async fn put(&self, subscription: ChannelSubscription) {
        self.subscriptions
            .write()
            .await
            .insert(subscription.id.clone(), subscription);
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn insert(&self, new: NewChannelSubscription) -> StoreResult<ChannelSubscription> {
        let subscription = new
            .normalized()
            .into_subscription(new_subscription_id(), Utc::now());
        self.put(subscription.clone()).await;
        Ok(subscription)
    }

    async fn get(&self, id: &str) -> StoreResult<Option<ChannelSubscription>> {
        Ok(self.subscriptions.read().await.get(id).cloned())
    }

    async fn list_by_guild(&self, guild_id: &str) -> StoreResult<Vec<ChannelSubscription>> {
        let mut rows: Vec<_> = self
            .subscriptions
            .read()
            .await
            .values()
            .filter(|s| s.guild_id == guild_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn list_by_youtube_channel(
        &self,
        youtube_channel_id: &str,
    ) -> StoreResult<Vec<ChannelSubscription>> {
        Ok(self
            .subscriptions
            .read()
            .await
            .values()
            .filter(|s| s.youtube_channel_id == youtube_channel_id)
            .cloned()
            .collect())
    }

    async fn count_by_guild(&self, guild_id: &str) -> StoreResult<i64> {
        let count = self
            .subscriptions
            .read()
            .await
            .values()
            .filter(|s| s.guild_id == guild_id)
            .count();
        Ok(count as i64)
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        Ok(self.subscriptions.write().await.remove(id).is_some())
    }

    async fn disable_by_channel(&self, channel_id: &str) -> StoreResult<u64> {
        let now = Utc::now();
        let mut updated = 0;
        for sub in self
            .subscriptions
            .write()
            .await
            .values_mut()
            .filter(|s| s.channel_id == channel_id)
        {
            sub.enabled = Some(false);
            sub.updated_at = now;
            updated += 1;
        }
        Ok(updated)
    }

    async fn set_youtube_channel_name(
        &self,
        youtube_channel_id: &str,
        name: &str,
    ) -> StoreResult<u64> {
        let now = Utc::now();
        let mut updated = 0;
        for sub in self
            .subscriptions
            .write()
            .await
            .values_mut()
            .filter(|s| s.youtube_channel_id == youtube_channel_id)
        {
            sub.youtube_channel_name = name.to_string();
            sub.updated_at = now;
            updated += 1;
        }
        Ok(updated)
    }

    async fn youtube_channel_ids(&self) -> StoreResult<Vec<String>> {
        let ids: BTreeSet<String> = self
            .subscriptions
            .read()
            .await
            .values()
            .map(|s| s.youtube_channel_id.clone())
            .collect();
        Ok(ids.into_iter().collect())
    }

    async fn announcement(&self, guild_id: i64) -> StoreResult<Option<YoutubeAnnouncements>> {
        Ok(self.announcements.read().await.get(&guild_id).cloned())
    }

    async fn upsert_announcement(
        &self,
        announcement: YoutubeAnnouncements,
    ) -> StoreResult<YoutubeAnnouncements> {
        self.announcements
            .write()
            .await
            .insert(announcement.guild_id, announcement.clone());
        Ok(announcement)
    }
}
