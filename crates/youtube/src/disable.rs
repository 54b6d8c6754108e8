use async_trait::async_trait;
use common::store::{SourceDisabler, SubscriptionStore};
use std::error::Error as StdError;
use tracing::{error, info};

/// Turns off every feed that posts into a destination channel the delivery
/// queue could not reach. Rows are kept so the guild's configuration survives.
pub struct FeedDisabler<S> {
    store: S,
}

impl<S> FeedDisabler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: SubscriptionStore> SourceDisabler for FeedDisabler<S> {
    async fn disable_feed(&self, channel_id: &str, cause: &(dyn StdError + Send + Sync)) {
        match self.store.disable_by_channel(channel_id).await {
            Ok(disabled) => info!(
                channel_id = %channel_id,
                disabled,
                cause = %cause,
                "disabled youtube feeds to nonexistent channel"
            ),
            Err(err) => error!(
                error = %err,
                channel_id = %channel_id,
                "failed disabling youtube feeds to nonexistent channel"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::store::{MemoryStore, StoreError, StoreResult};
    use common::types::{ChannelSubscription, NewChannelSubscription, YoutubeAnnouncements};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug, thiserror::Error)]
    #[error("unknown channel")]
    struct UnknownChannel;

    fn new_sub(channel: &str, yt: &str) -> NewChannelSubscription {
        NewChannelSubscription {
            guild_id: "1".to_string(),
            channel_id: channel.to_string(),
            youtube_channel_id: yt.to_string(),
            ..Default::default()
        }
    }

    async fn seeded() -> (Arc<MemoryStore>, [ChannelSubscription; 3]) {
        let store = Arc::new(MemoryStore::new());
        let a = store.insert(new_sub("C1", "UC1")).await.unwrap();
        let b = store.insert(new_sub("C1", "UC2")).await.unwrap();
        let c = store.insert(new_sub("C2", "UC1")).await.unwrap();
        (store, [a, b, c])
    }

    async fn enabled_flags(store: &MemoryStore, subs: &[ChannelSubscription]) -> Vec<bool> {
        let mut flags = Vec::new();
        for sub in subs {
            flags.push(store.get(&sub.id).await.unwrap().unwrap().is_enabled());
        }
        flags
    }

    #[tokio::test]
    async fn test_disables_only_matching_destination() {
        let (store, subs) = seeded().await;
        let disabler = FeedDisabler::new(store.clone());

        disabler.disable_feed("C1", &UnknownChannel).await;

        assert_eq!(enabled_flags(&store, &subs).await, vec![false, false, true]);
        assert_eq!(store.get(&subs[2].id).await.unwrap().unwrap(), subs[2]);
    }

    #[tokio::test]
    async fn test_disable_is_idempotent() {
        let (store, subs) = seeded().await;
        let disabler = FeedDisabler::new(store.clone());

        disabler.disable_feed("C1", &UnknownChannel).await;
        let once = enabled_flags(&store, &subs).await;
        disabler.disable_feed("C1", &UnknownChannel).await;
        let twice = enabled_flags(&store, &subs).await;

        assert_eq!(once, twice);
    }

    struct BrokenStore {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SubscriptionStore for BrokenStore {
        async fn insert(&self, _: NewChannelSubscription) -> StoreResult<ChannelSubscription> {
            unimplemented!()
        }
        async fn get(&self, _: &str) -> StoreResult<Option<ChannelSubscription>> {
            unimplemented!()
        }
        async fn list_by_guild(&self, _: &str) -> StoreResult<Vec<ChannelSubscription>> {
            unimplemented!()
        }
        async fn list_by_youtube_channel(
            &self,
            _: &str,
        ) -> StoreResult<Vec<ChannelSubscription>> {
            unimplemented!()
        }
        async fn count_by_guild(&self, _: &str) -> StoreResult<i64> {
            unimplemented!()
        }
        async fn delete(&self, _: &str) -> StoreResult<bool> {
            unimplemented!()
        }
        async fn disable_by_channel(&self, _: &str) -> StoreResult<u64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::backend(UnknownChannel))
        }
        async fn set_youtube_channel_name(&self, _: &str, _: &str) -> StoreResult<u64> {
            unimplemented!()
        }
        async fn youtube_channel_ids(&self) -> StoreResult<Vec<String>> {
            unimplemented!()
        }
        async fn announcement(&self, _: i64) -> StoreResult<Option<YoutubeAnnouncements>> {
            unimplemented!()
        }
        async fn upsert_announcement(
            &self,
            _: YoutubeAnnouncements,
        ) -> StoreResult<YoutubeAnnouncements> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn test_store_failure_is_swallowed() {
        let disabler = FeedDisabler::new(BrokenStore {
            calls: AtomicUsize::new(0),
        });

        disabler.disable_feed("C1", &UnknownChannel).await;

        assert_eq!(disabler.store.calls.load(Ordering::SeqCst), 1);
    }
}
