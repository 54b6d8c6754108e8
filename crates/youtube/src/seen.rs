use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use common::store::{StoreError, StoreResult};
use redis::AsyncCommands;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

pub fn key_last_video_time(youtube_channel_id: &str) -> String {
    format!("youtube_last_video_time:{}", youtube_channel_id)
}

pub fn key_last_video_id(youtube_channel_id: &str) -> String {
    format!("youtube_last_video_id:{}", youtube_channel_id)
}

pub fn key_channel_lock(youtube_channel_id: &str) -> String {
    format!("youtube_subbed_channel_lock:{}", youtube_channel_id)
}

/// Held while one push for a channel is being fanned out. Expires on its own
/// if the holder dies.
pub const CHANNEL_LOCK_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastVideo {
    pub video_id: String,
    pub published: DateTime<Utc>,
}

impl LastVideo {
    /// The hub re-pushes an entry whenever its title or description changes;
    /// only uploads newer than the last announced one count.
    pub fn is_superseded_by(&self, video_id: &str, published: DateTime<Utc>) -> bool {
        self.video_id != video_id && published > self.published
    }
}

fn decode_last(time: Option<i64>, video_id: Option<String>) -> Option<LastVideo> {
    match (time, video_id) {
        (Some(time), Some(video_id)) => Utc
            .timestamp_opt(time, 0)
            .single()
            .map(|published| LastVideo {
                video_id,
                published,
            }),
        _ => None,
    }
}

fn encode_last(youtube_channel_id: &str, video: LastVideo) -> [(String, String); 2] {
    [
        (
            key_last_video_time(youtube_channel_id),
            video.published.timestamp().to_string(),
        ),
        (key_last_video_id(youtube_channel_id), video.video_id),
    ]
}

/// Latest announced upload per YouTube channel.
#[async_trait]
pub trait LastVideoBook: Send + Sync {
    async fn last(&self, youtube_channel_id: &str) -> StoreResult<Option<LastVideo>>;
    async fn mark(&self, youtube_channel_id: &str, video: LastVideo) -> StoreResult<()>;
    /// Returns false when another push for the channel is in flight.
    async fn claim(&self, youtube_channel_id: &str) -> StoreResult<bool>;
    async fn release(&self, youtube_channel_id: &str) -> StoreResult<()>;
}

#[async_trait]
impl<T: LastVideoBook + ?Sized> LastVideoBook for Arc<T> {
    async fn last(&self, youtube_channel_id: &str) -> StoreResult<Option<LastVideo>> {
        (**self).last(youtube_channel_id).await
    }

    async fn mark(&self, youtube_channel_id: &str, video: LastVideo) -> StoreResult<()> {
        (**self).mark(youtube_channel_id, video).await
    }

    async fn claim(&self, youtube_channel_id: &str) -> StoreResult<bool> {
        (**self).claim(youtube_channel_id).await
    }

    async fn release(&self, youtube_channel_id: &str) -> StoreResult<()> {
        (**self).release(youtube_channel_id).await
    }
}

#[derive(Clone)]
pub struct RedisLastVideos {
    client: redis::Client,
}

impl RedisLastVideos {
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

#[async_trait]
impl LastVideoBook for RedisLastVideos {
    async fn last(&self, youtube_channel_id: &str) -> StoreResult<Option<LastVideo>> {
        let mut conn = self.conn().await?;
        let (time, video_id): (Option<i64>, Option<String>) = conn
            .mget(vec![
                key_last_video_time(youtube_channel_id),
                key_last_video_id(youtube_channel_id),
            ])
            .await
            .map_err(StoreError::backend)?;
        Ok(decode_last(time, video_id))
    }

    async fn mark(&self, youtube_channel_id: &str, video: LastVideo) -> StoreResult<()> {
        let mut conn = self.conn().await?;
        let _: () = conn
            .mset(&encode_last(youtube_channel_id, video)[..])
            .await
            .map_err(StoreError::backend)?;
        Ok(())
    }

    async fn claim(&self, youtube_channel_id: &str) -> StoreResult<bool> {
        let mut conn = self.conn().await?;
        let reply: Option<String> = redis::cmd("SET")
            .arg(key_channel_lock(youtube_channel_id))
            .arg(1)
            .arg("NX")
            .arg("EX")
            .arg(CHANNEL_LOCK_SECS)
            .query_async(&mut conn)
            .await
            .map_err(StoreError::backend)?;
        Ok(reply.is_some())
    }

    async fn release(&self, youtube_channel_id: &str) -> StoreResult<()> {
        let mut conn = self.conn().await?;
        let _: () = conn
            .del(key_channel_lock(youtube_channel_id))
            .await
            .map_err(StoreError::backend)?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryLastVideos {
    videos: RwLock<HashMap<String, LastVideo>>,
    locks: RwLock<HashSet<String>>,
}

impl MemoryLastVideos {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LastVideoBook for MemoryLastVideos {
    async fn last(&self, youtube_channel_id: &str) -> StoreResult<Option<LastVideo>> {
        Ok(self.videos.read().await.get(youtube_channel_id).cloned())
    }

    async fn mark(&self, youtube_channel_id: &str, video: LastVideo) -> StoreResult<()> {
        self.videos
            .write()
            .await
            .insert(youtube_channel_id.to_string(), video);
        Ok(())
    }

    async fn claim(&self, youtube_channel_id: &str) -> StoreResult<bool> {
        Ok(self
            .locks
            .write()
            .await
            .insert(youtube_channel_id.to_string()))
    }

    async fn release(&self, youtube_channel_id: &str) -> StoreResult<()> {
        self.locks.write().await.remove(youtube_channel_id);
        Ok(())
    }
}
