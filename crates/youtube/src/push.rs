//! What the callback endpoint does with hub traffic. The HTTP server lives in
//! the host; it forwards the path token, the query of GET challenges and the
//! body of POST pushes here.

use async_trait::async_trait;
use common::auth::verify_token_matches;
use common::feed::{parse_push, FeedEntry, FeedError};
use common::store::{StoreError, SubscriptionStore};
use common::types::{ChannelSubscription, ContentKind, VideoNotification};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::seen::{LastVideo, LastVideoBook};

#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("verify token mismatch")]
    BadToken,
    #[error("unsupported hub.mode {0:?}")]
    BadMode(String),
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Query of the hub's GET verification request.
#[derive(Debug, Clone, Deserialize)]
pub struct HubChallenge {
    #[serde(rename = "hub.mode")]
    pub mode: String,
    #[serde(rename = "hub.topic")]
    pub topic: String,
    #[serde(rename = "hub.challenge")]
    pub challenge: String,
    #[serde(rename = "hub.verify_token", default)]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.lease_seconds", default)]
    pub lease_seconds: Option<u64>,
}

/// Returns the challenge to echo back when the hub is verifying an intent
/// this service issued.
pub fn verify_challenge(
    expected_token: &str,
    path_token: &str,
    query: &HubChallenge,
) -> Result<String, PushError> {
    if !verify_token_matches(expected_token, path_token) {
        return Err(PushError::BadToken);
    }
    if let Some(token) = query.verify_token.as_deref() {
        if !verify_token_matches(expected_token, token) {
            return Err(PushError::BadToken);
        }
    }
    match query.mode.as_str() {
        "subscribe" | "unsubscribe" => {}
        other => return Err(PushError::BadMode(other.to_string())),
    }

    info!(
        mode = %query.mode,
        topic = %query.topic,
        lease_seconds = ?query.lease_seconds,
        "websub: verified hub challenge"
    );
    Ok(query.challenge.clone())
}

/// Hand-off to the delivery queue.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn publish(&self, notification: VideoNotification);
}

#[async_trait]
impl<T: NotificationSink + ?Sized> NotificationSink for Arc<T> {
    async fn publish(&self, notification: VideoNotification) {
        (**self).publish(notification).await
    }
}

/// Tells uploads, livestreams and shorts apart; the push itself does not say.
#[async_trait]
pub trait ContentClassifier: Send + Sync {
    async fn classify(&self, entry: &FeedEntry) -> ContentKind;
}

#[async_trait]
impl ContentClassifier for ContentKind {
    async fn classify(&self, _entry: &FeedEntry) -> ContentKind {
        *self
    }
}

pub struct PushReceiver<S, V, K, N> {
    store: S,
    seen: V,
    classifier: K,
    sink: N,
    verify_token: String,
}

impl<S, V, K, N> PushReceiver<S, V, K, N>
where
    S: SubscriptionStore,
    V: LastVideoBook,
    K: ContentClassifier,
    N: NotificationSink,
{
    pub fn new(store: S, seen: V, classifier: K, sink: N, verify_token: String) -> Self {
        Self {
            store,
            seen,
            classifier,
            sink,
            verify_token,
        }
    }

    /// Handles one POSTed feed document and returns how many notifications
    /// were queued.
    pub async fn receive(&self, path_token: &str, body: &str) -> Result<usize, PushError> {
        if !verify_token_matches(&self.verify_token, path_token) {
            warn!("websub: push with bad verify token");
            return Err(PushError::BadToken);
        }

        let entry = match parse_push(body)? {
            Some(entry) => entry,
            None => {
                debug!("websub: push without entry");
                return Ok(0);
            }
        };

        if !self.seen.claim(&entry.channel_id).await? {
            debug!(
                channel_id = %entry.channel_id,
                video_id = %entry.video_id,
                "websub: push for channel already in flight"
            );
            return Ok(0);
        }

        let result = self.announce(&entry).await;

        if let Err(err) = self.seen.release(&entry.channel_id).await {
            warn!(error = %err, channel_id = %entry.channel_id, "failed releasing channel lock");
        }

        result
    }

    async fn announce(&self, entry: &FeedEntry) -> Result<usize, PushError> {
        let published = entry.published_at();
        if let Some(last) = self.seen.last(&entry.channel_id).await? {
            if !last.is_superseded_by(&entry.video_id, published) {
                debug!(
                    channel_id = %entry.channel_id,
                    video_id = %entry.video_id,
                    "websub: skipping already announced or older video"
                );
                return Ok(0);
            }
        }

        let subscriptions = self.store.list_by_youtube_channel(&entry.channel_id).await?;
        if subscriptions.is_empty() {
            warn!(channel_id = %entry.channel_id, "websub: push for channel without feeds");
            return Ok(0);
        }

        self.refresh_channel_name(entry, &subscriptions).await;

        let kind = self.classifier.classify(entry).await;
        let targets: Vec<&ChannelSubscription> =
            subscriptions.iter().filter(|s| s.accepts(kind)).collect();

        // No store access after the first publish.
        let mut announcements: HashMap<&str, Option<String>> = HashMap::new();
        for sub in &targets {
            if !announcements.contains_key(sub.guild_id.as_str()) {
                let template = self.announcement_for(&sub.guild_id).await?;
                announcements.insert(sub.guild_id.as_str(), template);
            }
        }

        for sub in &targets {
            let announcement = announcements.get(sub.guild_id.as_str()).cloned().flatten();
            self.sink
                .publish(notification(entry, sub, kind, announcement))
                .await;
        }

        let last = LastVideo {
            video_id: entry.video_id.clone(),
            published,
        };
        if let Err(err) = self.seen.mark(&entry.channel_id, last).await {
            warn!(
                error = %err,
                channel_id = %entry.channel_id,
                video_id = %entry.video_id,
                "failed recording last announced video"
            );
        }

        info!(
            channel_id = %entry.channel_id,
            video_id = %entry.video_id,
            queued = targets.len(),
            "websub: new video"
        );

        Ok(targets.len())
    }

    async fn refresh_channel_name(&self, entry: &FeedEntry, subscriptions: &[ChannelSubscription]) {
        if entry.author_name.is_empty()
            || subscriptions
                .iter()
                .all(|s| s.youtube_channel_name == entry.author_name)
        {
            return;
        }
        if let Err(err) = self
            .store
            .set_youtube_channel_name(&entry.channel_id, &entry.author_name)
            .await
        {
            warn!(error = %err, channel_id = %entry.channel_id, "failed refreshing channel name");
        }
    }

    async fn announcement_for(&self, guild_id: &str) -> Result<Option<String>, PushError> {
        let guild_id = match guild_id.parse::<i64>() {
            Ok(id) => id,
            Err(_) => return Ok(None),
        };
        Ok(self
            .store
            .announcement(guild_id)
            .await?
            .filter(|a| a.is_enabled())
            .map(|a| a.message))
    }
}

fn notification(
    entry: &FeedEntry,
    sub: &ChannelSubscription,
    kind: ContentKind,
    announcement: Option<String>,
) -> VideoNotification {
    let youtube_channel_name = if entry.author_name.is_empty() {
        sub.youtube_channel_name.clone()
    } else {
        entry.author_name.clone()
    };

    VideoNotification {
        subscription_id: sub.id.clone(),
        guild_id: sub.guild_id.clone(),
        channel_id: sub.channel_id.clone(),
        youtube_channel_id: entry.channel_id.clone(),
        youtube_channel_name,
        video_id: entry.video_id.clone(),
        title: entry.title.clone(),
        url: entry.url(),
        published_at: entry.published_at(),
        kind,
        mention_everyone: sub.mention_everyone,
        mention_roles: sub.mention_roles.clone(),
        announcement,
    }
}
