use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SUBSCRIPTION_ID_PREFIX: &str = "ytsub_";

pub fn new_subscription_id() -> String {
    format!("{}{}", SUBSCRIPTION_ID_PREFIX, nanoid::nanoid!(12))
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Video,
    Livestream,
    Short,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelSubscription {
    pub id: String,
    pub guild_id: String,
    pub channel_id: String,
    pub youtube_channel_id: String,
    pub youtube_channel_name: String,
    pub mention_everyone: bool,
    pub mention_roles: Vec<i64>,
    pub publish_livestream: Option<bool>,
    pub publish_shorts: Option<bool>,
    pub enabled: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChannelSubscription {
    pub fn publishes_livestreams(&self) -> bool {
        self.publish_livestream.unwrap_or(true)
    }

    pub fn publishes_shorts(&self) -> bool {
        self.publish_shorts.unwrap_or(true)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    /// Whether a new upload of `kind` should be announced through this feed.
    pub fn accepts(&self, kind: ContentKind) -> bool {
        if !self.is_enabled() {
            return false;
        }
        match kind {
            ContentKind::Video => true,
            ContentKind::Livestream => self.publishes_livestreams(),
            ContentKind::Short => self.publishes_shorts(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewChannelSubscription {
    pub guild_id: String,
    pub channel_id: String,
    pub youtube_channel_id: String,
    pub youtube_channel_name: String,
    pub mention_everyone: bool,
    pub mention_roles: Vec<i64>,
    pub publish_livestream: Option<bool>,
    pub publish_shorts: Option<bool>,
}

impl NewChannelSubscription {
    /// Role mentions are a set; drop ordering and duplicates before storing.
    pub fn normalized(mut self) -> Self {
        self.mention_roles.sort_unstable();
        self.mention_roles.dedup();
        self
    }

    pub fn into_subscription(self, id: String, now: DateTime<Utc>) -> ChannelSubscription {
        ChannelSubscription {
            id,
            guild_id: self.guild_id,
            channel_id: self.channel_id,
            youtube_channel_id: self.youtube_channel_id,
            youtube_channel_name: self.youtube_channel_name,
            mention_everyone: self.mention_everyone,
            mention_roles: self.mention_roles,
            publish_livestream: Some(self.publish_livestream.unwrap_or(true)),
            publish_shorts: Some(self.publish_shorts.unwrap_or(true)),
            enabled: Some(true),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct YoutubeAnnouncements {
    pub guild_id: i64,
    pub message: String,
    pub enabled: Option<bool>,
}

impl YoutubeAnnouncements {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(false)
    }
}

/// Event handed to the delivery queue for one subscription.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VideoNotification {
    pub subscription_id: String,
    pub guild_id: String,
    pub channel_id: String,
    pub youtube_channel_id: String,
    pub youtube_channel_name: String,
    pub video_id: String,
    pub title: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
    pub kind: ContentKind,
    pub mention_everyone: bool,
    pub mention_roles: Vec<i64>,
    pub announcement: Option<String>,
}
