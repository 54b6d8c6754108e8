use chrono::{DateTime, Utc};
use common::types::{ChannelSubscription, YoutubeAnnouncements};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChannelSubscriptionRow {
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

impl From<ChannelSubscriptionRow> for ChannelSubscription {
    fn from(row: ChannelSubscriptionRow) -> Self {
        ChannelSubscription {
            id: row.id,
            guild_id: row.guild_id,
            channel_id: row.channel_id,
            youtube_channel_id: row.youtube_channel_id,
            youtube_channel_name: row.youtube_channel_name,
            mention_everyone: row.mention_everyone,
            mention_roles: row.mention_roles,
            publish_livestream: row.publish_livestream,
            publish_shorts: row.publish_shorts,
            enabled: row.enabled,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct YoutubeAnnouncementsRow {
    pub guild_id: i64,
    pub message: String,
    pub enabled: Option<bool>,
}

impl From<YoutubeAnnouncementsRow> for YoutubeAnnouncements {
    fn from(row: YoutubeAnnouncementsRow) -> Self {
        YoutubeAnnouncements {
            guild_id: row.guild_id,
            message: row.message,
            enabled: row.enabled,
        }
    }
}
