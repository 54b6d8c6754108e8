//! Parsing of the Atom documents the hub pushes for YouTube topics.
//!
//! A push carries at most one `<entry>` describing the uploaded video, with
//! the video and channel IDs in the `yt:` namespace. Deleted videos arrive as
//! an `at:deleted-entry` element instead and produce no entry.

use atom_syndication::{extension::ExtensionMap, Feed};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::str::FromStr;

pub const TOPIC_URL_PREFIX: &str = "https://www.youtube.com/xml/feeds/videos.xml?channel_id=";

const YT_PREFIX: &str = "yt";

pub fn topic_url(youtube_channel_id: &str) -> String {
    format!("{}{}", TOPIC_URL_PREFIX, youtube_channel_id)
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("malformed feed: {0}")]
    Malformed(#[from] atom_syndication::Error),
    #[error("feed entry is missing {0}")]
    MissingField(&'static str),
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FeedEntry {
    pub entry_id: String,
    pub video_id: String,
    pub channel_id: String,
    pub title: String,
    pub link: Option<String>,
    pub author_name: String,
    pub author_uri: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub updated: DateTime<Utc>,
    pub feed_title: String,
    pub feed_updated: DateTime<Utc>,
}

impl FeedEntry {
    /// Alternate link when the hub sent one, the canonical watch URL otherwise.
    pub fn url(&self) -> String {
        self.link.clone().unwrap_or_else(|| watch_url(&self.video_id))
    }

    pub fn published_at(&self) -> DateTime<Utc> {
        self.published.unwrap_or(self.updated)
    }
}

pub fn parse_push(body: &str) -> Result<Option<FeedEntry>, FeedError> {
    let feed = Feed::from_str(body)?;

    let entry = match feed.entries().first() {
        Some(entry) => entry,
        None => return Ok(None),
    };

    let video_id =
        yt_extension(entry.extensions(), "videoId").ok_or(FeedError::MissingField("yt:videoId"))?;
    let channel_id = yt_extension(entry.extensions(), "channelId")
        .ok_or(FeedError::MissingField("yt:channelId"))?;

    let author = entry.authors().first();
    let link = entry
        .links()
        .iter()
        .find(|link| link.rel() == "alternate")
        .map(|link| link.href().to_string());

    Ok(Some(FeedEntry {
        entry_id: entry.id().to_string(),
        video_id,
        channel_id,
        title: entry.title().value.clone(),
        link,
        author_name: author.map(|a| a.name().to_string()).unwrap_or_default(),
        author_uri: author.and_then(|a| a.uri()).map(str::to_string),
        published: entry.published().map(|d| d.with_timezone(&Utc)),
        updated: entry.updated().with_timezone(&Utc),
        feed_title: feed.title().value.clone(),
        feed_updated: feed.updated().with_timezone(&Utc),
    }))
}

fn yt_extension(extensions: &ExtensionMap, name: &str) -> Option<String> {
    extensions
        .get(YT_PREFIX)?
        .get(name)?
        .first()?
        .value()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PUSH: &str = r#"<?xml version='1.0' encoding='UTF-8'?>
<feed xmlns:yt="http://www.youtube.com/xml/schemas/2015" xmlns="http://www.w3.org/2005/Atom">
  <link rel="hub" href="https://pubsubhubbub.appspot.com"/>
  <link rel="self" href="https://www.youtube.com/xml/feeds/videos.xml?channel_id=UCt-ERbX-2yA6cAqfdKOlUwQ"/>
  <title>YouTube video feed</title>
  <updated>2024-05-01T19:05:24+00:00</updated>
  <entry>
    <id>yt:video:dQw4w9WgXcQ</id>
    <yt:videoId>dQw4w9WgXcQ</yt:videoId>
    <yt:channelId>UCt-ERbX-2yA6cAqfdKOlUwQ</yt:channelId>
    <title>Never Gonna Give You Up</title>
    <link rel="alternate" href="https://www.youtube.com/watch?v=dQw4w9WgXcQ"/>
    <author>
      <name>Rick Astley</name>
      <uri>https://www.youtube.com/channel/UCt-ERbX-2yA6cAqfdKOlUwQ</uri>
    </author>
    <published>2024-05-01T18:00:00+00:00</published>
    <updated>2024-05-01T19:05:24+00:00</updated>
  </entry>
</feed>"#;

    const DELETED: &str = r#"<?xml version='1.0' encoding='UTF-8'?>
<feed xmlns:at="http://purl.org/atompub/tombstones/1.0" xmlns="http://www.w3.org/2005/Atom">
  <at:deleted-entry ref="yt:video:dQw4w9WgXcQ" when="2024-05-02T10:00:00+00:00"/>
</feed>"#;

    #[test]
    fn test_topic_url() {
        assert_eq!(
            topic_url("UC123"),
            "https://www.youtube.com/xml/feeds/videos.xml?channel_id=UC123"
        );
    }

    #[test]
    fn test_parse_push_entry() {
        let entry = parse_push(PUSH).unwrap().expect("entry");

        assert_eq!(entry.entry_id, "yt:video:dQw4w9WgXcQ");
        assert_eq!(entry.video_id, "dQw4w9WgXcQ");
        assert_eq!(entry.channel_id, "UCt-ERbX-2yA6cAqfdKOlUwQ");
        assert_eq!(entry.title, "Never Gonna Give You Up");
        assert_eq!(entry.author_name, "Rick Astley");
        assert_eq!(
            entry.author_uri.as_deref(),
            Some("https://www.youtube.com/channel/UCt-ERbX-2yA6cAqfdKOlUwQ")
        );
        assert_eq!(entry.url(), "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(entry.feed_title, "YouTube video feed");
        assert_eq!(
            entry.published_at(),
            DateTime::parse_from_rfc3339("2024-05-01T18:00:00+00:00")
                .unwrap()
                .with_timezone(&Utc)
        );
        assert!(entry.updated > entry.published_at());
    }

    #[test]
    fn test_parse_deleted_entry_is_ignored() {
        assert!(parse_push(DELETED).unwrap().is_none());
    }

    #[test]
    fn test_parse_missing_video_id() {
        let body = PUSH.replace("<yt:videoId>dQw4w9WgXcQ</yt:videoId>", "");
        let err = parse_push(&body).unwrap_err();
        assert!(matches!(err, FeedError::MissingField("yt:videoId")));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_push("this is not xml").is_err());
    }
}
