use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const DEFAULT_THUMBNAIL_BASE: &str = "https://img.youtube.com/vi";

/// A curated artist and its ordered playlist
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Artist {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub songs: Vec<Track>,
}

impl Artist {
    pub fn track_count(&self) -> usize {
        self.songs.len()
    }

    pub fn track(&self, index: usize) -> Option<&Track> {
        self.songs.get(index)
    }
}

/// A playable track, backed by an external video
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub title: String,
    pub youtube_id: String,
    pub url: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub channel_title: String,
    pub published_at: DateTime<Utc>,
    // Carried over from the search API when the catalog was generated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_count: Option<String>,
}

impl Track {
    /// Thumbnail reference, falling back to the provider's default still for the video
    pub fn thumbnail_url(&self) -> String {
        match &self.thumbnail {
            Some(url) if !url.is_empty() => url.clone(),
            _ => format!("{DEFAULT_THUMBNAIL_BASE}/{}/mqdefault.jpg", self.youtube_id),
        }
    }

    /// Calendar date of publication, as shown next to the channel label
    pub fn published_date(&self) -> String {
        self.published_at.format("%Y-%m-%d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track_json(thumbnail: &str) -> String {
        format!(
            r#"{{
                "title": "Ya Leil",
                "youtubeId": "abc123",
                "url": "https://www.youtube.com/watch?v=abc123",
                {thumbnail}
                "channelTitle": "Mezwed Music",
                "publishedAt": "2019-04-12T18:30:00Z"
            }}"#
        )
    }

    #[test]
    fn track_uses_camel_case_fields() {
        let track: Track = serde_json::from_str(&track_json(
            r#""thumbnail": "https://i.ytimg.com/vi/abc123/mqdefault.jpg","#,
        ))
        .unwrap();
        assert_eq!(track.youtube_id, "abc123");
        assert_eq!(track.channel_title, "Mezwed Music");
        assert_eq!(track.published_date(), "2019-04-12");
        assert_eq!(
            track.thumbnail_url(),
            "https://i.ytimg.com/vi/abc123/mqdefault.jpg"
        );
        assert!(track.duration.is_none());
    }

    #[test]
    fn missing_thumbnail_falls_back_to_default_still() {
        let track: Track = serde_json::from_str(&track_json("")).unwrap();
        assert_eq!(
            track.thumbnail_url(),
            "https://img.youtube.com/vi/abc123/mqdefault.jpg"
        );
    }

    #[test]
    fn invalid_timestamp_is_rejected() {
        let raw = track_json("").replace("2019-04-12T18:30:00Z", "yesterday");
        assert!(serde_json::from_str::<Track>(&raw).is_err());
    }
}
