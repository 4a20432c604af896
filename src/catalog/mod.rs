/// Artist and track records
pub mod entities;

use std::collections::BTreeMap;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
pub use entities::{Artist, Track};

/// Provenance block written next to the artists when the catalog was generated
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogMetadata {
    #[serde(default)]
    pub generated_at: Option<String>,
    #[serde(default)]
    pub total_artists: Option<usize>,
    #[serde(default)]
    pub api_version: Option<String>,
}

/// Read-only artist catalog, keyed by artist name
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Catalog {
    artists: BTreeMap<String, Artist>,
    #[serde(default)]
    metadata: CatalogMetadata,
}

impl Catalog {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let catalog: Catalog = serde_json::from_str(raw)?;
        debug!(
            "Parsed catalog with {} artists and {} tracks",
            catalog.len(),
            catalog.total_tracks()
        );
        Ok(catalog)
    }

    /// Load the catalog file once at startup
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await?;
        debug!("Loaded catalog from {path:?}");
        Self::from_json_str(&raw)
    }

    pub fn lookup(&self, artist_name: &str) -> Option<&Artist> {
        self.artists.get(artist_name)
    }

    /// Artists in stable name order
    pub fn artists(&self) -> impl Iterator<Item = &Artist> {
        self.artists.values()
    }

    pub fn len(&self) -> usize {
        self.artists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artists.is_empty()
    }

    pub fn total_tracks(&self) -> usize {
        self.artists.values().map(Artist::track_count).sum()
    }

    pub fn metadata(&self) -> &CatalogMetadata {
        &self.metadata
    }
}

impl FromIterator<Artist> for Catalog {
    fn from_iter<I: IntoIterator<Item = Artist>>(iter: I) -> Self {
        let artists = iter
            .into_iter()
            .map(|artist| (artist.name.clone(), artist))
            .collect();
        Catalog {
            artists,
            metadata: CatalogMetadata::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "artists": {
            "Lotfi Jormana": {
                "name": "Lotfi Jormana",
                "description": "Modern Mezwed performer",
                "image": "https://example.org/lotfi.jpg",
                "songs": [
                    {
                        "title": "Sahra",
                        "youtubeId": "s1",
                        "url": "https://www.youtube.com/watch?v=s1",
                        "thumbnail": "https://i.ytimg.com/vi/s1/mqdefault.jpg",
                        "channelTitle": "Jormana",
                        "publishedAt": "2020-01-01T00:00:00Z",
                        "duration": "PT4M2S",
                        "viewCount": "1200"
                    }
                ]
            },
            "Hedi Habbouba": {
                "name": "Hedi Habbouba",
                "description": "Legendary Mezwed artist",
                "image": "https://example.org/hedi.jpg",
                "songs": []
            }
        },
        "metadata": {
            "generatedAt": "2024-05-01T10:00:00Z",
            "totalArtists": 2,
            "apiVersion": "YouTube Data API v3"
        }
    }"#;

    #[test]
    fn lookup_finds_existing_artist() {
        let catalog = Catalog::from_json_str(SAMPLE).unwrap();
        let artist = catalog.lookup("Lotfi Jormana").unwrap();
        assert_eq!(artist.track_count(), 1);
        assert_eq!(artist.songs[0].duration.as_deref(), Some("PT4M2S"));
        assert!(catalog.lookup("Ghost Artist").is_none());
    }

    #[test]
    fn artists_are_listed_in_name_order() {
        let catalog = Catalog::from_json_str(SAMPLE).unwrap();
        let names: Vec<_> = catalog.artists().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["Hedi Habbouba", "Lotfi Jormana"]);
        assert_eq!(catalog.total_tracks(), 1);
        assert_eq!(catalog.metadata().total_artists, Some(2));
    }

    #[test]
    fn metadata_block_is_optional() {
        let catalog = Catalog::from_json_str(r#"{"artists": {}}"#).unwrap();
        assert!(catalog.is_empty());
        assert_eq!(catalog.metadata(), &CatalogMetadata::default());
    }

    #[test]
    fn malformed_catalog_is_a_parse_error() {
        let err = Catalog::from_json_str(r#"{"artists": []}"#).unwrap_err();
        assert!(matches!(err, crate::errors::Error::CatalogParseError(_)));
    }
}
