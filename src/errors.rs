use thiserror::Error;

/// Crate-wide result alias
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by the catalog, the selection store and the playback controller
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to parse catalog, error: {0}")]
    CatalogParseError(#[from] serde_json::Error),

    #[error("Unknown artist: {0}")]
    UnknownArtist(String),

    #[error("Artist {0} has no playable tracks")]
    EmptyArtist(String),

    #[error("Track index {index} is out of range for a playlist of {len} tracks")]
    TrackOutOfRange { index: usize, len: usize },

    #[error("Embedded player error: {0}")]
    EmbedError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] std::io::Error),
}
