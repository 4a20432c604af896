//! Mezwed - a curated artist radio on top of an embedded video player
//!
//! This library provides the read-only artist catalog, the persisted artist
//! selection and a playback controller that keeps an unreliable third-party
//! embed playing: it retries the runtime load, nudges stalled buffering,
//! skips broken tracks and works around autoplay restrictions.

/// Application shell: restore, select and change artist
pub mod app;
/// Artist catalog loaded from JSON
pub mod catalog;
/// Configuration builder and playback timings
pub mod config;
/// Error types and result aliases
pub mod errors;
/// Playback controller and the embed boundary
pub mod player;
/// Persisted artist selection
pub mod storage;

pub use app::{App, Screen};
pub use catalog::Catalog;
pub use storage::{FileSelectionStore, MemorySelectionStore, SelectionStore};
