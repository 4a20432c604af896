use log::{debug, info, warn};

use crate::catalog::{Artist, Catalog};
use crate::config::PlaybackTimings;
use crate::errors::{Error, Result};
use crate::player::{EmbedHost, PlaybackController};
use crate::storage::SelectionStore;

/// What the user is looking at
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Selection,
    Player(Artist),
}

/// Owns the catalog and the persisted selection
pub struct App<S: SelectionStore> {
    catalog: Catalog,
    store: S,
    selected: Option<String>,
}

impl<S: SelectionStore> App<S> {
    pub fn new(catalog: Catalog, store: S) -> Self {
        App {
            catalog,
            store,
            selected: None,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn selected_artist(&self) -> Option<&Artist> {
        self.selected
            .as_deref()
            .and_then(|name| self.catalog.lookup(name))
    }

    /// Resolves the persisted selection at startup.
    ///
    /// A name the catalog no longer knows, or one with nothing to play, is
    /// cleared from the store and the selection screen is shown instead.
    pub async fn restore(&mut self) -> Result<Screen> {
        let saved = match self.store.load().await {
            Ok(saved) => saved,
            Err(e) => {
                warn!("Could not read the persisted selection: {e}");
                None
            }
        };
        let Some(name) = saved else {
            debug!("No prior selection");
            return Ok(Screen::Selection);
        };
        match self.catalog.lookup(&name) {
            Some(artist) if artist.songs.is_empty() => {
                warn!("Persisted artist {name:?} has no tracks, clearing it");
                self.store.clear().await?;
                self.selected = None;
                Ok(Screen::Selection)
            }
            Some(artist) => {
                info!("Restored selection: {name}");
                self.selected = Some(name);
                Ok(Screen::Player(artist.clone()))
            }
            None => {
                warn!("Persisted artist {name:?} is not in the catalog, clearing it");
                self.store.clear().await?;
                self.selected = None;
                Ok(Screen::Selection)
            }
        }
    }

    pub async fn select_artist(&mut self, name: &str) -> Result<&Artist> {
        let Some(artist) = self.catalog.lookup(name) else {
            return Err(Error::UnknownArtist(name.to_string()));
        };
        if artist.songs.is_empty() {
            return Err(Error::EmptyArtist(name.to_string()));
        }
        self.store.store(name).await?;
        self.selected = Some(name.to_string());
        info!("Selected artist {name}");
        Ok(artist)
    }

    /// Discards the session and the persisted selection
    pub async fn change_artist(&mut self) -> Result<Screen> {
        self.store.clear().await?;
        if let Some(name) = self.selected.take() {
            info!("Leaving {name}");
        }
        Ok(Screen::Selection)
    }

    /// A fresh session for the selected artist
    pub fn start_session<H: EmbedHost>(
        &self,
        host: H,
        timings: PlaybackTimings,
        volume: u8,
    ) -> Result<PlaybackController<H>> {
        let artist = self
            .selected_artist()
            .ok_or_else(|| Error::UnknownArtist(self.selected.clone().unwrap_or_default()))?;
        PlaybackController::new(artist.clone(), host, timings, volume)
    }
}
