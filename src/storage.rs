use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::debug;

use crate::errors::Result;

const SELECTION_FILE_NAME: &str = "selected_artist";

/// Durable client-local slot holding the selected artist's name.
///
/// Only the name is stored, never the artist record itself. Absence means
/// there was no prior selection.
pub trait SelectionStore {
    fn load(&self) -> impl Future<Output = Result<Option<String>>>;
    fn store(&self, artist_name: &str) -> impl Future<Output = Result<()>>;
    fn clear(&self) -> impl Future<Output = Result<()>>;
}

/// Plain-text file store under the user's data directory
#[derive(Debug, Clone)]
pub struct FileSelectionStore {
    path: PathBuf,
}

impl FileSelectionStore {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        FileSelectionStore {
            path: dir.as_ref().join(SELECTION_FILE_NAME),
        }
    }

    pub fn try_default() -> Result<Self> {
        let dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp")) // Fallback to /tmp if data directory can't be determined
            .join("mezwed");
        Ok(Self::in_dir(dir))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SelectionStore for FileSelectionStore {
    async fn load(&self) -> Result<Option<String>> {
        if !tokio::fs::try_exists(&self.path).await? {
            debug!("No persisted artist selection in {:?}", self.path);
            return Ok(None);
        }
        let contents = tokio::fs::read_to_string(&self.path).await?;
        let name = contents.trim();
        if name.is_empty() {
            return Ok(None);
        }
        debug!("Loaded persisted artist selection from {:?}", self.path);
        Ok(Some(name.to_string()))
    }

    async fn store(&self, artist_name: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, artist_name).await?;
        debug!("Stored artist selection in {:?}", self.path);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!("Cleared artist selection in {:?}", self.path);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Volatile store, used when nothing should outlive the process
#[derive(Debug, Default)]
pub struct MemorySelectionStore {
    value: Mutex<Option<String>>,
}

impl MemorySelectionStore {
    pub fn with_value(artist_name: &str) -> Self {
        MemorySelectionStore {
            value: Mutex::new(Some(artist_name.to_string())),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        // The slot holds a plain string; a poisoned lock still has a usable value
        self.value
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl SelectionStore for MemorySelectionStore {
    async fn load(&self) -> Result<Option<String>> {
        Ok(self.slot().clone())
    }

    async fn store(&self, artist_name: &str) -> Result<()> {
        *self.slot() = Some(artist_name.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.slot() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_store_round_trips_and_clears() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = FileSelectionStore::in_dir(dir.path().join("nested"));

        assert_eq!(store.load().await?, None);
        store.store("Hedi Habbouba").await?;
        assert_eq!(store.load().await?.as_deref(), Some("Hedi Habbouba"));

        store.clear().await?;
        assert_eq!(store.load().await?, None);
        // Clearing twice is not an error
        store.clear().await?;
        Ok(())
    }

    #[tokio::test]
    async fn blank_file_means_no_selection() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = FileSelectionStore::in_dir(dir.path());
        tokio::fs::write(store.path(), "  \n").await?;
        assert_eq!(store.load().await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn memory_store_holds_one_value() -> Result<()> {
        let store = MemorySelectionStore::with_value("Ali El Mezwed");
        assert_eq!(store.load().await?.as_deref(), Some("Ali El Mezwed"));
        store.store("Salah El Mezwed").await?;
        assert_eq!(store.load().await?.as_deref(), Some("Salah El Mezwed"));
        store.clear().await?;
        assert_eq!(store.load().await?, None);
        Ok(())
    }
}
