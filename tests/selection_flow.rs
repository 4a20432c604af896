use mezwed::errors::{Error, Result};
use mezwed::player::simulated::{SdkBehaviour, SimulatedHost};
use mezwed::{App, Catalog, FileSelectionStore, MemorySelectionStore, Screen, SelectionStore};

const CATALOG: &str = r#"{
    "artists": {
        "Hedi Habbouba": {
            "name": "Hedi Habbouba",
            "description": "Legendary Mezwed artist",
            "image": "https://example.org/hedi.jpg",
            "songs": [
                {
                    "title": "Ya Leil",
                    "youtubeId": "leil01",
                    "url": "https://www.youtube.com/watch?v=leil01",
                    "channelTitle": "Mezwed Music",
                    "publishedAt": "2015-06-14T20:11:05Z"
                },
                {
                    "title": "Mazal",
                    "youtubeId": "mazal02",
                    "url": "https://www.youtube.com/watch?v=mazal02",
                    "channelTitle": "Mezwed Music",
                    "publishedAt": "2017-02-03T09:42:10Z"
                }
            ]
        },
        "Silent Artist": {
            "name": "Silent Artist",
            "description": "Nothing to play",
            "image": "",
            "songs": []
        }
    }
}"#;

fn catalog() -> Catalog {
    Catalog::from_json_str(CATALOG).unwrap()
}

#[tokio::test]
async fn ghost_artist_is_cleared_on_restore() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store = FileSelectionStore::in_dir(dir.path());
    store.store("Ghost Artist").await?;

    let mut app = App::new(catalog(), store);
    assert_eq!(app.restore().await?, Screen::Selection);
    assert_eq!(app.store().load().await?, None);
    assert!(app.selected_artist().is_none());
    Ok(())
}

#[tokio::test]
async fn artist_without_tracks_is_cleared_on_restore() -> Result<()> {
    let mut app = App::new(catalog(), MemorySelectionStore::with_value("Silent Artist"));
    assert_eq!(app.restore().await?, Screen::Selection);
    assert_eq!(app.store().load().await?, None);
    assert!(app.selected_artist().is_none());

    let (host, _signals) = SimulatedHost::new(SdkBehaviour::Present);
    assert!(matches!(
        app.start_session(host, Default::default(), 50),
        Err(Error::UnknownArtist(_))
    ));
    Ok(())
}

#[tokio::test]
async fn known_artist_is_restored() -> Result<()> {
    let store = MemorySelectionStore::with_value("Hedi Habbouba");
    let mut app = App::new(catalog(), store);
    match app.restore().await? {
        Screen::Player(artist) => assert_eq!(artist.track_count(), 2),
        Screen::Selection => panic!("expected the player screen"),
    }
    assert_eq!(app.selected_artist().map(|a| a.name.as_str()), Some("Hedi Habbouba"));
    Ok(())
}

#[tokio::test]
async fn selection_persists_name_and_change_artist_clears_it() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut app = App::new(catalog(), FileSelectionStore::in_dir(dir.path()));
    assert_eq!(app.restore().await?, Screen::Selection);

    let artist = app.select_artist("Hedi Habbouba").await?;
    assert_eq!(artist.name, "Hedi Habbouba");
    let raw = tokio::fs::read_to_string(dir.path().join("selected_artist")).await?;
    assert_eq!(raw, "Hedi Habbouba");

    // A second process sees the same selection
    let mut restarted = App::new(catalog(), FileSelectionStore::in_dir(dir.path()));
    assert!(matches!(restarted.restore().await?, Screen::Player(_)));

    assert_eq!(app.change_artist().await?, Screen::Selection);
    assert!(app.selected_artist().is_none());
    assert_eq!(app.store().load().await?, None);
    Ok(())
}

#[tokio::test]
async fn unknown_or_empty_artists_are_rejected() {
    let mut app = App::new(catalog(), MemorySelectionStore::default());
    assert!(matches!(
        app.select_artist("Ghost Artist").await,
        Err(Error::UnknownArtist(_))
    ));
    assert!(matches!(
        app.select_artist("Silent Artist").await,
        Err(Error::EmptyArtist(_))
    ));
    assert_eq!(app.store().load().await.unwrap(), None);
}

#[tokio::test]
async fn session_starts_on_the_first_track() -> Result<()> {
    let mut app = App::new(catalog(), MemorySelectionStore::default());
    app.select_artist("Hedi Habbouba").await?;

    let (host, _signals) = SimulatedHost::new(SdkBehaviour::Present);
    let controller = app.start_session(host, Default::default(), 50)?;
    assert_eq!(controller.session().track_index, 0);
    assert_eq!(controller.current_track().youtube_id, "leil01");
    Ok(())
}

#[tokio::test]
async fn session_needs_a_selection() {
    let app = App::new(catalog(), MemorySelectionStore::default());
    let (host, _signals) = SimulatedHost::new(SdkBehaviour::Present);
    assert!(app.start_session(host, Default::default(), 50).is_err());
}
