use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use mezwed::catalog::Catalog;
use mezwed::config::{Config, ConfigBuilder};
use mezwed::errors::{Error, Result};
use mezwed::player::SdkHook;
use mezwed::player::controller::format_clock;
use mezwed::player::driver::SessionDriver;
use mezwed::player::simulated::{SdkBehaviour, SimulatedHost, TrackBehaviour};
use mezwed::{App, FileSelectionStore, Screen};

#[derive(Parser)]
#[command(name = "mezwed")]
#[command(version, about = "Curated Mezwed artist radio", long_about = None)]
struct Cli {
    /// Catalog JSON file (defaults to $MEZWED_CATALOG or data/mezwed-data.json)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Directory of the persisted artist selection
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the artists in the catalog
    Artists,
    /// Show an artist's playlist
    Show { artist: String },
    /// Remember an artist as the current selection
    Select { artist: String },
    /// Print the remembered artist, clearing it if the catalog no longer has it
    Current,
    /// Forget the remembered artist
    Clear,
    /// Run a playback session against a scripted embed
    Simulate {
        /// Artist to play; defaults to the remembered one
        #[arg(long)]
        artist: Option<String>,
        #[arg(long, value_enum, default_value_t = Scenario::Healthy)]
        scenario: Scenario,
        /// How long to run the session
        #[arg(long, default_value_t = 30)]
        seconds: u64,
        /// Length of each simulated track, in seconds
        #[arg(long, default_value_t = 12.0)]
        track_length: f64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Scenario {
    /// Every track plays through
    Healthy,
    /// The first track fails to load
    Error,
    /// The first track never stops buffering
    Stall,
    /// The embed runtime never becomes ready
    NoSdk,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut builder = ConfigBuilder::new().from_env();
    if let Some(path) = cli.catalog {
        builder = builder.catalog_path(path);
    }
    if let Some(dir) = cli.state_dir {
        builder = builder.state_dir(dir);
    }
    let config = builder.build()?;

    info!("Loading catalog from {:?} ...", config.catalog_path);
    let catalog = Catalog::load(&config.catalog_path).await?;
    let store = match &config.state_dir {
        Some(dir) => FileSelectionStore::in_dir(dir),
        None => FileSelectionStore::try_default()?,
    };
    let mut app = App::new(catalog, store);

    match cli.command {
        Commands::Artists => list_artists(&app),
        Commands::Show { artist } => show_artist(&app, &artist)?,
        Commands::Select { artist } => {
            let artist = app.select_artist(&artist).await?;
            println!("Now listening to {} ({} songs)", artist.name, artist.track_count());
        }
        Commands::Current => match app.restore().await? {
            Screen::Player(artist) => println!("{}", artist.name),
            Screen::Selection => println!("No artist selected"),
        },
        Commands::Clear => {
            app.change_artist().await?;
            println!("Selection cleared");
        }
        Commands::Simulate {
            artist,
            scenario,
            seconds,
            track_length,
        } => simulate(&mut app, &config, artist, scenario, seconds, track_length).await?,
    }
    Ok(())
}

fn list_artists(app: &App<FileSelectionStore>) {
    for artist in app.catalog().artists() {
        println!(
            "{:<24} {:>3} songs  {}",
            artist.name,
            artist.track_count(),
            artist.description
        );
    }
}

fn show_artist(app: &App<FileSelectionStore>, name: &str) -> Result<()> {
    let artist = app
        .catalog()
        .lookup(name)
        .ok_or_else(|| Error::UnknownArtist(name.to_string()))?;
    println!("{}\n{}\n", artist.name, artist.description);
    for (index, track) in artist.songs.iter().enumerate() {
        println!(
            "{index:>3}. {}\n     {} · {} · {}",
            track.title,
            track.channel_title,
            track.published_date(),
            track.url
        );
    }
    Ok(())
}

async fn simulate(
    app: &mut App<FileSelectionStore>,
    config: &Config,
    artist: Option<String>,
    scenario: Scenario,
    seconds: u64,
    track_length: f64,
) -> Result<()> {
    match artist {
        Some(name) => {
            app.select_artist(&name).await?;
        }
        None => {
            if app.restore().await? == Screen::Selection {
                return Err(Error::ConfigurationError(
                    "No artist selected; pass --artist or run `mezwed select` first".into(),
                ));
            }
        }
    }

    let sdk = match scenario {
        Scenario::NoSdk => SdkBehaviour::Silent,
        _ => SdkBehaviour::Loads,
    };
    let (host, signals) = SimulatedHost::with_hook(SdkHook::global().clone(), sdk);
    let mut host = host.default_behaviour(TrackBehaviour::Healthy {
        length: track_length,
    });
    if let Some(first) = app.selected_artist().and_then(|a| a.songs.first()) {
        match scenario {
            Scenario::Error => host = host.behaviour(&first.youtube_id, TrackBehaviour::ErrorOnLoad(150)),
            Scenario::Stall => host = host.behaviour(&first.youtube_id, TrackBehaviour::StuckBuffering),
            Scenario::Healthy | Scenario::NoSdk => {}
        }
    }

    let controller = app.start_session(host, config.timings, config.default_volume)?;
    let (driver, _commands) = SessionDriver::new(controller, signals);
    let stop_at = tokio::time::Instant::now() + Duration::from_secs(seconds);
    let controller = driver.run(Some(stop_at)).await;

    let session = controller.session();
    let progress = controller.progress();
    println!(
        "Stopped on track {} \"{}\" at {} / {}",
        session.track_index,
        controller.current_track().title,
        format_clock(progress.elapsed),
        format_clock(progress.duration)
    );
    println!(
        "Tracks loaded: {}",
        controller.host().constructed_videos().len()
    );
    if let Some(notice) = controller.notice() {
        println!("Last notice: {}", notice.message());
    }
    Ok(())
}
