use std::path::PathBuf;
use std::time::Duration;

use log::debug;

use crate::errors::{Error, Result};

/// Bounded waits used by the playback controller.
///
/// Tuned against the embed's real-world latency; none of them is a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackTimings {
    /// How long to wait for the embed runtime before reporting it unavailable
    pub sdk_ready_timeout: Duration,
    /// Delay before the single retry after the runtime failed to load
    pub sdk_retry_delay: Duration,
    /// Clears the loading flag if a freshly started track never reports progress
    pub startup_timeout: Duration,
    /// Clears the loading flag after mount no matter what
    pub global_loading_timeout: Duration,
    /// Buffering watchdog #1: nudge playback
    pub buffering_nudge_after: Duration,
    /// Buffering watchdog #2, armed by the nudge: skip the track
    pub buffering_skip_after: Duration,
    /// How far the nudge rewinds before re-issuing play
    pub nudge_rewind: Duration,
    /// Progress sampler period
    pub progress_interval: Duration,
}

impl Default for PlaybackTimings {
    fn default() -> Self {
        PlaybackTimings {
            sdk_ready_timeout: Duration::from_secs(5),
            sdk_retry_delay: Duration::from_millis(1500),
            startup_timeout: Duration::from_secs(4),
            global_loading_timeout: Duration::from_secs(8),
            buffering_nudge_after: Duration::from_secs(6),
            buffering_skip_after: Duration::from_secs(4),
            nudge_rewind: Duration::from_millis(250),
            progress_interval: Duration::from_millis(700),
        }
    }
}

impl PlaybackTimings {
    /// Overrides read from `MEZWED_<NAME>_MS` variables
    fn apply_env(&mut self, lookup: &impl Fn(&str) -> Option<String>) -> Result<()> {
        let fields: [(&str, &mut Duration); 8] = [
            ("MEZWED_SDK_READY_TIMEOUT_MS", &mut self.sdk_ready_timeout),
            ("MEZWED_SDK_RETRY_DELAY_MS", &mut self.sdk_retry_delay),
            ("MEZWED_STARTUP_TIMEOUT_MS", &mut self.startup_timeout),
            ("MEZWED_LOADING_TIMEOUT_MS", &mut self.global_loading_timeout),
            ("MEZWED_BUFFERING_NUDGE_MS", &mut self.buffering_nudge_after),
            ("MEZWED_BUFFERING_SKIP_MS", &mut self.buffering_skip_after),
            ("MEZWED_NUDGE_REWIND_MS", &mut self.nudge_rewind),
            ("MEZWED_PROGRESS_INTERVAL_MS", &mut self.progress_interval),
        ];
        for (key, slot) in fields {
            if let Some(raw) = lookup(key) {
                let millis: u64 = raw.trim().parse().map_err(|_| {
                    Error::ConfigurationError(format!("{key} must be a number of milliseconds, got {raw:?}"))
                })?;
                *slot = Duration::from_millis(millis);
            }
        }
        if self.progress_interval.is_zero() {
            return Err(Error::ConfigurationError(
                "MEZWED_PROGRESS_INTERVAL_MS must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Resolved application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub catalog_path: PathBuf,
    /// Directory of the persisted artist selection; `None` uses the user's data directory
    pub state_dir: Option<PathBuf>,
    pub default_volume: u8,
    pub timings: PlaybackTimings,
}

pub struct ConfigBuilder {
    catalog_path: Option<PathBuf>,
    state_dir: Option<PathBuf>,
    default_volume: Option<u8>,
    timings: Option<PlaybackTimings>,
    read_env: bool,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            catalog_path: None,
            state_dir: None,
            default_volume: None, // 50 unless overridden
            timings: None,
            read_env: false,
        }
    }

    pub fn catalog_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog_path = Some(path.into());
        self
    }

    pub fn state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_dir = Some(dir.into());
        self
    }

    pub fn default_volume(mut self, volume: u8) -> Self {
        self.default_volume = Some(volume);
        self
    }

    pub fn timings(mut self, timings: PlaybackTimings) -> Self {
        self.timings = Some(timings);
        self
    }

    /// Fill unset values from `MEZWED_*` environment variables
    pub fn from_env(mut self) -> Self {
        self.read_env = true;
        self
    }

    pub fn build(self) -> Result<Config> {
        if self.read_env {
            self.build_with(|key| std::env::var(key).ok())
        } else {
            self.build_with(|_| None)
        }
    }

    pub fn build_with(self, lookup: impl Fn(&str) -> Option<String>) -> Result<Config> {
        let catalog_path = match self.catalog_path {
            Some(p) => p,
            None => lookup("MEZWED_CATALOG")
                .map_or_else(|| PathBuf::from("data/mezwed-data.json"), PathBuf::from),
        };
        let state_dir = self
            .state_dir
            .or_else(|| lookup("MEZWED_STATE_DIR").map(PathBuf::from));
        let default_volume = match self.default_volume {
            Some(v) => v,
            None => match lookup("MEZWED_DEFAULT_VOLUME") {
                Some(raw) => raw.trim().parse().map_err(|_| {
                    Error::ConfigurationError(format!(
                        "MEZWED_DEFAULT_VOLUME must be between 0 and 100, got {raw:?}"
                    ))
                })?,
                None => 50,
            },
        };
        if default_volume > 100 {
            return Err(Error::ConfigurationError(format!(
                "default volume must be between 0 and 100, got {default_volume}"
            )));
        }
        let timings = match self.timings {
            Some(t) => t,
            None => {
                let mut t = PlaybackTimings::default();
                t.apply_env(&lookup)?;
                t
            }
        };
        debug!("Resolved configuration: catalog={catalog_path:?}, timings={timings:?}");
        Ok(Config {
            catalog_path,
            state_dir,
            default_volume,
            timings,
        })
    }
}
