//! Scripted, in-process stand-in for the embed runtime.
//!
//! Each video id can be given a [`TrackBehaviour`]. Signals are pushed onto
//! an unbounded channel tagged with the emitting [`InstanceId`], and every
//! command the controller issues is recorded for inspection.

use std::cell::Cell;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::time::Instant;

use crate::errors::{Error, Result};
use crate::player::embed::{
    EmbedErrorCode, EmbedHost, EmbedSignal, EmbedState, EmbeddedPlayer, InstanceId,
    PlayerOptions, SdkLoad, Teardown,
};
use crate::player::sdk_hook::SdkHook;

/// How the runtime itself behaves when requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdkBehaviour {
    /// Already loaded when asked
    Present,
    /// Loads and fires the ready hook right after the request
    Loads,
    /// First request fails, the retry loads
    FailsOnce,
    /// Never announces readiness
    Silent,
}

/// How one video behaves once constructed
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackBehaviour {
    /// Ready, then plays when asked; reports the end once a position read reaches `length`
    Healthy { length: f64 },
    /// Ready, then reports the same error twice in a row
    ErrorOnLoad(i32),
    /// Ready, then buffers forever whenever asked to play
    StuckBuffering,
    /// Never reports ready
    NeverReady,
}

/// Commands received by simulated instances, in order
#[derive(Debug, Clone, PartialEq)]
pub enum EmbedCommand {
    Construct(InstanceId, String),
    Play(InstanceId),
    Pause(InstanceId),
    Seek(InstanceId, f64),
    Mute(InstanceId),
    Unmute(InstanceId),
    SetVolume(InstanceId, u8),
    Destroy(InstanceId),
}

type CommandLog = Arc<Mutex<Vec<EmbedCommand>>>;

fn lock(log: &CommandLog) -> MutexGuard<'_, Vec<EmbedCommand>> {
    log.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct SimulatedHost {
    hook: SdkHook,
    sdk: SdkBehaviour,
    sdk_requests: usize,
    default_behaviour: TrackBehaviour,
    behaviours: HashMap<String, TrackBehaviour>,
    async_teardown: bool,
    signals: UnboundedSender<(InstanceId, EmbedSignal)>,
    commands: CommandLog,
}

impl SimulatedHost {
    /// A host with its own ready hook, plus the receiving end of its signals
    pub fn new(sdk: SdkBehaviour) -> (Self, UnboundedReceiver<(InstanceId, EmbedSignal)>) {
        Self::with_hook(SdkHook::default(), sdk)
    }

    pub fn with_hook(
        hook: SdkHook,
        sdk: SdkBehaviour,
    ) -> (Self, UnboundedReceiver<(InstanceId, EmbedSignal)>) {
        let (signals, rx) = unbounded_channel();
        let host = SimulatedHost {
            hook,
            sdk,
            sdk_requests: 0,
            default_behaviour: TrackBehaviour::Healthy { length: 240.0 },
            behaviours: HashMap::new(),
            async_teardown: false,
            signals,
            commands: CommandLog::default(),
        };
        (host, rx)
    }

    #[must_use]
    pub fn default_behaviour(mut self, behaviour: TrackBehaviour) -> Self {
        self.default_behaviour = behaviour;
        self
    }

    #[must_use]
    pub fn behaviour(mut self, video_id: &str, behaviour: TrackBehaviour) -> Self {
        self.behaviours.insert(video_id.to_string(), behaviour);
        self
    }

    /// Destroy completes later, with an [`EmbedSignal::Destroyed`] signal
    #[must_use]
    pub fn async_teardown(mut self, enabled: bool) -> Self {
        self.async_teardown = enabled;
        self
    }

    pub fn commands(&self) -> Vec<EmbedCommand> {
        lock(&self.commands).clone()
    }

    pub fn constructed_videos(&self) -> Vec<String> {
        lock(&self.commands)
            .iter()
            .filter_map(|c| match c {
                EmbedCommand::Construct(_, video) => Some(video.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn sdk_requests(&self) -> usize {
        self.sdk_requests
    }

    /// Simulates the runtime finishing its load late
    pub fn announce_sdk(&self) -> bool {
        self.hook.fire()
    }
}

impl EmbedHost for SimulatedHost {
    type Player = SimulatedPlayer;

    fn ready_hook(&self) -> &SdkHook {
        &self.hook
    }

    fn load_sdk(&mut self) -> Result<SdkLoad> {
        self.sdk_requests += 1;
        match (self.sdk, self.sdk_requests) {
            (SdkBehaviour::Present, _) => Ok(SdkLoad::Ready),
            (SdkBehaviour::FailsOnce, 1) => {
                Err(Error::EmbedError("runtime script failed to load".into()))
            }
            (SdkBehaviour::Loads | SdkBehaviour::FailsOnce, _) => {
                self.hook.fire();
                Ok(SdkLoad::Requested)
            }
            (SdkBehaviour::Silent, _) => Ok(SdkLoad::Requested),
        }
    }

    fn construct(
        &mut self,
        id: InstanceId,
        video_id: &str,
        options: &PlayerOptions,
    ) -> Result<SimulatedPlayer> {
        debug!("Simulated construct {id} for {video_id} via {}", options.host);
        lock(&self.commands).push(EmbedCommand::Construct(id, video_id.to_string()));
        let behaviour = self
            .behaviours
            .get(video_id)
            .copied()
            .unwrap_or(self.default_behaviour);

        let player = SimulatedPlayer {
            id,
            behaviour,
            position: 0.0,
            playing_since: None,
            ended: Cell::new(false),
            async_teardown: self.async_teardown,
            signals: self.signals.clone(),
            commands: self.commands.clone(),
        };
        match behaviour {
            TrackBehaviour::NeverReady => {}
            TrackBehaviour::ErrorOnLoad(code) => {
                player.emit(EmbedSignal::Ready);
                player.emit(EmbedSignal::Error(EmbedErrorCode::from(code)));
                player.emit(EmbedSignal::Error(EmbedErrorCode::from(code)));
            }
            TrackBehaviour::Healthy { .. } | TrackBehaviour::StuckBuffering => {
                player.emit(EmbedSignal::Ready);
            }
        }
        Ok(player)
    }
}

pub struct SimulatedPlayer {
    id: InstanceId,
    behaviour: TrackBehaviour,
    position: f64,
    playing_since: Option<Instant>,
    ended: Cell<bool>,
    async_teardown: bool,
    signals: UnboundedSender<(InstanceId, EmbedSignal)>,
    commands: CommandLog,
}

impl SimulatedPlayer {
    fn emit(&self, signal: EmbedSignal) {
        // The receiver may already be gone when a session is shutting down
        let _ = self.signals.send((self.id, signal));
    }

    fn record(&self, command: EmbedCommand) {
        lock(&self.commands).push(command);
    }

    fn position_now(&self) -> f64 {
        let played = self
            .playing_since
            .map_or(0.0, |since| since.elapsed().as_secs_f64());
        match self.behaviour {
            TrackBehaviour::Healthy { length } => (self.position + played).min(length),
            _ => self.position,
        }
    }
}

impl EmbeddedPlayer for SimulatedPlayer {
    fn play(&mut self) -> Result<()> {
        self.record(EmbedCommand::Play(self.id));
        match self.behaviour {
            TrackBehaviour::Healthy { .. } => {
                if self.playing_since.is_none() {
                    self.playing_since = Some(Instant::now());
                }
                self.emit(EmbedSignal::StateChanged(EmbedState::Playing));
            }
            TrackBehaviour::StuckBuffering => {
                self.emit(EmbedSignal::StateChanged(EmbedState::Buffering));
            }
            TrackBehaviour::ErrorOnLoad(_) | TrackBehaviour::NeverReady => {}
        }
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.record(EmbedCommand::Pause(self.id));
        self.position = self.position_now();
        self.playing_since = None;
        self.emit(EmbedSignal::StateChanged(EmbedState::Paused));
        Ok(())
    }

    fn seek_to(&mut self, seconds: f64) -> Result<()> {
        self.record(EmbedCommand::Seek(self.id, seconds));
        self.position = seconds;
        if self.playing_since.is_some() {
            self.playing_since = Some(Instant::now());
        }
        Ok(())
    }

    fn mute(&mut self) -> Result<()> {
        self.record(EmbedCommand::Mute(self.id));
        Ok(())
    }

    fn unmute(&mut self) -> Result<()> {
        self.record(EmbedCommand::Unmute(self.id));
        Ok(())
    }

    fn set_volume(&mut self, volume: u8) -> Result<()> {
        self.record(EmbedCommand::SetVolume(self.id, volume));
        Ok(())
    }

    fn current_time(&self) -> Result<f64> {
        let position = self.position_now();
        if let TrackBehaviour::Healthy { length } = self.behaviour {
            if position >= length && !self.ended.replace(true) {
                self.emit(EmbedSignal::StateChanged(EmbedState::Ended));
            }
        }
        Ok(position)
    }

    fn duration(&self) -> Result<f64> {
        match self.behaviour {
            TrackBehaviour::Healthy { length } => Ok(length),
            _ => Ok(0.0),
        }
    }

    fn destroy(&mut self) -> Teardown {
        self.record(EmbedCommand::Destroy(self.id));
        self.playing_since = None;
        if self.async_teardown {
            self.emit(EmbedSignal::Destroyed);
            Teardown::Pending
        } else {
            Teardown::Complete
        }
    }
}
