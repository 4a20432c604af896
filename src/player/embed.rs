//! Boundary to the third-party embeddable video player.
//!
//! The controller never talks to a concrete widget. It drives an
//! [`EmbedHost`], which loads the runtime and constructs [`EmbeddedPlayer`]
//! instances, and it receives [`EmbedSignal`]s tagged with the
//! [`InstanceId`] they were emitted by.

use std::fmt;

use crate::errors::Result;
use crate::player::sdk_hook::SdkHook;

/// Identity of one constructed embed instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "embed#{}", self.0)
    }
}

/// Lifecycle states reported by the embed, with the provider's numeric codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedState {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
}

impl EmbedState {
    pub fn code(self) -> i32 {
        match self {
            EmbedState::Unstarted => -1,
            EmbedState::Ended => 0,
            EmbedState::Playing => 1,
            EmbedState::Paused => 2,
            EmbedState::Buffering => 3,
            EmbedState::Cued => 5,
        }
    }
}

impl TryFrom<i32> for EmbedState {
    type Error = i32;

    fn try_from(code: i32) -> std::result::Result<Self, Self::Error> {
        match code {
            -1 => Ok(EmbedState::Unstarted),
            0 => Ok(EmbedState::Ended),
            1 => Ok(EmbedState::Playing),
            2 => Ok(EmbedState::Paused),
            3 => Ok(EmbedState::Buffering),
            5 => Ok(EmbedState::Cued),
            other => Err(other),
        }
    }
}

/// Error codes the embed reports for a track it cannot play
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedErrorCode {
    InvalidParameter,
    Html5Playback,
    VideoNotFound,
    EmbeddingForbidden,
    Unknown(i32),
}

impl From<i32> for EmbedErrorCode {
    fn from(code: i32) -> Self {
        match code {
            2 => EmbedErrorCode::InvalidParameter,
            5 => EmbedErrorCode::Html5Playback,
            100 => EmbedErrorCode::VideoNotFound,
            101 | 150 => EmbedErrorCode::EmbeddingForbidden,
            other => EmbedErrorCode::Unknown(other),
        }
    }
}

/// Signals delivered by an embed instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedSignal {
    Ready,
    StateChanged(EmbedState),
    Error(EmbedErrorCode),
    /// An asynchronous teardown finished
    Destroyed,
}

/// Outcome of asking the host for the embed runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdkLoad {
    /// Runtime already present
    Ready,
    /// Load requested; readiness arrives through the ready hook
    Requested,
}

/// Outcome of destroying an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Teardown {
    Complete,
    /// The instance reports [`EmbedSignal::Destroyed`] when done
    Pending,
}

/// Construction options for a hidden, audio-only embed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerOptions {
    pub host: String,
    pub width: u32,
    pub height: u32,
    pub autoplay: bool,
    pub controls: bool,
    pub keyboard: bool,
    pub inline_playback: bool,
    pub related_videos: bool,
    pub quality_hint: String,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        PlayerOptions {
            host: "https://www.youtube-nocookie.com".to_string(),
            // 1x1 keeps the embed emitting events while invisible
            width: 1,
            height: 1,
            autoplay: true,
            controls: false,
            keyboard: false,
            inline_playback: true,
            related_videos: false,
            quality_hint: "small".to_string(),
        }
    }
}

/// Commands understood by a live embed instance
pub trait EmbeddedPlayer {
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self) -> Result<()>;
    fn seek_to(&mut self, seconds: f64) -> Result<()>;
    fn mute(&mut self) -> Result<()>;
    fn unmute(&mut self) -> Result<()>;
    /// `volume` is within 0..=100
    fn set_volume(&mut self, volume: u8) -> Result<()>;
    fn current_time(&self) -> Result<f64>;
    fn duration(&self) -> Result<f64>;
    fn destroy(&mut self) -> Teardown;
}

/// Loads the embed runtime and constructs instances bound to a video
pub trait EmbedHost {
    type Player: EmbeddedPlayer;

    /// The process-wide hook the runtime calls once it is ready
    fn ready_hook(&self) -> &SdkHook;

    fn load_sdk(&mut self) -> Result<SdkLoad>;

    fn construct(
        &mut self,
        id: InstanceId,
        video_id: &str,
        options: &PlayerOptions,
    ) -> Result<Self::Player>;
}
