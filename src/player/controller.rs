//! Playback session controller.
//!
//! A single-threaded state machine that owns the session (artist, track
//! index, play/mute/volume) and drives one embedded player instance at a
//! time. It is fed three kinds of input, always one at a time:
//!
//! - embed signals, via [`PlaybackController::handle_signal`]
//! - user actions (`next`, `select_track`, `set_volume`, ...)
//! - timer expiry, via [`PlaybackController::tick`]
//!
//! Time is injected as [`Instant`] arguments, so recovery policies can be
//! exercised without waiting on a wall clock.

use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::catalog::{Artist, Track};
use crate::config::PlaybackTimings;
use crate::errors::{Error, Result};
use crate::player::embed::{
    EmbedHost, EmbedSignal, EmbedState, EmbeddedPlayer, InstanceId, PlayerOptions, SdkLoad,
    Teardown,
};
use crate::player::sdk_hook::SdkSubscription;
use crate::player::timers::{TimerKind, Timers};

/// Lifecycle position of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerPhase {
    Uninitialized,
    LoadingSdk,
    /// The embed runtime never became ready; track selection still works
    SdkUnavailable,
    SdkReady,
    PlayerInitializing,
    Playing,
    Paused,
    Buffering,
    Ended,
    Error,
    /// Waiting for an instance to finish tearing down before the next one
    TearingDown,
}

/// Availability of the embed runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdkStatus {
    NotRequested,
    Loading,
    Ready,
    Unavailable,
}

/// The one banner the player surface shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    LoadingPlayer,
    PlayerUnavailable,
    Loading,
    /// Started muted because the user has not interacted yet; one click unmutes
    PlayingMuted,
    ClickToStart,
}

impl Notice {
    pub fn message(self) -> &'static str {
        match self {
            Notice::LoadingPlayer => "Loading player...",
            Notice::PlayerUnavailable => "Player failed to load. Check ad blockers/network.",
            Notice::Loading => "Loading...",
            Notice::PlayingMuted => "Playing muted - click to unmute",
            Notice::ClickToStart => "Click to start playback",
        }
    }
}

/// Observable session state
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub track_index: usize,
    pub playing: bool,
    pub muted: bool,
    pub volume: u8,
    /// Advisory, from the progress sampler
    pub elapsed: f64,
    pub duration: f64,
    pub loading: bool,
    pub embed_state: Option<EmbedState>,
    pub user_interacted: bool,
    /// Muted by the autoplay workaround rather than by the user
    pub muted_by_autoplay: bool,
}

impl SessionState {
    fn new(volume: u8) -> Self {
        SessionState {
            track_index: 0,
            playing: false,
            muted: false,
            volume: volume.min(100),
            elapsed: 0.0,
            duration: 0.0,
            loading: true,
            embed_state: None,
            user_interacted: false,
            muted_by_autoplay: false,
        }
    }
}

/// Elapsed/duration snapshot for progress display
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub elapsed: f64,
    pub duration: f64,
    /// 0..=100
    pub percent: f64,
}

/// Renders seconds as `m:ss`
pub fn format_clock(seconds: f64) -> String {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

struct LivePlayer<P> {
    id: InstanceId,
    video_id: String,
    player: P,
    ready: bool,
}

pub struct PlaybackController<H: EmbedHost> {
    host: H,
    artist: Artist,
    timings: PlaybackTimings,
    options: PlayerOptions,
    session: SessionState,
    phase: PlayerPhase,
    sdk: SdkStatus,
    sdk_retry_used: bool,
    subscription: Option<SdkSubscription>,
    live: Option<LivePlayer<H::Player>>,
    // Instance whose asynchronous teardown has not completed yet
    dying: Option<InstanceId>,
    reload_queued: bool,
    next_instance: u64,
    timers: Timers,
}

impl<H: EmbedHost> PlaybackController<H> {
    pub fn new(artist: Artist, host: H, timings: PlaybackTimings, volume: u8) -> Result<Self> {
        if artist.songs.is_empty() {
            return Err(Error::EmptyArtist(artist.name));
        }
        // The sampler re-arms itself, so a zero interval would never leave `tick`
        if timings.progress_interval.is_zero() {
            return Err(Error::ConfigurationError(
                "progress interval must be greater than zero".into(),
            ));
        }
        Ok(PlaybackController {
            host,
            artist,
            timings,
            options: PlayerOptions::default(),
            session: SessionState::new(volume),
            phase: PlayerPhase::Uninitialized,
            sdk: SdkStatus::NotRequested,
            sdk_retry_used: false,
            subscription: None,
            live: None,
            dying: None,
            reload_queued: false,
            next_instance: 1,
            timers: Timers::default(),
        })
    }

    pub fn artist(&self) -> &Artist {
        &self.artist
    }

    pub fn current_track(&self) -> &Track {
        // track_index is kept within bounds and the playlist is never empty
        &self.artist.songs[self.session.track_index]
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn phase(&self) -> PlayerPhase {
        self.phase
    }

    pub fn sdk_status(&self) -> SdkStatus {
        self.sdk
    }

    pub fn instance_id(&self) -> Option<InstanceId> {
        self.live.as_ref().map(|live| live.id)
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn is_timer_armed(&self, kind: TimerKind) -> bool {
        self.timers.is_armed(kind)
    }

    /// Earliest pending timer, for the event loop to sleep on
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Requests the embed runtime and claims its ready hook.
    ///
    /// `on_sdk_ready` runs whenever the runtime announces itself; the caller
    /// should answer it with [`Self::on_sdk_ready`].
    pub fn mount(&mut self, now: Instant, on_sdk_ready: impl Fn() + Send + Sync + 'static) {
        if self.phase != PlayerPhase::Uninitialized {
            debug!("Controller already mounted, ignoring");
            return;
        }
        info!("Mounting player for {}", self.artist.name);
        match self.host.ready_hook().claim(on_sdk_ready) {
            Ok(subscription) => self.subscription = Some(subscription),
            Err(e) => warn!("Continuing without the SDK ready hook: {e}"),
        }
        self.session.loading = true;
        self.sdk = SdkStatus::Loading;
        self.phase = PlayerPhase::LoadingSdk;
        self.timers.arm(
            TimerKind::GlobalLoading,
            now + self.timings.global_loading_timeout,
        );
        self.timers
            .arm(TimerKind::SdkReady, now + self.timings.sdk_ready_timeout);
        self.request_sdk(now);
    }

    fn request_sdk(&mut self, now: Instant) {
        match self.host.load_sdk() {
            Ok(SdkLoad::Ready) => self.on_sdk_ready(),
            Ok(SdkLoad::Requested) => debug!("Embed runtime requested"),
            Err(e) if !self.sdk_retry_used => {
                warn!("Embed runtime failed to load: {e}, retrying");
                self.sdk_retry_used = true;
                self.timers
                    .arm(TimerKind::SdkRetry, now + self.timings.sdk_retry_delay);
            }
            Err(e) => warn!("Embed runtime failed to load again: {e}"),
        }
    }

    /// The runtime is ready; possibly after it was already reported unavailable
    pub fn on_sdk_ready(&mut self) {
        if self.phase == PlayerPhase::Uninitialized || self.sdk == SdkStatus::Ready {
            return;
        }
        if self.sdk == SdkStatus::Unavailable {
            info!("Embed runtime became ready after the readiness timeout");
        } else {
            debug!("Embed runtime ready");
        }
        self.sdk = SdkStatus::Ready;
        self.timers.cancel(TimerKind::SdkReady);
        self.timers.cancel(TimerKind::SdkRetry);
        self.phase = PlayerPhase::SdkReady;
        self.initialize_player();
    }

    fn initialize_player(&mut self) {
        if self.sdk != SdkStatus::Ready {
            return;
        }
        if self.dying.is_some() {
            self.reload_queued = true;
            self.phase = PlayerPhase::TearingDown;
            return;
        }
        if self.teardown_live() == Teardown::Pending {
            self.reload_queued = true;
            self.phase = PlayerPhase::TearingDown;
            return;
        }

        let id = InstanceId(self.next_instance);
        self.next_instance += 1;
        let video_id = self.current_track().youtube_id.clone();
        debug!("Constructing {id} for video {video_id}");
        match self.host.construct(id, &video_id, &self.options) {
            Ok(player) => {
                self.live = Some(LivePlayer {
                    id,
                    video_id,
                    player,
                    ready: false,
                });
                self.phase = PlayerPhase::PlayerInitializing;
                self.session.loading = true;
                self.session.embed_state = None;
                self.session.elapsed = 0.0;
                self.session.duration = 0.0;
            }
            Err(e) => {
                warn!("Could not construct embedded player for {video_id}: {e}");
                self.phase = PlayerPhase::Error;
                self.session.loading = false;
            }
        }
    }

    /// Destroys the live instance, cancelling everything scoped to it
    fn teardown_live(&mut self) -> Teardown {
        for kind in TimerKind::TRACK_SCOPED {
            self.timers.cancel(kind);
        }
        let Some(mut live) = self.live.take() else {
            return Teardown::Complete;
        };
        let outcome = live.player.destroy();
        debug!("Destroyed {} ({:?})", live.id, outcome);
        if outcome == Teardown::Pending {
            self.dying = Some(live.id);
        }
        outcome
    }

    fn change_track(&mut self, index: usize) {
        self.session.track_index = index;
        self.session.elapsed = 0.0;
        self.session.loading = true;
        for kind in TimerKind::TRACK_SCOPED {
            self.timers.cancel(kind);
        }
        debug!("Track {index}: {}", self.artist.songs[index].title);
        self.initialize_player();
    }

    fn advance(&mut self) {
        let next = (self.session.track_index + 1) % self.artist.songs.len();
        self.change_track(next);
    }

    /// Delivers one embed signal. Signals from replaced instances are dropped.
    pub fn handle_signal(&mut self, id: InstanceId, signal: EmbedSignal, now: Instant) {
        if signal == EmbedSignal::Destroyed {
            self.on_destroyed(id);
            return;
        }
        if self.live.as_ref().map(|live| live.id) != Some(id) {
            debug!("Ignoring {signal:?} from stale {id}");
            return;
        }
        match signal {
            EmbedSignal::Ready => self.on_ready(now),
            EmbedSignal::StateChanged(state) => self.on_state_changed(state, now),
            EmbedSignal::Error(code) => {
                warn!(
                    "Embed error {code:?} on \"{}\", skipping to the next track",
                    self.current_track().title
                );
                self.phase = PlayerPhase::Error;
                self.session.loading = false;
                self.advance();
            }
            EmbedSignal::Destroyed => {}
        }
    }

    fn on_destroyed(&mut self, id: InstanceId) {
        if self.dying != Some(id) {
            debug!("Ignoring teardown notice from {id}");
            return;
        }
        debug!("{id} finished tearing down");
        self.dying = None;
        if std::mem::take(&mut self.reload_queued) {
            self.initialize_player();
        }
    }

    fn on_ready(&mut self, now: Instant) {
        let volume = self.session.volume;
        let autoplay_mute = !self.session.user_interacted;
        let keep_muted = self.session.muted;
        let Some(live) = self.live.as_mut() else {
            return;
        };
        if live.ready {
            return;
        }
        live.ready = true;
        debug!("{} ready with video {}", live.id, live.video_id);

        if let Err(e) = live.player.set_volume(volume) {
            debug!("set_volume failed on ready: {e}");
        }
        let mute_result = if autoplay_mute || keep_muted {
            live.player.mute()
        } else {
            live.player.unmute()
        };
        if let Err(e) = mute_result {
            debug!("Mute setup failed on ready: {e}");
        }
        if autoplay_mute {
            self.session.muted = true;
            self.session.muted_by_autoplay = true;
        }

        self.phase = PlayerPhase::Playing;
        self.session.loading = true;
        match live.player.play() {
            Ok(()) => {
                self.session.playing = true;
                self.timers
                    .arm(TimerKind::Startup, now + self.timings.startup_timeout);
                // Stall guard: if the first frames never arrive the watchdog nudges
                self.timers.arm(
                    TimerKind::BufferingNudge,
                    now + self.timings.buffering_nudge_after,
                );
            }
            Err(e) => {
                warn!("Could not start playback: {e}");
                self.session.playing = false;
                self.session.loading = false;
            }
        }
        self.timers.arm(
            TimerKind::ProgressSample,
            now + self.timings.progress_interval,
        );
    }

    fn on_state_changed(&mut self, state: EmbedState, now: Instant) {
        debug!("Embed state -> {state:?}");
        let previous = self.session.embed_state.replace(state);
        match state {
            EmbedState::Ended => {
                self.phase = PlayerPhase::Ended;
                self.session.loading = false;
                self.advance();
            }
            EmbedState::Playing => {
                self.phase = PlayerPhase::Playing;
                self.session.playing = true;
                self.session.loading = false;
                self.clear_watchdogs();
            }
            EmbedState::Paused => {
                self.phase = PlayerPhase::Paused;
                self.session.playing = false;
                self.session.loading = false;
                self.clear_watchdogs();
            }
            EmbedState::Buffering => {
                self.phase = PlayerPhase::Buffering;
                self.session.loading = true;
                // A new stall always gets the full nudge delay; repeated reports
                // within the same stall leave the watchdogs alone
                if previous != Some(EmbedState::Buffering) {
                    self.timers.cancel(TimerKind::BufferingSkip);
                    self.timers.arm(
                        TimerKind::BufferingNudge,
                        now + self.timings.buffering_nudge_after,
                    );
                }
            }
            EmbedState::Unstarted | EmbedState::Cued => {
                self.session.loading = false;
                self.timers.cancel(TimerKind::BufferingSkip);
            }
        }
    }

    fn clear_watchdogs(&mut self) {
        for kind in TimerKind::WATCHDOGS {
            self.timers.cancel(kind);
        }
    }

    /// Fires every timer that is due at `now`
    pub fn tick(&mut self, now: Instant) {
        while let Some(kind) = self.timers.pop_due(now) {
            debug!("Timer {kind:?} fired");
            self.on_timer(kind, now);
        }
    }

    fn on_timer(&mut self, kind: TimerKind, now: Instant) {
        match kind {
            TimerKind::SdkReady => {
                if self.sdk != SdkStatus::Ready {
                    warn!("Embed runtime not ready after {:?}", self.timings.sdk_ready_timeout);
                    self.sdk = SdkStatus::Unavailable;
                    self.phase = PlayerPhase::SdkUnavailable;
                    self.session.loading = false;
                }
            }
            TimerKind::SdkRetry => {
                if self.sdk != SdkStatus::Ready {
                    self.request_sdk(now);
                }
            }
            TimerKind::GlobalLoading | TimerKind::Startup => {
                self.session.loading = false;
            }
            TimerKind::BufferingNudge => self.nudge(now),
            TimerKind::BufferingSkip => {
                if self.session.embed_state == Some(EmbedState::Buffering) {
                    warn!(
                        "Still buffering \"{}\" after a nudge, skipping",
                        self.current_track().title
                    );
                    self.session.loading = false;
                    self.advance();
                }
            }
            TimerKind::ProgressSample => self.sample_progress(now),
        }
    }

    fn nudge(&mut self, now: Instant) {
        let buffering = match self.session.embed_state {
            Some(EmbedState::Buffering) => true,
            // No state report since ready: the first frames never arrived
            None => false,
            Some(state) => {
                debug!("Stall guard fired while {state:?}, nothing to recover");
                return;
            }
        };
        let rewind = self.timings.nudge_rewind.as_secs_f64();
        let Some(live) = self.live.as_mut() else {
            return;
        };
        let nudged = live
            .player
            .current_time()
            .and_then(|t| live.player.seek_to((t - rewind).max(0.0)))
            .and_then(|()| live.player.play());
        match nudged {
            Ok(()) => {
                debug!("Nudged {} after a stall", live.id);
                // Only a reported stall can end in a skip
                if buffering {
                    self.timers.arm(
                        TimerKind::BufferingSkip,
                        now + self.timings.buffering_skip_after,
                    );
                }
            }
            Err(e) => {
                warn!("Nudge failed: {e}, skipping");
                self.advance();
            }
        }
    }

    fn sample_progress(&mut self, now: Instant) {
        let Some(live) = self.live.as_ref().filter(|live| live.ready) else {
            return;
        };
        if let Ok(elapsed) = live.player.current_time() {
            self.session.elapsed = elapsed;
        }
        if let Ok(duration) = live.player.duration() {
            self.session.duration = duration;
        }
        self.timers.arm(
            TimerKind::ProgressSample,
            now + self.timings.progress_interval,
        );
    }

    /// Any click on the player surface. Restores sound muted by the autoplay workaround.
    pub fn interact(&mut self) {
        self.session.user_interacted = true;
        if self.session.muted_by_autoplay {
            self.restore_sound();
        }
    }

    fn restore_sound(&mut self) {
        self.session.muted = false;
        self.session.muted_by_autoplay = false;
        let volume = self.session.volume;
        if let Some(live) = self.live.as_mut().filter(|live| live.ready) {
            let restored = live
                .player
                .unmute()
                .and_then(|()| live.player.set_volume(volume));
            if let Err(e) = restored {
                debug!("Could not restore sound: {e}");
            }
        }
    }

    /// The one-click "unmute" affordance; also resumes playback
    pub fn unmute(&mut self) {
        self.session.user_interacted = true;
        self.restore_sound();
        self.play();
    }

    pub fn play(&mut self) {
        self.interact();
        self.session.playing = true;
        if let Some(live) = self.live.as_mut().filter(|live| live.ready) {
            if let Err(e) = live.player.play() {
                debug!("play failed: {e}");
            }
        }
    }

    pub fn pause(&mut self) {
        self.interact();
        self.session.playing = false;
        if let Some(live) = self.live.as_mut().filter(|live| live.ready) {
            if let Err(e) = live.player.pause() {
                debug!("pause failed: {e}");
            }
        }
    }

    /// Returns whether the session is now playing
    pub fn toggle_play_pause(&mut self) -> bool {
        if self.session.playing {
            self.pause();
        } else {
            self.play();
        }
        self.session.playing
    }

    pub fn next(&mut self) {
        self.interact();
        self.advance();
    }

    pub fn previous(&mut self) {
        self.interact();
        let len = self.artist.songs.len();
        let prev = (self.session.track_index + len - 1) % len;
        self.change_track(prev);
    }

    /// Jumps to `index` and forces the playing state
    pub fn select_track(&mut self, index: usize) -> Result<()> {
        let len = self.artist.songs.len();
        if index >= len {
            return Err(Error::TrackOutOfRange { index, len });
        }
        self.interact();
        self.session.playing = true;
        self.change_track(index);
        Ok(())
    }

    /// Values above 100 are clamped. Muting is left untouched.
    pub fn set_volume(&mut self, volume: u8) {
        self.interact();
        let volume = volume.min(100);
        self.session.volume = volume;
        if self.session.muted {
            return;
        }
        if let Some(live) = self.live.as_mut().filter(|live| live.ready) {
            if let Err(e) = live.player.set_volume(volume) {
                debug!("set_volume failed: {e}");
            }
        }
    }

    /// Returns whether output is now muted
    pub fn toggle_mute(&mut self) -> bool {
        self.session.user_interacted = true;
        if self.session.muted {
            self.restore_sound();
        } else {
            self.session.muted = true;
            if let Some(live) = self.live.as_mut().filter(|live| live.ready) {
                if let Err(e) = live.player.mute() {
                    debug!("mute failed: {e}");
                }
            }
        }
        self.session.muted
    }

    pub fn notice(&self) -> Option<Notice> {
        match self.sdk {
            SdkStatus::Loading => return Some(Notice::LoadingPlayer),
            SdkStatus::Unavailable => return Some(Notice::PlayerUnavailable),
            SdkStatus::NotRequested | SdkStatus::Ready => {}
        }
        if self.session.loading {
            Some(Notice::Loading)
        } else if self.session.muted_by_autoplay {
            Some(Notice::PlayingMuted)
        } else if !self.session.user_interacted {
            Some(Notice::ClickToStart)
        } else {
            None
        }
    }

    pub fn progress(&self) -> Progress {
        let elapsed = self.session.elapsed.max(0.0);
        let duration = self.session.duration.max(0.0);
        let percent = if duration > 0.0 {
            (elapsed / duration * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };
        Progress {
            elapsed,
            duration,
            percent,
        }
    }

    /// Tears everything down: timers, the live instance and the ready hook
    pub fn teardown(&mut self) {
        if self.phase == PlayerPhase::Uninitialized && self.live.is_none() {
            return;
        }
        self.timers.cancel_all();
        self.teardown_live();
        self.reload_queued = false;
        self.subscription = None;
        self.phase = PlayerPhase::Uninitialized;
        self.sdk = SdkStatus::NotRequested;
        debug!("Controller for {} torn down", self.artist.name);
    }

    /// Remaining time until `kind` fires, if armed
    pub fn time_until(&self, kind: TimerKind, now: Instant) -> Option<Duration> {
        self.timers
            .deadline(kind)
            .map(|at| at.saturating_duration_since(now))
    }
}

impl<H: EmbedHost> Drop for PlaybackController<H> {
    fn drop(&mut self) {
        self.teardown();
    }
}
