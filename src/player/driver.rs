use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use tokio::sync::Notify;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::time::{Instant, sleep_until};

use crate::player::controller::PlaybackController;
use crate::player::embed::{EmbedHost, EmbedSignal, InstanceId};

/// User requests accepted by a running session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCommand {
    Interact,
    TogglePlayPause,
    Next,
    Previous,
    SelectTrack(usize),
    SetVolume(u8),
    ToggleMute,
    Unmute,
    /// Ends the session
    Stop,
}

/// Serializes embed signals, user commands, runtime readiness and timer
/// expiry into one controller, one input at a time.
pub struct SessionDriver<H: EmbedHost> {
    controller: PlaybackController<H>,
    signals: UnboundedReceiver<(InstanceId, EmbedSignal)>,
    commands: UnboundedReceiver<UserCommand>,
    sdk_ready: Arc<Notify>,
}

impl<H: EmbedHost> SessionDriver<H> {
    /// Returns the driver and a handle for sending it user commands
    pub fn new(
        controller: PlaybackController<H>,
        signals: UnboundedReceiver<(InstanceId, EmbedSignal)>,
    ) -> (Self, UnboundedSender<UserCommand>) {
        let (tx, commands) = unbounded_channel();
        let driver = SessionDriver {
            controller,
            signals,
            commands,
            sdk_ready: Arc::new(Notify::new()),
        };
        (driver, tx)
    }

    /// Mounts the controller and runs until [`UserCommand::Stop`], until every
    /// command sender is gone, or until `stop_at`. The controller is torn down
    /// and handed back.
    pub async fn run(mut self, stop_at: Option<Instant>) -> PlaybackController<H> {
        let notify = self.sdk_ready.clone();
        self.controller
            .mount(Instant::now().into_std(), move || notify.notify_one());

        loop {
            let wake = self
                .controller
                .next_deadline()
                .map_or_else(far_future, Instant::from_std);
            let stop = stop_at.unwrap_or_else(far_future);

            tokio::select! {
                biased;
                () = sleep_until(stop) => {
                    debug!("Session time limit reached");
                    break;
                }
                Some((id, signal)) = self.signals.recv() => {
                    self.controller.handle_signal(id, signal, Instant::now().into_std());
                }
                () = self.sdk_ready.notified() => {
                    self.controller.on_sdk_ready();
                }
                command = self.commands.recv() => match command {
                    Some(UserCommand::Stop) | None => break,
                    Some(command) => self.apply(command),
                },
                () = sleep_until(wake) => {
                    self.controller.tick(Instant::now().into_std());
                }
            }
        }

        info!("Stopping session for {}", self.controller.artist().name);
        self.controller.teardown();
        self.controller
    }

    fn apply(&mut self, command: UserCommand) {
        debug!("User command {command:?}");
        let controller = &mut self.controller;
        match command {
            UserCommand::Interact => controller.interact(),
            UserCommand::TogglePlayPause => {
                controller.toggle_play_pause();
            }
            UserCommand::Next => controller.next(),
            UserCommand::Previous => controller.previous(),
            UserCommand::SelectTrack(index) => {
                if let Err(e) = controller.select_track(index) {
                    info!("Ignoring track selection: {e}");
                }
            }
            UserCommand::SetVolume(volume) => controller.set_volume(volume),
            UserCommand::ToggleMute => {
                controller.toggle_mute();
            }
            UserCommand::Unmute => controller.unmute(),
            UserCommand::Stop => {}
        }
    }
}

fn far_future() -> Instant {
    Instant::now() + Duration::from_secs(86_400)
}
