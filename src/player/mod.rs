/// Playback session state machine
pub mod controller;
/// Tokio event loop around the controller
pub mod driver;
/// Embedded player boundary
pub mod embed;
/// Scoped ownership of the runtime's global ready hook
pub mod sdk_hook;
/// Scripted embed used by tests and the `simulate` command
pub mod simulated;
/// Controller-owned deadlines
pub mod timers;

pub use controller::{Notice, PlaybackController, PlayerPhase, SdkStatus, SessionState};
pub use driver::{SessionDriver, UserCommand};
pub use embed::{EmbedHost, EmbedSignal, EmbedState, EmbeddedPlayer, InstanceId};
pub use sdk_hook::SdkHook;
