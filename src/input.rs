//! Controller input layer
//!
//! Everything between the platform's controller/keyboard events and the
//! game's view of its four N64 controller ports:
//!
//! - `registry`: opened controllers and their motion state
//! - `resolver`: slot assignment from stored controller identities
//! - `wizard`: the interactive assignment flow and rebind capture state
//! - `motion`: gyro/accelerometer fusion and pending deltas
//! - `rumble`: Rumble Pak motor envelope
//! - `subsystem`: the shared [`InputSubsystem`] tying these together
//! - `n64`: per-port button mask and stick read-out

pub mod backend;
pub mod bindings;
pub mod events;
pub mod host;
pub mod identity;
pub mod motion;
pub mod n64;
pub mod normalize;
pub mod registry;
pub mod resolver;
pub mod rumble;
pub mod subsystem;
#[cfg(test)]
pub(crate) mod testing;
pub mod types;
pub mod wizard;

use thiserror::Error;

pub use backend::{BackendError, ControllerBackend, GilrsBackend};
pub use events::{DispatchFlow, KeyMod, PlatformEvent, SensorKind};
pub use host::{CursorState, GameSession, SessionFlags, UiHost};
pub use identity::ControllerIdentity;
pub use n64::{ConnectedDevice, ConnectedDeviceInfo, N64ControllerState, Pak};
pub use subsystem::{ControllerOption, InputSubsystem};
pub use types::{
    ControllerAxis, ControllerButton, GameInput, InputBinding, InputDevice, InputKind, InstanceId, MAX_PLAYERS,
};
pub use wizard::{AssignmentHandle, AssignmentOutcome, AssignmentPrompt};

/// Errors returned by fallible input subsystem calls
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("invalid player slot {0}")]
    InvalidSlot(usize),

    #[error("input capture busy: {0} in progress")]
    CaptureBusy(&'static str),
}
