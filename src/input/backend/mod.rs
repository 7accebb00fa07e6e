//! Platform controller backends
//!
//! The input layer talks to physical controllers only through the
//! [`ControllerBackend`] trait. [`GilrsBackend`] drives real hardware through
//! gilrs; unit tests use the scripted `MockBackend` from `input::testing`.

pub mod gilrs_backend;

use thiserror::Error;

use super::events::{KeyboardSnapshot, PlatformEvent};
use super::identity::ControllerIdentity;
use super::types::{ControllerAxis, ControllerButton, InstanceId};

pub use gilrs_backend::GilrsBackend;

/// Errors raised by a controller backend
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("controller backend initialization failed: {0}")]
    Init(String),

    #[error("controller {0} is not open")]
    NotOpen(InstanceId),

    #[error("controller {0} does not support rumble")]
    RumbleUnsupported(InstanceId),

    #[error("rumble command failed: {0}")]
    Rumble(String),
}

/// Access to the platform's game controller layer
///
/// Device indices enumerate currently attached devices (`0..device_count()`)
/// and may shift on hot-plug. Instance ids are stable for one connection.
pub trait ControllerBackend {
    /// Bring internal device state up to date before enumeration
    fn pump(&mut self) {}

    /// Number of attached joystick devices
    fn device_count(&self) -> usize;

    /// Whether the device at `device_index` has a game controller mapping
    fn is_game_controller(&self, device_index: usize) -> bool;

    /// Instance id of the device at `device_index`, without opening it
    fn instance_id(&self, device_index: usize) -> Option<InstanceId>;

    /// Open a controller handle for the device at `device_index`
    ///
    /// Handles are keyed by instance id: opening a device that is already
    /// open returns the existing handle rather than a second one.
    fn open(&mut self, device_index: usize) -> Option<InstanceId>;

    /// Release the handle for `instance_id`
    fn close(&mut self, instance_id: InstanceId);

    /// Identity of an open controller, `None` when no joystick handle is available
    fn identity(&self, instance_id: InstanceId) -> Option<ControllerIdentity>;

    /// Human readable device name
    fn name(&self, instance_id: InstanceId) -> Option<String>;

    fn button(&self, instance_id: InstanceId, button: ControllerButton) -> bool;

    /// Raw axis value in `-32768..=32767` (triggers report `0..=32767`)
    fn axis(&self, instance_id: InstanceId, axis: ControllerAxis) -> i16;

    /// Whether the controller has both a gyroscope and an accelerometer
    fn has_motion_sensors(&self, instance_id: InstanceId) -> bool;

    fn enable_motion_sensors(&mut self, instance_id: InstanceId);

    /// Drive the rumble motors for `duration_ms`
    fn rumble(
        &mut self,
        instance_id: InstanceId,
        low_frequency: u16,
        high_frequency: u16,
        duration_ms: u32,
    ) -> Result<(), BackendError>;

    /// Next pending platform event, if any
    fn poll_event(&mut self) -> Option<PlatformEvent>;

    /// Current keyboard state (empty for backends without keyboard access)
    fn keyboard_state(&self) -> KeyboardSnapshot {
        KeyboardSnapshot::default()
    }
}
