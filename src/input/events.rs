//! Platform events consumed by the dispatch filter

use std::path::PathBuf;

use super::types::{ControllerAxis, ControllerButton, InstanceId};

/// Keyboard modifier state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyMod {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl KeyMod {
    pub const NONE: KeyMod = KeyMod {
        shift: false,
        ctrl: false,
        alt: false,
    };

    pub const ALT: KeyMod = KeyMod {
        shift: false,
        ctrl: false,
        alt: true,
    };
}

/// Motion sensor reporting a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    /// Linear acceleration in m/s²
    Accelerometer,
    /// Angular velocity in rad/s
    Gyro,
}

/// Snapshot of the keyboard taken once per poll
#[derive(Debug, Clone, Default)]
pub struct KeyboardSnapshot {
    /// Held state indexed by scancode
    pub keys: Vec<bool>,
    pub modifiers: KeyMod,
}

impl KeyboardSnapshot {
    pub fn is_held(&self, scancode: usize) -> bool {
        self.keys.get(scancode).copied().unwrap_or(false)
    }
}

/// A raw input event from the platform layer
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformEvent {
    KeyDown {
        scancode: u32,
        modifiers: KeyMod,
        repeat: bool,
    },
    KeyUp {
        scancode: u32,
        modifiers: KeyMod,
    },
    /// A device became available at `device_index`
    ControllerAdded {
        device_index: usize,
    },
    ControllerRemoved {
        instance_id: InstanceId,
    },
    ControllerButtonDown {
        instance_id: InstanceId,
        button: ControllerButton,
    },
    ControllerButtonUp {
        instance_id: InstanceId,
        button: ControllerButton,
    },
    ControllerAxisMotion {
        instance_id: InstanceId,
        axis: ControllerAxis,
        value: i16,
    },
    ControllerSensor {
        instance_id: InstanceId,
        sensor: SensorKind,
        data: [f32; 3],
        timestamp_ms: u64,
    },
    MouseMotion {
        xrel: f32,
        yrel: f32,
    },
    MouseButton {
        button: u8,
        pressed: bool,
    },
    MouseWheel {
        x: i32,
        y: i32,
        flipped: bool,
    },
    DropBegin,
    DropFile(PathBuf),
    DropComplete,
    /// Synthetic notification queued when a stick crossed the capture threshold
    /// during rebind scanning, so the UI can wait for it to return to center
    StickReleased {
        axis: ControllerAxis,
    },
    WindowFocus {
        gained: bool,
    },
    Quit,
}

/// Whether the drain loop keeps going after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchFlow {
    Continue,
    Exit,
}
