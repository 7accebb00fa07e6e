//! Input vocabulary shared across the input layer
//!
//! Buttons and axes follow the SDL game controller numbering so that bindings
//! stored in configuration files stay compatible with existing setups:
//! a `ControllerDigital` binding id is a [`ControllerButton`] index, and a
//! `ControllerAnalog` binding id is `±(axis index + 1)` where the sign selects
//! the half-axis.

use serde::{Deserialize, Serialize};

/// Number of N64 controller ports / logical player slots
pub const MAX_PLAYERS: usize = 4;

/// Analog magnitude at which an axis binding reads as "pressed"
pub const AXIS_THRESHOLD: f32 = 0.5;

/// Full-scale value of a raw controller axis reading
pub const AXIS_FULL_SCALE: f32 = 32768.0;

/// Joystick instance id assigned by the backend for the lifetime of one connection
pub type InstanceId = u32;

/// Keyboard scancodes (USB HID usage ids, same numbering as SDL)
pub mod scancode {
    pub const A: u32 = 4;
    pub const D: u32 = 7;
    pub const E: u32 = 8;
    pub const F: u32 = 9;
    pub const I: u32 = 12;
    pub const J: u32 = 13;
    pub const K: u32 = 14;
    pub const L: u32 = 15;
    pub const Q: u32 = 20;
    pub const R: u32 = 21;
    pub const S: u32 = 22;
    pub const W: u32 = 26;
    pub const RETURN: u32 = 40;
    pub const ESCAPE: u32 = 41;
    pub const BACKSPACE: u32 = 42;
    pub const TAB: u32 = 43;
    pub const SPACE: u32 = 44;
    pub const F1: u32 = 58;
    pub const F11: u32 = 68;
    pub const F12: u32 = 69;
    pub const RIGHT: u32 = 79;
    pub const LEFT: u32 = 80;
    pub const DOWN: u32 = 81;
    pub const UP: u32 = 82;
    pub const LSHIFT: u32 = 225;
    pub const RSHIFT: u32 = 229;

    /// Size of the keyboard state array
    pub const COUNT: usize = 512;
}

/// Kind of physical input a binding refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    #[default]
    None,
    Keyboard,
    Mouse,
    ControllerDigital,
    ControllerAnalog,
}

/// Device family a binding set belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputDevice {
    Keyboard,
    Controller,
}

/// One physical input bound to a logical game action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
pub struct InputBinding {
    pub kind: InputKind,
    pub id: i32,
}

impl InputBinding {
    /// Unbound placeholder
    pub const NONE: InputBinding = InputBinding {
        kind: InputKind::None,
        id: 0,
    };

    pub fn keyboard(scancode: u32) -> Self {
        Self {
            kind: InputKind::Keyboard,
            id: scancode as i32,
        }
    }

    pub fn button(button: ControllerButton) -> Self {
        Self {
            kind: InputKind::ControllerDigital,
            id: button as i32,
        }
    }

    /// Positive half of an axis (`id = axis + 1`)
    pub fn axis_positive(axis: ControllerAxis) -> Self {
        Self {
            kind: InputKind::ControllerAnalog,
            id: axis as i32 + 1,
        }
    }

    /// Negative half of an axis (`id = -(axis + 1)`)
    pub fn axis_negative(axis: ControllerAxis) -> Self {
        Self {
            kind: InputKind::ControllerAnalog,
            id: -(axis as i32 + 1),
        }
    }

    pub fn is_bound(&self) -> bool {
        self.kind != InputKind::None
    }

    /// Decode an analog binding into its physical axis and direction
    ///
    /// Returns `(axis, negative_half)`, or `None` for non-analog bindings and
    /// out-of-range axis ids.
    pub fn analog_axis(&self) -> Option<(ControllerAxis, bool)> {
        if self.kind != InputKind::ControllerAnalog || self.id == 0 {
            return None;
        }
        let index = self.id.unsigned_abs() as usize - 1;
        ControllerAxis::from_index(index).map(|axis| (axis, self.id < 0))
    }
}

/// Game controller buttons (SDL numbering)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerButton {
    A = 0,
    B,
    X,
    Y,
    Back,
    Guide,
    Start,
    LeftStick,
    RightStick,
    LeftShoulder,
    RightShoulder,
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
    Misc1,
    Paddle1,
    Paddle2,
    Paddle3,
    Paddle4,
    Touchpad,
}

impl ControllerButton {
    pub const COUNT: usize = 21;

    /// All buttons in index order
    pub const ALL: [ControllerButton; Self::COUNT] = [
        Self::A,
        Self::B,
        Self::X,
        Self::Y,
        Self::Back,
        Self::Guide,
        Self::Start,
        Self::LeftStick,
        Self::RightStick,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::DpadUp,
        Self::DpadDown,
        Self::DpadLeft,
        Self::DpadRight,
        Self::Misc1,
        Self::Paddle1,
        Self::Paddle2,
        Self::Paddle3,
        Self::Paddle4,
        Self::Touchpad,
    ];

    /// Positional aliases: the face buttons are named by position on the pad
    pub const SOUTH: ControllerButton = ControllerButton::A;
    pub const EAST: ControllerButton = ControllerButton::B;
    pub const WEST: ControllerButton = ControllerButton::X;
    pub const NORTH: ControllerButton = ControllerButton::Y;

    pub fn from_index(index: i32) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn is_dpad(self) -> bool {
        matches!(
            self,
            Self::DpadUp | Self::DpadDown | Self::DpadLeft | Self::DpadRight
        )
    }
}

/// Game controller axes (SDL numbering)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerAxis {
    LeftX = 0,
    LeftY,
    RightX,
    RightY,
    TriggerLeft,
    TriggerRight,
}

impl ControllerAxis {
    pub const COUNT: usize = 6;

    pub const ALL: [ControllerAxis; Self::COUNT] = [
        Self::LeftX,
        Self::LeftY,
        Self::RightX,
        Self::RightY,
        Self::TriggerLeft,
        Self::TriggerRight,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn is_right_stick(self) -> bool {
        matches!(self, Self::RightX | Self::RightY)
    }
}

/// Logical game actions that can be bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameInput {
    A,
    B,
    L,
    R,
    Z,
    Start,
    CLeft,
    CRight,
    CUp,
    CDown,
    DpadLeft,
    DpadRight,
    DpadUp,
    DpadDown,
    AnalogLeft,
    AnalogRight,
    AnalogUp,
    AnalogDown,
    ToggleMenu,
    AcceptMenu,
    ApplyMenu,
}

impl GameInput {
    pub const ALL: [GameInput; 21] = [
        Self::A,
        Self::B,
        Self::L,
        Self::R,
        Self::Z,
        Self::Start,
        Self::CLeft,
        Self::CRight,
        Self::CUp,
        Self::CDown,
        Self::DpadLeft,
        Self::DpadRight,
        Self::DpadUp,
        Self::DpadDown,
        Self::AnalogLeft,
        Self::AnalogRight,
        Self::AnalogUp,
        Self::AnalogDown,
        Self::ToggleMenu,
        Self::AcceptMenu,
        Self::ApplyMenu,
    ];

    /// Menu navigation actions; the D-pad is never captured for these
    pub fn is_menu_action(self) -> bool {
        matches!(self, Self::ToggleMenu | Self::AcceptMenu | Self::ApplyMenu)
    }
}
