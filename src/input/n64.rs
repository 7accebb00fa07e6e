//! N64 controller read-out
//!
//! Composes the configured bindings of one player slot into the button mask
//! and analog stick the game reads from its controller port.

use serde::Serialize;

use super::backend::ControllerBackend;
use super::subsystem::InputSubsystem;
use super::types::GameInput;

/// N64 button mask bits
pub mod buttons {
    pub const A: u16 = 0x8000;
    pub const B: u16 = 0x4000;
    pub const Z: u16 = 0x2000;
    pub const START: u16 = 0x1000;
    pub const DPAD_UP: u16 = 0x0800;
    pub const DPAD_DOWN: u16 = 0x0400;
    pub const DPAD_LEFT: u16 = 0x0200;
    pub const DPAD_RIGHT: u16 = 0x0100;
    pub const L: u16 = 0x0020;
    pub const R: u16 = 0x0010;
    pub const C_UP: u16 = 0x0008;
    pub const C_DOWN: u16 = 0x0004;
    pub const C_LEFT: u16 = 0x0002;
    pub const C_RIGHT: u16 = 0x0001;
}

/// Game inputs that map to a bit of the button mask
const BUTTON_MAP: [(GameInput, u16); 14] = [
    (GameInput::A, buttons::A),
    (GameInput::B, buttons::B),
    (GameInput::Z, buttons::Z),
    (GameInput::Start, buttons::START),
    (GameInput::DpadUp, buttons::DPAD_UP),
    (GameInput::DpadDown, buttons::DPAD_DOWN),
    (GameInput::DpadLeft, buttons::DPAD_LEFT),
    (GameInput::DpadRight, buttons::DPAD_RIGHT),
    (GameInput::L, buttons::L),
    (GameInput::R, buttons::R),
    (GameInput::CUp, buttons::C_UP),
    (GameInput::CDown, buttons::C_DOWN),
    (GameInput::CLeft, buttons::C_LEFT),
    (GameInput::CRight, buttons::C_RIGHT),
];

/// State of one N64 controller port for a frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct N64ControllerState {
    pub buttons: u16,
    /// Stick position in [-1.0, 1.0], right is positive
    pub stick_x: f32,
    /// Stick position in [-1.0, 1.0], up is positive
    pub stick_y: f32,
}

impl N64ControllerState {
    pub fn is_pressed(&self, mask: u16) -> bool {
        self.buttons & mask != 0
    }
}

/// Device plugged into a controller port
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum ConnectedDevice {
    #[default]
    None,
    Controller,
}

/// Accessory inserted into a controller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Pak {
    #[default]
    None,
    RumblePak,
}

/// What the game sees on one controller port
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConnectedDeviceInfo {
    pub device: ConnectedDevice,
    pub pak: Pak,
}

impl<B: ControllerBackend> InputSubsystem<B> {
    /// Read the N64 controller state for `slot`
    ///
    /// Reads neutral while a menu captures input, while a rebind scan runs,
    /// and for slots with no controller present.
    pub fn n64_controller_state(&self, slot: usize) -> N64ControllerState {
        if self.game_input_disabled() || self.all_input_disabled() || !self.controller_present(slot) {
            return N64ControllerState::default();
        }

        let buttons = BUTTON_MAP
            .iter()
            .filter(|(input, _)| self.game_input_digital(slot, *input))
            .fold(0u16, |mask, (_, bit)| mask | bit);

        let x = self.game_input_analog(slot, GameInput::AnalogRight)
            - self.game_input_analog(slot, GameInput::AnalogLeft);
        let y = self.game_input_analog(slot, GameInput::AnalogUp)
            - self.game_input_analog(slot, GameInput::AnalogDown);
        let (stick_x, stick_y) = self.apply_joystick_deadzone(x, y);

        N64ControllerState {
            buttons,
            stick_x,
            stick_y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_bits_are_distinct() {
        let combined = BUTTON_MAP.iter().fold(0u16, |mask, (_, bit)| {
            assert_eq!(mask & bit, 0, "bit {:#06x} used twice", bit);
            mask | bit
        });
        assert_eq!(combined.count_ones(), 14);
    }

    #[test]
    fn test_is_pressed() {
        let state = N64ControllerState {
            buttons: buttons::A | buttons::C_LEFT,
            ..Default::default()
        };
        assert!(state.is_pressed(buttons::A));
        assert!(state.is_pressed(buttons::C_LEFT));
        assert!(!state.is_pressed(buttons::B));
    }
}
