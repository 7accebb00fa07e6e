//! Binding reads and per-poll values
//!
//! All reads use the state captured by the last [`poll_inputs`] call for the
//! keyboard and deltas, and live backend state for controllers.
//!
//! [`poll_inputs`]: super::InputSubsystem::poll_inputs

use std::sync::atomic::Ordering;

use super::InputSubsystem;
use crate::input::backend::ControllerBackend;
use crate::input::events::KeyMod;
use crate::input::normalize::{self, half_axis};
use crate::input::types::{
    scancode, ControllerAxis, ControllerButton, GameInput, InputBinding, InputDevice, InputKind,
    AXIS_THRESHOLD, MAX_PLAYERS,
};

/// Alt+Enter toggles fullscreen, so Enter must not also read as held
pub(super) fn should_override_keystate(code: u32, modifiers: KeyMod) -> bool {
    code == scancode::RETURN && modifiers.alt
}

impl<B: ControllerBackend> InputSubsystem<B> {
    fn keyboard_held(&self, code: i32) -> bool {
        let Ok(index) = usize::try_from(code) else {
            return false;
        };
        let keyboard = self.keyboard.read();
        if should_override_keystate(index as u32, keyboard.modifiers) {
            return false;
        }
        keyboard.is_held(index)
    }

    fn controller_button_state(&self, slot: usize, id: i32) -> bool {
        let Some(button) = ControllerButton::from_index(id) else {
            return false;
        };

        let single_controller = self.single_controller_mode();
        let registry = self.registry.lock();
        registry
            .targets_for(slot, single_controller)
            .into_iter()
            .any(|instance_id| registry.backend().button(instance_id, button))
    }

    fn controller_axis_state(&self, slot: usize, id: i32, allow_suppression: bool) -> f32 {
        let binding = InputBinding {
            kind: InputKind::ControllerAnalog,
            id,
        };
        let Some((axis, negative)) = binding.analog_axis() else {
            return 0.0;
        };

        let suppressed = allow_suppression
            && axis.is_right_stick()
            && self.right_analog_suppressed.load(Ordering::SeqCst);

        let single_controller = self.single_controller_mode();
        let registry = self.registry.lock();
        let total: f32 = registry
            .targets_for(slot, single_controller)
            .into_iter()
            .map(|instance_id| {
                if suppressed {
                    0.0
                } else {
                    half_axis(registry.backend().axis(instance_id, axis), negative)
                }
            })
            .sum();

        total.clamp(0.0, 1.0)
    }

    /// Read one binding as a value in [0.0, 1.0]
    pub fn get_input_analog(&self, slot: usize, binding: &InputBinding) -> f32 {
        if slot >= MAX_PLAYERS {
            return 0.0;
        }

        match binding.kind {
            InputKind::Keyboard => {
                if self.keyboard_held(binding.id) {
                    1.0
                } else {
                    0.0
                }
            },
            InputKind::ControllerDigital => {
                if self.controller_button_state(slot, binding.id) {
                    1.0
                } else {
                    0.0
                }
            },
            InputKind::ControllerAnalog => self.controller_axis_state(slot, binding.id, true),
            InputKind::Mouse | InputKind::None => 0.0,
        }
    }

    /// Sum of several bindings, clamped to [0.0, 1.0]
    pub fn get_input_analog_sum(&self, slot: usize, bindings: &[InputBinding]) -> f32 {
        bindings
            .iter()
            .map(|binding| self.get_input_analog(slot, binding))
            .sum::<f32>()
            .clamp(0.0, 1.0)
    }

    /// Read one binding as pressed/released
    ///
    /// Analog bindings count as pressed from half deflection.
    pub fn get_input_digital(&self, slot: usize, binding: &InputBinding) -> bool {
        if slot >= MAX_PLAYERS {
            return false;
        }

        match binding.kind {
            InputKind::Keyboard => self.keyboard_held(binding.id),
            InputKind::ControllerDigital => self.controller_button_state(slot, binding.id),
            InputKind::ControllerAnalog => {
                self.controller_axis_state(slot, binding.id, true) >= AXIS_THRESHOLD
            },
            InputKind::Mouse | InputKind::None => false,
        }
    }

    /// True if any of the bindings reads as pressed
    pub fn get_input_digital_any(&self, slot: usize, bindings: &[InputBinding]) -> bool {
        bindings
            .iter()
            .any(|binding| self.get_input_digital(slot, binding))
    }

    /// Configured bindings that feed `slot`; the keyboard only drives player 1
    fn game_input_bindings(&self, slot: usize, input: GameInput) -> Vec<InputBinding> {
        let mut bindings = self.config.bindings(input, InputDevice::Controller);
        if slot == 0 {
            bindings.extend(self.config.bindings(input, InputDevice::Keyboard));
        }
        bindings
    }

    /// Digital state of a game input through its configured bindings
    pub fn game_input_digital(&self, slot: usize, input: GameInput) -> bool {
        self.get_input_digital_any(slot, &self.game_input_bindings(slot, input))
    }

    /// Analog state of a game input through its configured bindings
    pub fn game_input_analog(&self, slot: usize, input: GameInput) -> f32 {
        self.get_input_analog_sum(slot, &self.game_input_bindings(slot, input))
    }

    /// Gyro rotation latched by the last poll, scaled by the gyro sensitivity
    pub fn get_gyro_deltas(&self) -> (f32, f32) {
        let [x, y] = self.deltas.lock().rotation();
        let sensitivity = self.config.gyro_sensitivity() as f32 / 100.0;
        (x * sensitivity, y * sensitivity)
    }

    /// Pointer motion latched by the last poll, scaled by the mouse sensitivity
    pub fn get_mouse_deltas(&self) -> (f32, f32) {
        let [x, y] = self.deltas.lock().mouse();
        let sensitivity = self.config.mouse_sensitivity() as f32 / 100.0;
        (x * sensitivity, y * sensitivity)
    }

    /// Apply the configured joystick deadzone
    pub fn apply_joystick_deadzone(&self, x: f32, y: f32) -> (f32, f32) {
        let deadzone = self.config.joystick_deadzone() as f32 / 100.0;
        normalize::apply_joystick_deadzone(x, y, deadzone)
    }

    /// Right stick position for camera control
    ///
    /// Ignores right-analog suppression.
    pub fn get_right_analog(&self, slot: usize) -> (f32, f32) {
        if slot >= MAX_PLAYERS {
            return (0.0, 0.0);
        }

        let axis_value = |axis: ControllerAxis| {
            let positive = InputBinding::axis_positive(axis).id;
            let negative = InputBinding::axis_negative(axis).id;
            self.controller_axis_state(slot, positive, false)
                - self.controller_axis_state(slot, negative, false)
        };

        let x = axis_value(ControllerAxis::RightX);
        let y = axis_value(ControllerAxis::RightY);
        self.apply_joystick_deadzone(x, y)
    }

    /// Force right-stick axis bindings to read zero
    pub fn set_right_analog_suppressed(&self, suppressed: bool) {
        self.right_analog_suppressed
            .store(suppressed, Ordering::SeqCst);
    }

    /// Accumulated wheel position
    pub fn mouse_wheel_pos(&self) -> i32 {
        self.mouse_wheel_pos.load(Ordering::SeqCst)
    }

    /// Game input is disabled while a menu captures input
    pub fn game_input_disabled(&self) -> bool {
        self.ui.is_context_capturing_input()
    }

    /// All forwarded input is disabled while a rebind scan runs
    pub fn all_input_disabled(&self) -> bool {
        self.capture.lock().scan_request().is_some()
    }

    pub fn set_cursor_visible(&self, visible: bool) {
        self.cursor_enabled.store(visible, Ordering::SeqCst);
    }
}
