//! Default N64 mappings and binding labels

use std::fmt;

use super::types::{
    scancode, ControllerAxis, ControllerButton, GameInput, InputBinding, InputDevice, InputKind,
};

/// Default bindings for one game input on one device family
pub fn default_bindings(input: GameInput, device: InputDevice) -> Vec<InputBinding> {
    match device {
        InputDevice::Keyboard => vec![InputBinding::keyboard(default_key(input))],
        InputDevice::Controller => default_controller(input),
    }
}

fn default_key(input: GameInput) -> u32 {
    match input {
        GameInput::A => scancode::SPACE,
        GameInput::B => scancode::LSHIFT,
        GameInput::L => scancode::E,
        GameInput::R => scancode::R,
        GameInput::Z => scancode::Q,
        GameInput::Start => scancode::RETURN,
        GameInput::CLeft => scancode::LEFT,
        GameInput::CRight => scancode::RIGHT,
        GameInput::CUp => scancode::UP,
        GameInput::CDown => scancode::DOWN,
        GameInput::DpadLeft => scancode::J,
        GameInput::DpadRight => scancode::L,
        GameInput::DpadUp => scancode::I,
        GameInput::DpadDown => scancode::K,
        GameInput::AnalogLeft => scancode::A,
        GameInput::AnalogRight => scancode::D,
        GameInput::AnalogUp => scancode::W,
        GameInput::AnalogDown => scancode::S,
        GameInput::ToggleMenu => scancode::ESCAPE,
        GameInput::AcceptMenu => scancode::RETURN,
        GameInput::ApplyMenu => scancode::F,
    }
}

fn default_controller(input: GameInput) -> Vec<InputBinding> {
    use ControllerAxis as Axis;
    use ControllerButton as Button;

    match input {
        GameInput::A => vec![InputBinding::button(Button::SOUTH)],
        GameInput::B => vec![InputBinding::button(Button::WEST)],
        GameInput::L => vec![InputBinding::button(Button::LeftShoulder)],
        GameInput::R => vec![InputBinding::button(Button::RightShoulder)],
        GameInput::Z => vec![InputBinding::axis_positive(Axis::TriggerLeft)],
        GameInput::Start => vec![InputBinding::button(Button::Start)],
        GameInput::CLeft => vec![
            InputBinding::axis_negative(Axis::RightX),
            InputBinding::button(Button::NORTH),
        ],
        GameInput::CRight => vec![
            InputBinding::axis_positive(Axis::RightX),
            InputBinding::button(Button::EAST),
        ],
        GameInput::CUp => vec![
            InputBinding::axis_negative(Axis::RightY),
            InputBinding::button(Button::RightStick),
        ],
        GameInput::CDown => vec![InputBinding::axis_positive(Axis::RightY)],
        GameInput::DpadLeft => vec![InputBinding::button(Button::DpadLeft)],
        GameInput::DpadRight => vec![InputBinding::button(Button::DpadRight)],
        GameInput::DpadUp => vec![InputBinding::button(Button::DpadUp)],
        GameInput::DpadDown => vec![InputBinding::button(Button::DpadDown)],
        GameInput::AnalogLeft => vec![InputBinding::axis_negative(Axis::LeftX)],
        GameInput::AnalogRight => vec![InputBinding::axis_positive(Axis::LeftX)],
        GameInput::AnalogUp => vec![InputBinding::axis_negative(Axis::LeftY)],
        GameInput::AnalogDown => vec![InputBinding::axis_positive(Axis::LeftY)],
        GameInput::ToggleMenu => vec![InputBinding::button(Button::Back)],
        GameInput::AcceptMenu => vec![InputBinding::button(Button::SOUTH)],
        GameInput::ApplyMenu => vec![
            InputBinding::button(Button::WEST),
            InputBinding::button(Button::Start),
        ],
    }
}

fn button_label(button: ControllerButton) -> &'static str {
    match button {
        ControllerButton::A => "A",
        ControllerButton::B => "B",
        ControllerButton::X => "X",
        ControllerButton::Y => "Y",
        ControllerButton::Back => "View",
        ControllerButton::Guide => "Home",
        ControllerButton::Start => "Menu",
        ControllerButton::LeftStick => "L3",
        ControllerButton::RightStick => "R3",
        ControllerButton::LeftShoulder => "LB",
        ControllerButton::RightShoulder => "RB",
        ControllerButton::DpadUp => "D-Pad Up",
        ControllerButton::DpadDown => "D-Pad Down",
        ControllerButton::DpadLeft => "D-Pad Left",
        ControllerButton::DpadRight => "D-Pad Right",
        ControllerButton::Misc1 => "Misc",
        ControllerButton::Paddle1 => "Paddle 1",
        ControllerButton::Paddle2 => "Paddle 2",
        ControllerButton::Paddle3 => "Paddle 3",
        ControllerButton::Paddle4 => "Paddle 4",
        ControllerButton::Touchpad => "Touchpad",
    }
}

fn axis_label(axis: ControllerAxis, negative: bool) -> &'static str {
    match (axis, negative) {
        (ControllerAxis::LeftX, false) => "Left Stick Right",
        (ControllerAxis::LeftX, true) => "Left Stick Left",
        (ControllerAxis::LeftY, false) => "Left Stick Down",
        (ControllerAxis::LeftY, true) => "Left Stick Up",
        (ControllerAxis::RightX, false) => "Right Stick Right",
        (ControllerAxis::RightX, true) => "Right Stick Left",
        (ControllerAxis::RightY, false) => "Right Stick Down",
        (ControllerAxis::RightY, true) => "Right Stick Up",
        (ControllerAxis::TriggerLeft, false) => "LT",
        (ControllerAxis::TriggerLeft, true) => "LT-",
        (ControllerAxis::TriggerRight, false) => "RT",
        (ControllerAxis::TriggerRight, true) => "RT-",
    }
}

fn key_label(code: i32) -> Option<String> {
    let label = match code {
        4..=29 => ((b'A' + (code - 4) as u8) as char).to_string(),
        30..=38 => ((b'1' + (code - 30) as u8) as char).to_string(),
        39 => "0".to_string(),
        58..=69 => format!("F{}", code - 57),
        c if c == scancode::RETURN as i32 => "Enter".to_string(),
        c if c == scancode::ESCAPE as i32 => "Esc".to_string(),
        c if c == scancode::BACKSPACE as i32 => "Backspace".to_string(),
        c if c == scancode::TAB as i32 => "Tab".to_string(),
        c if c == scancode::SPACE as i32 => "Space".to_string(),
        c if c == scancode::RIGHT as i32 => "Right".to_string(),
        c if c == scancode::LEFT as i32 => "Left".to_string(),
        c if c == scancode::DOWN as i32 => "Down".to_string(),
        c if c == scancode::UP as i32 => "Up".to_string(),
        c if c == scancode::LSHIFT as i32 => "L Shift".to_string(),
        c if c == scancode::RSHIFT as i32 => "R Shift".to_string(),
        _ => return None,
    };
    Some(label)
}

impl fmt::Display for InputBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            InputKind::None => Ok(()),
            InputKind::Keyboard => match key_label(self.id) {
                Some(label) => f.write_str(&label),
                None => write!(f, "Key {}", self.id),
            },
            InputKind::ControllerDigital => match ControllerButton::from_index(self.id) {
                Some(button) => f.write_str(button_label(button)),
                None => write!(f, "Button {}", self.id),
            },
            InputKind::ControllerAnalog => match self.analog_axis() {
                Some((axis, negative)) => f.write_str(axis_label(axis, negative)),
                None => write!(
                    f,
                    "Axis {}{}",
                    self.id.unsigned_abs().saturating_sub(1),
                    if self.id > 0 { '+' } else { '-' }
                ),
            },
            InputKind::Mouse => write!(f, "Mouse {}", self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_input_has_defaults() {
        for input in GameInput::ALL {
            let keyboard = default_bindings(input, InputDevice::Keyboard);
            let controller = default_bindings(input, InputDevice::Controller);
            assert!(!keyboard.is_empty() && keyboard.len() <= 2, "{:?}", input);
            assert!(!controller.is_empty() && controller.len() <= 2, "{:?}", input);
        }
    }

    #[test]
    fn test_controller_defaults() {
        assert_eq!(
            default_bindings(GameInput::Z, InputDevice::Controller),
            vec![InputBinding::axis_positive(ControllerAxis::TriggerLeft)]
        );
        assert_eq!(
            default_bindings(GameInput::CLeft, InputDevice::Controller),
            vec![
                InputBinding::axis_negative(ControllerAxis::RightX),
                InputBinding::button(ControllerButton::Y),
            ]
        );
        assert_eq!(
            default_bindings(GameInput::ToggleMenu, InputDevice::Controller),
            vec![InputBinding::button(ControllerButton::Back)]
        );
    }

    #[test]
    fn test_keyboard_defaults() {
        assert_eq!(
            default_bindings(GameInput::Start, InputDevice::Keyboard),
            vec![InputBinding::keyboard(scancode::RETURN)]
        );
        assert_eq!(
            default_bindings(GameInput::AnalogUp, InputDevice::Keyboard),
            vec![InputBinding::keyboard(scancode::W)]
        );
    }

    #[test]
    fn test_labels() {
        assert_eq!(InputBinding::NONE.to_string(), "");
        assert_eq!(InputBinding::keyboard(scancode::Q).to_string(), "Q");
        assert_eq!(InputBinding::keyboard(scancode::F11).to_string(), "F11");
        assert_eq!(InputBinding::keyboard(scancode::SPACE).to_string(), "Space");
        assert_eq!(InputBinding::keyboard(300).to_string(), "Key 300");
        assert_eq!(InputBinding::button(ControllerButton::Start).to_string(), "Menu");
        assert_eq!(
            InputBinding::axis_negative(ControllerAxis::LeftY).to_string(),
            "Left Stick Up"
        );
        let bad_axis = InputBinding {
            kind: InputKind::ControllerAnalog,
            id: -9,
        };
        assert_eq!(bad_axis.to_string(), "Axis 8-");
    }
}
