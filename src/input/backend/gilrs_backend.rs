//! gilrs-backed controller access
//!
//! gilrs reports buttons by physical position, which lines up directly with
//! the positional SDL naming used by [`ControllerButton`] (A = south face
//! button, B = east, X = west, Y = north).
//!
//! gilrs exposes the SDL-format GUID as the gamepad UUID, so identities are
//! compatible with ones stored by SDL-based front-ends. Motion sensors are not
//! available through gilrs; sensor events only come from other backends.

use gilrs::ff::{BaseEffect, BaseEffectType, Effect, EffectBuilder, Repeat, Replay, Ticks};
use gilrs::{Axis, Button, Event, EventType, GamepadId, Gilrs, MappingSource};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, trace, warn};

use super::{BackendError, ControllerBackend};
use crate::input::events::PlatformEvent;
use crate::input::identity::ControllerIdentity;
use crate::input::types::{ControllerAxis, ControllerButton, InstanceId};

/// Controller backend built on gilrs
///
/// Not `Send`: create and use it on the thread that drains events.
pub struct GilrsBackend {
    gilrs: Gilrs,
    opened: HashSet<InstanceId>,
    /// One looping rumble effect per controller; strength is applied through the gain
    effects: HashMap<InstanceId, Effect>,
    queued: VecDeque<PlatformEvent>,
}

impl GilrsBackend {
    pub fn new() -> Result<Self, BackendError> {
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                debug!("gilrs initialized");
                g
            },
            Err(e) => {
                warn!("Failed to initialize gilrs: {:?}", e);
                return Err(BackendError::Init(e.to_string()));
            },
        };

        Ok(Self {
            gilrs,
            opened: HashSet::new(),
            effects: HashMap::new(),
            queued: VecDeque::new(),
        })
    }

    /// Connected gamepads in stable (id) order; the position is the device index
    fn connected_ids(&self) -> Vec<GamepadId> {
        let mut ids: Vec<GamepadId> = self
            .gilrs
            .gamepads()
            .filter(|(_, gp)| gp.is_connected())
            .map(|(id, _)| id)
            .collect();
        ids.sort_by_key(|id| usize::from(*id));
        ids
    }

    fn gamepad_id(&self, instance_id: InstanceId) -> Option<GamepadId> {
        self.connected_ids()
            .into_iter()
            .find(|id| to_instance_id(*id) == instance_id)
    }

    fn rumble_effect(&mut self, instance_id: InstanceId, duration_ms: u32) -> Result<&Effect, BackendError> {
        if !self.effects.contains_key(&instance_id) {
            let gamepad_id = self
                .gamepad_id(instance_id)
                .ok_or(BackendError::NotOpen(instance_id))?;

            let supported = self
                .gilrs
                .connected_gamepad(gamepad_id)
                .map(|gp| gp.is_ff_supported())
                .unwrap_or(false);
            if !supported {
                return Err(BackendError::RumbleUnsupported(instance_id));
            }

            let scheduling = Replay {
                play_for: Ticks::from_ms(duration_ms),
                ..Default::default()
            };
            let effect = EffectBuilder::new()
                .add_effect(BaseEffect {
                    kind: BaseEffectType::Strong {
                        magnitude: u16::MAX,
                    },
                    scheduling,
                    ..Default::default()
                })
                .add_effect(BaseEffect {
                    kind: BaseEffectType::Weak {
                        magnitude: u16::MAX,
                    },
                    scheduling,
                    ..Default::default()
                })
                .repeat(Repeat::Infinitely)
                .gamepads(&[gamepad_id])
                .finish(&mut self.gilrs)
                .map_err(|e| BackendError::Rumble(e.to_string()))?;

            effect
                .set_gain(0.0)
                .map_err(|e| BackendError::Rumble(e.to_string()))?;
            effect
                .play()
                .map_err(|e| BackendError::Rumble(e.to_string()))?;

            debug!("Created rumble effect for controller {}", instance_id);
            self.effects.insert(instance_id, effect);
        }

        self.effects
            .get(&instance_id)
            .ok_or(BackendError::NotOpen(instance_id))
    }

    fn convert_event(&self, id: GamepadId, event: EventType) -> Option<PlatformEvent> {
        let instance_id = to_instance_id(id);

        match event {
            EventType::Connected => {
                let device_index = self.connected_ids().iter().position(|gid| *gid == id)?;
                Some(PlatformEvent::ControllerAdded { device_index })
            },
            EventType::Disconnected => Some(PlatformEvent::ControllerRemoved { instance_id }),
            EventType::ButtonPressed(button, _) => {
                map_button(button).map(|button| PlatformEvent::ControllerButtonDown {
                    instance_id,
                    button,
                })
            },
            EventType::ButtonReleased(button, _) => {
                map_button(button).map(|button| PlatformEvent::ControllerButtonUp {
                    instance_id,
                    button,
                })
            },
            EventType::ButtonChanged(button, value, _) => {
                map_trigger(button).map(|axis| PlatformEvent::ControllerAxisMotion {
                    instance_id,
                    axis,
                    value: to_raw_axis(value),
                })
            },
            EventType::AxisChanged(axis, value, _) => {
                let (axis, invert) = map_axis(axis)?;
                let value = if invert { -value } else { value };
                Some(PlatformEvent::ControllerAxisMotion {
                    instance_id,
                    axis,
                    value: to_raw_axis(value),
                })
            },
            _ => None,
        }
    }
}

impl ControllerBackend for GilrsBackend {
    fn pump(&mut self) {
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            if let Some(converted) = self.convert_event(id, event) {
                self.queued.push_back(converted);
            }
        }
    }

    fn device_count(&self) -> usize {
        self.connected_ids().len()
    }

    fn is_game_controller(&self, device_index: usize) -> bool {
        self.connected_ids()
            .get(device_index)
            .and_then(|id| self.gilrs.connected_gamepad(*id))
            .map(|gp| gp.mapping_source() != MappingSource::None)
            .unwrap_or(false)
    }

    fn instance_id(&self, device_index: usize) -> Option<InstanceId> {
        self.connected_ids().get(device_index).map(|id| to_instance_id(*id))
    }

    fn open(&mut self, device_index: usize) -> Option<InstanceId> {
        let instance_id = self.instance_id(device_index)?;
        self.opened.insert(instance_id);
        Some(instance_id)
    }

    fn close(&mut self, instance_id: InstanceId) {
        self.opened.remove(&instance_id);
        if let Some(effect) = self.effects.remove(&instance_id) {
            let _ = effect.stop();
        }
    }

    fn identity(&self, instance_id: InstanceId) -> Option<ControllerIdentity> {
        if !self.opened.contains(&instance_id) {
            return None;
        }
        let gamepad = self.gilrs.connected_gamepad(self.gamepad_id(instance_id)?)?;
        Some(ControllerIdentity::from_sdl_guid(
            &gamepad.uuid(),
            None,
            native_player_index(instance_id),
        ))
    }

    fn name(&self, instance_id: InstanceId) -> Option<String> {
        let gamepad = self.gilrs.connected_gamepad(self.gamepad_id(instance_id)?)?;
        Some(gamepad.name().to_string())
    }

    fn button(&self, instance_id: InstanceId, button: ControllerButton) -> bool {
        let Some(gilrs_button) = to_gilrs_button(button) else {
            return false;
        };
        self.gamepad_id(instance_id)
            .and_then(|id| self.gilrs.connected_gamepad(id))
            .map(|gp| gp.is_pressed(gilrs_button))
            .unwrap_or(false)
    }

    fn axis(&self, instance_id: InstanceId, axis: ControllerAxis) -> i16 {
        let Some(gamepad) = self
            .gamepad_id(instance_id)
            .and_then(|id| self.gilrs.connected_gamepad(id))
        else {
            return 0;
        };

        let value = match axis {
            ControllerAxis::LeftX => gamepad.value(Axis::LeftStickX),
            ControllerAxis::LeftY => -gamepad.value(Axis::LeftStickY),
            ControllerAxis::RightX => gamepad.value(Axis::RightStickX),
            ControllerAxis::RightY => -gamepad.value(Axis::RightStickY),
            ControllerAxis::TriggerLeft => gamepad
                .button_data(Button::LeftTrigger2)
                .map(|d| d.value())
                .unwrap_or(0.0),
            ControllerAxis::TriggerRight => gamepad
                .button_data(Button::RightTrigger2)
                .map(|d| d.value())
                .unwrap_or(0.0),
        };

        to_raw_axis(value)
    }

    fn has_motion_sensors(&self, _instance_id: InstanceId) -> bool {
        false
    }

    fn enable_motion_sensors(&mut self, instance_id: InstanceId) {
        trace!("Motion sensors unavailable through gilrs (controller {})", instance_id);
    }

    fn rumble(
        &mut self,
        instance_id: InstanceId,
        low_frequency: u16,
        high_frequency: u16,
        duration_ms: u32,
    ) -> Result<(), BackendError> {
        let gain = low_frequency.max(high_frequency) as f32 / u16::MAX as f32;
        let effect = self.rumble_effect(instance_id, duration_ms)?;
        effect
            .set_gain(gain)
            .map_err(|e| BackendError::Rumble(e.to_string()))
    }

    fn poll_event(&mut self) -> Option<PlatformEvent> {
        if self.queued.is_empty() {
            self.pump();
        }
        self.queued.pop_front()
    }
}

fn to_instance_id(id: GamepadId) -> InstanceId {
    usize::from(id) as InstanceId
}

/// gilrs hands out gamepad ids per connection slot, so the id doubles as the
/// native player index that tells identical controllers apart
fn native_player_index(instance_id: InstanceId) -> i32 {
    i32::try_from(instance_id).unwrap_or(-1)
}

/// Convert a normalized gilrs value to the raw SDL axis range
fn to_raw_axis(value: f32) -> i16 {
    (value.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

fn map_button(button: Button) -> Option<ControllerButton> {
    match button {
        Button::South => Some(ControllerButton::A),
        Button::East => Some(ControllerButton::B),
        Button::West => Some(ControllerButton::X),
        Button::North => Some(ControllerButton::Y),
        Button::Select => Some(ControllerButton::Back),
        Button::Mode => Some(ControllerButton::Guide),
        Button::Start => Some(ControllerButton::Start),
        Button::LeftThumb => Some(ControllerButton::LeftStick),
        Button::RightThumb => Some(ControllerButton::RightStick),
        Button::LeftTrigger => Some(ControllerButton::LeftShoulder),
        Button::RightTrigger => Some(ControllerButton::RightShoulder),
        Button::DPadUp => Some(ControllerButton::DpadUp),
        Button::DPadDown => Some(ControllerButton::DpadDown),
        Button::DPadLeft => Some(ControllerButton::DpadLeft),
        Button::DPadRight => Some(ControllerButton::DpadRight),
        Button::C => Some(ControllerButton::Misc1),
        // Analog triggers are reported as axes
        Button::LeftTrigger2 | Button::RightTrigger2 => None,
        _ => {
            trace!("Unmapped gilrs button: {:?}", button);
            None
        },
    }
}

fn to_gilrs_button(button: ControllerButton) -> Option<Button> {
    match button {
        ControllerButton::A => Some(Button::South),
        ControllerButton::B => Some(Button::East),
        ControllerButton::X => Some(Button::West),
        ControllerButton::Y => Some(Button::North),
        ControllerButton::Back => Some(Button::Select),
        ControllerButton::Guide => Some(Button::Mode),
        ControllerButton::Start => Some(Button::Start),
        ControllerButton::LeftStick => Some(Button::LeftThumb),
        ControllerButton::RightStick => Some(Button::RightThumb),
        ControllerButton::LeftShoulder => Some(Button::LeftTrigger),
        ControllerButton::RightShoulder => Some(Button::RightTrigger),
        ControllerButton::DpadUp => Some(Button::DPadUp),
        ControllerButton::DpadDown => Some(Button::DPadDown),
        ControllerButton::DpadLeft => Some(Button::DPadLeft),
        ControllerButton::DpadRight => Some(Button::DPadRight),
        ControllerButton::Misc1 => Some(Button::C),
        ControllerButton::Paddle1
        | ControllerButton::Paddle2
        | ControllerButton::Paddle3
        | ControllerButton::Paddle4
        | ControllerButton::Touchpad => None,
    }
}

fn map_trigger(button: Button) -> Option<ControllerAxis> {
    match button {
        Button::LeftTrigger2 => Some(ControllerAxis::TriggerLeft),
        Button::RightTrigger2 => Some(ControllerAxis::TriggerRight),
        _ => None,
    }
}

/// Map a gilrs axis to an SDL axis; the bool requests Y inversion (gilrs Y points up)
fn map_axis(axis: Axis) -> Option<(ControllerAxis, bool)> {
    match axis {
        Axis::LeftStickX => Some((ControllerAxis::LeftX, false)),
        Axis::LeftStickY => Some((ControllerAxis::LeftY, true)),
        Axis::RightStickX => Some((ControllerAxis::RightX, false)),
        Axis::RightStickY => Some((ControllerAxis::RightY, true)),
        _ => {
            trace!("Unmapped gilrs axis: {:?}", axis);
            None
        },
    }
}
