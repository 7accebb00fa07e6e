//! Platform event filter
//!
//! Every platform event passes through [`InputSubsystem::dispatch_event`]
//! exactly once. Depending on the capture mode it feeds the wizard, the
//! rebind scan, the device registry, the motion integrator, or is forwarded
//! to the UI's event queue.

use std::sync::atomic::Ordering;
use tracing::{debug, trace};

use super::queries::should_override_keystate;
use super::InputSubsystem;
use crate::input::backend::ControllerBackend;
use crate::input::events::{DispatchFlow, PlatformEvent, SensorKind};
use crate::input::host::CursorState;
use crate::input::normalize::raw_to_float;
use crate::input::types::{
    scancode, ControllerAxis, ControllerButton, GameInput, InputBinding, InputDevice, InputKind, InstanceId,
    AXIS_THRESHOLD,
};

impl<B: ControllerBackend> InputSubsystem<B> {
    /// Drain every pending backend event
    ///
    /// Returns [`DispatchFlow::Exit`] once a quit arrives before the game
    /// started; later calls then return immediately.
    pub fn handle_events(&self) -> DispatchFlow {
        if self.exited.load(Ordering::SeqCst) {
            return DispatchFlow::Exit;
        }

        loop {
            let event = self.registry.lock().backend_mut().poll_event();
            let Some(event) = event else {
                break;
            };

            if self.dispatch_event(event) == DispatchFlow::Exit {
                self.exited.store(true, Ordering::SeqCst);
                break;
            }
        }

        self.update_cursor();

        if self.session.is_game_started() && !self.game_started_seen.swap(true, Ordering::SeqCst) {
            debug!("Game session started");
            self.ui.process_game_started();
        }

        if self.exited.load(Ordering::SeqCst) {
            DispatchFlow::Exit
        } else {
            DispatchFlow::Continue
        }
    }

    /// Current cursor state derived from settings, UI focus and session state
    pub fn cursor_state(&self) -> CursorState {
        let locked = self.config.mouse_sensitivity() != 0
            && !self.game_input_disabled()
            && self.session.is_game_started();
        let visible = self.cursor_enabled.load(Ordering::SeqCst) && !locked;
        CursorState { visible, locked }
    }

    fn update_cursor(&self) {
        self.ui.apply_cursor(self.cursor_state());
    }

    fn queue_if_enabled(&self, event: PlatformEvent) {
        if !self.all_input_disabled() {
            self.ui.queue_event(event);
        }
    }

    /// Handle one platform event
    pub fn dispatch_event(&self, event: PlatformEvent) -> DispatchFlow {
        match event {
            PlatformEvent::KeyDown {
                scancode: code,
                modifiers,
                repeat,
            } => {
                if code == scancode::ESCAPE && self.is_controller_assignment_active() {
                    self.cancel_controller_assignment();
                    return DispatchFlow::Continue;
                }

                // Key repeat only matters in menus
                if repeat && !self.ui.is_context_capturing_input() {
                    return DispatchFlow::Continue;
                }

                if (code == scancode::RETURN && modifiers.alt) || code == scancode::F11 {
                    self.ui.toggle_fullscreen();
                }

                let scan = self.capture.lock().scan_request();
                match scan {
                    Some(_) if code == scancode::ESCAPE => {},
                    Some(request) => {
                        if request.device == InputDevice::Keyboard {
                            self.finish_scan(InputBinding::keyboard(code));
                        }
                        return DispatchFlow::Continue;
                    },
                    None => {
                        if !should_override_keystate(code, modifiers) {
                            self.queue_if_enabled(event);
                        }
                        return DispatchFlow::Continue;
                    },
                }

                self.cancel_scanning_input();
            },
            PlatformEvent::ControllerAdded { device_index } => {
                trace!("Controller added at device index {}", device_index);
                self.scan_controllers();
            },
            PlatformEvent::ControllerRemoved { instance_id } => {
                self.remove_controller(instance_id);
            },
            PlatformEvent::Quit => {
                self.session.quit();
                if !self.session.is_game_started() {
                    return DispatchFlow::Exit;
                }
                self.ui.activate_mouse();
            },
            PlatformEvent::MouseWheel { y, flipped, .. } => {
                let delta = if flipped { -y } else { y };
                self.mouse_wheel_pos.fetch_add(delta, Ordering::SeqCst);
                self.queue_if_enabled(event);
            },
            PlatformEvent::ControllerButtonDown { instance_id, button } => {
                if self.try_handle_controller_assignment(instance_id) {
                    return DispatchFlow::Continue;
                }
                self.scan_controller_button(instance_id, button, event);
            },
            PlatformEvent::ControllerAxisMotion { axis, value, .. } => {
                let scan = self.capture.lock().scan_request();
                match scan {
                    Some(request) if request.device == InputDevice::Controller => {
                        if !request.game_input.is_menu_action() {
                            self.scan_controller_axis(axis, value);
                        }
                        return DispatchFlow::Continue;
                    },
                    _ => {},
                }
                self.queue_if_enabled(event);
            },
            PlatformEvent::ControllerSensor {
                instance_id,
                sensor,
                data,
                timestamp_ms,
            } => {
                self.process_sensor(instance_id, sensor, data, timestamp_ms);
            },
            PlatformEvent::MouseMotion { xrel, yrel } => {
                if !self.game_input_disabled() {
                    self.deltas.lock().add_mouse(xrel, yrel);
                }
                self.queue_if_enabled(event);
            },
            PlatformEvent::DropBegin => {
                self.dropped_files.lock().clear();
            },
            PlatformEvent::DropFile(path) => {
                self.dropped_files.lock().push(path);
            },
            PlatformEvent::DropComplete => {
                let files = std::mem::take(&mut *self.dropped_files.lock());
                self.ui.drop_files(files);
            },
            PlatformEvent::ControllerButtonUp { .. } => {
                // Releases always reach the UI so no button stays held across a scan
                self.ui.queue_event(event);
            },
            PlatformEvent::KeyUp { .. }
            | PlatformEvent::MouseButton { .. }
            | PlatformEvent::StickReleased { .. }
            | PlatformEvent::WindowFocus { .. } => {
                self.queue_if_enabled(event);
            },
        }

        DispatchFlow::Continue
    }

    fn scan_controller_button(&self, instance_id: InstanceId, button: ControllerButton, event: PlatformEvent) {
        let scan = self.capture.lock().scan_request();
        let Some(request) = scan else {
            self.queue_if_enabled(event);
            return;
        };

        let toggle_menu = self.config.bindings(GameInput::ToggleMenu, InputDevice::Controller);
        let pressed_toggle = toggle_menu
            .iter()
            .any(|b| b.kind == InputKind::ControllerDigital && b.id == button as i32);
        if pressed_toggle {
            debug!("Scan cancelled from controller {}", instance_id);
            self.cancel_scanning_input();
            return;
        }

        if request.device != InputDevice::Controller {
            return;
        }

        // The D-pad navigates menus, so it can't be bound to menu actions
        if request.game_input.is_menu_action() && button.is_dpad() {
            return;
        }

        self.finish_scan(InputBinding::button(button));
    }

    fn scan_controller_axis(&self, axis: ControllerAxis, value: i16) {
        let value = raw_to_float(value);
        let binding = if value > AXIS_THRESHOLD {
            InputBinding::axis_positive(axis)
        } else if value < -AXIS_THRESHOLD {
            InputBinding::axis_negative(axis)
        } else {
            return;
        };

        // Lets the UI wait for the stick to return before accepting more input
        self.ui.queue_event(PlatformEvent::StickReleased { axis });
        self.finish_scan(binding);
    }

    fn process_sensor(&self, instance_id: InstanceId, sensor: SensorKind, data: [f32; 3], timestamp_ms: u64) {
        let rotation = {
            let mut registry = self.registry.lock();
            let Some(state) = registry.state_mut(instance_id) else {
                trace!("Sensor data from unknown controller {}", instance_id);
                return;
            };

            match sensor {
                SensorKind::Accelerometer => {
                    state.update_accelerometer(data);
                    None
                },
                SensorKind::Gyro => Some(state.update_gyro(data, timestamp_ms)),
            }
        };

        if let Some((x, y)) = rotation {
            self.deltas.lock().add_rotation(x, y);
        }
    }
}
