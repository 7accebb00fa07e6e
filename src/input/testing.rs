//! Scripted backend and recording UI
//!
//! [`MockBackend`] simulates attached controllers, keyboard state and the
//! platform event queue. Clones share state, so a test can keep one handle
//! for scripting while the subsystem owns another. [`RecordingUi`] captures
//! every call the subsystem makes into the UI.

use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;

use super::backend::{BackendError, ControllerBackend};
use super::events::{KeyMod, KeyboardSnapshot, PlatformEvent};
use super::host::{CursorState, UiHost};
use super::identity::ControllerIdentity;
use super::types::{scancode, ControllerAxis, ControllerButton, InstanceId};

/// A rumble command received by the mock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RumbleCommand {
    pub instance_id: InstanceId,
    pub low_frequency: u16,
    pub high_frequency: u16,
    pub duration_ms: u32,
}

#[derive(Debug, Clone)]
struct MockDevice {
    instance_id: InstanceId,
    /// Whether the instance id can be looked up before opening
    reports_instance_id: bool,
    identity: Option<ControllerIdentity>,
    name: String,
    is_controller: bool,
    has_motion: bool,
    sensors_enabled: bool,
    buttons: HashSet<ControllerButton>,
    axes: [i16; ControllerAxis::COUNT],
}

#[derive(Debug)]
struct MockState {
    devices: Vec<MockDevice>,
    opened: HashSet<InstanceId>,
    next_instance_id: InstanceId,
    open_calls: usize,
    pump_calls: usize,
    events: VecDeque<PlatformEvent>,
    keys: Vec<bool>,
    modifiers: KeyMod,
    rumble_log: Vec<RumbleCommand>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            devices: Vec::new(),
            opened: HashSet::new(),
            next_instance_id: 0,
            open_calls: 0,
            pump_calls: 0,
            events: VecDeque::new(),
            keys: vec![false; scancode::COUNT],
            modifiers: KeyMod::NONE,
            rumble_log: Vec::new(),
        }
    }
}

impl MockState {
    fn device(&self, instance_id: InstanceId) -> Option<&MockDevice> {
        self.devices.iter().find(|d| d.instance_id == instance_id)
    }

    fn device_mut(&mut self, instance_id: InstanceId) -> Option<&mut MockDevice> {
        self.devices.iter_mut().find(|d| d.instance_id == instance_id)
    }
}

/// In-memory controller backend
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a game controller; returns its instance id
    pub fn add_controller(&self, identity: ControllerIdentity) -> InstanceId {
        self.add_device(identity, true)
    }

    /// Attach a joystick device, optionally without a controller mapping
    pub fn add_device(&self, identity: ControllerIdentity, is_controller: bool) -> InstanceId {
        let mut state = self.state.lock();
        let instance_id = state.next_instance_id;
        state.next_instance_id += 1;
        state.devices.push(MockDevice {
            instance_id,
            reports_instance_id: true,
            name: format!("Mock Controller {}", instance_id),
            identity: Some(identity),
            is_controller,
            has_motion: false,
            sensors_enabled: false,
            buttons: HashSet::new(),
            axes: [0; ControllerAxis::COUNT],
        });
        instance_id
    }

    /// Detach a device (does not queue an event)
    pub fn detach(&self, instance_id: InstanceId) {
        let mut state = self.state.lock();
        state.devices.retain(|d| d.instance_id != instance_id);
        state.opened.remove(&instance_id);
    }

    /// Simulate a platform that only reveals the instance id on open
    pub fn hide_instance_id(&self, instance_id: InstanceId) {
        if let Some(device) = self.state.lock().device_mut(instance_id) {
            device.reports_instance_id = false;
        }
    }

    /// Simulate a controller whose joystick handle is unavailable
    pub fn clear_identity(&self, instance_id: InstanceId) {
        if let Some(device) = self.state.lock().device_mut(instance_id) {
            device.identity = None;
        }
    }

    pub fn set_name(&self, instance_id: InstanceId, name: &str) {
        if let Some(device) = self.state.lock().device_mut(instance_id) {
            device.name = name.to_string();
        }
    }

    pub fn with_motion(&self, instance_id: InstanceId) {
        if let Some(device) = self.state.lock().device_mut(instance_id) {
            device.has_motion = true;
        }
    }

    pub fn sensors_enabled(&self, instance_id: InstanceId) -> bool {
        self.state
            .lock()
            .device(instance_id)
            .map(|d| d.sensors_enabled)
            .unwrap_or(false)
    }

    pub fn is_open(&self, instance_id: InstanceId) -> bool {
        self.state.lock().opened.contains(&instance_id)
    }

    pub fn open_calls(&self) -> usize {
        self.state.lock().open_calls
    }

    pub fn pump_calls(&self) -> usize {
        self.state.lock().pump_calls
    }

    pub fn press(&self, instance_id: InstanceId, button: ControllerButton) {
        if let Some(device) = self.state.lock().device_mut(instance_id) {
            device.buttons.insert(button);
        }
    }

    pub fn release(&self, instance_id: InstanceId, button: ControllerButton) {
        if let Some(device) = self.state.lock().device_mut(instance_id) {
            device.buttons.remove(&button);
        }
    }

    pub fn set_axis(&self, instance_id: InstanceId, axis: ControllerAxis, value: i16) {
        if let Some(device) = self.state.lock().device_mut(instance_id) {
            device.axes[axis as usize] = value;
        }
    }

    pub fn push_event(&self, event: PlatformEvent) {
        self.state.lock().events.push_back(event);
    }

    pub fn pending_events(&self) -> usize {
        self.state.lock().events.len()
    }

    pub fn set_key(&self, scancode: u32, held: bool) {
        let mut state = self.state.lock();
        if let Some(key) = state.keys.get_mut(scancode as usize) {
            *key = held;
        }
    }

    pub fn set_modifiers(&self, modifiers: KeyMod) {
        self.state.lock().modifiers = modifiers;
    }

    pub fn rumble_log(&self) -> Vec<RumbleCommand> {
        self.state.lock().rumble_log.clone()
    }

    pub fn clear_rumble_log(&self) {
        self.state.lock().rumble_log.clear();
    }
}

impl ControllerBackend for MockBackend {
    fn pump(&mut self) {
        self.state.lock().pump_calls += 1;
    }

    fn device_count(&self) -> usize {
        self.state.lock().devices.len()
    }

    fn is_game_controller(&self, device_index: usize) -> bool {
        self.state
            .lock()
            .devices
            .get(device_index)
            .map(|d| d.is_controller)
            .unwrap_or(false)
    }

    fn instance_id(&self, device_index: usize) -> Option<InstanceId> {
        self.state
            .lock()
            .devices
            .get(device_index)
            .filter(|d| d.reports_instance_id)
            .map(|d| d.instance_id)
    }

    fn open(&mut self, device_index: usize) -> Option<InstanceId> {
        let mut state = self.state.lock();
        let instance_id = state.devices.get(device_index)?.instance_id;
        state.open_calls += 1;
        state.opened.insert(instance_id);
        Some(instance_id)
    }

    fn close(&mut self, instance_id: InstanceId) {
        self.state.lock().opened.remove(&instance_id);
    }

    fn identity(&self, instance_id: InstanceId) -> Option<ControllerIdentity> {
        let state = self.state.lock();
        if !state.opened.contains(&instance_id) {
            return None;
        }
        state.device(instance_id)?.identity.clone()
    }

    fn name(&self, instance_id: InstanceId) -> Option<String> {
        self.state.lock().device(instance_id).map(|d| d.name.clone())
    }

    fn button(&self, instance_id: InstanceId, button: ControllerButton) -> bool {
        self.state
            .lock()
            .device(instance_id)
            .map(|d| d.buttons.contains(&button))
            .unwrap_or(false)
    }

    fn axis(&self, instance_id: InstanceId, axis: ControllerAxis) -> i16 {
        self.state
            .lock()
            .device(instance_id)
            .map(|d| d.axes[axis as usize])
            .unwrap_or(0)
    }

    fn has_motion_sensors(&self, instance_id: InstanceId) -> bool {
        self.state
            .lock()
            .device(instance_id)
            .map(|d| d.has_motion)
            .unwrap_or(false)
    }

    fn enable_motion_sensors(&mut self, instance_id: InstanceId) {
        if let Some(device) = self.state.lock().device_mut(instance_id) {
            device.sensors_enabled = true;
        }
    }

    fn rumble(
        &mut self,
        instance_id: InstanceId,
        low_frequency: u16,
        high_frequency: u16,
        duration_ms: u32,
    ) -> Result<(), BackendError> {
        let mut state = self.state.lock();
        if !state.opened.contains(&instance_id) {
            return Err(BackendError::NotOpen(instance_id));
        }
        state.rumble_log.push(RumbleCommand {
            instance_id,
            low_frequency,
            high_frequency,
            duration_ms,
        });
        Ok(())
    }

    fn poll_event(&mut self) -> Option<PlatformEvent> {
        self.state.lock().events.pop_front()
    }

    fn keyboard_state(&self) -> KeyboardSnapshot {
        let state = self.state.lock();
        KeyboardSnapshot {
            keys: state.keys.clone(),
            modifiers: state.modifiers,
        }
    }
}

/// Everything a [`RecordingUi`] has been asked to do
#[derive(Debug, Clone, Default)]
pub struct UiLog {
    pub queued: Vec<PlatformEvent>,
    pub notifications: Vec<(String, String)>,
    pub progress: Vec<(usize, usize)>,
    pub progress_cleared: usize,
    pub prompts_closed: usize,
    pub fullscreen_toggles: usize,
    pub dropped: Vec<Vec<PathBuf>>,
    pub cursors: Vec<CursorState>,
    pub mouse_activations: usize,
    pub game_started_calls: usize,
}

/// [`UiHost`] that records every call
#[derive(Debug, Default)]
pub struct RecordingUi {
    log: Mutex<UiLog>,
    capturing: std::sync::atomic::AtomicBool,
}

impl RecordingUi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend a menu that captures input is open
    pub fn set_capturing(&self, capturing: bool) {
        self.capturing
            .store(capturing, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn log(&self) -> UiLog {
        self.log.lock().clone()
    }

    pub fn queued(&self) -> Vec<PlatformEvent> {
        self.log.lock().queued.clone()
    }

    pub fn clear(&self) {
        *self.log.lock() = UiLog::default();
    }
}

impl UiHost for RecordingUi {
    fn queue_event(&self, event: PlatformEvent) {
        self.log.lock().queued.push(event);
    }

    fn is_context_capturing_input(&self) -> bool {
        self.capturing.load(std::sync::atomic::Ordering::SeqCst)
    }

    fn open_notification(&self, title: &str, message: &str) {
        self.log
            .lock()
            .notifications
            .push((title.to_string(), message.to_string()));
    }

    fn set_prompt_progress(&self, completed: usize, total: usize) {
        self.log.lock().progress.push((completed, total));
    }

    fn clear_prompt_progress(&self) {
        self.log.lock().progress_cleared += 1;
    }

    fn close_prompt(&self) {
        self.log.lock().prompts_closed += 1;
    }

    fn toggle_fullscreen(&self) {
        self.log.lock().fullscreen_toggles += 1;
    }

    fn drop_files(&self, files: Vec<PathBuf>) {
        self.log.lock().dropped.push(files);
    }

    fn apply_cursor(&self, cursor: CursorState) {
        self.log.lock().cursors.push(cursor);
    }

    fn activate_mouse(&self) {
        self.log.lock().mouse_activations += 1;
    }

    fn process_game_started(&self) {
        self.log.lock().game_started_calls += 1;
    }
}
