//! Open controllers and their per-device state
//!
//! The registry owns the backend and every opened controller. It is kept
//! behind one lock together with the resolver output, so slot assignments
//! always describe controllers that are actually open.

use glam::Vec3;
use std::collections::BTreeMap;
use tracing::{debug, info, trace};

use super::backend::ControllerBackend;
use super::identity::ControllerIdentity;
use super::motion::{MotionFusion, RAD_TO_DEG, STANDARD_GRAVITY};
use super::resolver::{resolve_assignments, Candidate};
use super::types::{InstanceId, MAX_PLAYERS};

/// Per-controller state, created on open and dropped on removal
#[derive(Debug, Clone, Default)]
pub struct ControllerState {
    /// Latest accelerometer sample in g
    pub latest_accelerometer: Vec3,
    pub motion: MotionFusion,
    /// Timestamp of the previous gyro sample; `None` right after connecting
    pub prev_gyro_timestamp: Option<u64>,
}

impl ControllerState {
    /// Cache an accelerometer sample given in m/s²
    pub fn update_accelerometer(&mut self, data: [f32; 3]) {
        self.latest_accelerometer = Vec3::from(data) / STANDARD_GRAVITY;
    }

    /// Fuse a gyro sample given in rad/s and return the player-space rate
    pub fn update_gyro(&mut self, data: [f32; 3], timestamp_ms: u64) -> (f32, f32) {
        let delta_ms = self
            .prev_gyro_timestamp
            .map(|prev| timestamp_ms.saturating_sub(prev))
            .unwrap_or(0);
        self.prev_gyro_timestamp = Some(timestamp_ms);

        let gyro = Vec3::from(data) * RAD_TO_DEG;
        self.motion
            .process(gyro, self.latest_accelerometer, delta_ms as f32 * 0.001);
        self.motion.player_space_gyro()
    }
}

/// Opened controllers plus the current slot assignment
pub struct DeviceRegistry<B> {
    backend: B,
    /// Keyed by instance id; iteration order is the enumeration order
    controllers: BTreeMap<InstanceId, ControllerState>,
    assigned: [Option<InstanceId>; MAX_PLAYERS],
}

impl<B: ControllerBackend> DeviceRegistry<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            controllers: BTreeMap::new(),
            assigned: [None; MAX_PLAYERS],
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Open the controller at `device_index`
    ///
    /// Does nothing for out-of-range indices, devices without a controller
    /// mapping, handles that fail to open, or controllers already open.
    /// Returns the instance id when a new controller was registered.
    pub fn open(&mut self, device_index: usize) -> Option<InstanceId> {
        if device_index >= self.backend.device_count() {
            trace!("Device index {} out of range", device_index);
            return None;
        }

        if !self.backend.is_game_controller(device_index) {
            trace!("Device {} is not a game controller", device_index);
            return None;
        }

        // Skip reopening instances we already hold
        if let Some(instance_id) = self.backend.instance_id(device_index) {
            if self.controllers.contains_key(&instance_id) {
                return None;
            }
        }

        let Some(instance_id) = self.backend.open(device_index) else {
            debug!("Failed to open controller at device index {}", device_index);
            return None;
        };

        if self.controllers.contains_key(&instance_id) {
            // Same instance reached through another index; the backend handed
            // back the live handle, so there is nothing to close
            trace!("Controller {} already open", instance_id);
            return None;
        }

        if self.backend.has_motion_sensors(instance_id) {
            self.backend.enable_motion_sensors(instance_id);
            debug!("Enabled motion sensors for controller {}", instance_id);
        }

        self.controllers.insert(instance_id, ControllerState::default());

        let name = self
            .backend
            .name(instance_id)
            .unwrap_or_else(|| "Unknown controller".to_string());
        info!("🎮 Controller connected: {} (instance {})", name, instance_id);

        Some(instance_id)
    }

    /// Close a controller and drop its state
    pub fn remove(&mut self, instance_id: InstanceId) -> bool {
        if self.controllers.remove(&instance_id).is_none() {
            return false;
        }
        self.backend.close(instance_id);
        for slot in self.assigned.iter_mut() {
            if *slot == Some(instance_id) {
                *slot = None;
            }
        }
        info!("🔌 Controller disconnected (instance {})", instance_id);
        true
    }

    /// Pump the backend and open every attached controller
    pub fn open_all(&mut self) -> usize {
        self.backend.pump();
        let count = self.backend.device_count();
        (0..count).filter_map(|index| self.open(index)).count()
    }

    /// Re-run slot assignment against the stored preferences
    pub fn refresh_assignments(&mut self, preferences: &[Option<ControllerIdentity>; MAX_PLAYERS]) {
        let candidates = self.candidates();
        let assigned = resolve_assignments(preferences, &candidates);
        if assigned != self.assigned {
            debug!("Controller assignments changed: {:?} -> {:?}", self.assigned, assigned);
        }
        self.assigned = assigned;
    }

    /// Open controllers in enumeration order, with their identities
    pub fn candidates(&self) -> Vec<Candidate> {
        self.controllers
            .keys()
            .map(|&instance_id| Candidate {
                instance_id,
                identity: self.backend.identity(instance_id),
            })
            .collect()
    }

    pub fn is_open(&self, instance_id: InstanceId) -> bool {
        self.controllers.contains_key(&instance_id)
    }

    pub fn open_ids(&self) -> Vec<InstanceId> {
        self.controllers.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    pub fn state_mut(&mut self, instance_id: InstanceId) -> Option<&mut ControllerState> {
        self.controllers.get_mut(&instance_id)
    }

    pub fn identity(&self, instance_id: InstanceId) -> Option<ControllerIdentity> {
        if !self.is_open(instance_id) {
            return None;
        }
        self.backend.identity(instance_id)
    }

    pub fn assigned(&self, slot: usize) -> Option<InstanceId> {
        self.assigned.get(slot).copied().flatten()
    }

    pub fn assignments(&self) -> [Option<InstanceId>; MAX_PLAYERS] {
        self.assigned
    }

    /// Controllers that feed `slot`
    ///
    /// In single-controller mode every open controller drives the slot.
    pub fn targets_for(&self, slot: usize, single_controller: bool) -> Vec<InstanceId> {
        if single_controller {
            self.open_ids()
        } else {
            self.assigned(slot).into_iter().collect()
        }
    }

    /// Close every controller
    pub fn close_all(&mut self) {
        let ids = self.open_ids();
        for instance_id in ids {
            self.remove(instance_id);
        }
        self.assigned = [None; MAX_PLAYERS];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::testing::MockBackend;

    fn pad(vendor: u16) -> ControllerIdentity {
        ControllerIdentity {
            vendor,
            product: 0x1234,
            version: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_open_is_idempotent() {
        let backend = MockBackend::new();
        backend.add_controller(pad(1));
        let mut registry = DeviceRegistry::new(backend.clone());

        assert!(registry.open(0).is_some());
        assert!(registry.open(0).is_none());
        assert_eq!(registry.len(), 1);
        assert_eq!(backend.open_calls(), 1);
    }

    #[test]
    fn test_reopen_keeps_live_handle_and_state() {
        let backend = MockBackend::new();
        let id = backend.add_controller(pad(1));
        backend.hide_instance_id(id);
        let mut registry = DeviceRegistry::new(backend.clone());

        assert_eq!(registry.open(0), Some(id));
        if let Some(state) = registry.state_mut(id) {
            state.update_gyro([0.0, 1.0, 0.0], 1_000);
        }

        // Only open() reveals the id, so the duplicate is caught afterwards
        assert_eq!(registry.open(0), None);
        assert_eq!(backend.open_calls(), 2);
        assert!(backend.is_open(id));
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.state_mut(id).and_then(|s| s.prev_gyro_timestamp),
            Some(1_000)
        );
    }

    #[test]
    fn test_open_skips_invalid_devices() {
        let backend = MockBackend::new();
        backend.add_device(pad(1), false);
        let mut registry = DeviceRegistry::new(backend.clone());

        assert!(registry.open(0).is_none());
        assert!(registry.open(5).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_open_enables_motion_sensors() {
        let backend = MockBackend::new();
        let id = backend.add_controller(pad(1));
        backend.with_motion(id);
        let mut registry = DeviceRegistry::new(backend.clone());

        registry.open(0);
        assert!(backend.sensors_enabled(id));
    }

    #[test]
    fn test_remove_clears_assignment() {
        let backend = MockBackend::new();
        let id = backend.add_controller(pad(1));
        let mut registry = DeviceRegistry::new(backend.clone());
        registry.open_all();
        registry.refresh_assignments(&[None, None, None, None]);
        assert_eq!(registry.assigned(0), Some(id));

        assert!(registry.remove(id));
        assert!(!registry.remove(id));
        assert_eq!(registry.assigned(0), None);
        assert!(!backend.is_open(id));
    }

    #[test]
    fn test_targets_for_single_controller_mode() {
        let backend = MockBackend::new();
        let a = backend.add_controller(pad(1));
        let b = backend.add_controller(pad(2));
        let mut registry = DeviceRegistry::new(backend);
        registry.open_all();
        registry.refresh_assignments(&[None, None, None, None]);

        assert_eq!(registry.targets_for(1, true), vec![a, b]);
        assert_eq!(registry.targets_for(1, false), vec![b]);
        assert_eq!(registry.targets_for(3, false), Vec::<InstanceId>::new());
    }

    #[test]
    fn test_first_gyro_sample_has_zero_dt() {
        let mut state = ControllerState::default();
        state.update_gyro([0.0, 1.0, 0.0], 5_000);
        assert_eq!(state.prev_gyro_timestamp, Some(5_000));
    }

    #[test]
    fn test_accelerometer_converted_to_g() {
        let mut state = ControllerState::default();
        state.update_accelerometer([0.0, STANDARD_GRAVITY, 0.0]);
        assert_eq!(state.latest_accelerometer, Vec3::Y);
    }
}
