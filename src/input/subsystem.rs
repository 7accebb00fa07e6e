//! The input subsystem
//!
//! One [`InputSubsystem`] owns every piece of shared input state: the device
//! registry, pending motion and pointer deltas, the rumble envelope, the
//! keyboard snapshot and the exclusive capture mode.
//!
//! ## Locking
//!
//! Each piece of state has its own lock. When two are needed the capture lock
//! is taken before the registry lock, never the other way around. No lock is
//! held while calling into the [`UiHost`] or while reporting an assignment
//! outcome.
//!
//! ## Module layout
//!
//! - `queries`: binding reads, deltas and deadzone shaping
//! - `capture`: rebind scanning and the assignment wizard
//! - `dispatch`: the platform event filter and drain loop

mod capture;
mod dispatch;
mod queries;


use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;
use tracing::{debug, info, trace};

use super::backend::ControllerBackend;
use super::events::KeyboardSnapshot;
use super::host::{GameSession, UiHost};
use super::identity::ControllerIdentity;
use super::motion::PendingDeltas;
use super::n64::{ConnectedDevice, ConnectedDeviceInfo, Pak};
use super::registry::DeviceRegistry;
use super::rumble::{motor_strength, RumbleEnvelope, RUMBLE_DURATION_MS};
use super::types::{InstanceId, MAX_PLAYERS};
use super::wizard::CaptureState;
use super::InputError;
use crate::config::ConfigStore;

/// A connected controller as listed in the settings UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControllerOption {
    pub instance_id: InstanceId,
    pub name: String,
    pub identity: ControllerIdentity,
}

/// Shared input state for one running front-end
pub struct InputSubsystem<B> {
    registry: Mutex<DeviceRegistry<B>>,
    deltas: Mutex<PendingDeltas>,
    rumble: Mutex<RumbleEnvelope>,
    keyboard: RwLock<KeyboardSnapshot>,
    capture: Mutex<CaptureState>,
    dropped_files: Mutex<Vec<PathBuf>>,
    controller_options: Mutex<Vec<ControllerOption>>,

    mouse_wheel_pos: AtomicI32,
    right_analog_suppressed: AtomicBool,
    cursor_enabled: AtomicBool,
    single_controller: AtomicBool,
    game_started_seen: AtomicBool,
    exited: AtomicBool,

    config: Arc<dyn ConfigStore>,
    ui: Arc<dyn UiHost>,
    session: Arc<dyn GameSession>,
}

impl<B: ControllerBackend> InputSubsystem<B> {
    pub fn new(
        backend: B,
        config: Arc<dyn ConfigStore>,
        ui: Arc<dyn UiHost>,
        session: Arc<dyn GameSession>,
    ) -> Self {
        let single_controller = config.single_controller();
        debug!("Input subsystem created (single controller: {})", single_controller);

        Self {
            registry: Mutex::new(DeviceRegistry::new(backend)),
            deltas: Mutex::new(PendingDeltas::default()),
            rumble: Mutex::new(RumbleEnvelope::new()),
            keyboard: RwLock::new(KeyboardSnapshot::default()),
            capture: Mutex::new(CaptureState::default()),
            dropped_files: Mutex::new(Vec::new()),
            controller_options: Mutex::new(Vec::new()),
            mouse_wheel_pos: AtomicI32::new(0),
            right_analog_suppressed: AtomicBool::new(false),
            cursor_enabled: AtomicBool::new(true),
            single_controller: AtomicBool::new(single_controller),
            game_started_seen: AtomicBool::new(false),
            exited: AtomicBool::new(false),
            config,
            ui,
            session,
        }
    }

    pub fn config(&self) -> &Arc<dyn ConfigStore> {
        &self.config
    }

    /// Run `f` with exclusive access to the backend
    pub fn with_backend<R>(&self, f: impl FnOnce(&mut B) -> R) -> R {
        f(self.registry.lock().backend_mut())
    }

    /// Open every attached controller and refresh slot assignments
    pub fn scan_controllers(&self) {
        let opened = self.registry.lock().open_all();
        if opened > 0 {
            debug!("Opened {} new controller(s)", opened);
        }
        self.refresh_assignments();
    }

    /// Re-run the resolver against the stored identities
    pub fn refresh_assignments(&self) {
        let preferences = self.config.controller_identities();
        self.registry.lock().refresh_assignments(&preferences);
    }

    /// Per-tick refresh
    ///
    /// Snapshots the keyboard, re-runs slot assignment, then latches the
    /// accumulated rotation and pointer deltas.
    pub fn poll_inputs(&self) {
        let snapshot = self.registry.lock().backend().keyboard_state();
        *self.keyboard.write() = snapshot;

        self.refresh_assignments();
        self.deltas.lock().latch();
    }

    /// Close a controller and forget its state
    pub fn remove_controller(&self, instance_id: InstanceId) {
        if !self.registry.lock().remove(instance_id) {
            trace!("Removal of unknown controller {}", instance_id);
        }
    }

    /// Number of open controllers
    pub fn detected_controller_count(&self) -> usize {
        self.registry.lock().len()
    }

    pub fn assignments(&self) -> [Option<InstanceId>; MAX_PLAYERS] {
        self.registry.lock().assignments()
    }

    pub fn single_controller_mode(&self) -> bool {
        self.single_controller.load(Ordering::SeqCst)
    }

    pub fn set_single_controller_mode(&self, single_controller: bool) {
        self.single_controller.store(single_controller, Ordering::SeqCst);
    }

    /// Record the game's rumble request for a slot
    pub fn set_rumble(&self, slot: usize, on: bool) -> Result<(), InputError> {
        if slot >= MAX_PLAYERS {
            return Err(InputError::InvalidSlot(slot));
        }
        self.rumble.lock().set_active(slot, on);
        Ok(())
    }

    /// Advance the rumble envelopes and drive the motors
    pub fn update_rumble(&self) {
        let smoothed = self.rumble.lock().tick();
        let strength_percent = self.config.rumble_strength();
        let single_controller = self.single_controller_mode();

        let mut registry = self.registry.lock();
        for (slot, level) in smoothed.iter().enumerate() {
            // Only player 1 exists in single-controller mode
            if single_controller && slot != 0 {
                continue;
            }

            let strength = motor_strength(*level, strength_percent);
            for instance_id in registry.targets_for(slot, single_controller) {
                if let Err(e) = registry
                    .backend_mut()
                    .rumble(instance_id, 0, strength, RUMBLE_DURATION_MS)
                {
                    trace!("Rumble failed on controller {}: {}", instance_id, e);
                }
            }
        }
    }

    /// Whether the game should see a controller in `slot`
    ///
    /// Slot 0 is always present so keyboard-only play works.
    pub fn controller_present(&self, slot: usize) -> bool {
        if slot == 0 {
            return true;
        }
        if slot >= MAX_PLAYERS || self.single_controller_mode() {
            return false;
        }
        self.registry.lock().assigned(slot).is_some()
    }

    /// Device and pak reported to the game for `slot`
    pub fn connected_device_info(&self, slot: usize) -> ConnectedDeviceInfo {
        if !self.controller_present(slot) {
            return ConnectedDeviceInfo::default();
        }

        let registry = self.registry.lock();
        let has_pad = if self.single_controller_mode() {
            !registry.is_empty()
        } else {
            registry.assigned(slot).is_some()
        };

        ConnectedDeviceInfo {
            device: ConnectedDevice::Controller,
            pak: if has_pad { Pak::RumblePak } else { Pak::None },
        }
    }

    /// Rebuild the list of connected controllers for the settings UI
    pub fn refresh_controller_options(&self) -> Vec<ControllerOption> {
        self.poll_inputs();

        let options: Vec<ControllerOption> = {
            let registry = self.registry.lock();
            registry
                .candidates()
                .into_iter()
                .filter_map(|candidate| {
                    let identity = candidate.identity?;
                    let name = registry
                        .backend()
                        .name(candidate.instance_id)
                        .filter(|n| !n.is_empty())
                        .unwrap_or_else(|| "Unknown controller".to_string());
                    Some(ControllerOption {
                        instance_id: candidate.instance_id,
                        name,
                        identity,
                    })
                })
                .collect()
        };

        *self.controller_options.lock() = options.clone();
        options
    }

    /// Controller list from the last refresh
    pub fn controller_options(&self) -> Vec<ControllerOption> {
        self.controller_options.lock().clone()
    }

    /// Stop rumble, end any capture and close every controller
    pub fn shutdown(&self) {
        self.cancel_controller_assignment();
        self.stop_scanning_input();

        let mut registry = self.registry.lock();
        for instance_id in registry.open_ids() {
            let _ = registry.backend_mut().rumble(instance_id, 0, 0, 0);
        }
        registry.close_all();
        info!("Input subsystem shut down");
    }
}
