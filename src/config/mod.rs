//! Configuration management for the input layer
//!
//! Handles loading, parsing, and hot-reloading of the YAML settings file,
//! and exposes the settings to the input subsystem through [`ConfigStore`].

pub mod watcher;

use anyhow::{Context, Result};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info};

use crate::input::bindings::default_bindings;
use crate::input::identity::ControllerIdentity;
use crate::input::types::{GameInput, InputBinding, InputDevice, MAX_PLAYERS};

pub use watcher::ConfigWatcher;

/// Directory name under the platform config dir
const APP_DIR: &str = "recomp-input";

/// Maximum bindings per game input and device
pub const MAX_BINDINGS: usize = 2;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct InputConfig {
    /// Stored controller identity per player slot
    #[serde(default)]
    pub controllers: [Option<ControllerIdentity>; MAX_PLAYERS],
    /// Rumble strength in percent
    #[serde(default = "default_rumble_strength")]
    pub rumble_strength: u32,
    /// Gyro aiming sensitivity in percent
    #[serde(default = "default_gyro_sensitivity")]
    pub gyro_sensitivity: u32,
    /// Mouse aiming sensitivity in percent (0 disables mouse aiming)
    #[serde(default)]
    pub mouse_sensitivity: u32,
    /// Joystick deadzone in percent
    #[serde(default = "default_joystick_deadzone")]
    pub joystick_deadzone: u32,
    /// Merge every controller into player 1
    #[serde(default = "default_true")]
    pub single_controller: bool,
    #[serde(default = "default_binding_table")]
    pub bindings: BTreeMap<GameInput, DeviceBindings>,
}

/// Bindings of one game input for each device family
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DeviceBindings {
    #[serde(default)]
    pub keyboard: Vec<InputBinding>,
    #[serde(default)]
    pub controller: Vec<InputBinding>,
}

impl DeviceBindings {
    pub fn for_device(&self, device: InputDevice) -> &[InputBinding] {
        match device {
            InputDevice::Keyboard => &self.keyboard,
            InputDevice::Controller => &self.controller,
        }
    }

    pub fn for_device_mut(&mut self, device: InputDevice) -> &mut Vec<InputBinding> {
        match device {
            InputDevice::Keyboard => &mut self.keyboard,
            InputDevice::Controller => &mut self.controller,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            controllers: Default::default(),
            rumble_strength: default_rumble_strength(),
            gyro_sensitivity: default_gyro_sensitivity(),
            mouse_sensitivity: 0,
            joystick_deadzone: default_joystick_deadzone(),
            single_controller: default_true(),
            bindings: default_binding_table(),
        }
    }
}

impl InputConfig {
    /// Load configuration from file with validation
    pub async fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_yaml_str(&contents)
            .with_context(|| format!("Failed to parse YAML config: {}", path.display()))
    }

    /// Load configuration, writing the defaults first if the file does not exist
    pub async fn load_or_create(path: &Path) -> Result<Self> {
        if fs::try_exists(path).await.unwrap_or(false) {
            return Self::load(path).await;
        }

        info!("No config at {}, writing defaults", path.display());
        let config = Self::default();
        config.save(path).await?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config to YAML")?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        fs::write(path, yaml)
            .await
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        debug!("Saved config to {}", path.display());
        Ok(())
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let mut config: InputConfig = serde_yaml::from_str(contents)?;
        config.fill_missing_bindings();
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for correctness and consistency
    pub fn validate(&self) -> Result<()> {
        if self.rumble_strength > 100 {
            anyhow::bail!("rumble_strength must be 0-100 (got {})", self.rumble_strength);
        }
        if self.gyro_sensitivity > 100 {
            anyhow::bail!("gyro_sensitivity must be 0-100 (got {})", self.gyro_sensitivity);
        }
        if self.mouse_sensitivity > 100 {
            anyhow::bail!("mouse_sensitivity must be 0-100 (got {})", self.mouse_sensitivity);
        }
        if self.joystick_deadzone >= 100 {
            anyhow::bail!(
                "joystick_deadzone must be below 100 (got {})",
                self.joystick_deadzone
            );
        }

        for (input, bindings) in &self.bindings {
            for device in [InputDevice::Keyboard, InputDevice::Controller] {
                let list = bindings.for_device(device);
                if list.len() > MAX_BINDINGS {
                    anyhow::bail!(
                        "{:?} has {} {:?} bindings (at most {} allowed)",
                        input,
                        list.len(),
                        device,
                        MAX_BINDINGS
                    );
                }
            }
        }

        Ok(())
    }

    /// Add default bindings for game inputs missing from the file
    fn fill_missing_bindings(&mut self) {
        for input in GameInput::ALL {
            self.bindings.entry(input).or_insert_with(|| default_device_bindings(input));
        }
    }

    pub fn bindings(&self, input: GameInput, device: InputDevice) -> Vec<InputBinding> {
        self.bindings
            .get(&input)
            .map(|b| b.for_device(device).to_vec())
            .unwrap_or_default()
    }

    /// Replace one binding; `index` selects the first or second binding
    pub fn set_binding(&mut self, input: GameInput, device: InputDevice, index: usize, binding: InputBinding) {
        if index >= MAX_BINDINGS {
            return;
        }
        let list = self.bindings.entry(input).or_default().for_device_mut(device);
        if list.len() <= index {
            list.resize(index + 1, InputBinding::NONE);
        }
        list[index] = binding;
    }
}

/// Settings the input subsystem reads on every poll
///
/// Only the assignment wizard writes (per-slot controller identity).
pub trait ConfigStore: Send + Sync {
    fn controller_identity(&self, slot: usize) -> Option<ControllerIdentity>;

    fn set_controller_identity(&self, slot: usize, identity: ControllerIdentity);

    fn controller_identities(&self) -> [Option<ControllerIdentity>; MAX_PLAYERS] {
        [0, 1, 2, 3].map(|slot| self.controller_identity(slot))
    }

    fn rumble_strength(&self) -> u32;

    fn gyro_sensitivity(&self) -> u32;

    fn mouse_sensitivity(&self) -> u32;

    fn joystick_deadzone(&self) -> u32;

    fn single_controller(&self) -> bool;

    fn bindings(&self, input: GameInput, device: InputDevice) -> Vec<InputBinding>;
}

/// In-memory config shared between the input thread and the rest of the app
#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<InputConfig>>,
    dirty: Arc<AtomicBool>,
    /// Contents of the last write, used to recognize our own file events
    last_saved: Arc<Mutex<Option<InputConfig>>>,
}

/// What [`SharedConfig::apply_reload`] did with a reloaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// The file holds what we last wrote
    OwnWrite,
    /// Unsaved slot assignments were kept, everything else reloaded
    Merged,
    Replaced,
}

impl SharedConfig {
    pub fn new(config: InputConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
            dirty: Arc::new(AtomicBool::new(false)),
            last_saved: Arc::new(Mutex::new(None)),
        }
    }

    pub fn snapshot(&self) -> InputConfig {
        self.inner.read().clone()
    }

    /// Apply a config reloaded from disk
    ///
    /// Echoes of our own saves are dropped. While local changes are pending
    /// the in-memory controller identities win over the file's.
    pub fn apply_reload(&self, config: InputConfig) -> ReloadOutcome {
        if self.last_saved.lock().as_ref() == Some(&config) {
            return ReloadOutcome::OwnWrite;
        }

        let mut inner = self.inner.write();
        if self.dirty.load(Ordering::SeqCst) {
            let controllers = inner.controllers.clone();
            *inner = InputConfig { controllers, ..config };
            ReloadOutcome::Merged
        } else {
            *inner = config;
            ReloadOutcome::Replaced
        }
    }

    pub fn update(&self, f: impl FnOnce(&mut InputConfig)) {
        f(&mut self.inner.write());
        self.dirty.store(true, Ordering::SeqCst);
    }

    /// Whether the config changed since the last call (and reset the flag)
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::SeqCst)
    }

    /// Write pending changes to `path`; returns whether anything was written
    pub async fn save_if_dirty(&self, path: &Path) -> Result<bool> {
        if !self.take_dirty() {
            return Ok(false);
        }

        let snapshot = self.snapshot();
        *self.last_saved.lock() = Some(snapshot.clone());
        if let Err(e) = snapshot.save(path).await {
            self.dirty.store(true, Ordering::SeqCst);
            return Err(e);
        }
        Ok(true)
    }
}

impl ConfigStore for SharedConfig {
    fn controller_identity(&self, slot: usize) -> Option<ControllerIdentity> {
        self.inner.read().controllers.get(slot).cloned().flatten()
    }

    fn set_controller_identity(&self, slot: usize, identity: ControllerIdentity) {
        if slot >= MAX_PLAYERS {
            return;
        }
        self.update(|config| config.controllers[slot] = Some(identity));
    }

    fn rumble_strength(&self) -> u32 {
        self.inner.read().rumble_strength
    }

    fn gyro_sensitivity(&self) -> u32 {
        self.inner.read().gyro_sensitivity
    }

    fn mouse_sensitivity(&self) -> u32 {
        self.inner.read().mouse_sensitivity
    }

    fn joystick_deadzone(&self) -> u32 {
        self.inner.read().joystick_deadzone
    }

    fn single_controller(&self) -> bool {
        self.inner.read().single_controller
    }

    fn bindings(&self, input: GameInput, device: InputDevice) -> Vec<InputBinding> {
        self.inner.read().bindings(input, device)
    }
}

/// Default location of the settings file
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("input.yaml")
}

fn default_device_bindings(input: GameInput) -> DeviceBindings {
    DeviceBindings {
        keyboard: default_bindings(input, InputDevice::Keyboard),
        controller: default_bindings(input, InputDevice::Controller),
    }
}

fn default_binding_table() -> BTreeMap<GameInput, DeviceBindings> {
    GameInput::ALL
        .into_iter()
        .map(|input| (input, default_device_bindings(input)))
        .collect()
}

fn default_rumble_strength() -> u32 { 25 }
fn default_gyro_sensitivity() -> u32 { 50 }
fn default_joystick_deadzone() -> u32 { 5 }
fn default_true() -> bool { true }

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::types::{scancode, ControllerButton};
    use tempfile::TempDir;

    #[test]
    fn test_minimal_yaml_gets_defaults() {
        let config = InputConfig::from_yaml_str("rumble_strength: 80\n").unwrap();
        assert_eq!(config.rumble_strength, 80);
        assert_eq!(config.gyro_sensitivity, 50);
        assert_eq!(config.joystick_deadzone, 5);
        assert!(config.single_controller);
        assert_eq!(config.bindings.len(), GameInput::ALL.len());
        assert_eq!(config.controllers, [None, None, None, None]);
    }

    #[test]
    fn test_partial_bindings_are_completed() {
        let yaml = r#"
bindings:
  a:
    keyboard:
      - kind: keyboard
        id: 9
"#;
        let config = InputConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(
            config.bindings(GameInput::A, InputDevice::Keyboard),
            vec![InputBinding::keyboard(scancode::F)]
        );
        // Missing device list stays empty rather than falling back
        assert!(config.bindings(GameInput::A, InputDevice::Controller).is_empty());
        // Missing inputs get defaults
        assert_eq!(
            config.bindings(GameInput::Start, InputDevice::Controller),
            vec![InputBinding::button(ControllerButton::Start)]
        );
    }

    #[test]
    fn test_validation_rejects_out_of_range() {
        assert!(InputConfig::from_yaml_str("rumble_strength: 101\n").is_err());
        assert!(InputConfig::from_yaml_str("joystick_deadzone: 100\n").is_err());
        assert!(InputConfig::from_yaml_str("mouse_sensitivity: 250\n").is_err());
    }

    #[test]
    fn test_validation_rejects_too_many_bindings() {
        let mut config = InputConfig::default();
        config
            .bindings
            .entry(GameInput::B)
            .or_default()
            .keyboard = vec![InputBinding::keyboard(scancode::Q); 3];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_set_binding_grows_list() {
        let mut config = InputConfig::default();
        config.set_binding(GameInput::Z, InputDevice::Keyboard, 1, InputBinding::keyboard(scancode::TAB));
        assert_eq!(
            config.bindings(GameInput::Z, InputDevice::Keyboard),
            vec![InputBinding::keyboard(scancode::Q), InputBinding::keyboard(scancode::TAB)]
        );

        config.set_binding(GameInput::Z, InputDevice::Keyboard, 5, InputBinding::NONE);
        assert_eq!(config.bindings(GameInput::Z, InputDevice::Keyboard).len(), 2);
    }

    #[test]
    fn test_shared_config_tracks_identity_writes() {
        let shared = SharedConfig::new(InputConfig::default());
        assert!(!shared.take_dirty());

        let identity = ControllerIdentity {
            vendor: 0x045e,
            product: 0x028e,
            ..Default::default()
        };
        shared.set_controller_identity(2, identity.clone());
        shared.set_controller_identity(9, identity.clone());

        assert!(shared.take_dirty());
        assert!(!shared.take_dirty());
        assert_eq!(shared.controller_identity(2), Some(identity));
        assert_eq!(shared.controller_identities()[0], None);
    }

    fn claimed(vendor: u16) -> ControllerIdentity {
        ControllerIdentity {
            vendor,
            product: 0x0100,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_claim_during_save_survives_reload_echo() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("input.yaml");
        let shared = SharedConfig::new(InputConfig::default());

        shared.set_controller_identity(0, claimed(1));
        assert!(shared.save_if_dirty(&path).await?);

        // Next player claims before the watcher delivers the file we just wrote
        shared.set_controller_identity(1, claimed(2));
        let echo = InputConfig::load(&path).await?;
        assert_eq!(shared.apply_reload(echo), ReloadOutcome::OwnWrite);

        assert_eq!(shared.controller_identity(1), Some(claimed(2)));
        assert!(shared.save_if_dirty(&path).await?);
        let saved = InputConfig::load(&path).await?;
        assert_eq!(saved.controllers[0], Some(claimed(1)));
        assert_eq!(saved.controllers[1], Some(claimed(2)));
        Ok(())
    }

    #[test]
    fn test_external_edit_keeps_unsaved_claims() {
        let shared = SharedConfig::new(InputConfig::default());
        shared.set_controller_identity(0, claimed(1));

        let edited = InputConfig {
            rumble_strength: 90,
            ..InputConfig::default()
        };
        assert_eq!(shared.apply_reload(edited), ReloadOutcome::Merged);

        let config = shared.snapshot();
        assert_eq!(config.rumble_strength, 90);
        assert_eq!(config.controllers[0], Some(claimed(1)));
        assert!(shared.take_dirty());
    }

    #[test]
    fn test_external_edit_replaces_clean_config() {
        let shared = SharedConfig::new(InputConfig::default());
        let mut edited = InputConfig::default();
        edited.controllers[2] = Some(claimed(7));
        edited.single_controller = false;

        assert_eq!(shared.apply_reload(edited.clone()), ReloadOutcome::Replaced);
        assert_eq!(shared.snapshot(), edited);
        assert!(!shared.take_dirty());
    }

    #[tokio::test]
    async fn test_save_if_dirty_skips_clean_config() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("input.yaml");
        let shared = SharedConfig::new(InputConfig::default());

        assert!(!shared.save_if_dirty(&path).await?);
        assert!(!path.exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_save_and_load_roundtrip() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("nested").join("input.yaml");

        let mut config = InputConfig::load_or_create(&path).await?;
        assert_eq!(config, InputConfig::default());

        config.controllers[1] = Some(ControllerIdentity {
            serial: "ABC".to_string(),
            vendor: 0x057e,
            product: 0x2009,
            version: 0x0111,
            crc16: 0x1234,
            player_index: 1,
        });
        config.single_controller = false;
        config.save(&path).await?;

        let loaded = InputConfig::load(&path).await?;
        assert_eq!(loaded, config);
        assert_eq!(loaded.controllers[1].as_ref().map(|c| c.player_index), Some(1));
        Ok(())
    }
}
