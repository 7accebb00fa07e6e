//! Stable controller identification across reconnects
//!
//! A [`ControllerIdentity`] recognizes "the same physical controller" regardless
//! of connection order. It is derived from the 16-byte SDL-format joystick GUID
//! (which gilrs exposes as the gamepad UUID) plus the optional serial number.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bus types below this value (or the virtual bus) carry vendor/product info in the GUID
const BUS_INFO_LIMIT: u16 = 0x20;
const BUS_VIRTUAL: u16 = 0xFF;

/// Identity of a physical controller
///
/// Equality compares vendor, product, version and crc16, and requires the
/// serials to match (two empty serials count as a match). The
/// `player_index` only breaks ties between otherwise identical controllers.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ControllerIdentity {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub serial: String,
    pub vendor: u16,
    pub product: u16,
    pub version: u16,
    pub crc16: u16,
    /// Native player index reported by the platform (-1 when unknown)
    #[serde(default = "default_player_index")]
    pub player_index: i32,
}

impl ControllerIdentity {
    /// Build an identity from an SDL-format joystick GUID
    ///
    /// Layout (little-endian u16 words): bus, crc16, vendor, 0, product, 0, version, driver data.
    /// GUIDs that don't follow this layout yield zeroed vendor/product/version/crc16.
    pub fn from_sdl_guid(guid: &[u8; 16], serial: Option<&str>, player_index: i32) -> Self {
        let word = |i: usize| u16::from_le_bytes([guid[i * 2], guid[i * 2 + 1]]);
        let bus = word(0);

        let (vendor, product, version, crc16) =
            if (bus < BUS_INFO_LIMIT || bus == BUS_VIRTUAL) && word(3) == 0 && word(5) == 0 {
                (word(2), word(4), word(6), word(1))
            } else {
                (0, 0, 0, 0)
            };

        Self {
            serial: serial.unwrap_or_default().to_string(),
            vendor,
            product,
            version,
            crc16,
            player_index,
        }
    }

    /// Distance between the stored player index and a candidate's native index
    pub fn player_index_distance(&self, other: &ControllerIdentity) -> i64 {
        (self.player_index as i64 - other.player_index as i64).abs()
    }
}

impl PartialEq for ControllerIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.vendor == other.vendor
            && self.product == other.product
            && self.version == other.version
            && self.crc16 == other.crc16
            && self.serial == other.serial
    }
}

impl Eq for ControllerIdentity {}

impl fmt::Display for ControllerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04x}:{:04x} v{:04x} crc {:04x}",
            self.vendor, self.product, self.version, self.crc16
        )?;
        if !self.serial.is_empty() {
            write!(f, " sn {}", self.serial)?;
        }
        Ok(())
    }
}

fn default_player_index() -> i32 {
    -1
}
