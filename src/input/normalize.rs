//! Shared normalization functions for controller stick and trigger values.
//!
//! Every axis query goes through these helpers so that binding reads, the
//! right-stick camera read and the N64 stick read-out agree on scale.
//!
//! # Key Functions
//!
//! - [`half_axis`]: one direction of a raw axis, in [0.0, 1.0]
//! - [`apply_joystick_deadzone`]: per-axis deadzone with rescale
//! - [`smoothstep`]: the rumble spin-up curve

use super::types::AXIS_FULL_SCALE;

/// Convert a raw axis reading to a signed float.
///
/// Divides by 32768 so that `i16::MIN` maps to exactly -1.0; the positive
/// end tops out just below 1.0.
pub fn raw_to_float(raw: i16) -> f32 {
    raw as f32 * (1.0 / AXIS_FULL_SCALE)
}

/// Read one half of an axis.
///
/// # Arguments
/// * `raw` - Raw axis value from the backend (-32768 to 32767)
/// * `negative` - Read the negative half (the value is sign-flipped before clamping)
///
/// # Returns
/// * Magnitude of the requested half, clamped to [0.0, 1.0]
///
/// # Example
/// ```
/// use recomp_input::input::normalize::half_axis;
///
/// assert_eq!(half_axis(-32768, true), 1.0);
/// assert_eq!(half_axis(-32768, false), 0.0);
/// ```
pub fn half_axis(raw: i16, negative: bool) -> f32 {
    let value = raw_to_float(raw);
    let value = if negative { -value } else { value };
    value.clamp(0.0, 1.0)
}

/// Apply a per-axis (square) deadzone and rescale the remaining range.
///
/// Values whose magnitude is below `deadzone` become 0.0. Others are moved
/// toward zero by `deadzone` and divided by `1 - deadzone`, so full
/// deflection still reaches ±1.0.
///
/// # Arguments
/// * `x`, `y` - Stick values in [-1.0, 1.0]
/// * `deadzone` - Deadzone as a fraction (configured percent / 100)
pub fn apply_joystick_deadzone(x: f32, y: f32, deadzone: f32) -> (f32, f32) {
    (deadzone_axis(x, deadzone), deadzone_axis(y, deadzone))
}

fn deadzone_axis(value: f32, deadzone: f32) -> f32 {
    if value.abs() < deadzone {
        return 0.0;
    }
    if deadzone >= 1.0 {
        return 0.0;
    }

    let shifted = if value > 0.0 {
        value - deadzone
    } else {
        value + deadzone
    };
    shifted / (1.0 - deadzone)
}

/// Smoothstep curve `3t² - 2t³` over [0, 1]
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
