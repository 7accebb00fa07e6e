//! Rumble envelope simulation
//!
//! The N64 Rumble Pak motor takes a moment to spin up and keeps turning for a
//! while after power is cut. Each slot keeps an intensity accumulator that
//! ramps up while rumble is requested and decays once it stops; the motor
//! strength sent to the controller is the smoothstep of that accumulator.

use super::normalize::smoothstep;
use super::types::MAX_PLAYERS;

/// Intensity added per tick while rumble is requested
pub const RUMBLE_ATTACK: f32 = 0.17;
/// Multiplicative decay per tick while rumble is off
pub const RUMBLE_DECAY: f32 = 0.92;
/// Constant subtracted after the multiplicative decay
pub const RUMBLE_RELEASE: f32 = 0.01;

/// Duration passed with every rumble command; the game turns rumble off itself
pub const RUMBLE_DURATION_MS: u32 = 1_000_000;

/// Per-slot attack/decay state
#[derive(Debug, Clone, Default)]
pub struct RumbleEnvelope {
    intensity: [f32; MAX_PLAYERS],
    active: [bool; MAX_PLAYERS],
}

impl RumbleEnvelope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the game's rumble request for a slot (out-of-range slots are ignored)
    pub fn set_active(&mut self, slot: usize, on: bool) {
        if let Some(active) = self.active.get_mut(slot) {
            *active = on;
        }
    }

    pub fn is_active(&self, slot: usize) -> bool {
        self.active.get(slot).copied().unwrap_or(false)
    }

    pub fn intensity(&self, slot: usize) -> f32 {
        self.intensity.get(slot).copied().unwrap_or(0.0)
    }

    /// Advance every slot by one tick and return the smoothed intensities
    pub fn tick(&mut self) -> [f32; MAX_PLAYERS] {
        let mut smoothed = [0.0; MAX_PLAYERS];

        for slot in 0..MAX_PLAYERS {
            let current = &mut self.intensity[slot];
            if self.active[slot] {
                *current = (*current + RUMBLE_ATTACK).min(1.0);
            } else {
                *current = (*current * RUMBLE_DECAY - RUMBLE_RELEASE).max(0.0);
            }
            smoothed[slot] = smoothstep(*current);
        }

        smoothed
    }
}

/// Scale a smoothed intensity to a motor strength
///
/// `strength_percent` is the configured rumble strength (0 to 100).
pub fn motor_strength(smoothed: f32, strength_percent: u32) -> u16 {
    let scale = strength_percent.min(100) as f32 * u16::MAX as f32 / 100.0;
    (smoothed.clamp(0.0, 1.0) * scale) as u16
}
