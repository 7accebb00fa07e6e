//! recomp-input
//!
//! Controller input, gyro, rumble and player assignment for natively
//! recompiled N64 games.

pub mod config;
pub mod console;
pub mod input;
