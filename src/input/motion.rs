//! Gyro/accelerometer fusion and pending-delta accumulation
//!
//! Sensor samples arrive far more often than the game polls. Each gyro
//! sample is fused into a per-device [`MotionFusion`] and the resulting
//! player-space rate is added into [`PendingDeltas`]; the poll step latches
//! the sum and resets the accumulator.

use glam::Vec3;

/// Radians to degrees
pub const RAD_TO_DEG: f32 = 180.0 / std::f32::consts::PI;

/// Standard gravity in m/s², used to convert accelerometer samples to g
pub const STANDARD_GRAVITY: f32 = 9.80665;

/// Yaw relaxation factor for player-space gyro
const YAW_RELAX: f32 = 1.41;

/// Weight of the accelerometer when correcting the tracked gravity vector
const GRAVITY_CORRECTION: f32 = 0.02;

/// Time the device must stay still before the gyro bias is sampled (seconds)
const STILLNESS_WARMUP: f32 = 1.0;
/// Max change of the gyro reading between samples that still counts as still (deg/s)
const STILLNESS_GYRO_TOLERANCE: f32 = 3.0;
/// Max change of the accelerometer reading between samples that still counts as still (g)
const STILLNESS_ACCEL_TOLERANCE: f32 = 0.02;
/// Max bias-corrected rotation rate that still counts as still (deg/s)
const STILLNESS_MAX_RATE: f32 = 6.0;
/// Rate at which the bias estimate follows the gyro while still (per second)
const BIAS_ADAPT_RATE: f32 = 0.5;

/// Per-device motion fusion state
///
/// Tracks the gravity direction in controller space with a complementary
/// filter and estimates the gyro bias whenever the controller rests still.
#[derive(Debug, Clone)]
pub struct MotionFusion {
    /// Unit gravity vector in controller space (points down)
    gravity: Vec3,
    /// Estimated gyro bias (deg/s)
    bias: Vec3,
    /// Latest bias-corrected gyro reading (deg/s)
    gyro: Vec3,
    prev_raw_gyro: Option<Vec3>,
    prev_accel: Option<Vec3>,
    still_time: f32,
}

impl Default for MotionFusion {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionFusion {
    pub fn new() -> Self {
        Self {
            gravity: Vec3::NEG_Y,
            bias: Vec3::ZERO,
            gyro: Vec3::ZERO,
            prev_raw_gyro: None,
            prev_accel: None,
            still_time: 0.0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Feed one sample
    ///
    /// # Arguments
    /// * `gyro` - Angular velocity in deg/s
    /// * `accel` - Acceleration in g (latest cached reading)
    /// * `dt` - Seconds since the previous gyro sample
    pub fn process(&mut self, gyro: Vec3, accel: Vec3, dt: f32) {
        let dt = dt.max(0.0);
        self.calibrate(gyro, accel, dt);
        self.gyro = gyro - self.bias;

        // Gravity is fixed in the world, so in controller space it turns
        // opposite to the controller's own rotation
        let omega = self.gyro / RAD_TO_DEG * dt;
        if let Some(g) = (self.gravity + self.gravity.cross(omega)).try_normalize() {
            self.gravity = g;
        }

        // Accelerometer reads the reaction to gravity
        if let Some(measured) = (-accel).try_normalize() {
            if let Some(g) = self.gravity.lerp(measured, GRAVITY_CORRECTION).try_normalize() {
                self.gravity = g;
            }
        }
    }

    fn calibrate(&mut self, gyro: Vec3, accel: Vec3, dt: f32) {
        let steady = match (self.prev_raw_gyro, self.prev_accel) {
            (Some(prev_gyro), Some(prev_accel)) => {
                gyro.distance(prev_gyro) < STILLNESS_GYRO_TOLERANCE
                    && accel.distance(prev_accel) < STILLNESS_ACCEL_TOLERANCE
            },
            _ => false,
        };
        self.prev_raw_gyro = Some(gyro);
        self.prev_accel = Some(accel);

        // A constant-rate turn reads steady too; only near-zero rates are rest
        let slow = (gyro - self.bias).length() < STILLNESS_MAX_RATE;

        if !(steady && slow) {
            self.still_time = 0.0;
            return;
        }

        self.still_time += dt;
        if self.still_time >= STILLNESS_WARMUP {
            let rate = (BIAS_ADAPT_RATE * dt).min(1.0);
            self.bias = self.bias.lerp(gyro, rate);
        }
    }

    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    pub fn bias(&self) -> Vec3 {
        self.bias
    }

    /// Player-space gyro rate as `(yaw, pitch)` in deg/s
    ///
    /// Yaw is the rotation around the world's vertical axis, relaxed toward
    /// the local yaw/roll magnitude so that tilted grips still turn the camera.
    pub fn player_space_gyro(&self) -> (f32, f32) {
        let Vec3 { x: gx, y: gy, z: gz } = self.gyro;
        let world_yaw = -(self.gravity.y * gy + self.gravity.z * gz);
        if world_yaw == 0.0 {
            return (0.0, gx);
        }
        let local_mag = (gy * gy + gz * gz).sqrt();
        let yaw = world_yaw.signum() * (world_yaw.abs() * YAW_RELAX).min(local_mag);
        (yaw, gx)
    }
}

/// Accumulate-then-drain storage for rotation and pointer deltas
///
/// Writers add into the pending slot; [`latch`](Self::latch) moves pending to
/// current and zeroes pending, so each sample is consumed by exactly one poll.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PendingDeltas {
    pending_rotation: [f32; 2],
    pending_mouse: [f32; 2],
    rotation: [f32; 2],
    mouse: [f32; 2],
}

impl PendingDeltas {
    pub fn add_rotation(&mut self, x: f32, y: f32) {
        self.pending_rotation[0] += x;
        self.pending_rotation[1] += y;
    }

    pub fn add_mouse(&mut self, x: f32, y: f32) {
        self.pending_mouse[0] += x;
        self.pending_mouse[1] += y;
    }

    pub fn latch(&mut self) {
        self.rotation = std::mem::take(&mut self.pending_rotation);
        self.mouse = std::mem::take(&mut self.pending_mouse);
    }

    /// Rotation latched by the last poll
    pub fn rotation(&self) -> [f32; 2] {
        self.rotation
    }

    /// Pointer motion latched by the last poll
    pub fn mouse(&self) -> [f32; 2] {
        self.mouse
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLAT: Vec3 = Vec3::Y;

    #[test]
    fn test_flat_controller_yaw() {
        let mut fusion = MotionFusion::new();
        fusion.process(Vec3::new(0.0, 90.0, 0.0), FLAT, 0.0);

        let (yaw, pitch) = fusion.player_space_gyro();
        assert!((yaw - 90.0).abs() < 0.01);
        assert_eq!(pitch, 0.0);
    }

    #[test]
    fn test_pitch_follows_x_axis() {
        let mut fusion = MotionFusion::new();
        fusion.process(Vec3::new(45.0, 0.0, 0.0), FLAT, 0.0);

        let (yaw, pitch) = fusion.player_space_gyro();
        assert_eq!(yaw, 0.0);
        assert_eq!(pitch, 45.0);
    }

    #[test]
    fn test_gravity_follows_accelerometer() {
        let mut fusion = MotionFusion::new();
        // Controller standing on its side: gravity along -x
        for _ in 0..500 {
            fusion.process(Vec3::ZERO, Vec3::X, 0.01);
        }
        let g = fusion.gravity();
        assert!(g.x < -0.9, "gravity did not converge: {:?}", g);
    }

    #[test]
    fn test_stillness_estimates_bias() {
        let mut fusion = MotionFusion::new();
        for _ in 0..1000 {
            fusion.process(Vec3::new(0.0, 2.0, 0.0), FLAT, 0.01);
        }
        assert!((fusion.bias().y - 2.0).abs() < 0.1);

        let (yaw, _) = fusion.player_space_gyro();
        assert!(yaw.abs() < 0.1);
    }

    #[test]
    fn test_steady_turn_keeps_its_rate() {
        let mut fusion = MotionFusion::new();
        for _ in 0..400 {
            fusion.process(Vec3::new(0.0, 60.0, 0.0), FLAT, 0.01);
        }
        assert_eq!(fusion.bias(), Vec3::ZERO);

        let (yaw, _) = fusion.player_space_gyro();
        assert!((yaw - 60.0).abs() < 0.01, "turn rate decayed to {}", yaw);
    }

    #[test]
    fn test_moving_controller_keeps_bias() {
        let mut fusion = MotionFusion::new();
        for i in 0..200 {
            let rate = if i % 2 == 0 { 50.0 } else { -50.0 };
            fusion.process(Vec3::new(0.0, rate, 0.0), FLAT, 0.01);
        }
        assert_eq!(fusion.bias(), Vec3::ZERO);
    }

    #[test]
    fn test_reset() {
        let mut fusion = MotionFusion::new();
        fusion.process(Vec3::splat(10.0), Vec3::X, 0.5);
        fusion.reset();
        assert_eq!(fusion.gravity(), Vec3::NEG_Y);
        assert_eq!(fusion.player_space_gyro(), (0.0, 0.0));
    }

    #[test]
    fn test_pending_deltas_accumulate_and_drain() {
        let mut deltas = PendingDeltas::default();
        deltas.add_rotation(1.0, 1.0);
        deltas.add_rotation(2.0, 2.0);
        deltas.add_rotation(3.0, 3.0);

        // Nothing visible until latched
        assert_eq!(deltas.rotation(), [0.0, 0.0]);

        deltas.latch();
        assert_eq!(deltas.rotation(), [6.0, 6.0]);
        // Stable between polls
        assert_eq!(deltas.rotation(), [6.0, 6.0]);

        deltas.latch();
        assert_eq!(deltas.rotation(), [0.0, 0.0]);
    }

    #[test]
    fn test_mouse_and_rotation_independent() {
        let mut deltas = PendingDeltas::default();
        deltas.add_mouse(4.0, -2.0);
        deltas.latch();
        assert_eq!(deltas.mouse(), [4.0, -2.0]);
        assert_eq!(deltas.rotation(), [0.0, 0.0]);
    }
}
