use nalgebra::{UnitQuaternion, Vector3};

use super::frames;

// ---------------------------------------------------------------------------
// Flight state snapshot (host → core, read-only each tick)
// ---------------------------------------------------------------------------

/// Attitude and flight-path snapshot supplied by the host once per tick.
///
/// Angles are in degrees. Vectors are world-frame (the host's frame; the
/// demo plant uses East-North-Up). The body frame is forward-right-down.
#[derive(Debug, Clone)]
pub struct FlightState {
    pub time: f64,               // s
    pub heading: f64,            // deg, [0, 360)
    pub pitch: f64,              // deg, [-90, 90]
    pub roll: f64,               // deg, (-180, 180], left wing down positive
    pub yaw: f64,                // deg, sideslip of the surface velocity
    pub aoa: f64,                // deg, angle of attack
    pub vertical_speed: f64,     // m/s
    pub altitude: f64,           // m
    pub surface_speed: f64,      // m/s
    pub latitude: f64,           // deg
    pub grounded: bool,          // landed or without control authority
    pub host_sas_engaged: bool,  // host's own stability system is on
    pub attitude: UnitQuaternion<f64>,     // body → world
    pub angular_velocity: Vector3<f64>,    // deg/s about body forward, right, down
    pub up: Vector3<f64>,                  // local vertical, unit
    pub velocity: Vector3<f64>,            // orbital velocity, world frame
    pub target_relative: Option<Vector3<f64>>, // target position minus own position
    pub maneuver: Option<Vector3<f64>>,        // planned burn direction
}

impl FlightState {
    /// Body forward (nose) axis in world frame.
    pub fn forward(&self) -> Vector3<f64> {
        self.attitude * Vector3::x()
    }

    /// Body right (starboard wing) axis in world frame.
    pub fn right(&self) -> Vector3<f64> {
        self.attitude * Vector3::y()
    }

    /// Body down (belly) axis in world frame.
    pub fn down(&self) -> Vector3<f64> {
        self.attitude * Vector3::z()
    }

    /// Roll, pitch and yaw body rates in deg/s.
    pub fn roll_rate(&self) -> f64 {
        self.angular_velocity.x
    }

    pub fn pitch_rate(&self) -> f64 {
        self.angular_velocity.y
    }

    pub fn yaw_rate(&self) -> f64 {
        self.angular_velocity.z
    }
}

impl Default for FlightState {
    /// Level flight heading north, ENU world frame.
    fn default() -> Self {
        let up = Vector3::z();
        let north = Vector3::y();
        Self {
            time: 0.0,
            heading: 0.0,
            pitch: 0.0,
            roll: 0.0,
            yaw: 0.0,
            aoa: 0.0,
            vertical_speed: 0.0,
            altitude: 1000.0,
            surface_speed: 100.0,
            latitude: 0.0,
            grounded: false,
            host_sas_engaged: false,
            attitude: frames::attitude_from_euler(0.0, 0.0, 0.0, &up, &north),
            angular_velocity: Vector3::zeros(),
            up,
            velocity: north * 100.0,
            target_relative: None,
            maneuver: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Control command (core → host)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControlCommand {
    pub roll: f64,     // [-1, 1], positive = roll right (reduces `FlightState::roll`)
    pub pitch: f64,    // [-1, 1], positive = nose up
    pub yaw: f64,      // [-1, 1], positive = nose right
    pub throttle: f64, // [0, 1]
}

impl ControlCommand {
    /// Clamp every axis into its valid range.
    pub fn clamped(self) -> Self {
        Self {
            roll: self.roll.clamp(-1.0, 1.0),
            pitch: self.pitch.clamp(-1.0, 1.0),
            yaw: self.yaw.clamp(-1.0, 1.0),
            throttle: self.throttle.clamp(0.0, 1.0),
        }
    }
}

// ---------------------------------------------------------------------------
// Simulation config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub dt: f64,
    pub max_time: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt: 0.02,          // 50 Hz physics tick
            max_time: 120.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn default_state_points_north_wings_level() {
        let s = FlightState::default();
        assert_abs_diff_eq!(s.forward(), Vector3::y(), epsilon = 1e-12);
        assert_abs_diff_eq!(s.right(), Vector3::x(), epsilon = 1e-12);
        assert_abs_diff_eq!(s.down(), -Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn command_clamp() {
        let c = ControlCommand { roll: 2.0, pitch: -3.0, yaw: 0.5, throttle: -0.1 }.clamped();
        assert_eq!(c, ControlCommand { roll: 1.0, pitch: -1.0, yaw: 0.5, throttle: 0.0 });
    }
}
