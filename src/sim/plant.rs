use nalgebra::{Quaternion, UnitQuaternion, Vector3};

use crate::angle::lerp;
use crate::flight::{attitude_from_euler, ControlCommand, FlightState, Kinematics};

pub const G0: f64 = 9.80665;

/// Metres of northward travel per degree of latitude.
const METRES_PER_DEG_LAT: f64 = 111_320.0;

/// Flow angles are clamped here; beyond it the toy lift model stalls flat.
const MAX_FLOW_ANGLE: f64 = 0.3;

// ---------------------------------------------------------------------------
// Toy aircraft: parameters and state
// ---------------------------------------------------------------------------

/// Lumped coefficients of a small fixed-wing aircraft. Control authorities
/// are angular accelerations (rad/s^2) at full deflection.
#[derive(Debug, Clone)]
pub struct AircraftParams {
    pub mass: f64,             // kg
    pub idle_thrust: f64,      // N at zero throttle
    pub max_thrust: f64,       // N at full throttle
    pub drag_coeff: f64,       // N per (m/s)^2
    pub lift_slope: f64,       // N per rad per (m/s)^2
    pub trim_aoa: f64,         // rad, hands-off angle of attack
    pub roll_authority: f64,
    pub pitch_authority: f64,
    pub yaw_authority: f64,
    pub pitch_stability: f64,  // rad/s^2 per rad of AoA off trim
    pub weathervane: f64,      // rad/s^2 per rad of sideslip
    pub rate_damping: Vector3<f64>, // 1/s, per body axis
}

impl Default for AircraftParams {
    /// Trimmed for level flight at 100 m/s with roughly half throttle.
    fn default() -> Self {
        let mass = 1000.0;
        let cruise = 100.0;
        let trim_aoa = 4.0_f64.to_radians();
        Self {
            mass,
            idle_thrust: 0.0,
            max_thrust: 7000.0,
            drag_coeff: 0.35,
            lift_slope: mass * G0 / (trim_aoa * cruise * cruise),
            trim_aoa,
            roll_authority: 4.0,
            pitch_authority: 3.0,
            yaw_authority: 2.0,
            pitch_stability: 8.0,
            weathervane: 6.0,
            rate_damping: Vector3::new(4.0, 3.0, 3.0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AircraftState {
    pub time: f64,
    pub pos: Vector3<f64>,          // m, ENU from the start point
    pub vel: Vector3<f64>,          // m/s, ENU
    pub quat: UnitQuaternion<f64>,  // body (FRD) → ENU
    pub omega: Vector3<f64>,        // rad/s, body frame
}

impl AircraftState {
    /// Level flight at `altitude` and `speed`, nose and velocity along
    /// `heading` with the trim angle of attack.
    pub fn cruise(heading: f64, altitude: f64, speed: f64, params: &AircraftParams) -> Self {
        let quat = attitude_from_euler(heading, params.trim_aoa.to_degrees(), 0.0, &Vector3::z(), &Vector3::y());
        let (sh, ch) = heading.to_radians().sin_cos();
        Self {
            time: 0.0,
            pos: Vector3::new(0.0, 0.0, altitude),
            vel: Vector3::new(sh, ch, 0.0) * speed,
            quat,
            omega: Vector3::zeros(),
        }
    }

    pub fn apply(&self, d: &Deriv, dt: f64) -> Self {
        let q_raw = self.quat.quaternion() + d.dquat * dt;
        Self {
            time: self.time + dt,
            pos: self.pos + d.dpos * dt,
            vel: self.vel + d.dvel * dt,
            quat: UnitQuaternion::new_normalize(q_raw),
            omega: self.omega + d.domega * dt,
        }
    }

    /// Flight state seen by the autopilot. `origin_latitude` is the
    /// latitude of the start point.
    pub fn flight_state(&self, origin_latitude: f64) -> FlightState {
        FlightState::from_kinematics(&Kinematics {
            time: self.time,
            attitude: self.quat,
            angular_velocity: self.omega.map(f64::to_degrees),
            up: Vector3::z(),
            north: Vector3::y(),
            surface_velocity: self.vel,
            orbital_velocity: self.vel,
            altitude: self.pos.z,
            latitude: origin_latitude + self.pos.y / METRES_PER_DEG_LAT,
            grounded: self.pos.z <= 0.0,
            host_sas_engaged: false,
            target_relative: None,
            maneuver: None,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Deriv {
    pub dpos: Vector3<f64>,
    pub dvel: Vector3<f64>,
    pub dquat: Quaternion<f64>, // raw, not unit
    pub domega: Vector3<f64>,
}

// ---------------------------------------------------------------------------
// Equations of motion
// ---------------------------------------------------------------------------

/// State derivatives under a constant command.
///
/// Forces: gravity, throttle-scheduled thrust along the nose, quadratic
/// drag against the velocity and lift normal to the wing proportional to
/// angle of attack. Moments: control authority per axis, pitch stiffness
/// about the trim AoA, weathervane yaw into the sideslip and rate damping.
pub fn derivatives(state: &AircraftState, params: &AircraftParams, cmd: &ControlCommand) -> Deriv {
    let cmd = cmd.clamped();
    let forward = state.quat * Vector3::x();
    let down = state.quat * Vector3::z();

    let speed = state.vel.norm();
    let v_body = state.quat.inverse() * state.vel;
    let (aoa, beta) = if speed > 1.0 {
        (
            v_body.z.atan2(v_body.x).clamp(-MAX_FLOW_ANGLE, MAX_FLOW_ANGLE),
            v_body.y.atan2(v_body.x).clamp(-MAX_FLOW_ANGLE, MAX_FLOW_ANGLE),
        )
    } else {
        (0.0, 0.0)
    };

    // --- Forces (world) ---
    let thrust = forward * lerp(cmd.throttle, params.idle_thrust, params.max_thrust);
    let drag = -state.vel * speed * params.drag_coeff;
    let lift = -down * params.lift_slope * aoa * speed * speed;
    let gravity = Vector3::new(0.0, 0.0, -G0 * params.mass);
    let accel = (thrust + drag + lift + gravity) / params.mass;

    // --- Moments (body) ---
    let control = Vector3::new(
        cmd.roll * params.roll_authority,
        cmd.pitch * params.pitch_authority,
        cmd.yaw * params.yaw_authority,
    );
    let aero = Vector3::new(
        0.0,
        -params.pitch_stability * (aoa - params.trim_aoa),
        params.weathervane * beta,
    );
    let damping = -state.omega.component_mul(&params.rate_damping);
    let domega = control + aero + damping;

    let dquat = state.quat.quaternion() * Quaternion::from_imag(state.omega) * 0.5;

    Deriv {
        dpos: state.vel,
        dvel: accel,
        dquat,
        domega,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn trimmed_cruise_is_balanced() {
        let p = AircraftParams::default();
        let s = AircraftState::cruise(0.0, 1000.0, 100.0, &p);
        let throttle = p.drag_coeff * 100.0 * 100.0 / p.max_thrust;
        let d = derivatives(&s, &p, &ControlCommand { throttle, ..Default::default() });
        // lift carries the weight; the trim AoA tilts it back a little
        assert!(d.dvel.z.abs() < 0.5, "vertical accel {}", d.dvel.z);
        assert!(d.dvel.y.abs() < 1.0, "longitudinal accel {}", d.dvel.y);
        assert_abs_diff_eq!(d.domega, Vector3::zeros(), epsilon = 1e-9);
    }

    #[test]
    fn commands_accelerate_the_right_way() {
        let p = AircraftParams::default();
        let s = AircraftState::cruise(0.0, 1000.0, 100.0, &p);
        let d = derivatives(&s, &p, &ControlCommand { roll: 1.0, pitch: 0.5, yaw: -0.5, throttle: 0.0 });
        assert!(d.domega.x > 0.0); // right wing down
        assert!(d.domega.y > 0.0); // nose up
        assert!(d.domega.z < 0.0); // nose left
    }

    #[test]
    fn cruise_state_reports_flight_angles() {
        let p = AircraftParams::default();
        let s = AircraftState::cruise(90.0, 500.0, 80.0, &p);
        let fs = s.flight_state(45.0);
        assert_abs_diff_eq!(fs.heading, 90.0, epsilon = 1e-9);
        assert_abs_diff_eq!(fs.aoa, 4.0, epsilon = 1e-9);
        assert_abs_diff_eq!(fs.surface_speed, 80.0, epsilon = 1e-9);
        assert_abs_diff_eq!(fs.latitude, 45.0);
        assert!(!fs.grounded);
    }
}
