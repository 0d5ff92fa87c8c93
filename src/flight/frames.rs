use nalgebra::{Matrix3, Rotation3, UnitQuaternion, Vector3};

use super::state::FlightState;
use crate::angle::wrap_heading;

/// Below this surface speed the flow angles are reported as zero.
const MIN_FLOW_SPEED: f64 = 1.0;

// ---------------------------------------------------------------------------
// Attitude construction
// ---------------------------------------------------------------------------

/// Attitude (body → world) from body forward/right/down axes given in world
/// frame. The axes must be orthonormal and right-handed.
pub fn attitude_from_axes(
    forward: &Vector3<f64>,
    right: &Vector3<f64>,
    down: &Vector3<f64>,
) -> UnitQuaternion<f64> {
    let m = Matrix3::from_columns(&[*forward, *right, *down]);
    UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(m))
}

/// Attitude from heading, pitch and roll (degrees) relative to the local
/// `up` / `north` directions. Roll is positive left wing down.
pub fn attitude_from_euler(
    heading: f64,
    pitch: f64,
    roll: f64,
    up: &Vector3<f64>,
    north: &Vector3<f64>,
) -> UnitQuaternion<f64> {
    let up = up.normalize();
    let north = (north - up * north.dot(&up)).normalize();
    let east = north.cross(&up);

    let (sh, ch) = heading.to_radians().sin_cos();
    let (sp, cp) = pitch.to_radians().sin_cos();
    let (sr, cr) = roll.to_radians().sin_cos();

    let fwd_level = north * ch + east * sh;
    let right_level = east * ch - north * sh;

    let forward = fwd_level * cp + up * sp;
    let top = up * cp - fwd_level * sp;

    let right = right_level * cr + top * sr;
    let top = top * cr - right_level * sr;

    attitude_from_axes(&forward, &right, &(-top))
}

// ---------------------------------------------------------------------------
// Flight angles from world-frame kinematics
// ---------------------------------------------------------------------------

/// Raw host kinematics, before reduction to flight angles.
#[derive(Debug, Clone)]
pub struct Kinematics {
    pub time: f64,
    pub attitude: UnitQuaternion<f64>,
    pub angular_velocity: Vector3<f64>, // deg/s, body frame
    pub up: Vector3<f64>,
    pub north: Vector3<f64>,
    pub surface_velocity: Vector3<f64>,
    pub orbital_velocity: Vector3<f64>,
    pub altitude: f64,
    pub latitude: f64,
    pub grounded: bool,
    pub host_sas_engaged: bool,
    pub target_relative: Option<Vector3<f64>>,
    pub maneuver: Option<Vector3<f64>>,
}

impl FlightState {
    /// Reduce host kinematics to the flight angles the control loops use.
    pub fn from_kinematics(k: &Kinematics) -> Self {
        let up = k.up.normalize();
        let north = (k.north - up * k.north.dot(&up)).normalize();
        let east = north.cross(&up);

        let forward = k.attitude * Vector3::x();
        let right = k.attitude * Vector3::y();
        let down = k.attitude * Vector3::z();

        let pitch = forward.dot(&up).clamp(-1.0, 1.0).asin().to_degrees();

        // heading of the nose projected onto the horizon
        let fwd_level = forward - up * forward.dot(&up);
        let fwd_level = if fwd_level.norm() > 1e-9 {
            fwd_level.normalize()
        } else {
            // nose vertical: the belly points away from the heading
            let belly = down - up * down.dot(&up);
            if up.dot(&forward) > 0.0 { belly.normalize() } else { -belly.normalize() }
        };
        let heading = wrap_heading(fwd_level.dot(&east).atan2(fwd_level.dot(&north)).to_degrees());

        // positive when the right wing is raised
        let roll = right.dot(&up).atan2(-down.dot(&up)).to_degrees();

        let speed = k.surface_velocity.norm();
        let (aoa, yaw) = if speed > MIN_FLOW_SPEED {
            let v = k.surface_velocity / speed;
            let (vf, vr, vd) = (v.dot(&forward), v.dot(&right), v.dot(&down));
            (vd.atan2(vf).to_degrees(), vr.atan2(vf).to_degrees())
        } else {
            (0.0, 0.0)
        };

        FlightState {
            time: k.time,
            heading,
            pitch,
            roll,
            yaw,
            aoa,
            vertical_speed: k.surface_velocity.dot(&up),
            altitude: k.altitude,
            surface_speed: speed,
            latitude: k.latitude,
            grounded: k.grounded,
            host_sas_engaged: k.host_sas_engaged,
            attitude: k.attitude,
            angular_velocity: k.angular_velocity,
            up,
            velocity: k.orbital_velocity,
            target_relative: k.target_relative,
            maneuver: k.maneuver,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn kinematics(heading: f64, pitch: f64, roll: f64, vel: Vector3<f64>) -> Kinematics {
        let up = Vector3::z();
        let north = Vector3::y();
        Kinematics {
            time: 0.0,
            attitude: attitude_from_euler(heading, pitch, roll, &up, &north),
            angular_velocity: Vector3::zeros(),
            up,
            north,
            surface_velocity: vel,
            orbital_velocity: vel,
            altitude: 500.0,
            latitude: 10.0,
            grounded: false,
            host_sas_engaged: false,
            target_relative: None,
            maneuver: None,
        }
    }

    #[test]
    fn euler_round_trip_through_kinematics() {
        let cases = [(0.0, 0.0, 0.0), (45.0, 10.0, -20.0), (270.0, -30.0, 60.0), (135.0, 5.0, 170.0)];
        for (h, p, r) in cases {
            let s = FlightState::from_kinematics(&kinematics(h, p, r, Vector3::zeros()));
            assert_abs_diff_eq!(s.heading, h, epsilon = 1e-9);
            assert_abs_diff_eq!(s.pitch, p, epsilon = 1e-9);
            assert_abs_diff_eq!(s.roll, r, epsilon = 1e-9);
        }
    }

    #[test]
    fn heading_east_points_nose_east() {
        let q = attitude_from_euler(90.0, 0.0, 0.0, &Vector3::z(), &Vector3::y());
        assert_abs_diff_eq!(q * Vector3::x(), Vector3::x(), epsilon = 1e-12);
        assert_abs_diff_eq!(q * Vector3::y(), -Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn climbing_flow_gives_positive_aoa() {
        // nose 5 degrees above a level velocity vector
        let s = FlightState::from_kinematics(&kinematics(0.0, 5.0, 0.0, Vector3::new(0.0, 100.0, 0.0)));
        assert_abs_diff_eq!(s.aoa, 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(s.yaw, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(s.surface_speed, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn slow_flow_reports_zero_angles() {
        let s = FlightState::from_kinematics(&kinematics(0.0, 5.0, 0.0, Vector3::new(0.5, 0.0, 0.0)));
        assert_eq!(s.aoa, 0.0);
        assert_eq!(s.yaw, 0.0);
    }

    #[test]
    fn vertical_speed_is_along_up() {
        let s = FlightState::from_kinematics(&kinematics(0.0, 0.0, 0.0, Vector3::new(0.0, 80.0, 6.0)));
        assert_abs_diff_eq!(s.vertical_speed, 6.0, epsilon = 1e-12);
    }
}
