use nalgebra::{UnitQuaternion, Vector3};

use crate::flight::{attitude_from_axes, FlightState};

/// Direction vectors shorter than this are treated as undefined.
const MIN_DIRECTION_NORM: f64 = 1.0e-6;

// ---------------------------------------------------------------------------
// Guidance: target orientation for the stability assist
// ---------------------------------------------------------------------------

/// What the stability assist points the vehicle at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum GuidanceMode {
    /// Hold the attitude captured on activation (pitch / heading / roll).
    #[default]
    Hold,
    Prograde,
    Retrograde,
    RadialIn,
    RadialOut,
    Normal,
    AntiNormal,
    Target,
    Maneuver,
}

impl GuidanceMode {
    pub const ALL: [GuidanceMode; 9] = [
        GuidanceMode::Hold,
        GuidanceMode::Prograde,
        GuidanceMode::Retrograde,
        GuidanceMode::RadialIn,
        GuidanceMode::RadialOut,
        GuidanceMode::Normal,
        GuidanceMode::AntiNormal,
        GuidanceMode::Target,
        GuidanceMode::Maneuver,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            GuidanceMode::Hold => "hold",
            GuidanceMode::Prograde => "prograde",
            GuidanceMode::Retrograde => "retrograde",
            GuidanceMode::RadialIn => "radial-in",
            GuidanceMode::RadialOut => "radial-out",
            GuidanceMode::Normal => "normal",
            GuidanceMode::AntiNormal => "anti-normal",
            GuidanceMode::Target => "target",
            GuidanceMode::Maneuver => "maneuver",
        }
    }
}

/// World-frame direction the nose should point in, if the mode defines one
/// for this state. `Hold` never does.
///
/// Normal is `up × velocity` (orbital angular momentum); radial-out is
/// `velocity × normal`, which points away from the body for a circular orbit.
pub fn target_direction(mode: GuidanceMode, state: &FlightState) -> Option<Vector3<f64>> {
    let v = state.velocity;
    let normal = state.up.cross(&v);
    let dir = match mode {
        GuidanceMode::Hold => return None,
        GuidanceMode::Prograde => v,
        GuidanceMode::Retrograde => -v,
        GuidanceMode::Normal => normal,
        GuidanceMode::AntiNormal => -normal,
        GuidanceMode::RadialOut => v.cross(&normal),
        GuidanceMode::RadialIn => -v.cross(&normal),
        GuidanceMode::Target => state.target_relative?,
        GuidanceMode::Maneuver => state.maneuver?,
    };
    let norm = dir.norm();
    if norm < MIN_DIRECTION_NORM {
        None
    } else {
        Some(dir / norm)
    }
}

/// Target attitude (body → world) for `mode`: nose along the mode's
/// direction, rolled so the vehicle's top sits `roll_setpoint` degrees
/// (left wing down positive) from the local vertical.
///
/// Returns `None` when the mode has no direction in this state.
pub fn target_orientation(
    mode: GuidanceMode,
    state: &FlightState,
    roll_setpoint: f64,
) -> Option<UnitQuaternion<f64>> {
    let forward = target_direction(mode, state)?;

    // reference top: local up, else the current top, else behind the current
    // nose (pointing straight up or down from level flight)
    let top = [state.up, -state.down(), -state.forward()]
        .iter()
        .map(|v| v - forward * v.dot(&forward))
        .find(|v| v.norm() > MIN_DIRECTION_NORM)?
        .normalize();
    let right = forward.cross(&top);

    let (sr, cr) = roll_setpoint.to_radians().sin_cos();
    let rolled_right = right * cr + top * sr;
    let rolled_top = top * cr - right * sr;

    Some(attitude_from_axes(&forward, &rolled_right, &(-rolled_top)))
}

/// Attitude error of `state` against `target` as body-frame
/// `(roll, pitch, yaw)` degrees, in process-value-minus-setpoint form.
///
/// Roll is positive when the vehicle sits left wing down of the target,
/// pitch when the nose is above it and yaw when the nose is right of it.
pub fn attitude_error(state: &FlightState, target: &UnitQuaternion<f64>) -> Vector3<f64> {
    // rotation that would carry the current attitude onto the target, body frame
    let delta = (state.attitude.inverse() * target).scaled_axis();
    Vector3::new(delta.x, -delta.y, -delta.z).map(f64::to_degrees)
}
