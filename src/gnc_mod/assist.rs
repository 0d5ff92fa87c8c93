use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::angle::{relative_angle, wrap_heading};
use crate::config::Thresholds;
use crate::flight::{AxisInput, ControlCommand, FlightState, PilotInput};
use super::axis::{AxisState, FadeConfig};
use super::guidance::{attitude_error, target_orientation, GuidanceMode};
use super::pid::PidChannel;
use super::tuning::{PidTuning, TuningPatch};

// ---------------------------------------------------------------------------
// Axes, tunings and fades
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Pitch,
    Roll,
    Yaw,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::Pitch, Axis::Roll, Axis::Yaw];

    pub fn name(&self) -> &'static str {
        match self {
            Axis::Pitch => "pitch",
            Axis::Roll => "roll",
            Axis::Yaw => "yaw",
        }
    }
}

/// Per-axis assist tunings. Partial axes in a document keep their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "AssistTuningsDoc")]
pub struct AssistTunings {
    pub pitch: PidTuning,
    pub roll: PidTuning,
    pub yaw: PidTuning,
}

impl Default for AssistTunings {
    fn default() -> Self {
        let axis = |kp, kd| PidTuning::new(kp, 0.0, kd, -1.0, 1.0, -0.2, 0.2).with_scale(3.0);
        Self {
            pitch: axis(0.15, 0.06),
            roll: axis(0.1, 0.06),
            yaw: axis(0.15, 0.06),
        }
    }
}

impl AssistTunings {
    pub fn get(&self, axis: Axis) -> PidTuning {
        match axis {
            Axis::Pitch => self.pitch,
            Axis::Roll => self.roll,
            Axis::Yaw => self.yaw,
        }
    }

    pub fn set(&mut self, axis: Axis, tuning: PidTuning) {
        match axis {
            Axis::Pitch => self.pitch = tuning,
            Axis::Roll => self.roll = tuning,
            Axis::Yaw => self.yaw = tuning,
        }
    }

    pub fn invalid_limits(&self) -> Option<(Axis, &'static str)> {
        Axis::ALL
            .into_iter()
            .find_map(|axis| self.get(axis).invalid_limits().map(|pair| (axis, pair)))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AssistTuningsDoc {
    pitch: TuningPatch,
    roll: TuningPatch,
    yaw: TuningPatch,
}

impl From<AssistTuningsDoc> for AssistTunings {
    fn from(doc: AssistTuningsDoc) -> Self {
        let base = AssistTunings::default();
        Self {
            pitch: doc.pitch.over(base.pitch),
            roll: doc.roll.over(base.roll),
            yaw: doc.yaw.over(base.yaw),
        }
    }
}

/// Activation fade parameters per axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistFades {
    pub pitch: FadeConfig,
    pub roll: FadeConfig,
    pub yaw: FadeConfig,
}

/// How the roll axis measures its process value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollTracking {
    /// Bank angle against the local horizon.
    Surface,
    /// Angle to a reference direction captured in world space; used near
    /// vertical where bank is ill-defined.
    Vector,
}

/// One assist axis: override/fade bookkeeping plus its controller.
#[derive(Debug, Clone)]
pub struct AssistAxis {
    pub state: AxisState,
    pub pid: PidChannel,
}

impl AssistAxis {
    fn new(tuning: PidTuning, fade: FadeConfig) -> Self {
        Self {
            state: AxisState::new(fade),
            pid: PidChannel::new(tuning),
        }
    }

    /// Reset the integral and restart the activation fade.
    fn start_fade_in(&mut self) {
        self.pid.clear();
        self.state.start_fade_in();
    }

    /// Final command for this axis. An engaged axis outputs its faded PID
    /// response; otherwise the pilot's own input passes through, or zero.
    fn output(&mut self, error: f64, rate: f64, sign: f64, use_integral: bool, dt: f64, pilot: &AxisInput, deadband: f64) -> f64 {
        if self.state.enabled && !self.state.is_paused() {
            if self.state.is_delaying() {
                self.state.advance();
            } else {
                let response = self.pid.response_with_rate(error, rate, use_integral, dt);
                let out = sign * response / self.state.fade_current();
                self.state.advance();
                return out.clamp(-1.0, 1.0);
            }
        }
        if pilot.has_input(deadband) {
            pilot.demand()
        } else {
            0.0
        }
    }
}

// ---------------------------------------------------------------------------
// Stability assist
// ---------------------------------------------------------------------------

/// Attitude-hold assist with per-axis pilot override.
///
/// The assist is operational when exactly one of the toggle key latch and
/// the momentary hold key is set. While operational it owns pitch, roll and
/// yaw; an axis the pilot is actively flying is paused and fades back in
/// once the input stops.
#[derive(Debug, Clone)]
pub struct StabilityAssistController {
    pitch: AssistAxis,
    roll: AssistAxis,
    yaw: AssistAxis,
    toggle_key: bool,
    hold_key: bool,
    mode: GuidanceMode,
    roll_tracking: RollTracking,
    /// World-frame reference for vector roll tracking.
    roll_reference: Vector3<f64>,
    thresholds: Thresholds,
}

impl StabilityAssistController {
    pub fn new(tunings: &AssistTunings, fades: &AssistFades, thresholds: Thresholds) -> Self {
        Self {
            pitch: AssistAxis::new(tunings.pitch, fades.pitch),
            roll: AssistAxis::new(tunings.roll, fades.roll),
            yaw: AssistAxis::new(tunings.yaw, fades.yaw),
            toggle_key: false,
            hold_key: false,
            mode: GuidanceMode::Hold,
            roll_tracking: RollTracking::Surface,
            roll_reference: Vector3::zeros(),
            thresholds,
        }
    }

    /// One control tick. Returns `None` when the assist is not operational.
    pub fn update(&mut self, state: &FlightState, input: &PilotInput, dt: f64) -> Option<ControlCommand> {
        if !self.is_operational() {
            return None;
        }

        self.manage_overrides(state, input);

        let (roll_err, pitch_err, yaw_err) = match self.guided_errors(state) {
            Some(e) => e,
            None => self.hold_errors(state),
        };

        let use_integral = !state.grounded;
        let db = self.thresholds.input_deadband;
        // roll error is left-wing-down positive, the roll command rolls right
        let roll = self.roll.output(roll_err, -state.roll_rate(), 1.0, use_integral, dt, &input.roll, db);
        let pitch = self.pitch.output(pitch_err, state.pitch_rate(), -1.0, use_integral, dt, &input.pitch, db);
        let yaw = self.yaw.output(yaw_err, state.yaw_rate(), -1.0, use_integral, dt, &input.yaw, db);

        Some(ControlCommand {
            roll,
            pitch,
            yaw,
            throttle: input.throttle.clamp(0.0, 1.0),
        })
    }

    /// Pause axes the pilot is flying; re-target and fade in axes the pilot
    /// just released.
    fn manage_overrides(&mut self, state: &FlightState, input: &PilotInput) {
        let db = self.thresholds.input_deadband;
        let pitch_in = input.pitch.has_input(db);
        let roll_in = input.roll.has_input(db);
        let yaw_in = input.yaw.has_input(db);

        let pitch_yaw_paused = pitch_in || yaw_in || (roll_in && state.roll.abs() > self.thresholds.roll_sync_deg);
        let roll_paused = roll_in || (state.pitch.abs() > self.thresholds.vertical_pitch_deg && (pitch_in || yaw_in));

        let pitch_released = self.pitch.state.set_paused(pitch_yaw_paused);
        let yaw_released = self.yaw.state.set_paused(pitch_yaw_paused);
        if pitch_released || yaw_released {
            log::debug!("pitch/yaw override ended");
            self.pitch.pid.set_setpoint(state.pitch);
            self.yaw.pid.set_setpoint(state.heading);
            if self.pitch.state.enabled {
                self.pitch.start_fade_in();
            }
            if self.yaw.state.enabled {
                self.yaw.start_fade_in();
            }
        }

        if self.roll.state.set_paused(roll_paused) {
            log::debug!("roll override ended");
            match self.roll_tracking {
                RollTracking::Vector => self.roll_reference = state.right(),
                RollTracking::Surface => self.roll.pid.set_setpoint(state.roll),
            }
            if self.roll.state.enabled {
                self.roll.start_fade_in();
            }
        }
    }

    /// Errors against the guidance mode's target orientation, if it has one.
    fn guided_errors(&self, state: &FlightState) -> Option<(f64, f64, f64)> {
        if self.mode == GuidanceMode::Hold {
            return None;
        }
        let target = target_orientation(self.mode, state, self.roll.pid.setpoint())?;
        let e = attitude_error(state, &target);
        Some((e.x, e.y, e.z))
    }

    /// Errors for holding the captured pitch / heading / roll. The horizon
    /// errors are rotated into the body frame by the current bank.
    fn hold_errors(&mut self, state: &FlightState) -> (f64, f64, f64) {
        let pitch_err = if self.pitch.state.enabled {
            state.pitch - self.pitch.pid.setpoint()
        } else {
            0.0
        };
        let heading_err = if self.yaw.state.enabled {
            let sp = self.yaw.pid.setpoint();
            relative_angle(state.heading, sp) - sp
        } else {
            0.0
        };

        let (sr, cr) = state.roll.to_radians().sin_cos();
        let body_pitch = pitch_err * cr - heading_err * sr;
        let body_yaw = pitch_err * sr + heading_err * cr;

        let roll_err = if self.roll.state.enabled && !self.roll.state.is_paused() {
            self.update_roll_tracking(state);
            let sp = self.roll.pid.setpoint();
            match self.roll_tracking {
                RollTracking::Surface => relative_angle(state.roll, sp) - sp,
                RollTracking::Vector => self.vector_roll(state) - sp,
            }
        } else {
            0.0
        };

        (roll_err, body_pitch, body_yaw)
    }

    /// Hysteresis between surface and vector roll tracking.
    fn update_roll_tracking(&mut self, state: &FlightState) {
        let pitch = state.pitch.abs();
        match self.roll_tracking {
            RollTracking::Surface if pitch > self.thresholds.vector_enter_deg => {
                self.roll_tracking = RollTracking::Vector;
                self.roll.pid.set_setpoint(0.0);
                self.roll.pid.skip_derivative();
                self.roll_reference = state.right();
                log::debug!("roll tracking: vector");
            }
            RollTracking::Vector if pitch < self.thresholds.surface_reenter_deg => {
                self.roll_tracking = RollTracking::Surface;
                self.roll.pid.set_setpoint(state.roll);
                self.roll.pid.skip_derivative();
                log::debug!("roll tracking: surface");
            }
            _ => {}
        }
    }

    /// Angle (deg, left wing down positive) between the roll reference and
    /// its projection on the body forward/right plane.
    fn vector_roll(&self, state: &FlightState) -> f64 {
        let reference = self.roll_reference;
        let (forward, right) = (state.forward(), state.right());
        let proj = forward * forward.dot(&reference) + right * right.dot(&reference);
        if proj.norm() < 1.0e-9 || reference.norm() < 1.0e-9 {
            return 0.0;
        }
        let angle = proj.angle(&reference).to_degrees();
        // reference below the wing plane means the left wing has dropped
        let side = state.down().dot(&reference);
        if side > 0.0 {
            angle
        } else if side < 0.0 {
            -angle
        } else {
            0.0
        }
    }

    /// Capture the current attitude as the hold target and fade every
    /// enabled axis in.
    fn retarget(&mut self, state: &FlightState) {
        self.pitch.pid.set_setpoint(state.pitch);
        self.yaw.pid.set_setpoint(state.heading);
        match self.roll_tracking {
            RollTracking::Vector => self.roll.pid.set_setpoint(0.0),
            RollTracking::Surface => self.roll.pid.set_setpoint(state.roll),
        }
        self.roll_reference = state.right();
        for axis in [&mut self.pitch, &mut self.roll, &mut self.yaw] {
            if axis.state.enabled {
                axis.start_fade_in();
            }
        }
    }

    // -----------------------------------------------------------------------
    // Operational state
    // -----------------------------------------------------------------------

    pub fn is_operational(&self) -> bool {
        self.toggle_key != self.hold_key
    }

    /// Force the operational state, flipping the toggle latch as needed.
    pub fn set_operational(&mut self, operational: bool, state: &FlightState) {
        if operational == self.is_operational() {
            return;
        }
        self.toggle_key = !self.toggle_key;
        self.on_operational_change(state);
    }

    pub fn toggle_operational(&mut self, state: &FlightState) -> bool {
        self.set_operational(!self.is_operational(), state);
        self.is_operational()
    }

    /// Momentary hold key pressed: inverts the operational state while held.
    pub fn hold_pressed(&mut self, state: &FlightState) {
        if !self.hold_key {
            self.hold_key = true;
            self.on_operational_change(state);
        }
    }

    pub fn hold_released(&mut self, state: &FlightState) {
        if self.hold_key {
            self.hold_key = false;
            self.on_operational_change(state);
        }
    }

    fn on_operational_change(&mut self, state: &FlightState) {
        if self.is_operational() {
            self.retarget(state);
            log::info!("stability assist engaged ({})", self.mode.name());
        } else {
            log::info!("stability assist released");
        }
    }

    // -----------------------------------------------------------------------
    // Configuration and queries
    // -----------------------------------------------------------------------

    pub fn guidance_mode(&self) -> GuidanceMode {
        self.mode
    }

    /// Change what the assist points at. An operational assist re-captures
    /// the current attitude so the switch starts without a jump.
    pub fn set_guidance_mode(&mut self, mode: GuidanceMode, state: &FlightState) {
        if mode == self.mode {
            return;
        }
        self.mode = mode;
        log::info!("guidance mode: {}", mode.name());
        if self.is_operational() {
            self.retarget(state);
        }
    }

    pub fn roll_tracking(&self) -> RollTracking {
        self.roll_tracking
    }

    fn axis(&self, axis: Axis) -> &AssistAxis {
        match axis {
            Axis::Pitch => &self.pitch,
            Axis::Roll => &self.roll,
            Axis::Yaw => &self.yaw,
        }
    }

    fn axis_mut(&mut self, axis: Axis) -> &mut AssistAxis {
        match axis {
            Axis::Pitch => &mut self.pitch,
            Axis::Roll => &mut self.roll,
            Axis::Yaw => &mut self.yaw,
        }
    }

    pub fn is_axis_enabled(&self, axis: Axis) -> bool {
        self.axis(axis).state.enabled
    }

    pub fn set_axis_enabled(&mut self, axis: Axis, enabled: bool) {
        self.axis_mut(axis).state.enabled = enabled;
    }

    pub fn is_axis_paused(&self, axis: Axis) -> bool {
        self.axis(axis).state.is_paused()
    }

    /// Current output divisor of an axis (1 when fully engaged).
    pub fn fade(&self, axis: Axis) -> f64 {
        self.axis(axis).state.fade_current()
    }

    pub fn set_fade_config(&mut self, axis: Axis, fade: FadeConfig) {
        self.axis_mut(axis).state.set_fade_config(fade);
    }

    pub fn channel(&self, axis: Axis) -> &PidChannel {
        &self.axis(axis).pid
    }

    pub fn tuning(&self, axis: Axis) -> PidTuning {
        self.axis(axis).pid.tuning()
    }

    pub fn apply_tuning(&mut self, axis: Axis, tuning: PidTuning) {
        self.axis_mut(axis).pid.apply_tuning(tuning);
    }

    pub fn tunings(&self) -> AssistTunings {
        AssistTunings {
            pitch: self.tuning(Axis::Pitch),
            roll: self.tuning(Axis::Roll),
            yaw: self.tuning(Axis::Yaw),
        }
    }

    pub fn apply_tunings(&mut self, tunings: &AssistTunings) {
        for axis in Axis::ALL {
            self.apply_tuning(axis, tunings.get(axis));
        }
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    pub fn set_thresholds(&mut self, thresholds: Thresholds) {
        self.thresholds = thresholds;
    }

    pub fn target_pitch(&self) -> f64 {
        self.pitch.pid.setpoint()
    }

    pub fn set_target_pitch(&mut self, pitch: f64) {
        self.pitch.pid.set_setpoint(pitch.clamp(-90.0, 90.0));
    }

    pub fn target_heading(&self) -> f64 {
        self.yaw.pid.setpoint()
    }

    pub fn set_target_heading(&mut self, heading: f64) {
        self.yaw.pid.set_setpoint(wrap_heading(heading));
    }

    pub fn target_roll(&self) -> f64 {
        self.roll.pid.setpoint()
    }

    pub fn set_target_roll(&mut self, roll: f64) {
        self.roll.pid.set_setpoint(roll);
    }
}

impl Default for StabilityAssistController {
    fn default() -> Self {
        Self::new(&AssistTunings::default(), &AssistFades::default(), Thresholds::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flight::attitude_from_euler;
    use approx::assert_abs_diff_eq;

    const DT: f64 = 0.02;

    fn attitude(heading: f64, pitch: f64, roll: f64) -> FlightState {
        FlightState {
            heading,
            pitch,
            roll,
            attitude: attitude_from_euler(heading, pitch, roll, &Vector3::z(), &Vector3::y()),
            ..FlightState::default()
        }
    }

    fn engaged(state: &FlightState) -> StabilityAssistController {
        let mut sas = StabilityAssistController::default();
        sas.set_operational(true, state);
        sas
    }

    fn roll_input(value: f64) -> PilotInput {
        PilotInput { roll: AxisInput::analog(value), ..Default::default() }
    }

    #[test]
    fn toggle_and_hold_keys_xor() {
        let s = FlightState::default();
        let mut sas = StabilityAssistController::default();
        assert!(!sas.is_operational());
        assert!(sas.update(&s, &PilotInput::default(), DT).is_none());
        sas.hold_pressed(&s);
        assert!(sas.is_operational());
        sas.toggle_operational(&s);
        assert!(!sas.is_operational());
        sas.hold_released(&s);
        assert!(sas.is_operational());
        sas.set_operational(false, &s);
        assert!(!sas.is_operational());
    }

    #[test]
    fn engaging_captures_attitude_and_fades_in() {
        let s = attitude(123.0, 8.0, -4.0);
        let sas = engaged(&s);
        assert_eq!(sas.target_heading(), 123.0);
        assert_eq!(sas.target_pitch(), 8.0);
        assert_eq!(sas.target_roll(), -4.0);
        for axis in Axis::ALL {
            assert_eq!(sas.fade(axis), 10.0);
        }
    }

    #[test]
    fn corrects_toward_held_attitude() {
        let s = attitude(0.0, 0.0, 0.0);
        // nose high, nose right, left wing down
        let mut sas = engaged(&s);
        let cmd = sas.update(&attitude(10.0, 10.0, 10.0), &PilotInput::default(), DT).unwrap();
        assert!(cmd.roll > 0.0, "should roll right: {:?}", cmd);

        let mut sas = engaged(&s);
        let cmd = sas.update(&attitude(10.0, 10.0, 0.0), &PilotInput::default(), DT).unwrap();
        assert!(cmd.pitch < 0.0 && cmd.yaw < 0.0, "{:?}", cmd);
    }

    #[test]
    fn heading_error_uses_short_path() {
        let mut sas = engaged(&attitude(355.0, 0.0, 0.0));
        // 10 degrees right of target across north
        let cmd = sas.update(&attitude(5.0, 0.0, 0.0), &PilotInput::default(), DT).unwrap();
        assert!(cmd.yaw < 0.0);
        let expected = -(10.0 * 0.15 / 3.0) / 10.0;
        assert_abs_diff_eq!(cmd.yaw, expected, epsilon = 1e-9);
    }

    #[test]
    fn banked_heading_error_moves_to_pitch() {
        let mut sas = engaged(&attitude(0.0, 0.0, 90.0));
        let s = attitude(10.0, 0.0, 90.0);
        let cmd = sas.update(&s, &PilotInput::default(), DT).unwrap();
        // left wing down 90: turning left is a body pitch up
        assert!(cmd.pitch > 0.0);
        assert_abs_diff_eq!(cmd.yaw, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn pitch_input_pauses_pitch_and_yaw_together() {
        let s = attitude(0.0, 0.0, 0.0);
        let mut sas = engaged(&s);
        let input = PilotInput { pitch: AxisInput::analog(0.4), ..Default::default() };
        let cmd = sas.update(&s, &input, DT).unwrap();
        assert!(sas.is_axis_paused(Axis::Pitch) && sas.is_axis_paused(Axis::Yaw));
        assert!(!sas.is_axis_paused(Axis::Roll));
        assert_eq!(cmd.pitch, 0.4);
        assert_eq!(cmd.yaw, 0.0);
    }

    #[test]
    fn rolling_past_sync_angle_pauses_pitch_yaw() {
        let mut sas = engaged(&attitude(0.0, 0.0, 0.0));
        sas.update(&attitude(0.0, 0.0, 3.0), &roll_input(0.5), DT);
        assert!(!sas.is_axis_paused(Axis::Pitch));
        sas.update(&attitude(0.0, 0.0, 12.0), &roll_input(0.5), DT);
        assert!(sas.is_axis_paused(Axis::Pitch));
        assert!(sas.is_axis_paused(Axis::Roll));
    }

    #[test]
    fn near_vertical_pitch_input_pauses_roll() {
        let s = attitude(0.0, 80.0, 0.0);
        let mut sas = engaged(&s);
        let input = PilotInput { yaw: AxisInput::analog(0.3), ..Default::default() };
        let cmd = sas.update(&s, &input, DT).unwrap();
        assert!(sas.is_axis_paused(Axis::Roll));
        // roll owned but no roll input: suppressed
        assert_eq!(cmd.roll, 0.0);
    }

    #[test]
    fn released_roll_fades_back_in() {
        let mut sas = engaged(&attitude(0.0, 0.0, 0.0));
        let none = PilotInput::default();
        // still rolling right when the stick is released
        let spinning = FlightState {
            angular_velocity: Vector3::new(20.0, 0.0, 0.0),
            ..attitude(0.0, 0.0, 6.0)
        };
        sas.update(&spinning, &roll_input(1.0), DT);
        assert!(sas.is_axis_paused(Axis::Roll));

        let unfaded = -20.0 * 0.06 / 3.0;
        let first = sas.update(&spinning, &none, DT).unwrap().roll;
        assert_eq!(sas.target_roll(), 6.0);
        assert_abs_diff_eq!(first, unfaded / 10.0, epsilon = 1e-12);
        for _ in 0..74 {
            sas.update(&spinning, &none, DT);
        }
        assert_eq!(sas.fade(Axis::Roll), 1.0);
        let settled = sas.update(&spinning, &none, DT).unwrap().roll;
        assert_abs_diff_eq!(settled, unfaded, epsilon = 1e-12);
    }

    #[test]
    fn release_recaptures_roll_target() {
        let mut sas = engaged(&attitude(0.0, 0.0, 0.0));
        sas.update(&attitude(0.0, 0.0, 15.0), &roll_input(-0.5), DT);
        sas.update(&attitude(0.0, 0.0, 20.0), &PilotInput::default(), DT);
        assert_eq!(sas.target_roll(), 20.0);
        assert!(sas.fade(Axis::Roll) > 1.0);
    }

    #[test]
    fn disabled_axis_passes_pilot_input_or_zero() {
        let s = attitude(0.0, 0.0, 0.0);
        let mut sas = engaged(&s);
        sas.set_axis_enabled(Axis::Roll, false);
        let cmd = sas.update(&attitude(0.0, 0.0, 30.0), &PilotInput::default(), DT).unwrap();
        assert_eq!(cmd.roll, 0.0);
    }

    #[test]
    fn roll_tracking_hysteresis() {
        let mut sas = engaged(&attitude(0.0, 0.0, 0.0));
        let none = PilotInput::default();
        sas.update(&attitude(0.0, 28.0, 0.0), &none, DT);
        assert_eq!(sas.roll_tracking(), RollTracking::Surface);
        sas.update(&attitude(0.0, 35.0, 0.0), &none, DT);
        assert_eq!(sas.roll_tracking(), RollTracking::Vector);
        assert_eq!(sas.target_roll(), 0.0);
        sas.update(&attitude(0.0, 27.0, 0.0), &none, DT);
        assert_eq!(sas.roll_tracking(), RollTracking::Vector);
        sas.update(&attitude(0.0, 20.0, 5.0), &none, DT);
        assert_eq!(sas.roll_tracking(), RollTracking::Surface);
        assert_eq!(sas.target_roll(), 5.0);
    }

    #[test]
    fn vector_roll_sign_matches_bank_convention() {
        let mut sas = engaged(&attitude(0.0, 60.0, 0.0));
        let none = PilotInput::default();
        sas.update(&attitude(0.0, 60.0, 0.0), &none, DT);
        assert_eq!(sas.roll_tracking(), RollTracking::Vector);
        // rolled left wing down about the nose: positive error, roll right
        let cmd = sas.update(&attitude(0.0, 60.0, 10.0), &none, DT).unwrap();
        assert!(cmd.roll > 0.0);
        assert_abs_diff_eq!(sas.vector_roll(&attitude(0.0, 60.0, 10.0)), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn guidance_mode_errors_drive_commands() {
        let s = attitude(0.0, 0.0, 0.0);
        let mut sas = engaged(&s);
        sas.set_guidance_mode(GuidanceMode::RadialOut, &s);
        // radial-out points straight up: pull the nose up
        let cmd = sas.update(&s, &PilotInput::default(), DT).unwrap();
        assert!(cmd.pitch > 0.0);
        assert_abs_diff_eq!(cmd.yaw, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn tunings_round_trip_through_controller() {
        let mut sas = StabilityAssistController::default();
        assert_eq!(sas.tunings(), AssistTunings::default());
        let mut t = sas.tunings();
        t.yaw.kp = 0.5;
        sas.apply_tunings(&t);
        assert_eq!(sas.tuning(Axis::Yaw).kp, 0.5);
        assert_eq!(sas.tunings().yaw.scale(), 3.0);
    }

    #[test]
    fn partial_axis_tuning_keeps_axis_defaults() {
        let t: AssistTunings = serde_json::from_str(r#"{ "roll": { "kd": 0.1 } }"#).unwrap();
        assert_eq!(t.roll.kd, 0.1);
        assert_eq!(t.roll.kp, 0.1);
        assert_eq!(t.roll.clamp_upper, 0.2);
        assert_eq!(t.roll.scale(), 3.0);
        assert_eq!(t.pitch, AssistTunings::default().pitch);
    }
}
