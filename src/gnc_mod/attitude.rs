use serde::{Deserialize, Serialize};

use crate::angle::{relative_angle, wrap_heading};
use crate::flight::{ControlCommand, FlightState, PilotInput, DEFAULT_DEADBAND};
use super::pid::PidChannel;
use super::tuning::{PidTuning, TuningPatch, UNBOUNDED_INPUT};

/// Heading tracking degenerates this close to a pole; wings are held level instead.
pub const DEFAULT_POLE_LATITUDE: f64 = 88.0;

/// Heading / vertical speed nudge per tick at unit scale.
const HEADING_NUDGE: f64 = 0.4;
const VERTICAL_SPEED_NUDGE: f64 = 0.4;
const ALTITUDE_NUDGE: f64 = 4.0;

// ---------------------------------------------------------------------------
// Channel identities and tunings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelId {
    HeadingBank,
    BankToYaw,
    Aileron,
    Rudder,
    Altitude,
    VerticalSpeed,
    Elevator,
    Throttle,
}

impl ChannelId {
    pub const ALL: [ChannelId; 8] = [
        ChannelId::HeadingBank,
        ChannelId::BankToYaw,
        ChannelId::Aileron,
        ChannelId::Rudder,
        ChannelId::Altitude,
        ChannelId::VerticalSpeed,
        ChannelId::Elevator,
        ChannelId::Throttle,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ChannelId::HeadingBank => "heading-bank",
            ChannelId::BankToYaw => "bank-to-yaw",
            ChannelId::Aileron => "aileron",
            ChannelId::Rudder => "rudder",
            ChannelId::Altitude => "altitude",
            ChannelId::VerticalSpeed => "vertical-speed",
            ChannelId::Elevator => "elevator",
            ChannelId::Throttle => "throttle",
        }
    }
}

/// Snapshot of every attitude-loop tuning, one named field per channel.
///
/// In a document each channel is partial: absent fields keep that channel's
/// default, not the generic [`PidTuning::default`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "AttitudeTuningsDoc")]
pub struct AttitudeTunings {
    pub heading_bank: PidTuning,
    pub bank_to_yaw: PidTuning,
    pub aileron: PidTuning,
    pub rudder: PidTuning,
    pub altitude: PidTuning,
    pub vertical_speed: PidTuning,
    pub elevator: PidTuning,
    pub throttle: PidTuning,
}

impl Default for AttitudeTunings {
    fn default() -> Self {
        Self {
            heading_bank: PidTuning::new(2.0, 0.1, 0.0, -30.0, 30.0, -0.5, 0.5),
            bank_to_yaw: PidTuning::new(0.0, 0.0, 0.01, -2.0, 2.0, -0.5, 0.5),
            aileron: PidTuning::new(0.02, 0.005, 0.01, -1.0, 1.0, -0.4, 0.4)
                .with_input_limits(-180.0, 180.0),
            rudder: PidTuning::new(0.1, 0.08, 0.05, -1.0, 1.0, -0.4, 0.4),
            altitude: PidTuning::new(0.15, 0.01, 0.0, -50.0, 50.0, -0.01, 0.01)
                .with_input_limits(0.0, UNBOUNDED_INPUT),
            vertical_speed: PidTuning::new(2.0, 0.8, 2.0, -10.0, 10.0, -5.0, 5.0),
            elevator: PidTuning::new(0.05, 0.01, 0.1, -1.0, 1.0, -0.4, 0.4),
            throttle: PidTuning::new(0.2, 0.08, 0.1, -1.0, 1.0, -1.0, 1.0),
        }
    }
}

impl AttitudeTunings {
    pub fn get(&self, id: ChannelId) -> PidTuning {
        match id {
            ChannelId::HeadingBank => self.heading_bank,
            ChannelId::BankToYaw => self.bank_to_yaw,
            ChannelId::Aileron => self.aileron,
            ChannelId::Rudder => self.rudder,
            ChannelId::Altitude => self.altitude,
            ChannelId::VerticalSpeed => self.vertical_speed,
            ChannelId::Elevator => self.elevator,
            ChannelId::Throttle => self.throttle,
        }
    }

    pub fn set(&mut self, id: ChannelId, tuning: PidTuning) {
        match id {
            ChannelId::HeadingBank => self.heading_bank = tuning,
            ChannelId::BankToYaw => self.bank_to_yaw = tuning,
            ChannelId::Aileron => self.aileron = tuning,
            ChannelId::Rudder => self.rudder = tuning,
            ChannelId::Altitude => self.altitude = tuning,
            ChannelId::VerticalSpeed => self.vertical_speed = tuning,
            ChannelId::Elevator => self.elevator = tuning,
            ChannelId::Throttle => self.throttle = tuning,
        }
    }

    /// First channel with NaN or inverted limits, and which pair is wrong.
    pub fn invalid_limits(&self) -> Option<(ChannelId, &'static str)> {
        ChannelId::ALL
            .into_iter()
            .find_map(|id| self.get(id).invalid_limits().map(|pair| (id, pair)))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AttitudeTuningsDoc {
    heading_bank: TuningPatch,
    bank_to_yaw: TuningPatch,
    aileron: TuningPatch,
    rudder: TuningPatch,
    altitude: TuningPatch,
    vertical_speed: TuningPatch,
    elevator: TuningPatch,
    throttle: TuningPatch,
}

impl From<AttitudeTuningsDoc> for AttitudeTunings {
    fn from(doc: AttitudeTuningsDoc) -> Self {
        let base = AttitudeTunings::default();
        Self {
            heading_bank: doc.heading_bank.over(base.heading_bank),
            bank_to_yaw: doc.bank_to_yaw.over(base.bank_to_yaw),
            aileron: doc.aileron.over(base.aileron),
            rudder: doc.rudder.over(base.rudder),
            altitude: doc.altitude.over(base.altitude),
            vertical_speed: doc.vertical_speed.over(base.vertical_speed),
            elevator: doc.elevator.over(base.elevator),
            throttle: doc.throttle.over(base.throttle),
        }
    }
}

/// The eight cascade channels, owned by one control loop.
#[derive(Debug, Clone)]
pub struct AttitudeChannels {
    pub heading_bank: PidChannel,
    pub bank_to_yaw: PidChannel,
    pub aileron: PidChannel,
    pub rudder: PidChannel,
    pub altitude: PidChannel,
    pub vertical_speed: PidChannel,
    pub elevator: PidChannel,
    pub throttle: PidChannel,
}

impl AttitudeChannels {
    pub fn new(t: &AttitudeTunings) -> Self {
        Self {
            heading_bank: PidChannel::new(t.heading_bank),
            bank_to_yaw: PidChannel::new(t.bank_to_yaw),
            aileron: PidChannel::new(t.aileron),
            rudder: PidChannel::new(t.rudder),
            altitude: PidChannel::new(t.altitude),
            vertical_speed: PidChannel::new(t.vertical_speed),
            elevator: PidChannel::new(t.elevator),
            throttle: PidChannel::new(t.throttle),
        }
    }

    pub fn get(&self, id: ChannelId) -> &PidChannel {
        match id {
            ChannelId::HeadingBank => &self.heading_bank,
            ChannelId::BankToYaw => &self.bank_to_yaw,
            ChannelId::Aileron => &self.aileron,
            ChannelId::Rudder => &self.rudder,
            ChannelId::Altitude => &self.altitude,
            ChannelId::VerticalSpeed => &self.vertical_speed,
            ChannelId::Elevator => &self.elevator,
            ChannelId::Throttle => &self.throttle,
        }
    }

    pub fn get_mut(&mut self, id: ChannelId) -> &mut PidChannel {
        match id {
            ChannelId::HeadingBank => &mut self.heading_bank,
            ChannelId::BankToYaw => &mut self.bank_to_yaw,
            ChannelId::Aileron => &mut self.aileron,
            ChannelId::Rudder => &mut self.rudder,
            ChannelId::Altitude => &mut self.altitude,
            ChannelId::VerticalSpeed => &mut self.vertical_speed,
            ChannelId::Elevator => &mut self.elevator,
            ChannelId::Throttle => &mut self.throttle,
        }
    }
}

// ---------------------------------------------------------------------------
// Attitude control loop: heading, vertical and speed cascades
// ---------------------------------------------------------------------------

/// Cascaded flight-path controller.
///
/// - heading → bank angle → aileron, with bank → sideslip → rudder
/// - altitude → vertical speed → angle of attack → elevator
/// - airspeed → throttle
///
/// Each branch has its own enable flag; `paused` suspends all of them and
/// hands the axes back to the pilot.
#[derive(Debug, Clone)]
pub struct AttitudeControlLoop {
    channels: AttitudeChannels,
    heading_active: bool,
    wing_level_active: bool,
    vertical_active: bool,
    altitude_hold_active: bool,
    throttle_active: bool,
    paused: bool,
    pub pole_latitude: f64,
    pub input_deadband: f64,
}

impl AttitudeControlLoop {
    pub fn new(tunings: &AttitudeTunings) -> Self {
        Self {
            channels: AttitudeChannels::new(tunings),
            heading_active: false,
            wing_level_active: false,
            vertical_active: false,
            altitude_hold_active: false,
            throttle_active: false,
            paused: false,
            pole_latitude: DEFAULT_POLE_LATITUDE,
            input_deadband: DEFAULT_DEADBAND,
        }
    }

    /// Compute this tick's command. Axes without an active branch pass the
    /// pilot's input through unchanged; so does everything while paused or
    /// while a higher-priority assist owns the vehicle.
    pub fn update(
        &mut self,
        state: &FlightState,
        input: &PilotInput,
        assist_operational: bool,
        dt: f64,
    ) -> ControlCommand {
        let mut cmd = ControlCommand {
            roll: input.roll.demand(),
            pitch: input.pitch.demand(),
            yaw: input.yaw.demand(),
            throttle: input.throttle.clamp(0.0, 1.0),
        };

        if self.paused || assist_operational {
            return cmd;
        }

        let use_integral = !state.grounded;
        let ch = &mut self.channels;

        if self.heading_active {
            let near_pole = state.latitude.abs() >= self.pole_latitude;
            if !self.wing_level_active && !near_pole {
                let heading = relative_angle(state.heading, ch.heading_bank.setpoint());
                let bank = ch.heading_bank.response(heading, use_integral, dt);
                ch.aileron.set_setpoint(bank);
                ch.bank_to_yaw.set_setpoint(bank);
                let rudder_sp = -ch.bank_to_yaw.response(state.yaw, use_integral, dt);
                ch.rudder.set_setpoint(rudder_sp);
            } else {
                ch.aileron.set_setpoint(0.0);
                ch.rudder.set_setpoint(0.0);
            }
            let aileron = ch.aileron.response(state.roll, use_integral, dt);
            cmd.roll = (aileron + cmd.roll).clamp(-1.0, 1.0);
            cmd.yaw = ch.rudder.response(state.yaw, use_integral, dt).clamp(-1.0, 1.0);
        }

        if self.vertical_active {
            if self.altitude_hold_active {
                let vs = -ch.altitude.response(state.altitude, use_integral, dt);
                ch.vertical_speed.set_setpoint(vs);
            }
            let aoa_sp = -ch.vertical_speed.response(state.vertical_speed, use_integral, dt);
            ch.elevator.set_setpoint(aoa_sp);
            cmd.pitch = (-ch.elevator.response(state.aoa, use_integral, dt)).clamp(-1.0, 1.0);
        }

        if self.throttle_active {
            if ch.throttle.target_setpoint() == 0.0 {
                // explicit "no thrust" rather than letting the loop settle there
                ch.throttle.clear();
                cmd.throttle = 0.0;
            } else {
                let response = ch.throttle.response(state.surface_speed, use_integral, dt);
                cmd.throttle = (-response).clamp(0.0, 1.0);
            }
        }

        cmd
    }

    // -----------------------------------------------------------------------
    // Mode switching
    // -----------------------------------------------------------------------

    /// Toggle heading control. Engaging captures the current heading.
    /// Returns the new state.
    pub fn toggle_heading(&mut self, state: &FlightState) -> bool {
        self.set_heading_active(!self.heading_active, state)
    }

    pub fn set_heading_active(&mut self, active: bool, state: &FlightState) -> bool {
        if active == self.heading_active {
            return active;
        }
        if active {
            self.hold_heading(state.heading);
        } else {
            self.heading_active = false;
            self.channels.heading_bank.clear();
            self.channels.bank_to_yaw.clear();
            self.channels.aileron.clear();
            self.channels.rudder.clear();
            log::info!("heading control off");
        }
        self.heading_active
    }

    /// Engage heading control toward `heading`.
    pub fn hold_heading(&mut self, heading: f64) {
        self.set_target_heading(heading);
        self.heading_active = true;
        self.paused = false;
        log::info!("heading control on, target {:.1} deg", self.target_heading());
    }

    pub fn toggle_wing_level(&mut self, state: &FlightState) -> bool {
        self.wing_level_active = !self.wing_level_active;
        if !self.wing_level_active {
            // resume turning toward wherever the nose points now
            self.set_target_heading(state.heading);
        }
        log::info!("wing leveller {}", if self.wing_level_active { "on" } else { "off" });
        self.wing_level_active
    }

    /// Toggle vertical control. Engaging captures the current altitude or
    /// vertical speed, depending on the altitude-hold submode.
    pub fn toggle_vertical(&mut self, state: &FlightState) -> bool {
        self.set_vertical_active(!self.vertical_active, state)
    }

    pub fn set_vertical_active(&mut self, active: bool, state: &FlightState) -> bool {
        if active == self.vertical_active {
            return active;
        }
        if active {
            if self.altitude_hold_active {
                self.channels.altitude.set_setpoint(state.altitude.max(0.0));
            } else {
                self.channels.vertical_speed.set_setpoint(state.vertical_speed);
            }
            self.vertical_active = true;
            self.paused = false;
            log::info!("vertical control on");
        } else {
            self.vertical_active = false;
            self.channels.altitude.clear();
            self.channels.vertical_speed.clear();
            self.channels.elevator.clear();
            log::info!("vertical control off");
        }
        self.vertical_active
    }

    /// Engage vertical-speed control toward `vertical_speed`.
    pub fn hold_vertical_speed(&mut self, vertical_speed: f64) {
        self.channels.vertical_speed.set_setpoint(vertical_speed);
        self.vertical_active = true;
        self.altitude_hold_active = false;
        self.paused = false;
        log::info!("vertical speed hold {:.1} m/s", vertical_speed);
    }

    /// Engage altitude hold toward `altitude`.
    pub fn hold_altitude(&mut self, altitude: f64) {
        self.channels.altitude.set_setpoint(altitude.max(0.0));
        self.vertical_active = true;
        self.altitude_hold_active = true;
        self.paused = false;
        log::info!("altitude hold {:.0} m", altitude.max(0.0));
    }

    pub fn toggle_altitude_hold(&mut self, state: &FlightState) -> bool {
        self.altitude_hold_active = !self.altitude_hold_active;
        if self.altitude_hold_active {
            self.channels.altitude.set_setpoint(state.altitude.max(0.0));
        } else {
            self.channels.altitude.clear();
            self.channels.vertical_speed.set_setpoint(state.vertical_speed);
        }
        self.altitude_hold_active
    }

    /// Toggle speed control. Engaging captures the current surface speed.
    pub fn toggle_throttle(&mut self, state: &FlightState) -> bool {
        self.set_throttle_active(!self.throttle_active, state)
    }

    pub fn set_throttle_active(&mut self, active: bool, state: &FlightState) -> bool {
        if active == self.throttle_active {
            return active;
        }
        if active {
            self.hold_speed(state.surface_speed);
        } else {
            self.throttle_active = false;
            self.channels.throttle.clear();
            log::info!("speed control off");
        }
        self.throttle_active
    }

    /// Engage speed control toward `speed`.
    pub fn hold_speed(&mut self, speed: f64) {
        self.channels.throttle.set_setpoint(speed.max(0.0));
        self.throttle_active = true;
        self.paused = false;
        log::info!("speed control on, target {:.1} m/s", speed.max(0.0));
    }

    /// One-shot recovery: wings level, zero vertical speed.
    pub fn level_off(&mut self) {
        self.channels.vertical_speed.set_setpoint(0.0);
        self.vertical_active = true;
        self.altitude_hold_active = false;
        self.heading_active = true;
        self.wing_level_active = true;
        self.paused = false;
        log::info!("levelling off");
    }

    pub fn set_paused(&mut self, paused: bool) {
        if paused != self.paused {
            log::info!("attitude control {}", if paused { "paused" } else { "resumed" });
        }
        self.paused = paused;
    }

    // -----------------------------------------------------------------------
    // Target nudging from manual input
    // -----------------------------------------------------------------------

    /// Move the active targets with the pilot's pitch/yaw input. Heading wraps
    /// into [0, 360); altitude never goes below zero.
    pub fn nudge_targets(&mut self, input: &PilotInput) {
        let scale = input.nudge_scale();

        if self.heading_active && !self.wing_level_active && input.yaw.has_input(self.input_deadband) {
            let heading = self.target_heading() + HEADING_NUDGE * scale * input.yaw.demand();
            self.set_target_heading(heading);
        }

        if self.vertical_active && input.pitch.has_input(self.input_deadband) {
            let demand = input.pitch.demand();
            if self.altitude_hold_active {
                let alt = self.channels.altitude.target_setpoint() + ALTITUDE_NUDGE * scale * demand;
                self.channels.altitude.set_setpoint(alt.max(0.0));
            } else {
                let vs = self.channels.vertical_speed.target_setpoint() + VERTICAL_SPEED_NUDGE * scale * demand;
                self.channels.vertical_speed.set_setpoint(vs);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Targets (UI getters/setters)
    // -----------------------------------------------------------------------

    pub fn target_heading(&self) -> f64 {
        self.channels.heading_bank.target_setpoint()
    }

    /// Heading targets are applied immediately; easing across north would
    /// sweep through the wrong side of the compass.
    pub fn set_target_heading(&mut self, heading: f64) {
        self.channels.heading_bank.set_setpoint(wrap_heading(heading));
    }

    pub fn target_vertical_speed(&self) -> f64 {
        self.channels.vertical_speed.target_setpoint()
    }

    pub fn set_target_vertical_speed(&mut self, vertical_speed: f64) {
        self.channels.vertical_speed.set_setpoint_bumpless(vertical_speed);
    }

    pub fn target_altitude(&self) -> f64 {
        self.channels.altitude.target_setpoint()
    }

    pub fn set_target_altitude(&mut self, altitude: f64) {
        self.channels.altitude.set_setpoint_bumpless(altitude.max(0.0));
    }

    pub fn target_speed(&self) -> f64 {
        self.channels.throttle.target_setpoint()
    }

    pub fn set_target_speed(&mut self, speed: f64) {
        self.channels.throttle.set_setpoint_bumpless(speed.max(0.0));
    }

    // -----------------------------------------------------------------------
    // Queries and tuning
    // -----------------------------------------------------------------------

    pub fn is_heading_active(&self) -> bool {
        self.heading_active
    }

    pub fn is_wing_level_active(&self) -> bool {
        self.wing_level_active
    }

    pub fn is_vertical_active(&self) -> bool {
        self.vertical_active
    }

    pub fn is_altitude_hold_active(&self) -> bool {
        self.altitude_hold_active
    }

    pub fn is_throttle_active(&self) -> bool {
        self.throttle_active
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Any branch engaged.
    pub fn is_engaged(&self) -> bool {
        self.heading_active || self.vertical_active || self.throttle_active
    }

    pub fn channel(&self, id: ChannelId) -> &PidChannel {
        self.channels.get(id)
    }

    pub fn tuning(&self, id: ChannelId) -> PidTuning {
        self.channels.get(id).tuning()
    }

    pub fn apply_tuning(&mut self, id: ChannelId, tuning: PidTuning) {
        self.channels.get_mut(id).apply_tuning(tuning);
    }

    /// Copy of every channel's tuning.
    pub fn tunings(&self) -> AttitudeTunings {
        let mut t = AttitudeTunings::default();
        for id in ChannelId::ALL {
            t.set(id, self.tuning(id));
        }
        t
    }

    pub fn apply_tunings(&mut self, tunings: &AttitudeTunings) {
        for id in ChannelId::ALL {
            self.apply_tuning(id, tunings.get(id));
        }
    }
}

impl Default for AttitudeControlLoop {
    fn default() -> Self {
        Self::new(&AttitudeTunings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flight::AxisInput;
    use approx::assert_abs_diff_eq;

    const DT: f64 = 0.02;

    fn level(heading: f64) -> FlightState {
        FlightState { heading, ..FlightState::default() }
    }

    #[test]
    fn idle_loop_passes_pilot_input() {
        let mut ap = AttitudeControlLoop::default();
        let input = PilotInput {
            roll: AxisInput::analog(0.3),
            pitch: AxisInput::analog(-0.2),
            throttle: 0.7,
            ..Default::default()
        };
        let cmd = ap.update(&level(0.0), &input, false, DT);
        assert_eq!(cmd, ControlCommand { roll: 0.3, pitch: -0.2, yaw: 0.0, throttle: 0.7 });
    }

    #[test]
    fn wrap_case_banks_toward_target() {
        let mut ap = AttitudeControlLoop::default();
        ap.hold_heading(90.0);
        ap.update(&level(350.0), &PilotInput::default(), false, DT);
        assert_abs_diff_eq!(ap.channel(ChannelId::Aileron).setpoint(), -30.0);
        assert_abs_diff_eq!(ap.channel(ChannelId::BankToYaw).setpoint(), -30.0);
    }

    #[test]
    fn heading_command_is_bounded() {
        let mut ap = AttitudeControlLoop::default();
        ap.hold_heading(180.0);
        let input = PilotInput { roll: AxisInput::analog(1.0), ..Default::default() };
        for i in 0..100 {
            let s = FlightState { roll: (i as f64) * 2.0 - 100.0, yaw: 5.0, ..level(10.0) };
            let cmd = ap.update(&s, &input, false, DT);
            assert!(cmd.roll.abs() <= 1.0 && cmd.yaw.abs() <= 1.0);
        }
    }

    #[test]
    fn wing_level_zeroes_turn_setpoints() {
        let mut ap = AttitudeControlLoop::default();
        ap.hold_heading(90.0);
        ap.toggle_wing_level(&level(0.0));
        ap.update(&level(0.0), &PilotInput::default(), false, DT);
        assert_eq!(ap.channel(ChannelId::Aileron).setpoint(), 0.0);
        assert_eq!(ap.channel(ChannelId::Rudder).setpoint(), 0.0);
    }

    #[test]
    fn near_pole_holds_wings_level() {
        let mut ap = AttitudeControlLoop::default();
        ap.hold_heading(90.0);
        let s = FlightState { latitude: 89.0, ..level(0.0) };
        ap.update(&s, &PilotInput::default(), false, DT);
        assert_eq!(ap.channel(ChannelId::Aileron).setpoint(), 0.0);
    }

    #[test]
    fn leaving_wing_level_recaptures_heading() {
        let mut ap = AttitudeControlLoop::default();
        ap.hold_heading(90.0);
        ap.toggle_wing_level(&level(0.0));
        ap.toggle_wing_level(&level(123.0));
        assert_eq!(ap.target_heading(), 123.0);
    }

    #[test]
    fn engaging_captures_current_values() {
        let mut ap = AttitudeControlLoop::default();
        let s = FlightState { heading: 42.0, vertical_speed: 3.5, surface_speed: 150.0, ..FlightState::default() };
        assert!(ap.toggle_heading(&s));
        assert!(ap.toggle_vertical(&s));
        assert!(ap.toggle_throttle(&s));
        assert_eq!(ap.target_heading(), 42.0);
        assert_eq!(ap.target_vertical_speed(), 3.5);
        assert_eq!(ap.target_speed(), 150.0);
        ap.toggle_altitude_hold(&s);
        assert_eq!(ap.target_altitude(), s.altitude);
    }

    #[test]
    fn disengaging_clears_integrals() {
        let mut ap = AttitudeControlLoop::default();
        let s = FlightState { vertical_speed: -5.0, aoa: 2.0, ..level(0.0) };
        ap.hold_heading(60.0);
        ap.hold_vertical_speed(5.0);
        for _ in 0..50 {
            ap.update(&s, &PilotInput::default(), false, DT);
        }
        assert!(ap.channel(ChannelId::HeadingBank).integral() != 0.0);
        assert!(ap.channel(ChannelId::VerticalSpeed).integral() != 0.0);
        ap.set_heading_active(false, &s);
        ap.set_vertical_active(false, &s);
        for id in ChannelId::ALL {
            assert_eq!(ap.channel(id).integral(), 0.0, "{}", id.name());
        }
    }

    #[test]
    fn zero_speed_target_forces_zero_throttle() {
        let mut ap = AttitudeControlLoop::default();
        ap.hold_speed(200.0);
        let slow = FlightState { surface_speed: 50.0, ..FlightState::default() };
        for _ in 0..100 {
            ap.update(&slow, &PilotInput::default(), false, DT);
        }
        ap.hold_speed(0.0);
        for speed in [0.0, 50.0, 400.0] {
            let s = FlightState { surface_speed: speed, ..FlightState::default() };
            let input = PilotInput { throttle: 1.0, ..Default::default() };
            assert_eq!(ap.update(&s, &input, false, DT).throttle, 0.0);
        }
    }

    #[test]
    fn slow_vehicle_gets_throttle() {
        let mut ap = AttitudeControlLoop::default();
        ap.hold_speed(200.0);
        let s = FlightState { surface_speed: 100.0, ..FlightState::default() };
        let cmd = ap.update(&s, &PilotInput::default(), false, DT);
        assert_eq!(cmd.throttle, 1.0);
    }

    #[test]
    fn altitude_hold_cascades_to_climb() {
        let mut ap = AttitudeControlLoop::default();
        ap.hold_altitude(2000.0);
        let s = FlightState { altitude: 1000.0, ..FlightState::default() };
        let cmd = ap.update(&s, &PilotInput::default(), false, DT);
        assert!(ap.channel(ChannelId::VerticalSpeed).setpoint() > 0.0);
        assert!(ap.channel(ChannelId::Elevator).setpoint() > 0.0);
        assert!(cmd.pitch > 0.0);
    }

    #[test]
    fn paused_or_preempted_loop_does_nothing() {
        let mut ap = AttitudeControlLoop::default();
        ap.hold_heading(90.0);
        let input = PilotInput { roll: AxisInput::analog(0.1), ..Default::default() };
        let cmd = ap.update(&level(0.0), &input, true, DT);
        assert_eq!(cmd.roll, 0.1);
        ap.set_paused(true);
        let cmd = ap.update(&level(0.0), &input, false, DT);
        assert_eq!(cmd.roll, 0.1);
        assert_eq!(ap.channel(ChannelId::Aileron).setpoint(), 0.0);
    }

    #[test]
    fn level_off_sets_all_modes() {
        let mut ap = AttitudeControlLoop::default();
        ap.set_paused(true);
        ap.level_off();
        assert!(ap.is_heading_active() && ap.is_wing_level_active());
        assert!(ap.is_vertical_active() && !ap.is_altitude_hold_active());
        assert!(!ap.is_paused());
        assert_eq!(ap.target_vertical_speed(), 0.0);
    }

    #[test]
    fn nudges_wrap_and_clamp() {
        let mut ap = AttitudeControlLoop::default();
        ap.hold_heading(0.2);
        let left = PilotInput { yaw: AxisInput { key_negative: true, ..Default::default() }, ..Default::default() };
        ap.nudge_targets(&left);
        assert_abs_diff_eq!(ap.target_heading(), 359.8, epsilon = 1e-9);

        ap.hold_altitude(10.0);
        let down = PilotInput {
            pitch: AxisInput { key_negative: true, ..Default::default() },
            modifier_held: true,
            ..Default::default()
        };
        ap.nudge_targets(&down);
        assert_eq!(ap.target_altitude(), 0.0);

        ap.hold_vertical_speed(0.0);
        let precise_up = PilotInput {
            pitch: AxisInput::analog(0.5),
            precision_mode: true,
            ..Default::default()
        };
        ap.nudge_targets(&precise_up);
        assert_abs_diff_eq!(ap.target_vertical_speed(), 0.02, epsilon = 1e-12);
    }

    #[test]
    fn tunings_snapshot_and_apply() {
        let mut ap = AttitudeControlLoop::default();
        let mut t = ap.tunings();
        assert_eq!(t, AttitudeTunings::default());
        t.rudder.kp = 0.3;
        ap.apply_tunings(&t);
        assert_eq!(ap.tuning(ChannelId::Rudder).kp, 0.3);
        t.rudder.kp = 0.9;
        assert_eq!(ap.tuning(ChannelId::Rudder).kp, 0.3);
    }

    #[test]
    fn partial_tunings_keep_channel_defaults() {
        let t: AttitudeTunings = serde_json::from_str(r#"{ "altitude": { "kp": 0.2 } }"#).unwrap();
        let defaults = AttitudeTunings::default();
        assert_eq!(t.altitude.kp, 0.2);
        assert_eq!(t.altitude.ki, 0.01);
        assert_eq!(t.altitude.out_max, 50.0);
        assert_eq!(t.altitude.clamp_lower, -0.01);
        assert_eq!(t.altitude.in_min, 0.0);
        assert_eq!(t.aileron, defaults.aileron);
        assert_eq!(t.invalid_limits(), None);

        let bad: AttitudeTunings =
            serde_json::from_str(r#"{ "heading_bank": { "out_min": 30, "out_max": -30 } }"#).unwrap();
        assert_eq!(bad.invalid_limits(), Some((ChannelId::HeadingBank, "output")));
    }
}
