use crate::config::AutopilotConfig;
use crate::error::PresetError;
use crate::flight::{ControlCommand, FlightState, PilotInput};
use crate::gnc::{AttitudeControlLoop, Controller, GuidanceMode, StabilityAssistController};
use crate::presets::PresetLibrary;

// ---------------------------------------------------------------------------
// Flight state source
// ---------------------------------------------------------------------------

/// Supplies a fresh [`FlightState`] once per tick.
pub trait FlightStateSource {
    fn sample(&mut self) -> FlightState;
}

impl<F: FnMut() -> FlightState> FlightStateSource for F {
    fn sample(&mut self) -> FlightState {
        self()
    }
}

/// Which component produced the attitude axes of the last command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Authority {
    #[default]
    Pilot,
    Attitude,
    Assist,
    HostSas,
}

impl Authority {
    pub fn name(&self) -> &'static str {
        match self {
            Authority::Pilot => "pilot",
            Authority::Attitude => "attitude",
            Authority::Assist => "assist",
            Authority::HostSas => "host-sas",
        }
    }
}

// ---------------------------------------------------------------------------
// Vehicle autopilot
// ---------------------------------------------------------------------------

/// Top-level owner of one attitude control loop and one stability assist.
///
/// Precedence per tick: stability assist, then the host's own stability
/// system, then the attitude loop, then raw pilot input.
pub struct VehicleAutopilot {
    config: AutopilotConfig,
    attitude: AttitudeControlLoop,
    assist: StabilityAssistController,
    source: Option<Box<dyn FlightStateSource>>,
    last_state: Option<FlightState>,
    authority: Authority,
}

impl VehicleAutopilot {
    pub fn new(config: AutopilotConfig) -> Self {
        let (attitude, assist) = Self::build(&config);
        Self {
            config,
            attitude,
            assist,
            source: None,
            last_state: None,
            authority: Authority::Pilot,
        }
    }

    fn build(config: &AutopilotConfig) -> (AttitudeControlLoop, StabilityAssistController) {
        let mut attitude = AttitudeControlLoop::new(&config.attitude);
        attitude.pole_latitude = config.thresholds.pole_latitude_deg;
        attitude.input_deadband = config.thresholds.input_deadband;
        let assist = StabilityAssistController::new(&config.assist, &config.fades, config.thresholds);
        (attitude, assist)
    }

    /// Switch to a new vehicle's state source. Controller state (setpoints,
    /// integrals) carries over unchanged.
    pub fn attach(&mut self, source: Box<dyn FlightStateSource>) {
        if self.source.replace(source).is_some() {
            log::info!("flight state source replaced");
        } else {
            log::info!("flight state source attached");
        }
    }

    pub fn detach(&mut self) -> Option<Box<dyn FlightStateSource>> {
        let source = self.source.take();
        if source.is_some() {
            log::info!("flight state source detached");
        }
        source
    }

    pub fn is_attached(&self) -> bool {
        self.source.is_some()
    }

    /// Sample the attached source and run one control tick. `None` when
    /// nothing is attached.
    pub fn tick(&mut self, input: &PilotInput, dt: f64) -> Option<ControlCommand> {
        let state = self.source.as_mut()?.sample();
        Some(self.update(&state, input, dt))
    }

    /// Run one control tick against `state`.
    pub fn update(&mut self, state: &FlightState, input: &PilotInput, dt: f64) -> ControlCommand {
        if !input.all_locked {
            self.handle_keys(state, input);
            if self.attitude.is_engaged() && !self.attitude.is_paused() && !self.assist.is_operational() {
                self.attitude.nudge_targets(input);
            }
        }

        let preempted = self.assist.is_operational() || state.host_sas_engaged;
        let mut cmd = self.attitude.update(state, input, preempted, dt);
        self.authority = if state.host_sas_engaged && !self.assist.is_operational() {
            Authority::HostSas
        } else if !preempted && self.attitude.is_engaged() && !self.attitude.is_paused() {
            Authority::Attitude
        } else {
            Authority::Pilot
        };

        if let Some(assist) = self.assist.update(state, input, dt) {
            cmd.roll = assist.roll;
            cmd.pitch = assist.pitch;
            cmd.yaw = assist.yaw;
            self.authority = Authority::Assist;
        }

        self.last_state = Some(state.clone());
        cmd.clamped()
    }

    fn handle_keys(&mut self, state: &FlightState, input: &PilotInput) {
        let keys = input.keys;

        // throttle alone does not make the pause key live
        let steering = self.attitude.is_heading_active() || self.attitude.is_vertical_active();
        if keys.pause && steering {
            if self.attitude.is_paused() || self.assist.is_operational() {
                self.attitude.set_paused(false);
                self.assist.set_operational(false, state);
            } else {
                self.attitude.set_paused(true);
            }
        }

        if keys.level_off {
            self.level_off(state);
        }

        if keys.assist_toggle {
            self.assist.toggle_operational(state);
        }
        if keys.assist_hold_down {
            self.assist.hold_pressed(state);
        }
        if keys.assist_hold_up {
            self.assist.hold_released(state);
        }
    }

    // -----------------------------------------------------------------------
    // Mode switching (engaging an attitude mode hands control back from the assist)
    // -----------------------------------------------------------------------

    fn engaged(&mut self, on: bool, state: &FlightState) -> bool {
        if on {
            self.assist.set_operational(false, state);
        }
        on
    }

    pub fn toggle_heading(&mut self, state: &FlightState) -> bool {
        let on = self.attitude.toggle_heading(state);
        self.engaged(on, state)
    }

    pub fn toggle_wing_level(&mut self, state: &FlightState) -> bool {
        self.attitude.toggle_wing_level(state)
    }

    pub fn toggle_vertical(&mut self, state: &FlightState) -> bool {
        let on = self.attitude.toggle_vertical(state);
        self.engaged(on, state)
    }

    pub fn toggle_altitude_hold(&mut self, state: &FlightState) -> bool {
        self.attitude.toggle_altitude_hold(state)
    }

    pub fn toggle_throttle(&mut self, state: &FlightState) -> bool {
        let on = self.attitude.toggle_throttle(state);
        self.engaged(on, state)
    }

    pub fn hold_heading(&mut self, heading: f64, state: &FlightState) {
        self.attitude.hold_heading(heading);
        self.engaged(true, state);
    }

    pub fn hold_vertical_speed(&mut self, vertical_speed: f64, state: &FlightState) {
        self.attitude.hold_vertical_speed(vertical_speed);
        self.engaged(true, state);
    }

    pub fn hold_altitude(&mut self, altitude: f64, state: &FlightState) {
        self.attitude.hold_altitude(altitude);
        self.engaged(true, state);
    }

    pub fn hold_speed(&mut self, speed: f64, state: &FlightState) {
        self.attitude.hold_speed(speed);
        self.engaged(true, state);
    }

    pub fn level_off(&mut self, state: &FlightState) {
        self.attitude.level_off();
        self.engaged(true, state);
    }

    pub fn toggle_assist(&mut self, state: &FlightState) -> bool {
        self.assist.toggle_operational(state)
    }

    pub fn set_guidance_mode(&mut self, mode: GuidanceMode, state: &FlightState) {
        self.assist.set_guidance_mode(mode, state);
    }

    // -----------------------------------------------------------------------
    // Presets
    // -----------------------------------------------------------------------

    /// Load an attitude preset into the loop and mark it active.
    pub fn apply_attitude_preset(&mut self, library: &mut PresetLibrary, name: &str) -> Result<(), PresetError> {
        let tunings = library.attitude.activate(name)?;
        self.attitude.apply_tunings(&tunings);
        log::info!("attitude preset `{}` loaded", name);
        Ok(())
    }

    pub fn apply_assist_preset(&mut self, library: &mut PresetLibrary, name: &str) -> Result<(), PresetError> {
        let tunings = library.assist.activate(name)?;
        self.assist.apply_tunings(&tunings);
        log::info!("assist preset `{}` loaded", name);
        Ok(())
    }

    /// Write the live tunings back into both active presets.
    pub fn update_active_presets(&self, library: &mut PresetLibrary) -> Result<(), PresetError> {
        library.attitude.update_active(self.attitude.tunings())?;
        library.assist.update_active(self.assist.tunings())?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn attitude(&self) -> &AttitudeControlLoop {
        &self.attitude
    }

    pub fn attitude_mut(&mut self) -> &mut AttitudeControlLoop {
        &mut self.attitude
    }

    pub fn assist(&self) -> &StabilityAssistController {
        &self.assist
    }

    pub fn assist_mut(&mut self) -> &mut StabilityAssistController {
        &mut self.assist
    }

    pub fn config(&self) -> &AutopilotConfig {
        &self.config
    }

    pub fn last_state(&self) -> Option<&FlightState> {
        self.last_state.as_ref()
    }

    pub fn authority(&self) -> Authority {
        self.authority
    }
}

impl Default for VehicleAutopilot {
    fn default() -> Self {
        Self::new(AutopilotConfig::default())
    }
}

impl Controller for VehicleAutopilot {
    fn control(&mut self, state: &FlightState, input: &PilotInput, dt: f64) -> ControlCommand {
        self.update(state, input, dt)
    }

    /// Rebuild both loops from the configuration; the attached source stays.
    fn reset(&mut self) {
        let (attitude, assist) = Self::build(&self.config);
        self.attitude = attitude;
        self.assist = assist;
        self.last_state = None;
        self.authority = Authority::Pilot;
    }

    fn name(&self) -> &str {
        "VehicleAutopilot"
    }
}
