/// Axis magnitudes at or below this are treated as neutral.
pub const DEFAULT_DEADBAND: f64 = 1.0e-5;

// ---------------------------------------------------------------------------
// Manual input sample
// ---------------------------------------------------------------------------

/// One manual control axis: analog magnitude plus the two digital keys.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AxisInput {
    pub value: f64,         // [-1, 1]
    pub key_negative: bool, // e.g. pitch down / roll left / yaw left
    pub key_positive: bool,
    pub locked: bool,       // host input lock for this axis
}

impl AxisInput {
    pub fn analog(value: f64) -> Self {
        Self { value, ..Self::default() }
    }

    /// Pilot is actively commanding this axis.
    pub fn has_input(&self, deadband: f64) -> bool {
        !self.locked && (self.key_negative || self.key_positive || self.value.abs() > deadband)
    }

    /// Signed demand in [-1, 1]; keys win over the analog axis.
    pub fn demand(&self) -> f64 {
        if self.key_negative {
            -1.0
        } else if self.key_positive {
            1.0
        } else {
            self.value.clamp(-1.0, 1.0)
        }
    }
}

/// Discrete key presses seen since the previous tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyEvents {
    pub pause: bool,
    pub level_off: bool,
    pub assist_toggle: bool,
    pub assist_hold_down: bool,
    pub assist_hold_up: bool,
}

/// Pilot input for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PilotInput {
    pub pitch: AxisInput,
    pub roll: AxisInput,
    pub yaw: AxisInput,
    pub throttle: f64,
    pub precision_mode: bool,
    pub modifier_held: bool,
    pub all_locked: bool,
    pub keys: KeyEvents,
}

impl PilotInput {
    /// Multiplier for target nudging: precision mode slows it by 10x, the
    /// modifier key scales by another 10x in the same direction.
    pub fn nudge_scale(&self) -> f64 {
        match (self.precision_mode, self.modifier_held) {
            (true, true) => 0.01,
            (true, false) => 0.1,
            (false, true) => 10.0,
            (false, false) => 1.0,
        }
    }
}
