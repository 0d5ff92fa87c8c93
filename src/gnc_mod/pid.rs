use super::tuning::PidTuning;

/// Setpoint acceleration per unit of `easing`, in setpoint units/s^2.
pub const EASE_ACCEL: f64 = 25.0;

/// Default proportion of the previous derivative kept each tick.
pub const DEFAULT_ROLLING_FACTOR: f64 = 0.5;

// ---------------------------------------------------------------------------
// PID channel (single axis)
// ---------------------------------------------------------------------------

/// Single-axis PID controller.
///
/// The error convention is `process value - setpoint`, so a positive gain
/// produces a positive output when the process value is above target. Callers
/// negate the response where the actuator acts the other way.
#[derive(Debug, Clone)]
pub struct PidChannel {
    tuning: PidTuning,
    active_setpoint: f64,
    target_setpoint: f64,
    increment: f64,
    integral: f64,
    previous_input: f64,
    rolling_diff: f64,
    rolling_factor: f64,
    skip_derivative: bool,
    dt: f64,
}

impl PidChannel {
    /// Build a channel that owns its own copy of `tuning`.
    pub fn new(tuning: PidTuning) -> Self {
        Self {
            tuning: tuning,
            active_setpoint: 0.0,
            target_setpoint: 0.0,
            increment: 0.0,
            integral: 0.0,
            previous_input: 0.0,
            rolling_diff: 0.0,
            rolling_factor: DEFAULT_ROLLING_FACTOR,
            // no previous sample yet
            skip_derivative: true,
            dt: 1.0,
        }
    }

    /// Process-value response. Differentiates the (clamped) process value
    /// itself for the D term.
    pub fn response(&mut self, process_value: f64, use_integral: bool, dt: f64) -> f64 {
        self.dt = dt;
        let easing = self.ease_setpoint(dt);

        let input = limit(process_value, self.tuning.in_min, self.tuning.in_max);
        let error = input - self.active_setpoint;

        if self.skip_derivative {
            self.skip_derivative = false;
            self.previous_input = input;
        }

        let p = self.proportional(error);
        let i = self.integral_term(error, use_integral && !easing);
        let d = self.derivative(input);

        limit(p + i + d, self.tuning.out_min, self.tuning.out_max)
    }

    /// Error + rate response, for callers that already hold a wrapped error
    /// and an independently measured rate of the process value.
    ///
    /// The D term is `rate * kd / scale`, unsmoothed.
    pub fn response_with_rate(&mut self, error: f64, rate: f64, use_integral: bool, dt: f64) -> f64 {
        self.dt = dt;
        let p = self.proportional(error);
        let i = self.integral_term(error, use_integral);
        let d = if self.tuning.kd == 0.0 {
            0.0
        } else {
            rate * self.tuning.kd / self.tuning.scale()
        };

        limit(p + i + d, self.tuning.out_min, self.tuning.out_max)
    }

    /// Advance the active setpoint toward the target. Returns true while
    /// the setpoint is still moving.
    fn ease_setpoint(&mut self, dt: f64) -> bool {
        if self.active_setpoint == self.target_setpoint {
            return false;
        }
        // quadratic ease-in: the increment itself grows every tick
        self.increment += self.tuning.easing() * dt * dt * EASE_ACCEL;
        if self.active_setpoint < self.target_setpoint {
            self.active_setpoint = (self.active_setpoint + self.increment).min(self.target_setpoint);
        } else {
            self.active_setpoint = (self.active_setpoint - self.increment).max(self.target_setpoint);
        }
        self.active_setpoint != self.target_setpoint
    }

    fn proportional(&self, error: f64) -> f64 {
        if self.tuning.kp == 0.0 {
            return 0.0;
        }
        error * self.tuning.kp / self.tuning.scale()
    }

    fn integral_term(&mut self, error: f64, use_integral: bool) -> f64 {
        if self.tuning.ki == 0.0 || !use_integral {
            self.integral = 0.0;
            return 0.0;
        }
        self.integral += error * self.dt * self.tuning.ki / self.tuning.scale();
        // anti-windup
        self.integral = limit(self.integral, self.tuning.clamp_lower, self.tuning.clamp_upper);
        self.integral
    }

    fn derivative(&mut self, input: f64) -> f64 {
        if self.tuning.kd == 0.0 {
            return 0.0;
        }
        let diff = (input - self.previous_input) / self.dt;
        self.rolling_diff = self.rolling_diff * self.rolling_factor + diff * (1.0 - self.rolling_factor);
        self.previous_input = input;
        self.rolling_diff * self.tuning.kd / self.tuning.scale()
    }

    /// Zero the integral sum. Called when the mode that drives this channel
    /// is switched off.
    pub fn clear(&mut self) {
        self.integral = 0.0;
    }

    /// Treat the next process value as the first sample (no derivative kick).
    pub fn skip_derivative(&mut self) {
        self.skip_derivative = true;
    }

    /// Currently active setpoint.
    pub fn setpoint(&self) -> f64 {
        self.active_setpoint
    }

    /// Setpoint the channel is easing toward.
    pub fn target_setpoint(&self) -> f64 {
        self.target_setpoint
    }

    /// Jump to `value` immediately.
    pub fn set_setpoint(&mut self, value: f64) {
        self.active_setpoint = value;
        self.target_setpoint = value;
        self.increment = 0.0;
    }

    /// Glide to `value` over the following ticks.
    pub fn set_setpoint_bumpless(&mut self, value: f64) {
        self.target_setpoint = value;
        self.increment = 0.0;
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn tuning(&self) -> PidTuning {
        self.tuning
    }

    /// Replace gains and limits; controller state is kept.
    pub fn apply_tuning(&mut self, tuning: PidTuning) {
        self.tuning = tuning;
    }

    pub fn set_rolling_factor(&mut self, factor: f64) {
        self.rolling_factor = factor.clamp(0.0, 1.0);
    }
}

/// Clamp that tolerates `lo > hi` and NaN bounds (`hi` wins, NaN is ignored).
fn limit(value: f64, lo: f64, hi: f64) -> f64 {
    value.max(lo).min(hi)
}
