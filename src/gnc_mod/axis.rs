use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Activation fade parameters
// ---------------------------------------------------------------------------

/// Timing of the fade-in applied when an assist axis re-engages. Times are in
/// control ticks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FadeConfig {
    /// Ticks to wait after the override ends before the axis re-engages.
    pub activation_delay: u32,
    /// Output divisor applied on the first engaged tick (>= 1).
    pub fade_initial: f64,
    /// Ticks until the divisor has decayed to 1.
    pub time_max: u32,
}

impl Default for FadeConfig {
    fn default() -> Self {
        Self {
            activation_delay: 0,
            fade_initial: 10.0,
            time_max: 75,
        }
    }
}

impl FadeConfig {
    /// Decay constant `k` of `initial * e^(k t)`; zero when there is nothing to fade.
    pub fn decay_constant(&self) -> f64 {
        let initial = self.fade_initial.max(1.0);
        if self.time_max == 0 || initial <= 1.0 {
            0.0
        } else {
            (1.0 / initial).ln() / self.time_max as f64
        }
    }
}

// ---------------------------------------------------------------------------
// Per-axis state
// ---------------------------------------------------------------------------

/// Enable/pause bookkeeping and activation fade for one assist axis.
#[derive(Debug, Clone)]
pub struct AxisState {
    pub enabled: bool,
    paused: bool,
    fade: FadeConfig,
    decay: f64,
    delay_remaining: u32,
    fading_in: bool,
    fade_current: f64,
    time_elapsed: u32,
}

impl AxisState {
    pub fn new(fade: FadeConfig) -> Self {
        Self {
            enabled: true,
            paused: false,
            decay: fade.decay_constant(),
            fade,
            delay_remaining: 0,
            fading_in: false,
            fade_current: 1.0,
            time_elapsed: 0,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Set the override flag. Returns true on the tick the override ends.
    pub fn set_paused(&mut self, paused: bool) -> bool {
        let released = self.paused && !paused;
        self.paused = paused;
        if paused {
            self.fading_in = false;
            self.delay_remaining = 0;
        }
        released
    }

    /// Begin re-engagement: wait out the activation delay, then divide
    /// output by `fade_initial` and decay toward 1.
    pub fn start_fade_in(&mut self) {
        self.delay_remaining = self.fade.activation_delay;
        self.fading_in = true;
        self.fade_current = self.fade.fade_initial.max(1.0);
        self.time_elapsed = 0;
    }

    /// True while the axis is still waiting out its activation delay.
    pub fn is_delaying(&self) -> bool {
        self.delay_remaining > 0
    }

    pub fn is_fading_in(&self) -> bool {
        self.fading_in
    }

    /// Current output divisor, >= 1.
    pub fn fade_current(&self) -> f64 {
        self.fade_current
    }

    /// Advance one tick of delay or fade.
    pub fn advance(&mut self) {
        if self.delay_remaining > 0 {
            self.delay_remaining -= 1;
            return;
        }
        if !self.fading_in {
            return;
        }
        self.time_elapsed += 1;
        if self.time_elapsed >= self.fade.time_max {
            self.fade_current = 1.0;
            self.fading_in = false;
        } else {
            let initial = self.fade.fade_initial.max(1.0);
            let next = (initial * (self.decay * self.time_elapsed as f64).exp()).max(1.0);
            // guard against float noise in the exponential
            self.fade_current = next.min(self.fade_current);
        }
    }

    pub fn fade_config(&self) -> FadeConfig {
        self.fade
    }

    pub fn set_fade_config(&mut self, fade: FadeConfig) {
        self.fade = fade;
        self.decay = fade.decay_constant();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn fade_is_monotonic_and_reaches_one() {
        let mut axis = AxisState::new(FadeConfig::default());
        axis.start_fade_in();
        assert_abs_diff_eq!(axis.fade_current(), 10.0);
        let mut last = axis.fade_current();
        for _ in 0..75 {
            axis.advance();
            assert!(axis.fade_current() <= last);
            assert!(axis.fade_current() >= 1.0);
            last = axis.fade_current();
        }
        assert_eq!(axis.fade_current(), 1.0);
        assert!(!axis.is_fading_in());
    }

    #[test]
    fn fade_halfway_is_geometric_mean() {
        let fade = FadeConfig { activation_delay: 0, fade_initial: 16.0, time_max: 4 };
        let mut axis = AxisState::new(fade);
        axis.start_fade_in();
        axis.advance();
        axis.advance();
        assert_abs_diff_eq!(axis.fade_current(), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn delay_holds_fade_at_initial() {
        let fade = FadeConfig { activation_delay: 3, fade_initial: 5.0, time_max: 10 };
        let mut axis = AxisState::new(fade);
        axis.start_fade_in();
        for _ in 0..3 {
            assert!(axis.is_delaying());
            axis.advance();
            assert_abs_diff_eq!(axis.fade_current(), 5.0);
        }
        assert!(!axis.is_delaying());
        axis.advance();
        assert!(axis.fade_current() < 5.0);
    }

    #[test]
    fn release_is_reported_once() {
        let mut axis = AxisState::new(FadeConfig::default());
        assert!(!axis.set_paused(true));
        assert!(axis.set_paused(false));
        assert!(!axis.set_paused(false));
    }

    #[test]
    fn initial_below_one_means_no_fade() {
        let fade = FadeConfig { activation_delay: 0, fade_initial: 0.5, time_max: 10 };
        let mut axis = AxisState::new(fade);
        axis.start_fade_in();
        assert_eq!(axis.fade_current(), 1.0);
        assert_eq!(fade.decay_constant(), 0.0);
    }
}
