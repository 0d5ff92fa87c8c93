use serde::{Deserialize, Serialize};

/// Floor for `scale` and `easing`; both divide or drive a ramp.
pub const MIN_SCALE: f64 = 0.01;

/// Input bounds used when a channel has no meaningful input clamp.
pub const UNBOUNDED_INPUT: f64 = 1.0e9;

// ---------------------------------------------------------------------------
// PID tuning (value object, copied into every channel)
// ---------------------------------------------------------------------------

/// Gains and limits for one [`PidChannel`](super::PidChannel).
///
/// All gain terms are divided by `scale`, which lets presets carry gains of a
/// convenient magnitude. `scale` and `easing` are floored at [`MIN_SCALE`] on
/// every write. A document deserialises as a [`TuningPatch`] laid over
/// [`PidTuning::default`], so the floors apply there too.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "TuningPatch")]
pub struct PidTuning {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub in_min: f64,
    pub in_max: f64,
    pub out_min: f64,
    pub out_max: f64,
    pub clamp_lower: f64,
    pub clamp_upper: f64,
    scale: f64,
    easing: f64,
}

impl PidTuning {
    pub fn new(
        kp: f64,
        ki: f64,
        kd: f64,
        out_min: f64,
        out_max: f64,
        clamp_lower: f64,
        clamp_upper: f64,
    ) -> Self {
        Self {
            kp,
            ki,
            kd,
            in_min: -UNBOUNDED_INPUT,
            in_max: UNBOUNDED_INPUT,
            out_min,
            out_max,
            clamp_lower,
            clamp_upper,
            scale: 1.0,
            easing: 1.0,
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.set_scale(scale);
        self
    }

    pub fn with_easing(mut self, easing: f64) -> Self {
        self.set_easing(easing);
        self
    }

    pub fn with_input_limits(mut self, in_min: f64, in_max: f64) -> Self {
        self.in_min = in_min;
        self.in_max = in_max;
        self
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f64) {
        self.scale = scale.max(MIN_SCALE);
    }

    pub fn easing(&self) -> f64 {
        self.easing
    }

    pub fn set_easing(&mut self, easing: f64) {
        self.easing = easing.max(MIN_SCALE);
    }

    /// Name of the first limit pair that is NaN or has `min > max`.
    pub fn invalid_limits(&self) -> Option<&'static str> {
        [
            ("input", self.in_min, self.in_max),
            ("output", self.out_min, self.out_max),
            ("integral", self.clamp_lower, self.clamp_upper),
        ]
        .into_iter()
        .find(|&(_, lo, hi)| !(lo <= hi))
        .map(|(name, _, _)| name)
    }
}

impl Default for PidTuning {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, -1.0, 1.0, -1.0, 1.0)
    }
}

// ---------------------------------------------------------------------------
// Partial tuning (document form)
// ---------------------------------------------------------------------------

/// A tuning with every field optional, as read from a config or preset
/// document. Absent fields keep the value of whatever tuning it is laid over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TuningPatch {
    pub kp: Option<f64>,
    pub ki: Option<f64>,
    pub kd: Option<f64>,
    pub in_min: Option<f64>,
    pub in_max: Option<f64>,
    pub out_min: Option<f64>,
    pub out_max: Option<f64>,
    pub clamp_lower: Option<f64>,
    pub clamp_upper: Option<f64>,
    pub scale: Option<f64>,
    pub easing: Option<f64>,
}

impl TuningPatch {
    pub fn over(self, base: PidTuning) -> PidTuning {
        let mut t = base;
        t.kp = self.kp.unwrap_or(t.kp);
        t.ki = self.ki.unwrap_or(t.ki);
        t.kd = self.kd.unwrap_or(t.kd);
        t.in_min = self.in_min.unwrap_or(t.in_min);
        t.in_max = self.in_max.unwrap_or(t.in_max);
        t.out_min = self.out_min.unwrap_or(t.out_min);
        t.out_max = self.out_max.unwrap_or(t.out_max);
        t.clamp_lower = self.clamp_lower.unwrap_or(t.clamp_lower);
        t.clamp_upper = self.clamp_upper.unwrap_or(t.clamp_upper);
        t.set_scale(self.scale.unwrap_or(t.scale));
        t.set_easing(self.easing.unwrap_or(t.easing));
        t
    }
}

impl From<TuningPatch> for PidTuning {
    fn from(patch: TuningPatch) -> Self {
        patch.over(PidTuning::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_and_easing_are_floored() {
        let mut t = PidTuning::default().with_scale(0.0).with_easing(-3.0);
        assert_eq!(t.scale(), MIN_SCALE);
        assert_eq!(t.easing(), MIN_SCALE);
        t.set_scale(4.0);
        assert_eq!(t.scale(), 4.0);
    }

    #[test]
    fn deserialised_tuning_is_floored() {
        let t: PidTuning = serde_json::from_str(r#"{"kp": 2.0, "scale": 0.0}"#).unwrap();
        assert_eq!(t.kp, 2.0);
        assert_eq!(t.out_max, 1.0);
        assert_eq!(t.scale(), MIN_SCALE);
    }

    #[test]
    fn patch_keeps_base_fields() {
        let base = PidTuning::new(0.15, 0.01, 0.0, -50.0, 50.0, -0.01, 0.01).with_scale(3.0);
        let patch: TuningPatch = serde_json::from_str(r#"{"kp": 0.2, "easing": -1.0}"#).unwrap();
        let t = patch.over(base);
        assert_eq!(t.kp, 0.2);
        assert_eq!(t.ki, 0.01);
        assert_eq!(t.out_min, -50.0);
        assert_eq!(t.clamp_upper, 0.01);
        assert_eq!(t.scale(), 3.0);
        assert_eq!(t.easing(), MIN_SCALE);
    }

    #[test]
    fn inverted_or_nan_limits_are_reported() {
        assert_eq!(PidTuning::default().invalid_limits(), None);
        let mut t = PidTuning::new(1.0, 0.0, 0.0, 30.0, -30.0, -1.0, 1.0);
        assert_eq!(t.invalid_limits(), Some("output"));
        t.out_min = -30.0;
        t.in_max = f64::NAN;
        assert_eq!(t.invalid_limits(), Some("input"));
        t = t.with_input_limits(-1.0, 1.0);
        t.clamp_lower = 0.5;
        t.clamp_upper = 0.1;
        assert_eq!(t.invalid_limits(), Some("integral"));
    }

    #[test]
    fn copies_do_not_alias() {
        let a = PidTuning::new(1.0, 0.0, 0.0, -1.0, 1.0, -0.5, 0.5);
        let mut b = a;
        b.kp = 5.0;
        assert_eq!(a.kp, 1.0);
    }
}
