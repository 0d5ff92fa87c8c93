use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::flight::DEFAULT_DEADBAND;
use crate::gnc::attitude::DEFAULT_POLE_LATITUDE;
use crate::gnc::{AssistFades, AssistTunings, AttitudeTunings};

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Angles (degrees) and deadbands that switch controller behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Bank beyond which roll input also pauses pitch and yaw.
    pub roll_sync_deg: f64,
    /// Pitch beyond which pitch or yaw input also pauses roll.
    pub vertical_pitch_deg: f64,
    /// Roll tracking switches to vector mode above this pitch...
    pub vector_enter_deg: f64,
    /// ...and back to surface mode below this one.
    pub surface_reenter_deg: f64,
    pub pole_latitude_deg: f64,
    pub input_deadband: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            roll_sync_deg: 5.0,
            vertical_pitch_deg: 70.0,
            vector_enter_deg: 30.0,
            surface_reenter_deg: 25.0,
            pole_latitude_deg: DEFAULT_POLE_LATITUDE,
            input_deadband: DEFAULT_DEADBAND,
        }
    }
}

// ---------------------------------------------------------------------------
// Autopilot configuration
// ---------------------------------------------------------------------------

/// Everything needed to build a [`VehicleAutopilot`](crate::autopilot::VehicleAutopilot).
/// Missing fields in a document fall back to the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutopilotConfig {
    pub attitude: AttitudeTunings,
    pub assist: AssistTunings,
    pub fades: AssistFades,
    pub thresholds: Thresholds,
}

impl AutopilotConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.check_limits()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject tunings whose limit pairs cannot be clamped to.
    fn check_limits(&self) -> Result<(), ConfigError> {
        if let Some((id, limits)) = self.attitude.invalid_limits() {
            return Err(ConfigError::InvalidLimits { channel: id.name(), limits });
        }
        if let Some((axis, limits)) = self.assist.invalid_limits() {
            return Err(ConfigError::InvalidLimits { channel: axis.name(), limits });
        }
        Ok(())
    }
}
