//! Errors for the document-facing parts of the crate. The control loops
//! themselves never fail.

use thiserror::Error;

/// Preset registry and preset document errors.
#[derive(Error, Debug)]
pub enum PresetError {
    #[error("preset name must not be empty")]
    EmptyName,

    #[error("a preset named `{0}` already exists")]
    DuplicateName(String),

    #[error("no preset named `{0}`")]
    NotFound(String),

    #[error("no preset is active")]
    NoActive,

    #[error("preset `{preset}`: {channel} has NaN or inverted {limits} limits")]
    InvalidLimits {
        preset: String,
        channel: &'static str,
        limits: &'static str,
    },

    #[error("preset file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed preset document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Autopilot configuration loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed config document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{channel} has NaN or inverted {limits} limits")]
    InvalidLimits {
        channel: &'static str,
        limits: &'static str,
    },
}
