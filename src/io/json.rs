use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::angle::relative_angle;
use crate::flight::FlightState;
use crate::sim::SimResult;

/// Summary statistics computed from a simulated flight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightSummary {
    pub controller: String,
    pub flight_time_s: f64,
    pub final_heading_deg: f64,
    pub final_altitude_m: f64,
    pub final_speed_ms: f64,
    pub min_altitude_m: f64,
    pub max_altitude_m: f64,
    pub max_bank_deg: f64,
    pub max_roll_rate_dps: f64,
    /// Tick-to-tick change of the largest axis command, a measure of how
    /// smoothly the controller drives the surfaces.
    pub max_command_step: f64,
    pub events: Vec<EventRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    pub time_s: f64,
    pub event: String,
}

impl FlightSummary {
    /// Compute the summary. Returns `None` for an empty run.
    pub fn from_result(controller: &str, result: &SimResult) -> Option<Self> {
        let last = result.states.last()?;

        let (min_alt, max_alt) = result
            .states
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
                (lo.min(s.altitude), hi.max(s.altitude))
            });

        let max_bank = result.states.iter().map(|s| s.roll.abs()).fold(0.0_f64, f64::max);
        let max_roll_rate = result
            .states
            .iter()
            .map(FlightState::roll_rate)
            .map(f64::abs)
            .fold(0.0_f64, f64::max);

        let max_command_step = result
            .commands
            .windows(2)
            .map(|w| {
                (w[1].roll - w[0].roll)
                    .abs()
                    .max((w[1].pitch - w[0].pitch).abs())
                    .max((w[1].yaw - w[0].yaw).abs())
            })
            .fold(0.0_f64, f64::max);

        Some(FlightSummary {
            controller: controller.to_string(),
            flight_time_s: last.time,
            final_heading_deg: last.heading,
            final_altitude_m: last.altitude,
            final_speed_ms: last.surface_speed,
            min_altitude_m: min_alt,
            max_altitude_m: max_alt,
            max_bank_deg: max_bank,
            max_roll_rate_dps: max_roll_rate,
            max_command_step,
            events: result
                .events
                .iter()
                .map(|e| EventRecord { time_s: e.time, event: e.kind.to_string() })
                .collect(),
        })
    }

    /// Short-path error between the final heading and `target`.
    pub fn heading_error(&self, target: f64) -> f64 {
        target - relative_angle(self.final_heading_deg, target)
    }
}

/// Write flight summary as pretty JSON to a writer.
pub fn write_summary<W: Write>(writer: &mut W, summary: &FlightSummary) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(writer, summary)
}

/// Write flight summary JSON to a file.
pub fn write_summary_file(path: impl AsRef<Path>, summary: &FlightSummary) -> std::io::Result<()> {
    let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
    write_summary(&mut file, summary)?;
    writeln!(file)?;
    file.flush()
}
