use std::io::{self, Write};
use std::path::Path;

use crate::flight::{ControlCommand, FlightState};

/// Write telemetry in CSV format, one row per tick. `commands[i]` is the
/// command that produced `states[i]`; missing commands are written as zero.
///
/// Columns: time, heading_deg, pitch_deg, roll_deg, aoa_deg, sideslip_deg,
///          vertical_speed, altitude, speed, p_dps, q_dps, r_dps,
///          cmd_roll, cmd_pitch, cmd_yaw, cmd_throttle
pub fn write_telemetry<W: Write>(
    writer: &mut W,
    states: &[FlightState],
    commands: &[ControlCommand],
) -> io::Result<()> {
    writeln!(
        writer,
        "time,heading_deg,pitch_deg,roll_deg,aoa_deg,sideslip_deg,\
         vertical_speed,altitude,speed,p_dps,q_dps,r_dps,\
         cmd_roll,cmd_pitch,cmd_yaw,cmd_throttle"
    )?;

    for (i, s) in states.iter().enumerate() {
        let c = commands.get(i).copied().unwrap_or_default();
        let w = s.angular_velocity;
        writeln!(
            writer,
            "{:.4},{:.3},{:.3},{:.3},{:.3},{:.3},\
             {:.3},{:.2},{:.3},{:.3},{:.3},{:.3},\
             {:.4},{:.4},{:.4},{:.4}",
            s.time, s.heading, s.pitch, s.roll, s.aoa, s.yaw,
            s.vertical_speed, s.altitude, s.surface_speed, w.x, w.y, w.z,
            c.roll, c.pitch, c.yaw, c.throttle,
        )?;
    }

    Ok(())
}

/// Write telemetry to a CSV file at the given path.
pub fn write_telemetry_file(
    path: impl AsRef<Path>,
    states: &[FlightState],
    commands: &[ControlCommand],
) -> io::Result<()> {
    let mut file = io::BufWriter::new(std::fs::File::create(path)?);
    write_telemetry(&mut file, states, commands)?;
    file.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{AircraftParams, AircraftState};

    #[test]
    fn csv_output_has_header_and_rows() {
        let p = AircraftParams::default();
        let s0 = AircraftState::cruise(45.0, 1000.0, 100.0, &p).flight_state(0.0);
        let mut s1 = s0.clone();
        s1.time = 0.02;
        let cmds = vec![ControlCommand { throttle: 0.5, ..Default::default() }];

        let mut buf = Vec::new();
        write_telemetry(&mut buf, &[s0, s1], &cmds).unwrap();
        let output = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert!(lines[0].starts_with("time,heading_deg,"));
        assert_eq!(lines.len(), 3); // header + 2 data rows
        assert!(lines[1].starts_with("0.0000,45.000,"));
        assert!(lines[1].ends_with(",0.5000"));
        // second row has no command
        assert!(lines[2].ends_with(",0.0000"));
        assert_eq!(lines[1].split(',').count(), 16);
    }
}
