use crate::angle::relative_angle;
use crate::flight::FlightState;

// ---------------------------------------------------------------------------
// Simulation events
// ---------------------------------------------------------------------------

/// Kinds of simulation events.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    HeadingCaptured { target: f64 },
    AltitudeCrossed { altitude: f64, ascending: bool },
    Touchdown,
    Custom(String),
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::HeadingCaptured { target } => write!(f, "heading {:.0} captured", target),
            EventKind::AltitudeCrossed { altitude, ascending } => write!(
                f,
                "altitude {:.0} m ({})",
                altitude,
                if *ascending { "ascending" } else { "descending" }
            ),
            EventKind::Touchdown => write!(f, "touchdown"),
            EventKind::Custom(s) => write!(f, "{}", s),
        }
    }
}

/// A discrete event that occurred during simulation.
#[derive(Debug, Clone)]
pub struct SimEvent {
    pub time: f64,
    pub kind: EventKind,
}

/// Passive detector over consecutive flight states.
pub trait EventDetector {
    fn check(&mut self, prev: &FlightState, current: &FlightState) -> Option<EventKind>;
}

/// Fires once when the heading first comes within `tolerance` of `target`.
pub struct HeadingCaptureDetector {
    pub target: f64,
    pub tolerance: f64,
    fired: bool,
}

impl HeadingCaptureDetector {
    pub fn new(target: f64, tolerance: f64) -> Self {
        Self { target, tolerance, fired: false }
    }
}

impl EventDetector for HeadingCaptureDetector {
    fn check(&mut self, _prev: &FlightState, current: &FlightState) -> Option<EventKind> {
        if self.fired {
            return None;
        }
        let error = relative_angle(current.heading, self.target) - self.target;
        if error.abs() <= self.tolerance {
            self.fired = true;
            Some(EventKind::HeadingCaptured { target: self.target })
        } else {
            None
        }
    }
}

/// Detects when altitude crosses a threshold (ascending or descending).
pub struct AltitudeDetector {
    pub altitude: f64,
    pub ascending: bool,
    fired: bool,
}

impl AltitudeDetector {
    pub fn new(altitude: f64, ascending: bool) -> Self {
        Self { altitude, ascending, fired: false }
    }
}

impl EventDetector for AltitudeDetector {
    fn check(&mut self, prev: &FlightState, current: &FlightState) -> Option<EventKind> {
        if self.fired {
            return None;
        }
        let crossed = if self.ascending {
            prev.altitude < self.altitude && current.altitude >= self.altitude
        } else {
            prev.altitude > self.altitude && current.altitude <= self.altitude
        };
        if crossed {
            self.fired = true;
            Some(EventKind::AltitudeCrossed { altitude: self.altitude, ascending: self.ascending })
        } else {
            None
        }
    }
}

/// Detects the transition to grounded.
pub struct TouchdownDetector;

impl EventDetector for TouchdownDetector {
    fn check(&mut self, prev: &FlightState, current: &FlightState) -> Option<EventKind> {
        if !prev.grounded && current.grounded {
            Some(EventKind::Touchdown)
        } else {
            None
        }
    }
}
