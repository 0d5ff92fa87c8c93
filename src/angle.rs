// ---------------------------------------------------------------------------
// Angle helpers (degrees)
// ---------------------------------------------------------------------------

/// Shift `current` by a full turn so that `target - result` is the short-path
/// angular error. Inputs are expected within one turn of each other.
///
/// `relative_angle(350.0, 10.0)` returns `-10.0`, so a controller fed
/// `target - result` sees +20 degrees instead of -340.
pub fn relative_angle(current: f64, target: f64) -> f64 {
    let diff = target - current;
    if diff < -180.0 {
        current - 360.0
    } else if diff > 180.0 {
        current + 360.0
    } else {
        current
    }
}

/// Wrap a heading into [0, 360).
pub fn wrap_heading(heading: f64) -> f64 {
    let wrapped = heading.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Linear interpolation, `pct` clamped to [0, 1].
pub fn lerp(pct: f64, lower: f64, upper: f64) -> f64 {
    let pct = pct.clamp(0.0, 1.0);
    (1.0 - pct) * lower + pct * upper
}
