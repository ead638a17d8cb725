//! Velocity helpers

/// Velocities with a magnitude below this are considered zero, in m/s.
pub const NEGLIGIBLE_VELOCITY_MS: f64 = 0.001;

/// Distances below this are too small to divide by when computing a
/// deceleration rate, in m.
pub const MIN_DECEL_DISTANCE_M: f64 = 0.005;

/// Returns true if the velocity is close enough to zero to be treated as
/// stopped.
pub fn is_velocity_negligible(velocity_ms: f64) -> bool {
    velocity_ms.abs() < NEGLIGIBLE_VELOCITY_MS
}

/// Rate of deceleration needed to lose `velocity_ms` over `distance_m`.
///
/// Very short distances give a fixed rate of 1.0 rather than dividing by
/// (nearly) zero.
pub fn deceleration_rate(velocity_ms: f64, distance_m: f64) -> f64 {
    if distance_m < MIN_DECEL_DISTANCE_M {
        return 1.0;
    }

    velocity_ms / distance_m
}
