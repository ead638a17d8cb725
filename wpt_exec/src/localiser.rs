//! # Waypoint localiser
//!
//! Finds the index of the waypoint the vehicle is at along the path.
//!
//! The nearest waypoint by distance may be slightly behind the vehicle. The
//! localiser compares the vehicle heading with the bearing to the nearest
//! waypoint, and if they differ by more than a quarter of pi the waypoint is
//! considered behind and the next waypoint along the path is used instead.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use std::f64::consts::{FRAC_PI_4, PI};

use crate::{
    loc::Pose,
    nearest::{LinearScan, NearestNeighbourFinder},
    path::Waypoint,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The result of localising the vehicle on the path.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Localisation {
    /// Index of the waypoint the vehicle is heading towards
    pub index: usize,

    /// Index of the nearest waypoint by distance alone
    pub nearest_index: usize,

    /// True if the nearest waypoint was behind the vehicle and the index was
    /// advanced
    pub advanced: bool,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocaliseError {
    #[error("Cannot localise against an empty waypoint sequence or from a non-finite position")]
    InvalidInput,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Find the index of the waypoint nearest the pose, advanced by one if that
/// waypoint is behind the vehicle's heading.
///
/// The returned index is always in `[0, finder.len())`.
pub fn find_nearest_index<F>(pose: &Pose, finder: &F) -> Result<usize, LocaliseError>
where
    F: NearestNeighbourFinder + ?Sized,
{
    localise(pose, finder).map(|l| l.index)
}

/// Same as [`find_nearest_index`] using a linear scan over `waypoints`.
pub fn find_nearest_index_linear(pose: &Pose, waypoints: &[Waypoint]) -> Result<usize, LocaliseError> {
    let scan = LinearScan::new(waypoints.iter().map(|w| w.position_m).collect());
    find_nearest_index(pose, &scan)
}

/// Localise the pose on the path searched by `finder`, reporting whether the
/// heading check advanced the index.
pub fn localise<F>(pose: &Pose, finder: &F) -> Result<Localisation, LocaliseError>
where
    F: NearestNeighbourFinder + ?Sized,
{
    let num_points = finder.len();

    if pose.position_m.iter().any(|v| !v.is_finite()) {
        return Err(LocaliseError::InvalidInput);
    }

    let nearest_index = finder
        .nearest(&pose.position_m)
        .ok_or(LocaliseError::InvalidInput)?;
    let wp = finder
        .position(nearest_index)
        .ok_or(LocaliseError::InvalidInput)?;

    let yaw = pose.get_heading();
    let angle = (wp[1] - pose.position_m[1]).atan2(wp[0] - pose.position_m[0]);

    let delta = fold_heading_delta((yaw - angle).abs());

    let advanced = delta > FRAC_PI_4;
    let index = if advanced {
        (nearest_index + 1) % num_points
    } else {
        nearest_index
    };

    trace!(
        "Nearest waypoint {} (heading delta {:.4} rad), localised at {}",
        nearest_index,
        delta,
        index
    );

    Ok(Localisation {
        index,
        nearest_index,
        advanced,
    })
}

/// Fold an absolute heading difference by repeatedly subtracting pi while it
/// is greater than pi.
///
/// A delta of exactly pi is left as it is.
fn fold_heading_delta(mut delta: f64) -> f64 {
    while delta > PI {
        delta -= PI;
    }
    delta
}
