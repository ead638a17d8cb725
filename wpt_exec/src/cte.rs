//! # Cross track error estimation
//!
//! The cross track error (CTE) is the signed lateral distance between the
//! vehicle and the path, measured in the vehicle frame. It is estimated by
//! fitting a cubic `y = f(x)` to the upcoming waypoints in the vehicle frame
//! and evaluating it at `x = 0`, the vehicle's own longitudinal position.
//!
//! A positive CTE means the path is to the left of the vehicle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::debug;
use nalgebra::Vector2;

use util::maths::{poly_fit, poly_val, PolyFitError};

use crate::{frame::to_vehicle_frame, loc::Pose, path::Waypoint};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Degree of the polynomial fitted to the path
pub const FIT_DEGREE: usize = 3;

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CteError {
    /// More waypoints were requested for the fit than are available.
    ///
    /// This is recovered from inside [`estimate_cte`], which reports a CTE of
    /// zero.
    #[error("Cannot fit {fit_length} waypoints, only {available} are available")]
    DegenerateFit { fit_length: usize, available: usize },

    #[error("Could not fit the path polynomial: {0}")]
    FitFailed(PolyFitError),
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Estimate the cross track error of the vehicle to the path made by the
/// first `fit_length` waypoints.
///
/// A `fit_length` of zero uses all waypoints. If `fit_length` is larger than
/// the number of waypoints there isn't enough data for a fit, and `0.0` is
/// returned.
pub fn estimate_cte(pose: &Pose, waypoints: &[Waypoint], fit_length: usize) -> Result<f64, CteError> {
    match fit_path(pose, waypoints, fit_length) {
        Ok(coeffs) => Ok(poly_val(0.0, &coeffs)),
        Err(CteError::DegenerateFit {
            fit_length,
            available,
        }) => {
            debug!(
                "CTE fit of {} waypoints requested but only {} available, using zero",
                fit_length, available
            );
            Ok(0.0)
        }
        Err(e) => Err(e),
    }
}

/// Fit the path polynomial in the vehicle frame, returning its coefficients
/// highest power first.
pub fn fit_path(pose: &Pose, waypoints: &[Waypoint], fit_length: usize) -> Result<Vec<f64>, CteError> {
    let fit_length = if fit_length == 0 {
        waypoints.len()
    } else {
        fit_length
    };

    if fit_length > waypoints.len() {
        return Err(CteError::DegenerateFit {
            fit_length,
            available: waypoints.len(),
        });
    }

    let world: Vec<Vector2<f64>> = waypoints[..fit_length]
        .iter()
        .map(|w| w.position2())
        .collect();

    let (x, y): (Vec<f64>, Vec<f64>) = to_vehicle_frame(pose, &world)
        .iter()
        .map(|p| (p[0], p[1]))
        .unzip();

    poly_fit(&x, &y, FIT_DEGREE).map_err(CteError::FitFailed)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::FRAC_PI_4;

    fn line(n: usize, f: impl Fn(f64) -> (f64, f64)) -> Vec<Waypoint> {
        (0..n)
            .map(|i| {
                let (x, y) = f(i as f64);
                Waypoint::new(x, y, 0.0, 5.0)
            })
            .collect()
    }

    #[test]
    fn test_window_too_large_is_zero() {
        let wps = line(5, |s| (s, 2.0));
        let pose = Pose::default();

        assert_eq!(estimate_cte(&pose, &wps, 6), Ok(0.0));
        assert_eq!(
            fit_path(&pose, &wps, 6),
            Err(CteError::DegenerateFit {
                fit_length: 6,
                available: 5
            })
        );
    }

    #[test]
    fn test_on_straight_path() {
        // Path runs through the vehicle along its heading
        let wps = line(10, |s| (s * FRAC_PI_4.cos(), s * FRAC_PI_4.sin()));
        let pose = Pose::from_xy_heading(0.0, 0.0, FRAC_PI_4);

        let cte = estimate_cte(&pose, &wps, 10).unwrap();
        assert!(cte.abs() < 1e-9, "cte = {}", cte);
    }

    #[test]
    fn test_offset_straight_path() {
        // Path parallel to the X axis, 1.5 m to the left of the vehicle
        let wps = line(12, |s| (s - 3.0, 1.5));
        let pose = Pose::default();

        let cte = estimate_cte(&pose, &wps, 10).unwrap();
        assert!((cte - 1.5).abs() < 1e-9, "cte = {}", cte);

        // And to the right when the vehicle is above it
        let pose = Pose::from_xy_heading(0.0, 2.0, 0.0);
        let cte = estimate_cte(&pose, &wps, 10).unwrap();
        assert!((cte + 0.5).abs() < 1e-9, "cte = {}", cte);
    }

    #[test]
    fn test_offset_with_heading() {
        // Path along +Y at x = -2, vehicle at the origin facing +Y, so the
        // path is 2 m to the vehicle's left
        let wps = line(10, |s| (-2.0, s));
        let pose = Pose::from_xy_heading(0.0, 0.0, std::f64::consts::FRAC_PI_2);

        let cte = estimate_cte(&pose, &wps, 0).unwrap();
        assert!((cte - 2.0).abs() < 1e-9, "cte = {}", cte);
    }

    #[test]
    fn test_curved_path() {
        // Exact cubic in the world frame with the vehicle on the identity pose
        let f = |x: f64| 0.01 * x.powi(3) - 0.1 * x.powi(2) + 0.2 * x + 0.7;
        let wps = line(15, |s| (s - 5.0, f(s - 5.0)));

        let cte = estimate_cte(&Pose::default(), &wps, 0).unwrap();
        assert!((cte - 0.7).abs() < 1e-9, "cte = {}", cte);
    }

    #[test]
    fn test_zero_length_uses_whole_path() {
        let wps = line(6, |s| (s, 0.5 * s - 1.0));
        let pose = Pose::default();

        assert_eq!(fit_path(&pose, &wps, 0).unwrap().len(), FIT_DEGREE + 1);
        assert!((estimate_cte(&pose, &wps, 0).unwrap() + 1.0).abs() < 1e-9);

        // Empty path with a zero window is a fit over nothing
        assert!(matches!(
            estimate_cte(&pose, &[], 0),
            Err(CteError::FitFailed(PolyFitError::NoPoints))
        ));
    }

    #[test]
    fn test_non_finite_waypoint() {
        let mut wps = line(6, |s| (s, 0.0));
        wps[3].position_m[1] = std::f64::NAN;

        assert!(matches!(
            estimate_cte(&Pose::default(), &wps, 6),
            Err(CteError::FitFailed(PolyFitError::NonFinite))
        ));
    }
}
