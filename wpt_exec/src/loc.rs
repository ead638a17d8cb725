//! # Localisation module
//!
//! This module defines the pose of the vehicle as provided by the
//! localisation system each control cycle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{UnitQuaternion, Vector2, Vector3};
use serde::{Deserialize, Serialize};

use util::maths::yaw_from_quaternion;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The current pose (position and attitude in the world frame) of the vehicle.
///
/// A pose is an immutable snapshot valid for a single control cycle.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pose {
    /// The position in the world frame
    pub position_m: Vector3<f64>,

    /// The attitude of the vehicle in the world frame.
    pub attitude_q: UnitQuaternion<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Pose {
    fn default() -> Self {
        Self {
            position_m: Vector3::zeros(),
            attitude_q: UnitQuaternion::identity(),
        }
    }
}

impl Pose {
    /// Create a pose on the ground plane at `(x, y)` with the given heading.
    pub fn from_xy_heading(x_m: f64, y_m: f64, heading_rad: f64) -> Self {
        Self {
            position_m: Vector3::new(x_m, y_m, 0.0),
            attitude_q: UnitQuaternion::from_euler_angles(0.0, 0.0, heading_rad),
        }
    }

    /// Return the heading (yaw, angle to the positive world X axis) of the
    /// vehicle in radians.
    ///
    /// Heading is given in the range (-pi, pi], with 0 being in the world X
    /// direction.
    pub fn get_heading(&self) -> f64 {
        let q = self.attitude_q.quaternion();
        yaw_from_quaternion(q.i, q.j, q.k, q.w)
    }

    /// Get the 2D position vector of the vehicle
    pub fn position2(&self) -> Vector2<f64> {
        Vector2::new(self.position_m[0], self.position_m[1])
    }

    /// Get the unit vector pointing along the vehicle's heading, in 2D
    pub fn forward2(&self) -> Vector2<f64> {
        let heading = self.get_heading();
        Vector2::new(heading.cos(), heading.sin())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_heading() {
        assert_eq!(Pose::default().get_heading(), 0.0);
        assert!((Pose::from_xy_heading(0.0, 0.0, FRAC_PI_2).get_heading() - FRAC_PI_2).abs() < 1e-12);
        assert!((Pose::from_xy_heading(0.0, 0.0, -1.0).get_heading() + 1.0).abs() < 1e-12);

        // Facing backwards is +pi
        assert!((Pose::from_xy_heading(0.0, 0.0, PI).get_heading() - PI).abs() < 1e-12);
    }

    #[test]
    fn test_forward2() {
        let f = Pose::from_xy_heading(3.0, 4.0, FRAC_PI_2).forward2();
        assert!(f[0].abs() < 1e-12);
        assert!((f[1] - 1.0).abs() < 1e-12);
    }
}
