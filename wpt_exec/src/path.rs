//! # Path
//!
//! This module defines the reference path followed by the vehicle, as an
//! ordered sequence of waypoints.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{UnitQuaternion, Vector2, Vector3};
use serde::{Deserialize, Serialize};

use super::loc::Pose;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single sample of the reference path.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct Waypoint {
    /// Position of the waypoint in the world frame
    pub position_m: Vector3<f64>,

    /// Orientation of the path at this waypoint, if known
    pub attitude_q: Option<UnitQuaternion<f64>>,

    /// The speed the vehicle should have when passing this waypoint
    pub target_speed_ms: f64,
}

/// A path defining the desired trajectory of the vehicle.
///
/// Waypoint order is the direction of travel. For indexing purposes the path
/// is treated as cyclic, so stepping past the last waypoint wraps back to the
/// first.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct WaypointPath {
    pub waypoints: Vec<Waypoint>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Waypoint {
    /// Create a new waypoint with no orientation.
    pub fn new(x_m: f64, y_m: f64, z_m: f64, target_speed_ms: f64) -> Self {
        Self {
            position_m: Vector3::new(x_m, y_m, z_m),
            attitude_q: None,
            target_speed_ms,
        }
    }

    /// Get the 2D position vector of the waypoint
    pub fn position2(&self) -> Vector2<f64> {
        Vector2::new(self.position_m[0], self.position_m[1])
    }
}

impl WaypointPath {
    pub fn new(waypoints: Vec<Waypoint>) -> Self {
        Self { waypoints }
    }

    /// Get the number of waypoints in the path
    pub fn get_num_points(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Get the waypoint at the given index, if there is one.
    pub fn get(&self, index: usize) -> Option<&Waypoint> {
        self.waypoints.get(index)
    }

    /// All waypoint positions in path order.
    ///
    /// This is the form used to build spatial indexes over the path.
    pub fn positions(&self) -> Vec<Vector3<f64>> {
        self.waypoints.iter().map(|w| w.position_m).collect()
    }

    /// Return up to `count` waypoints starting at `start`, wrapping around to
    /// the beginning of the path if the end is reached.
    ///
    /// At most one full lap of the path is returned. If `start` is out of
    /// range it is wrapped as well. An empty path gives an empty list.
    pub fn ahead(&self, start: usize, count: usize) -> Vec<Waypoint> {
        let n = self.waypoints.len();
        if n == 0 {
            return Vec::new();
        }

        self.waypoints
            .iter()
            .cycle()
            .skip(start % n)
            .take(count.min(n))
            .copied()
            .collect()
    }
}

impl From<Vec<Waypoint>> for WaypointPath {
    fn from(waypoints: Vec<Waypoint>) -> Self {
        Self::new(waypoints)
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Planar (XY) euclidean distance between two points.
pub fn euclid_dist(p1: &Vector3<f64>, p2: &Vector3<f64>) -> f64 {
    // Dimensions always match here
    util::maths::norm(&p1.as_slice()[..2], &p2.as_slice()[..2]).unwrap_or(std::f64::NAN)
}

/// Planar distance between a pose and a waypoint.
pub fn dist_pose_waypoint(pose: &Pose, waypoint: &Waypoint) -> f64 {
    euclid_dist(&pose.position_m, &waypoint.position_m)
}
