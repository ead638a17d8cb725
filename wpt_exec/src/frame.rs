//! # Frame transforms
//!
//! Conversion of world frame points into the vehicle frame. The vehicle frame
//! has its origin at the vehicle's position and its X axis along the
//! vehicle's heading, with Y to the left.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Rotation2, Vector2};

use crate::loc::Pose;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Transform world frame `(x, y)` points into the vehicle frame of `pose`.
///
/// Each point is translated by the vehicle position and then rotated by the
/// negative of the vehicle heading. This is a rigid transform, so distances
/// between points are preserved.
pub fn to_vehicle_frame(pose: &Pose, world_points: &[Vector2<f64>]) -> Vec<Vector2<f64>> {
    let origin = pose.position2();
    let rot = Rotation2::new(-pose.get_heading());

    world_points.iter().map(|p| rot * (p - origin)).collect()
}

/// Transform a single world frame point into the vehicle frame of `pose`.
pub fn point_to_vehicle_frame(pose: &Pose, world_point: &Vector2<f64>) -> Vector2<f64> {
    Rotation2::new(-pose.get_heading()) * (world_point - pose.position2())
}
