//! # Waypoint library.
//!
//! This library allows other crates in the workspace, and the benchmarks, to
//! access items defined inside the waypoint following crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Cross track error estimation - fits the upcoming path in the vehicle frame
pub mod cte;

/// Waypoint follower module - localises the vehicle on the path each cycle
pub mod follower;

/// Frame transforms from the world frame into the vehicle frame
pub mod frame;

/// Localisation module - provides the pose of the vehicle
pub mod loc;

/// Waypoint localiser - finds the index of the waypoint the vehicle is heading towards
pub mod localiser;

/// Nearest neighbour search over waypoint positions
pub mod nearest;

/// Path definitions
pub mod path;

/// CSV records used to replay recorded paths and poses
pub mod replay;

/// Traffic light state codes
pub mod traffic_light;

/// Velocity helpers
pub mod velocity;
