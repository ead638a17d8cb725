//! # Waypoint follower module
//!
//! The waypoint follower combines the localiser and cross track error
//! estimator into a single control cycle. Given the vehicle pose it:
//!
//!  1. Finds the waypoint index the vehicle is at along the current path,
//!     using the configured nearest neighbour search strategy.
//!  1. Takes the waypoints ahead of that index (wrapping around the end of
//!     the path) and estimates the cross track error from them.
//!  1. Reports the target speed of that waypoint and the deceleration rate
//!     needed to meet it.
//!
//! The path is held as an immutable, shared [`PathSnapshot`]. Setting a new
//! path builds a new snapshot, so anyone still holding the old one keeps a
//! consistent view of it.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod params;
pub mod state;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use params::Params;
pub use state::*;
