//! Waypoint follower module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use serde::Serialize;
use std::{fmt, sync::Arc};

// Internal
use super::Params;
use crate::{
    cte::{estimate_cte, CteError},
    loc::Pose,
    localiser::{localise, Localisation, LocaliseError},
    nearest::{NearestNeighbourFinder, SearchStrategy},
    path::{dist_pose_waypoint, WaypointPath},
    velocity::{deceleration_rate, is_velocity_negligible},
};
use util::{kdtree::KdTreeError, module::State, params};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Follows the current path, producing the localised index and cross track
/// error each cycle.
pub struct WaypointFollower {
    params: Params,

    /// The path currently being followed
    snapshot: Option<Arc<PathSnapshot>>,
}

/// An immutable path together with the search structure built over it.
///
/// Snapshots are never modified once built, and can be shared freely between
/// threads.
pub struct PathSnapshot {
    path: WaypointPath,
    strategy: SearchStrategy,
    finder: Box<dyn NearestNeighbourFinder + Send + Sync>,
}

/// Input data for one cycle of the follower.
#[derive(Debug, Copy, Clone, Default)]
pub struct FollowInput {
    /// Current pose of the vehicle
    pub pose: Pose,
}

/// Output of one cycle of the follower.
#[derive(Debug, Copy, Clone, Default, Serialize, PartialEq)]
pub struct FollowOutput {
    /// Index of the waypoint the vehicle is heading towards
    pub index: usize,

    /// Cross track error, positive if the path is to the left of the vehicle
    pub cte_m: f64,

    /// Target speed of the indexed waypoint
    pub target_speed_ms: f64,

    /// Planar distance from the vehicle to the indexed waypoint
    pub dist_to_target_m: f64,

    /// Rate needed to lose the target speed over the distance to the
    /// indexed waypoint
    pub decel_rate: f64,

    /// True if the target speed is effectively zero
    pub velocity_negligible: bool,
}

/// The status report containing monitoring quantities for one cycle.
#[derive(Debug, Copy, Clone, Default, Serialize, PartialEq)]
pub struct StatusReport {
    /// Nearest waypoint by distance alone
    pub nearest_index: usize,

    /// If true the nearest waypoint was behind the vehicle and the index was
    /// advanced by one
    pub heading_advanced: bool,

    /// If true there weren't enough waypoints ahead for the cross track error
    /// fit, and it was reported as zero
    pub degenerate_fit: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Potential errors that can occur during processing of the module.
#[derive(Debug, thiserror::Error)]
pub enum FollowerError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(params::LoadError),

    #[error("Invalid parameters: {0}")]
    InvalidParams(&'static str),

    /// Attempted to process a cycle before any path was set.
    #[error("No path has been set")]
    NoPath,

    #[error("Could not localise on the path: {0}")]
    Localise(#[from] LocaliseError),

    /// Waypoint positions must be finite for every search strategy.
    #[error("Waypoint {0} has a non-finite position")]
    NonFiniteWaypoint(usize),

    #[error("Could not build the path search index: {0}")]
    InvalidPath(#[from] KdTreeError),

    #[error("Could not estimate the cross track error: {0}")]
    Cte(#[from] CteError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for WaypointFollower {
    type InitData = Params;
    type InitError = FollowerError;

    type InputData = FollowInput;
    type OutputData = FollowOutput;
    type StatusReport = StatusReport;
    type ProcError = FollowerError;

    /// Initialise the follower with no path.
    fn init(params: Params) -> Result<Self, FollowerError> {
        if params.lookahead_wps == 0 {
            return Err(FollowerError::InvalidParams("lookahead_wps must be at least 1"));
        }

        info!("WaypointFollower initialised with {:?}", params);

        Ok(Self {
            params,
            snapshot: None,
        })
    }

    /// Process one cycle.
    ///
    /// Processing involves:
    ///  1. Localising the pose on the current path.
    ///  1. Estimating the cross track error from the waypoints ahead.
    ///  1. Calculating the speed outputs for the localised waypoint.
    fn proc(&self, input: &FollowInput) -> Result<(FollowOutput, StatusReport), FollowerError> {
        let snapshot = self.snapshot.as_ref().ok_or(FollowerError::NoPath)?;

        snapshot.follow(&self.params, &input.pose)
    }
}

impl WaypointFollower {
    /// Initialise the follower from a parameter file relative to the params
    /// directory.
    pub fn from_params_file(params_path: &str) -> Result<Self, FollowerError> {
        let params = params::load(params_path).map_err(FollowerError::ParamLoadError)?;

        Self::init(params)
    }

    /// Get the parameters of the follower
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Set a new path to follow.
    ///
    /// A new snapshot is built for the path, replacing the current one. Empty
    /// paths are rejected and leave the current path in place.
    pub fn set_path<P>(&mut self, path: P) -> Result<Arc<PathSnapshot>, FollowerError>
    where
        P: Into<WaypointPath>,
    {
        let snapshot = PathSnapshot::new(path.into(), self.params.search_strategy)
            .map(Arc::new)
            .map_err(|e| {
                warn!("Path rejected: {}", e);
                e
            })?;

        info!(
            "New path set with {} waypoints ({:?} search)",
            snapshot.path().get_num_points(),
            snapshot.strategy()
        );

        self.snapshot = Some(snapshot.clone());

        Ok(snapshot)
    }

    /// Stop following the current path.
    pub fn clear_path(&mut self) {
        self.snapshot = None;
    }

    /// Get a shared handle to the current path snapshot.
    pub fn snapshot(&self) -> Option<Arc<PathSnapshot>> {
        self.snapshot.clone()
    }
}

impl PathSnapshot {
    /// Build a snapshot of the path, with a search structure of the given
    /// strategy.
    ///
    /// Empty paths and paths with a non-finite waypoint position are
    /// rejected, whatever the strategy.
    pub fn new(path: WaypointPath, strategy: SearchStrategy) -> Result<Self, FollowerError> {
        if path.is_empty() {
            return Err(FollowerError::Localise(LocaliseError::InvalidInput));
        }

        if let Some(i) = path
            .waypoints
            .iter()
            .position(|w| w.position_m.iter().any(|v| !v.is_finite()))
        {
            return Err(FollowerError::NonFiniteWaypoint(i));
        }

        let finder = strategy.build(path.positions())?;

        Ok(Self {
            path,
            strategy,
            finder,
        })
    }

    pub fn path(&self) -> &WaypointPath {
        &self.path
    }

    pub fn strategy(&self) -> SearchStrategy {
        self.strategy
    }

    pub fn finder(&self) -> &(dyn NearestNeighbourFinder + Send + Sync) {
        self.finder.as_ref()
    }

    /// Localise the pose on this path.
    pub fn localise(&self, pose: &Pose) -> Result<Localisation, LocaliseError> {
        localise(pose, self.finder())
    }

    /// Run one follower cycle against this path.
    pub fn follow(
        &self,
        params: &Params,
        pose: &Pose,
    ) -> Result<(FollowOutput, StatusReport), FollowerError> {
        let loc = self.localise(pose)?;

        let target = self
            .path
            .get(loc.index)
            .ok_or(FollowerError::Localise(LocaliseError::InvalidInput))?;

        // Cross track error over the waypoints ahead
        let window = self.path.ahead(loc.index, params.lookahead_wps);
        let fit_length = match params.cte_fit_length {
            0 => window.len(),
            n => n,
        };
        let cte_m = estimate_cte(pose, &window, params.cte_fit_length)?;

        let dist_to_target_m = dist_pose_waypoint(pose, target);

        let output = FollowOutput {
            index: loc.index,
            cte_m,
            target_speed_ms: target.target_speed_ms,
            dist_to_target_m,
            decel_rate: deceleration_rate(target.target_speed_ms, dist_to_target_m),
            velocity_negligible: is_velocity_negligible(target.target_speed_ms),
        };

        let report = StatusReport {
            nearest_index: loc.nearest_index,
            heading_advanced: loc.advanced,
            degenerate_fit: fit_length > window.len(),
        };

        debug!("Follower cycle: {:?}, {:?}", output, report);

        Ok((output, report))
    }
}

impl fmt::Debug for PathSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathSnapshot")
            .field("num_points", &self.path.get_num_points())
            .field("strategy", &self.strategy)
            .finish()
    }
}
