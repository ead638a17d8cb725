//! Waypoint follower parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use crate::nearest::SearchStrategy;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the waypoint follower
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Params {
    /// Strategy used to find the waypoint nearest the vehicle.
    pub search_strategy: SearchStrategy,

    /// Number of waypoints the cross track error polynomial is fitted to.
    ///
    /// Zero fits every waypoint in the lookahead window.
    pub cte_fit_length: usize,

    /// Number of waypoints, starting at the localised index, passed to the
    /// cross track error estimator.
    ///
    /// If this is less than `cte_fit_length` the fit can't be made and the
    /// cross track error is reported as zero.
    pub lookahead_wps: usize,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            search_strategy: SearchStrategy::KdTree,
            cte_fit_length: 10,
            lookahead_wps: 20,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_load_params() {
        let p: Params = util::params::from_str(
            r#"
            search_strategy = "LinearScan"
            cte_fit_length = 8
            lookahead_wps = 30
            "#,
        )
        .unwrap();

        assert_eq!(
            p,
            Params {
                search_strategy: SearchStrategy::LinearScan,
                cte_fit_length: 8,
                lookahead_wps: 30
            }
        );
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let p: Params = util::params::from_str("cte_fit_length = 0").unwrap();

        assert_eq!(p.search_strategy, SearchStrategy::KdTree);
        assert_eq!(p.cte_fit_length, 0);
        assert_eq!(p.lookahead_wps, 20);
    }

    #[test]
    fn test_bad_strategy() {
        let res: Result<Params, _> = util::params::from_str("search_strategy = \"Octree\"");
        assert!(matches!(res, Err(util::params::LoadError::DeserialiseError(_))));
    }

    #[test]
    fn test_load_default_file() {
        let p: Params = util::params::load_from(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../params/wpt_exec.toml"
        ))
        .unwrap();

        assert_eq!(p, Params::default());
    }
}
