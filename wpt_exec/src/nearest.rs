//! # Nearest neighbour search
//!
//! Strategies for finding the waypoint nearest a position. All strategies
//! use 3D euclidean distance and break ties towards the lowest index, so any
//! two of them agree on the same set of points.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use util::kdtree::{dist_sq, KdTree, KdTreeError};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Capability to find the nearest of a fixed, ordered set of points.
pub trait NearestNeighbourFinder {
    /// Index of the point nearest `query`, or `None` if there are no points.
    fn nearest(&self, query: &Vector3<f64>) -> Option<usize>;

    /// Position of the point with the given index.
    fn position(&self, index: usize) -> Option<Vector3<f64>>;

    /// Number of points searched.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Brute force search over every point.
#[derive(Debug, Clone, Default)]
pub struct LinearScan {
    points: Vec<Vector3<f64>>,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// The available search strategies.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchStrategy {
    /// Compute the distance to every waypoint, O(N) per query
    LinearScan,

    /// Query a k-d tree built once per path, O(log N) per query
    KdTree,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Unknown search strategy \"{0}\", expected \"linear\" or \"kdtree\"")]
pub struct ParseStrategyError(String);

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LinearScan {
    pub fn new(points: Vec<Vector3<f64>>) -> Self {
        Self { points }
    }
}

impl NearestNeighbourFinder for LinearScan {
    fn nearest(&self, query: &Vector3<f64>) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;

        for (i, p) in self.points.iter().enumerate() {
            let d = dist_sq(query, p);

            // Points with a non-finite distance are never the nearest
            if !d.is_finite() {
                continue;
            }

            // Strictly less keeps the first of any equal distances
            match best {
                Some((_, best_d)) if !(d < best_d) => (),
                _ => best = Some((i, d)),
            }
        }

        best.map(|(i, _)| i)
    }

    fn position(&self, index: usize) -> Option<Vector3<f64>> {
        self.points.get(index).copied()
    }

    fn len(&self) -> usize {
        self.points.len()
    }
}

impl NearestNeighbourFinder for KdTree {
    fn nearest(&self, query: &Vector3<f64>) -> Option<usize> {
        KdTree::nearest(self, query).map(|(i, _)| i)
    }

    fn position(&self, index: usize) -> Option<Vector3<f64>> {
        self.point(index).copied()
    }

    fn len(&self) -> usize {
        KdTree::len(self)
    }
}

impl Default for SearchStrategy {
    fn default() -> Self {
        SearchStrategy::KdTree
    }
}

impl SearchStrategy {
    /// Build a finder using this strategy over the given points.
    pub fn build(
        self,
        points: Vec<Vector3<f64>>,
    ) -> Result<Box<dyn NearestNeighbourFinder + Send + Sync>, KdTreeError> {
        Ok(match self {
            SearchStrategy::LinearScan => Box::new(LinearScan::new(points)),
            SearchStrategy::KdTree => Box::new(KdTree::new(points)?),
        })
    }
}

impl FromStr for SearchStrategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linear" | "linearscan" => Ok(SearchStrategy::LinearScan),
            "kdtree" => Ok(SearchStrategy::KdTree),
            _ => Err(ParseStrategyError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn test_linear_scan() {
        let scan = LinearScan::new(vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(2.0, 0.0, 0.0),
        ]);

        assert_eq!(scan.len(), 3);
        assert_eq!(scan.nearest(&Vector3::new(1.6, 0.3, 0.0)), Some(2));
        assert_eq!(scan.position(1), Some(Vector3::new(1.0, 0.0, 0.0)));
        assert_eq!(scan.position(3), None);

        // Halfway between 0 and 1 goes to the lower index
        assert_eq!(scan.nearest(&Vector3::new(0.5, 0.0, 0.0)), Some(0));

        assert_eq!(LinearScan::default().nearest(&Vector3::zeros()), None);
    }

    #[test]
    fn test_height_counts() {
        // The second point is nearer in the plane but far above
        let scan = LinearScan::new(vec![Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.5, 0.0, 5.0)]);
        assert_eq!(scan.nearest(&Vector3::zeros()), Some(0));
    }

    #[test]
    fn test_strategies_agree() {
        let mut rng = StdRng::seed_from_u64(0x5eed);

        for _ in 0..40 {
            let n = rng.gen_range(1..=1000);
            let points: Vec<Vector3<f64>> = (0..n)
                .map(|_| {
                    Vector3::new(
                        rng.gen_range(-50.0..50.0),
                        rng.gen_range(-50.0..50.0),
                        rng.gen_range(-1.0..1.0),
                    )
                })
                .collect();

            let linear = SearchStrategy::LinearScan.build(points.clone()).unwrap();
            let tree = SearchStrategy::KdTree.build(points).unwrap();

            assert_eq!(linear.len(), tree.len());

            for _ in 0..25 {
                let query = Vector3::new(
                    rng.gen_range(-60.0..60.0),
                    rng.gen_range(-60.0..60.0),
                    rng.gen_range(-1.0..1.0),
                );
                assert_eq!(linear.nearest(&query), tree.nearest(&query));
            }
        }
    }

    #[test]
    fn test_strategies_agree_on_ties() {
        // Integer grid with duplicated points and queries on cell centres,
        // so many distances are exactly equal
        let mut points = Vec::new();
        for i in 0..6 {
            for j in 0..6 {
                points.push(Vector3::new(i as f64, j as f64, 0.0));
            }
        }
        points.extend(points.clone());

        let linear = SearchStrategy::LinearScan.build(points.clone()).unwrap();
        let tree = SearchStrategy::KdTree.build(points).unwrap();

        for i in 0..6 {
            for j in 0..6 {
                let query = Vector3::new(i as f64 + 0.5, j as f64 + 0.5, 0.0);
                assert_eq!(linear.nearest(&query), tree.nearest(&query));

                // And it's the first copy
                let idx = tree.nearest(&query).unwrap();
                assert!(idx < 36);
            }
        }
    }

    #[test]
    fn test_strategy_deserialise() {
        #[derive(Deserialize)]
        struct P {
            s: SearchStrategy,
        }

        let p: P = util::params::from_str("s = \"LinearScan\"").unwrap();
        assert_eq!(p.s, SearchStrategy::LinearScan);
        assert_eq!(SearchStrategy::default(), SearchStrategy::KdTree);
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("linear".parse::<SearchStrategy>(), Ok(SearchStrategy::LinearScan));
        assert_eq!("LinearScan".parse::<SearchStrategy>(), Ok(SearchStrategy::LinearScan));
        assert_eq!("KdTree".parse::<SearchStrategy>(), Ok(SearchStrategy::KdTree));
        assert_eq!(
            "octree".parse::<SearchStrategy>(),
            Err(ParseStrategyError("octree".into()))
        );
    }

    #[test]
    fn test_linear_scan_skips_non_finite() {
        let scan = LinearScan::new(vec![
            Vector3::new(std::f64::NAN, 0.0, 0.0),
            Vector3::new(5.0, 0.0, 0.0),
            Vector3::new(10.0, std::f64::INFINITY, 0.0),
            Vector3::new(11.0, 0.0, 0.0),
        ]);

        assert_eq!(scan.nearest(&Vector3::new(4.0, 0.0, 0.0)), Some(1));
        assert_eq!(scan.nearest(&Vector3::new(10.5, 0.2, 0.0)), Some(3));
        assert_eq!(scan.nearest(&Vector3::new(std::f64::NAN, 0.0, 0.0)), None);
    }
}
