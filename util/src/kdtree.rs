//! # K-d Tree Implementation
//!
//! A balanced 3-dimensional k-d tree supporting nearest neighbour queries,
//! as described in [the wikipedia article](https://en.wikipedia.org/wiki/K-d_tree).
//!
//! The tree is built once from a fixed set of points and cannot be modified
//! afterwards. To index a different set of points build a new tree.
//!
//! Ties in distance are always broken towards the lowest point index, so a
//! query gives exactly the same answer as a linear scan over the points that
//! keeps the first minimum.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use nalgebra::Vector3;
use ordered_float::NotNan;

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

/// Number of dimensions of the tree
pub const DIMS: usize = 3;

// -----------------------------------------------------------------------------------------------
// STRUCTS
// -----------------------------------------------------------------------------------------------

/// An immutable, balanced k-d tree over 3D points.
#[derive(Clone, Debug)]
pub struct KdTree {
    /// The indexed points, in their original order
    points: Vec<Vector3<f64>>,

    /// Root node of the tree, `None` if there are no points
    root: Option<Box<KdNode>>,
}

/// A single node in the tree
#[derive(Clone, Debug)]
struct KdNode {
    /// Index of the splitting point in the tree's points list
    index: usize,

    /// Axis this node splits on
    axis: usize,

    /// Points with a coordinate on `axis` less than or equal to this node's
    left: Option<Box<KdNode>>,

    /// Points with a coordinate on `axis` greater than or equal to this node's
    right: Option<Box<KdNode>>,
}

/// The current best candidate of a nearest neighbour search
#[derive(Clone, Copy, Debug)]
struct Best {
    index: usize,
    dist_sq: f64,
}

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KdTreeError {
    #[error("The point {1} at index {0} has a NaN coordinate")]
    NanPoint(usize, Vector3<f64>),
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl KdTree {
    /// Build a new tree from the given points.
    ///
    /// Point indices in query results refer to positions in `points`.
    pub fn new(points: Vec<Vector3<f64>>) -> Result<Self, KdTreeError> {
        // Totally ordered copy of the coordinates used to sort during the build
        let mut keys = Vec::with_capacity(points.len());
        for (i, p) in points.iter().enumerate() {
            let coord = |axis: usize| NotNan::new(p[axis]).map_err(|_| KdTreeError::NanPoint(i, *p));
            keys.push([coord(0)?, coord(1)?, coord(2)?]);
        }

        let mut indices: Vec<usize> = (0..points.len()).collect();
        let root = Self::build(&keys, &mut indices, 0);

        Ok(Self { points, root })
    }

    /// Number of points in the tree
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Get the point with the given index
    pub fn point(&self, index: usize) -> Option<&Vector3<f64>> {
        self.points.get(index)
    }

    /// Get all points in the tree, in their original order
    pub fn points(&self) -> &[Vector3<f64>] {
        &self.points
    }

    /// Find the point nearest to `query`.
    ///
    /// Returns the index of the point and its (euclidean) distance from the
    /// query, or `None` if the tree is empty.
    pub fn nearest(&self, query: &Vector3<f64>) -> Option<(usize, f64)> {
        let root = self.root.as_ref()?;

        let mut best = Best {
            index: root.index,
            dist_sq: dist_sq(query, &self.points[root.index]),
        };
        self.search(root, query, &mut best);

        Some((best.index, best.dist_sq.sqrt()))
    }

    /// Recursively build the subtree for the given indices.
    fn build(keys: &[[NotNan<f64>; DIMS]], indices: &mut [usize], depth: usize) -> Option<Box<KdNode>> {
        if indices.is_empty() {
            return None;
        }

        let axis = depth % DIMS;

        // Sort along the axis, using the index to make the order (and so the
        // tree shape) deterministic
        indices.sort_unstable_by_key(|&i| (keys[i][axis], i));

        let mid = indices.len() / 2;
        let index = indices[mid];

        let (lower, upper) = indices.split_at_mut(mid);

        Some(Box::new(KdNode {
            index,
            axis,
            left: Self::build(keys, lower, depth + 1),
            right: Self::build(keys, &mut upper[1..], depth + 1),
        }))
    }

    fn search(&self, node: &KdNode, query: &Vector3<f64>, best: &mut Best) {
        let point = &self.points[node.index];
        let d_sq = dist_sq(query, point);

        if d_sq < best.dist_sq || (d_sq == best.dist_sq && node.index < best.index) {
            best.index = node.index;
            best.dist_sq = d_sq;
        }

        let diff = query[node.axis] - point[node.axis];

        let (near, far) = if diff < 0.0 {
            (&node.left, &node.right)
        } else {
            (&node.right, &node.left)
        };

        if let Some(n) = near {
            self.search(n, query, best);
        }

        // The far side can only hold a better (or equally near, lower index)
        // point if the splitting plane is no further away than the best so far
        if let Some(f) = far {
            if diff * diff <= best.dist_sq {
                self.search(f, query, best);
            }
        }
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Squared euclidean distance between two points.
///
/// Linear searches that need to agree with [`KdTree::nearest`] should use this
/// same function.
pub fn dist_sq(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    (a - b).norm_squared()
}

#[cfg(test)]
mod test {
    use super::*;

    /// First-minimum linear scan for reference
    fn brute_force(points: &[Vector3<f64>], query: &Vector3<f64>) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, p) in points.iter().enumerate() {
            let d = dist_sq(query, p);
            match best {
                Some((_, bd)) if d >= bd => (),
                _ => best = Some((i, d)),
            }
        }
        best.map(|(i, _)| i)
    }

    #[test]
    fn test_empty() {
        let tree = KdTree::new(Vec::new()).unwrap();

        assert!(tree.is_empty());
        assert_eq!(tree.nearest(&Vector3::zeros()), None);
    }

    #[test]
    fn test_single() {
        let tree = KdTree::new(vec![Vector3::new(1.0, 2.0, 2.0)]).unwrap();

        let (idx, dist) = tree.nearest(&Vector3::zeros()).unwrap();
        assert_eq!(idx, 0);
        assert!((dist - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_nan_rejected() {
        let p = Vector3::new(0.0, std::f64::NAN, 0.0);
        match KdTree::new(vec![Vector3::zeros(), p]) {
            Err(KdTreeError::NanPoint(1, _)) => (),
            other => panic!("Expected a NaN point error, got {:?}", other),
        }
    }

    #[test]
    fn test_matches_brute_force_on_grid() {
        let mut points = Vec::new();
        for i in 0..7 {
            for j in 0..5 {
                for k in 0..3 {
                    points.push(Vector3::new(i as f64 * 0.7, j as f64 * 1.3 - 2.0, k as f64));
                }
            }
        }
        let tree = KdTree::new(points.clone()).unwrap();

        for qi in 0..20 {
            for qj in 0..20 {
                let query = Vector3::new(qi as f64 * 0.31 - 1.0, qj as f64 * 0.47 - 3.0, 0.9);
                assert_eq!(
                    tree.nearest(&query).map(|(i, _)| i),
                    brute_force(&points, &query),
                    "Mismatch for query {}",
                    query
                );
            }
        }
    }

    #[test]
    fn test_ties_take_lowest_index() {
        // Four points equidistant from the origin, plus duplicates
        let points = vec![
            Vector3::new(5.0, 5.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(-1.0, 0.0, 0.0),
            Vector3::new(0.0, -1.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
        ];
        let tree = KdTree::new(points).unwrap();

        assert_eq!(tree.nearest(&Vector3::zeros()).map(|(i, _)| i), Some(1));

        // Duplicate points resolve to the first copy
        assert_eq!(tree.nearest(&Vector3::new(1.0, 0.0, 0.0)).map(|(i, _)| i), Some(2));
    }

    #[test]
    fn test_deterministic() {
        let points: Vec<Vector3<f64>> = (0..50)
            .map(|i| Vector3::new((i % 5) as f64, (i % 3) as f64, 0.0))
            .collect();
        let tree_a = KdTree::new(points.clone()).unwrap();
        let tree_b = KdTree::new(points).unwrap();

        for i in 0..30 {
            let query = Vector3::new(i as f64 * 0.2, 1.0, 0.0);
            assert_eq!(tree_a.nearest(&query), tree_b.nearest(&query));
        }
    }
}
