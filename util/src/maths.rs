//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{DMatrix, DVector};
use num_traits::Float;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Singular values (or QR diagonal entries) smaller than this fraction of the
/// largest one are treated as zero by [`poly_fit`].
const RANK_RCOND: f64 = 1e-12;

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Errors that can occur while fitting a polynomial.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolyFitError {
    #[error("Expected the same number of x and y values, found {0} and {1}")]
    LengthMismatch(usize, usize),

    #[error("Cannot fit a polynomial to zero points")]
    NoPoints,

    #[error("The points to fit contain a non-finite value")]
    NonFinite,

    #[error("The least squares solve failed: {0}")]
    SolveFailed(String),
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Return the euclidian norm (distance between) of two points.
///
/// If the points do not have the same number of dimentions then `None` is
/// returned.
pub fn norm<T>(point_0: &[T], point_1: &[T]) -> Option<T>
where
    T: Float,
{
    if point_0.len() != point_1.len() {
        return None;
    }

    let sum = point_0
        .iter()
        .zip(point_1.iter())
        .fold(T::zero(), |acc, (a, b)| acc + (*a - *b).powi(2));

    Some(sum.sqrt())
}

/// Extract the yaw (rotation about the vertical axis) from the components of
/// a quaternion.
///
/// The quaternion does not need to be normalised. The result is in the range
/// (-pi, pi].
pub fn yaw_from_quaternion(x: f64, y: f64, z: f64, w: f64) -> f64 {
    let n = (x * x + y * y + z * z + w * w).sqrt();
    let (x, y, z, w) = if n > 0.0 {
        (x / n, y / n, z / n, w / n)
    } else {
        (x, y, z, w)
    };

    let siny_cosp = 2.0 * (w * z + x * y);
    let cosy_cosp = 1.0 - 2.0 * (y * y + z * z);
    let yaw = siny_cosp.atan2(cosy_cosp);

    // atan2 can give -pi, fold it onto the other end of the range
    if yaw <= -std::f64::consts::PI {
        std::f64::consts::PI
    } else {
        yaw
    }
}

/// Apply polynomial coefficients to a value.
///
/// The order of the coefficients is highest power first, i.e. if there are
/// 3 coefficients it's a 2nd order polynomial `c[0]*x^2 + c[1]*x + c[2]`.
pub fn poly_val<T>(value: T, coeffs: &[T]) -> T
where
    T: Float,
{
    // Horner's method
    coeffs.iter().fold(T::zero(), |acc, c| acc * value + *c)
}

/// Least-squares fit of a polynomial of the given degree to the points
/// `(x[i], y[i])`.
///
/// Returns the coefficients highest power first, so the result can be passed
/// directly to [`poly_val`].
///
/// The Vandermonde matrix is column-scaled and solved with a Householder QR
/// decomposition. If the problem is under-determined or rank deficient (too
/// few distinct x values) the minimum-norm solution is taken from an SVD.
pub fn poly_fit(x: &[f64], y: &[f64], degree: usize) -> Result<Vec<f64>, PolyFitError> {
    if x.len() != y.len() {
        return Err(PolyFitError::LengthMismatch(x.len(), y.len()));
    }
    if x.is_empty() {
        return Err(PolyFitError::NoPoints);
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(PolyFitError::NonFinite);
    }

    let num_rows = x.len();
    let num_coeffs = degree + 1;
    let power = |col: usize| (degree - col) as i32;

    // Column scales, zero columns (all x == 0 for a non-constant power) are
    // left unscaled
    let scales: Vec<f64> = (0..num_coeffs)
        .map(|c| {
            let s = x.iter().map(|xi| xi.powi(2 * power(c))).sum::<f64>().sqrt();
            if s > 0.0 {
                s
            } else {
                1.0
            }
        })
        .collect();

    let a = DMatrix::from_fn(num_rows, num_coeffs, |r, c| x[r].powi(power(c)) / scales[c]);
    let b = DVector::from_column_slice(y);

    let solution = match solve_qr(&a, &b) {
        Some(s) => s,
        None => solve_svd(a, &b)?,
    };

    let coeffs: Vec<f64> = solution
        .iter()
        .zip(scales.iter())
        .map(|(s, scale)| s / scale)
        .collect();

    if coeffs.iter().any(|c| !c.is_finite()) {
        return Err(PolyFitError::SolveFailed(String::from(
            "solution contains non-finite coefficients",
        )));
    }

    Ok(coeffs)
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Solve the overdetermined system `a * s = b` with QR.
///
/// Returns `None` if the system is under-determined or `R` is numerically
/// singular.
fn solve_qr(a: &DMatrix<f64>, b: &DVector<f64>) -> Option<DVector<f64>> {
    if a.nrows() < a.ncols() {
        return None;
    }

    let qr = a.clone().qr();
    let r = qr.r();

    let diag_max = r.diagonal().amax();
    let tol = diag_max * RANK_RCOND;
    if diag_max == 0.0 || r.diagonal().iter().any(|d| d.abs() <= tol) {
        return None;
    }

    let qtb = qr.q().transpose() * b;
    r.solve_upper_triangular(&qtb)
}

/// Minimum-norm least squares solution of `a * s = b` using the SVD.
fn solve_svd(a: DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>, PolyFitError> {
    let svd = a.svd(true, true);
    let tol = svd.singular_values.amax() * RANK_RCOND;

    svd.solve(b, tol)
        .map_err(|e| PolyFitError::SolveFailed(e.to_string()))
}
