use glam::{DMat2, DVec2};
use nalgebra::{DMatrix, DVector};

/// Tolerance used by the debug checks on contact frames.
pub const FRAME_TOLERANCE: f64 = 1.0e-6;

/// Scalar 2-D cross product.
#[inline]
#[must_use]
pub fn cross(a: DVec2, b: DVec2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Right-handed tangent for a unit normal, so that `[n t]` has determinant +1.
#[inline]
#[must_use]
pub const fn tangent_of(n: DVec2) -> DVec2 {
    DVec2::new(-n.y, n.x)
}

/// Contact frame with the normal as the first column.
#[inline]
#[must_use]
pub fn contact_frame(n: DVec2) -> DMat2 {
    DMat2::from_cols(n, tangent_of(n))
}

#[must_use]
pub fn is_orthonormal_frame(basis: &DMat2) -> bool {
    let err = basis.mul_mat2(&basis.transpose()) - DMat2::IDENTITY;
    let max_err = err.x_axis.abs().max(err.y_axis.abs()).max_element();
    max_err <= FRAME_TOLERANCE && (basis.determinant() - 1.0).abs() <= FRAME_TOLERANCE
}

/// Solves `a x = rhs` for symmetric positive (semi-)definite `a`.
///
/// Tries Cholesky first, then LU, then an SVD least-squares solve for
/// rank deficient systems.
#[must_use]
pub fn solve_spd(a: &DMatrix<f64>, rhs: &DVector<f64>) -> DVector<f64> {
    if rhs.is_empty() {
        return DVector::zeros(0);
    }

    if let Some(chol) = a.clone().cholesky() {
        return chol.solve(rhs);
    }

    if let Some(x) = a.clone().lu().solve(rhs) {
        if x.iter().all(|v| v.is_finite()) {
            return x;
        }
    }

    a.clone()
        .svd(true, true)
        .solve(rhs, 1.0e-12)
        .unwrap_or_else(|_| DVector::zeros(rhs.len()))
}

/// Infinity norm of the LCP min-map `min(x, w)`.
#[must_use]
pub fn min_map_residual(x: &DVector<f64>, w: &DVector<f64>) -> f64 {
    x.iter()
        .zip(w.iter())
        .map(|(&xi, &wi)| xi.min(wi).abs())
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_is_right_handed() {
        let n = DVec2::new(3.0, -4.0).normalize();
        let basis = contact_frame(n);
        assert!(is_orthonormal_frame(&basis));
        assert_eq!(basis.x_axis, n);
    }

    #[test]
    fn spd_solve_falls_back_on_singular_systems() {
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 1.0]);
        let rhs = DVector::from_vec(vec![2.0, 2.0]);
        let x = solve_spd(&a, &rhs);
        let res = &a * &x - &rhs;
        assert!(res.amax() < 1.0e-9);
    }

    #[test]
    fn min_map_is_zero_at_complementary_point() {
        let x = DVector::from_vec(vec![0.0, 2.0]);
        let w = DVector::from_vec(vec![3.0, 0.0]);
        assert_eq!(min_map_residual(&x, &w), 0.0);
    }
}
