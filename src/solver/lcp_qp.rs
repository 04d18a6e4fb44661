use nalgebra::{DMatrix, DVector};

use super::{ProjectedGradientQp, SolveReport};

/// Solves the impact LCP as `min ½αᵗQα + bᵗα` with `α ≥ 0`.
///
/// Same optimum as the LCP whenever `Q` is positive semidefinite.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LcpQp {
    qp: ProjectedGradientQp,
}

impl LcpQp {
    #[must_use]
    pub const fn new(tol: f64, max_iters: usize) -> Self {
        Self {
            qp: ProjectedGradientQp { tol, max_iters },
        }
    }

    #[must_use]
    pub fn solve(
        &self,
        q: &DMatrix<f64>,
        b: &DVector<f64>,
        alpha0: &DVector<f64>,
    ) -> (DVector<f64>, SolveReport) {
        self.qp.solve(q, b, &[], alpha0)
    }
}
