use nalgebra::{DMatrix, DVector};

use super::SolveReport;

/// Group of consecutive variables whose sum is bounded by `cap`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimplexBlock {
    pub start: usize,
    pub len: usize,
    pub cap: f64,
}

/// Dense accelerated projected gradient solver for
///
/// `min ½ xᵗAx + cᵗx` s.t. `x ≥ 0` and `Σ x[block] ≤ cap` per block,
///
/// with symmetric positive semidefinite `A`. Uses a fixed `1/L` step with
/// `L` bounded by the Gershgorin row sums, Nesterov momentum and gradient
/// based restarts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectedGradientQp {
    pub tol: f64,
    pub max_iters: usize,
}

impl ProjectedGradientQp {
    /// `blocks` must either partition the variables or be empty, in which
    /// case the only constraint is `x ≥ 0`.
    #[must_use]
    pub fn solve(
        &self,
        a: &DMatrix<f64>,
        c: &DVector<f64>,
        blocks: &[SimplexBlock],
        x0: &DVector<f64>,
    ) -> (DVector<f64>, SolveReport) {
        let n = c.len();
        debug_assert_eq!(a.nrows(), n);
        debug_assert_eq!(a.ncols(), n);
        debug_assert_eq!(x0.len(), n);
        debug_assert!(blocks.is_empty() || blocks.iter().map(|b| b.len).sum::<usize>() == n);

        if n == 0 {
            return (DVector::zeros(0), SolveReport::converged(0, 0.0));
        }

        let lipschitz = gershgorin_bound(a);
        let step = if lipschitz > 0.0 { lipschitz.recip() } else { 1.0 };

        let mut x = project(x0.clone(), blocks);
        let mut residual = stationarity(a, c, &x, blocks);
        if residual <= self.tol {
            return (x, SolveReport::converged(0, residual));
        }

        let mut y = x.clone();
        let mut t = 1.0_f64;
        for iter in 1..=self.max_iters {
            let grad = a * &y + c;
            let x_next = project(&y - &grad * step, blocks);
            let dx = &x_next - &x;

            if grad.dot(&dx) > 0.0 {
                t = 1.0;
                y.copy_from(&x_next);
            } else {
                let t_next = 0.5 * (1.0 + (1.0 + 4.0 * t * t).sqrt());
                y = &x_next + dx * ((t - 1.0) / t_next);
                t = t_next;
            }
            x = x_next;

            residual = stationarity(a, c, &x, blocks);
            if residual <= self.tol {
                return (x, SolveReport::converged(iter, residual));
            }
        }

        (x, SolveReport::failed(self.max_iters, residual))
    }
}

fn gershgorin_bound(a: &DMatrix<f64>) -> f64 {
    a.row_iter()
        .map(|row| row.iter().map(|v| v.abs()).sum::<f64>())
        .fold(0.0, f64::max)
}

/// Norm of the projected gradient step with unit length, zero exactly at a KKT point.
fn stationarity(a: &DMatrix<f64>, c: &DVector<f64>, x: &DVector<f64>, blocks: &[SimplexBlock]) -> f64 {
    let grad = a * x + c;
    let moved = project(x - grad, blocks);
    (x - moved).amax()
}

pub(crate) fn project(mut x: DVector<f64>, blocks: &[SimplexBlock]) -> DVector<f64> {
    if blocks.is_empty() {
        x.apply(|v| *v = v.max(0.0));
        return x;
    }

    let values = x.as_mut_slice();
    for block in blocks {
        project_capped_simplex(&mut values[block.start..block.start + block.len], block.cap);
    }
    x
}

/// Euclidean projection onto `{x ≥ 0, Σx ≤ cap}`.
fn project_capped_simplex(values: &mut [f64], cap: f64) {
    let clamped_sum: f64 = values.iter().map(|v| v.max(0.0)).sum();
    if clamped_sum <= cap {
        for v in values.iter_mut() {
            *v = v.max(0.0);
        }
        return;
    }

    if cap <= 0.0 {
        values.fill(0.0);
        return;
    }

    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(|a, b| b.total_cmp(a));

    let mut cumsum = 0.0;
    let mut theta = 0.0;
    for (k, &u) in sorted.iter().enumerate() {
        cumsum += u;
        let candidate = (cumsum - cap) / (k + 1) as f64;
        if u > candidate {
            theta = candidate;
        }
    }

    for v in values.iter_mut() {
        *v = (*v - theta).max(0.0);
    }
}
