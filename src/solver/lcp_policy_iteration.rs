use nalgebra::{DMatrix, DVector};

use super::SolveReport;
use crate::math::{min_map_residual, solve_spd};

/// Policy iteration for `0 ≤ α ⟂ Qα + b ≥ 0`.
///
/// A policy is the set of constraints assumed to carry impulse. Each
/// iteration solves `Q_PP α_P = -b_P` with the rest pinned at zero, then
/// keeps exactly the indices where `w = Qα + b` falls below `α`. This is
/// Newton's method on the min-map `min(α, w)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LcpPolicyIteration {
    pub tol: f64,
    pub max_iters: usize,
}

impl LcpPolicyIteration {
    #[must_use]
    pub fn solve(
        &self,
        q: &DMatrix<f64>,
        b: &DVector<f64>,
        alpha0: &DVector<f64>,
    ) -> (DVector<f64>, SolveReport) {
        let n = b.len();
        if n == 0 {
            return (DVector::zeros(0), SolveReport::converged(0, 0.0));
        }

        let mut best = alpha0.map(|a| a.max(0.0));
        let mut best_residual = min_map_residual(&best, &(q * &best + b));
        if best_residual <= self.tol {
            return (best, SolveReport::converged(0, best_residual));
        }

        let mut policy: Vec<bool> = (0..n).map(|i| alpha0[i] > 0.0 || b[i] < 0.0).collect();
        for iter in 1..=self.max_iters {
            let alpha = Self::solve_policy(q, b, &policy);
            let w = q * &alpha + b;
            let residual = min_map_residual(&alpha, &w);

            if residual < best_residual {
                best_residual = residual;
                best.copy_from(&alpha);
            }

            if residual <= self.tol {
                return (alpha, SolveReport::converged(iter, residual));
            }

            let next_policy: Vec<bool> = (0..n).map(|i| w[i] < alpha[i]).collect();
            if next_policy == policy {
                // Stationary policy that does not satisfy the tolerance.
                best.apply(|a| *a = a.max(0.0));
                return (best, SolveReport::failed(iter, best_residual));
            }
            policy = next_policy;
        }

        best.apply(|a| *a = a.max(0.0));
        (best, SolveReport::failed(self.max_iters, best_residual))
    }

    fn solve_policy(q: &DMatrix<f64>, b: &DVector<f64>, policy: &[bool]) -> DVector<f64> {
        let active: Vec<usize> = (0..policy.len()).filter(|&i| policy[i]).collect();
        let mut alpha = DVector::zeros(policy.len());
        if active.is_empty() {
            return alpha;
        }

        let q_pp = q.select_rows(&active).select_columns(&active);
        let rhs = -b.select_rows(&active);
        let alpha_p = solve_spd(&q_pp, &rhs);
        for (k, &i) in active.iter().enumerate() {
            alpha[i] = alpha_p[k];
        }
        alpha
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solver() -> LcpPolicyIteration {
        LcpPolicyIteration {
            tol: 1.0e-12,
            max_iters: 50,
        }
    }

    #[test]
    fn single_contact_closed_form() {
        let q = DMatrix::from_element(1, 1, 2.0);
        let b = DVector::from_element(1, -4.0);
        let (alpha, report) = solver().solve(&q, &b, &DVector::zeros(1));
        assert!(report.converged);
        assert!((alpha[0] - 2.0).abs() < 1.0e-12);
    }

    #[test]
    fn separating_contacts_get_no_impulse() {
        let q = DMatrix::from_row_slice(2, 2, &[2.0, -1.0, -1.0, 2.0]);
        let b = DVector::from_vec(vec![1.0, 3.0]);
        let (alpha, report) = solver().solve(&q, &b, &DVector::from_vec(vec![5.0, 5.0]));
        assert!(report.converged);
        assert_eq!(alpha, DVector::zeros(2));
    }

    #[test]
    fn mixed_policy() {
        // Contact 0 is pushed, contact 1 separates once contact 0 acts.
        let q = DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 1.0, 2.0]);
        let b = DVector::from_vec(vec![-2.0, -0.5]);
        let (alpha, report) = solver().solve(&q, &b, &DVector::zeros(2));
        assert!(report.converged);
        assert!((alpha[0] - 1.0).abs() < 1.0e-12);
        assert_eq!(alpha[1], 0.0);

        let w = &q * &alpha + &b;
        assert!(w.iter().all(|&wi| wi >= -1.0e-12));
    }

    #[test]
    fn warm_start_at_solution_takes_no_iterations() {
        let q = DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 1.0, 2.0]);
        let b = DVector::from_vec(vec![-2.0, -0.5]);
        let (alpha, _) = solver().solve(&q, &b, &DVector::zeros(2));

        let (again, report) = solver().solve(&q, &b, &alpha);
        assert_eq!(report.iterations, 0);
        assert_eq!(again, alpha);
    }

    #[test]
    fn singular_coupling() {
        // Two identical contacts on the same pair of bodies.
        let q = DMatrix::from_row_slice(2, 2, &[2.0, 2.0, 2.0, 2.0]);
        let b = DVector::from_vec(vec![-4.0, -4.0]);
        let (alpha, report) = solver().solve(&q, &b, &DVector::zeros(2));
        assert!(report.converged);
        assert!(alpha.iter().all(|&a| a >= 0.0));
        assert!((alpha.sum() - 2.0).abs() < 1.0e-9);
    }
}
