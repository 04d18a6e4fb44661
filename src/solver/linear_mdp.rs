use std::f64::consts::TAU;

use nalgebra::{DMatrix, DVector};

use super::{ProjectedGradientQp, SimplexBlock, SolveReport, CHECK_SCALE};
use crate::config::FrictionConfig;

/// Linearized maximal dissipation friction solve.
///
/// Every contact samples `disk_samples` directions from a regular polygon
/// inscribed in the Coulomb disk. In the plane the disk collapses onto the
/// contact tangent `t`, so direction `k` is `cos(2πk/m) t` and directions
/// `k` and `k + m/2` are opposite. With `D` the stacked directions the
/// friction impulses solve
///
/// `min ½βᵗ(DᵗM⁻¹D)β + βᵗc` s.t. `β ≥ 0`, `Σ_k β_ck ≤ μ α_c`.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearMdpOperator {
    disk_samples: usize,
    coefficients: Vec<f64>,
    qp: ProjectedGradientQp,
    check_solution: bool,
}

impl LinearMdpOperator {
    /// # Panics
    ///
    /// If `disk_samples` is odd or smaller than two.
    #[must_use]
    pub fn new(config: &FrictionConfig) -> Self {
        let m = config.disk_samples;
        assert!(m >= 2 && m % 2 == 0, "disk_samples must be even and at least 2, got {m}");

        let coefficients: Vec<f64> = (0..m).map(|k| (TAU * k as f64 / m as f64).cos()).collect();
        debug_assert!(
            (0..m / 2).all(|k| (coefficients[k] + coefficients[k + m / 2]).abs() < 1.0e-12),
            "friction directions must come in opposite pairs"
        );

        Self {
            disk_samples: m,
            coefficients,
            qp: ProjectedGradientQp {
                tol: config.tol,
                max_iters: config.max_iters,
            },
            check_solution: config.check_solution,
        }
    }

    #[inline]
    #[must_use]
    pub const fn disk_samples(&self) -> usize {
        self.disk_samples
    }

    /// Tangent scale of each sampled direction.
    #[inline]
    #[must_use]
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        "linear_mdp"
    }

    /// Solves for `β` given the per-contact bounds `μα`.
    #[must_use]
    pub fn solve(
        &self,
        q_dd: &DMatrix<f64>,
        c: &DVector<f64>,
        bounds: &[f64],
        beta0: &DVector<f64>,
    ) -> (DVector<f64>, SolveReport) {
        let (beta, report) = self.solve_quietly(q_dd, c, bounds, beta0);
        self.report(q_dd, c, bounds, &beta, &report);
        (beta, report)
    }

    #[must_use]
    pub(crate) fn solve_quietly(
        &self,
        q_dd: &DMatrix<f64>,
        c: &DVector<f64>,
        bounds: &[f64],
        beta0: &DVector<f64>,
    ) -> (DVector<f64>, SolveReport) {
        let m = self.disk_samples;
        debug_assert_eq!(c.len(), bounds.len() * m);

        let blocks: Vec<SimplexBlock> = bounds
            .iter()
            .enumerate()
            .map(|(contact, &cap)| SimplexBlock {
                start: contact * m,
                len: m,
                cap: cap.max(0.0),
            })
            .collect();

        self.qp.solve(q_dd, c, &blocks, beta0)
    }

    pub(crate) fn report(
        &self,
        q_dd: &DMatrix<f64>,
        c: &DVector<f64>,
        bounds: &[f64],
        beta: &DVector<f64>,
        report: &SolveReport,
    ) {
        if !report.converged {
            log::warn!(
                "Friction solve stopped after {} iterations, residual {:e}",
                report.iterations,
                report.residual
            );
        }

        if self.check_solution {
            self.check_optimality(q_dd, c, bounds, beta);
        }
    }

    /// Net tangential impulse of contact `contact`.
    #[must_use]
    pub fn net_tangential_impulse(&self, beta: &DVector<f64>, contact: usize) -> f64 {
        let start = contact * self.disk_samples;
        self.coefficients
            .iter()
            .enumerate()
            .map(|(k, coeff)| coeff * beta[start + k])
            .sum()
    }

    /// Spreads a cached net tangential impulse onto the sampled directions.
    pub fn warm_start_contact(&self, beta: &mut DVector<f64>, contact: usize, net: f64) {
        let start = contact * self.disk_samples;
        if net >= 0.0 {
            beta[start] = net;
        } else {
            beta[start + self.disk_samples / 2] = -net;
        }
    }

    /// Cone multipliers recovered from the gradient, one per contact.
    #[must_use]
    pub fn cone_multipliers(
        &self,
        q_dd: &DMatrix<f64>,
        c: &DVector<f64>,
        beta: &DVector<f64>,
    ) -> Vec<f64> {
        let grad = q_dd * beta + c;
        grad.as_slice()
            .chunks_exact(self.disk_samples)
            .map(|block| block.iter().fold(0.0_f64, |acc, &g| acc.max(-g)))
            .collect()
    }

    /// Logs violated KKT conditions. Never fatal.
    fn check_optimality(
        &self,
        q_dd: &DMatrix<f64>,
        c: &DVector<f64>,
        bounds: &[f64],
        beta: &DVector<f64>,
    ) {
        let m = self.disk_samples;
        let multipliers = self.cone_multipliers(q_dd, c, beta);
        let grad = q_dd * beta + c;
        let scale = CHECK_SCALE * self.qp.tol * c.amax().max(1.0);

        for (contact, (&bound, &lambda)) in bounds.iter().zip(&multipliers).enumerate() {
            let block = contact * m..(contact + 1) * m;
            let sum: f64 = beta.as_slice()[block.clone()].iter().sum();

            if sum > bound + scale {
                log::warn!(
                    "Friction impulse {sum:e} of contact {contact} exceeds its bound {bound:e}"
                );
            }

            let cone_residual = lambda.min(bound - sum).abs();
            let stationarity = block
                .map(|k| beta[k].min(grad[k] + lambda).abs())
                .fold(cone_residual, f64::max);
            if stationarity > scale {
                log::warn!(
                    "Friction solution of contact {contact} violates optimality by {stationarity:e}"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn operator(disk_samples: usize) -> LinearMdpOperator {
        LinearMdpOperator::new(&FrictionConfig {
            disk_samples,
            tol: 1.0e-12,
            max_iters: 100_000,
            check_solution: true,
        })
    }

    #[test]
    fn directions_come_in_opposite_pairs() {
        let op = operator(6);
        let coeffs = op.coefficients();
        assert_eq!(coeffs.len(), 6);
        assert!((coeffs[0] - 1.0).abs() < 1.0e-12);
        assert!((coeffs[3] + 1.0).abs() < 1.0e-12);
    }

    #[test]
    #[should_panic]
    fn odd_sample_count_panics() {
        let _ = operator(3);
    }

    #[test]
    fn sticking_and_sliding() {
        // One ball sliding along +t at speed 2 with unit inverse mass.
        let op = operator(2);
        let q_dd = DMatrix::from_row_slice(2, 2, &[1.0, -1.0, -1.0, 1.0]);
        let c = DVector::from_vec(vec![2.0, -2.0]);

        // Enough friction to stop the ball.
        let (beta, report) = op.solve(&q_dd, &c, &[5.0], &DVector::zeros(2));
        assert!(report.converged);
        assert!((op.net_tangential_impulse(&beta, 0) + 2.0).abs() < 1.0e-9);

        // Sliding: the bound is saturated.
        let (beta, _) = op.solve(&q_dd, &c, &[0.5], &DVector::zeros(2));
        assert!((beta.sum() - 0.5).abs() < 1.0e-9);
        assert!((op.net_tangential_impulse(&beta, 0) + 0.5).abs() < 1.0e-9);
        assert!(op.cone_multipliers(&q_dd, &c, &beta)[0] > 0.0);
    }

    #[test]
    fn warm_start_places_net_impulse() {
        let op = operator(4);
        let mut beta = DVector::zeros(8);
        op.warm_start_contact(&mut beta, 0, 0.75);
        op.warm_start_contact(&mut beta, 1, -0.25);
        assert_eq!(beta[0], 0.75);
        assert_eq!(beta[6], 0.25);
        assert!((op.net_tangential_impulse(&beta, 1) + 0.25).abs() < 1.0e-12);
    }
}
