//! Dense solvers for the impact LCP and the friction QP.

mod lcp_policy_iteration;
mod lcp_qp;
mod linear_mdp;
mod projected_gradient_qp;

pub use lcp_policy_iteration::*;
pub use lcp_qp::*;
pub use linear_mdp::*;
pub use projected_gradient_qp::*;

use nalgebra::{DMatrix, DVector};

use crate::{
    config::{ImpactSolverConfig, ImpactSolverKind},
    math::min_map_residual,
};

/// Slack on the post-solve checks, in units of the solver tolerance.
pub(crate) const CHECK_SCALE: f64 = 100.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolveReport {
    pub iterations: usize,
    pub residual: f64,
    pub converged: bool,
}

impl SolveReport {
    #[inline]
    #[must_use]
    pub const fn converged(iterations: usize, residual: f64) -> Self {
        Self {
            iterations,
            residual,
            converged: true,
        }
    }

    #[inline]
    #[must_use]
    pub const fn failed(iterations: usize, residual: f64) -> Self {
        Self {
            iterations,
            residual,
            converged: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum ImpactStrategy {
    PolicyIteration(LcpPolicyIteration),
    QuadraticProgram(LcpQp),
}

/// Solves `0 ≤ α ⟂ Qα + b ≥ 0` for the normal impulses.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImpactOperator {
    strategy: ImpactStrategy,
    tol: f64,
    check_solution: bool,
}

impl Default for ImpactOperator {
    fn default() -> Self {
        Self::new(&ImpactSolverConfig::DEFAULT)
    }
}

impl ImpactOperator {
    #[must_use]
    pub fn new(config: &ImpactSolverConfig) -> Self {
        let strategy = match config.kind {
            ImpactSolverKind::PolicyIteration => {
                ImpactStrategy::PolicyIteration(LcpPolicyIteration {
                    tol: config.tol,
                    max_iters: config.max_iters,
                })
            }
            ImpactSolverKind::QuadraticProgram => {
                ImpactStrategy::QuadraticProgram(LcpQp::new(config.tol, config.qp_max_iters))
            }
        };

        Self {
            strategy,
            tol: config.tol,
            check_solution: config.check_solution,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self.strategy {
            ImpactStrategy::PolicyIteration(_) => "lcp_policy_iteration",
            ImpactStrategy::QuadraticProgram(_) => "lcp_qp",
        }
    }

    /// Normal impulses, starting from `alpha0`.
    ///
    /// Non-convergence is logged and the best iterate is returned.
    #[must_use]
    pub fn solve(
        &self,
        q: &DMatrix<f64>,
        b: &DVector<f64>,
        alpha0: &DVector<f64>,
    ) -> (DVector<f64>, SolveReport) {
        let (alpha, report) = self.solve_quietly(q, b, alpha0);
        self.report(q, b, &alpha, &report);
        (alpha, report)
    }

    /// [`Self::solve`] without any logging or checks, for callers that
    /// solve repeatedly and report once.
    #[must_use]
    pub(crate) fn solve_quietly(
        &self,
        q: &DMatrix<f64>,
        b: &DVector<f64>,
        alpha0: &DVector<f64>,
    ) -> (DVector<f64>, SolveReport) {
        match &self.strategy {
            ImpactStrategy::PolicyIteration(solver) => solver.solve(q, b, alpha0),
            ImpactStrategy::QuadraticProgram(solver) => solver.solve(q, b, alpha0),
        }
    }

    pub(crate) fn report(
        &self,
        q: &DMatrix<f64>,
        b: &DVector<f64>,
        alpha: &DVector<f64>,
        report: &SolveReport,
    ) {
        if !report.converged {
            log::warn!(
                "{} stopped after {} iterations, residual {:e}",
                self.name(),
                report.iterations,
                report.residual
            );
        }

        if self.check_solution {
            self.check_optimality(q, b, alpha);
        }
    }

    /// Logs negative impulses or a large complementarity residual. Never fatal.
    fn check_optimality(&self, q: &DMatrix<f64>, b: &DVector<f64>, alpha: &DVector<f64>) {
        if alpha.is_empty() {
            return;
        }

        let scale = CHECK_SCALE * self.tol * b.amax().max(1.0);
        let min_alpha = alpha.min();
        if min_alpha < -scale {
            log::warn!("{} returned a negative impulse {min_alpha:e}", self.name());
        }

        let residual = min_map_residual(alpha, &(q * alpha + b));
        if residual > scale {
            log::warn!("{} complementarity residual {residual:e}", self.name());
        }
    }
}

/// True if `q` has a positive diagonal and a non-positive off-diagonal.
#[must_use]
pub fn is_m_matrix(q: &DMatrix<f64>) -> bool {
    debug_assert_eq!(q.nrows(), q.ncols());

    q.row_iter().enumerate().all(|(row, values)| {
        values.iter().enumerate().all(|(col, &value)| {
            if row == col {
                value > 0.0
            } else {
                value <= 0.0
            }
        })
    })
}
