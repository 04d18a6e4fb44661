use glam::DVec2;
use nalgebra::{DMatrix, DVector};

use super::{
    apply_impulses, coupling_matrix, impact_rhs, transpose_mul, update_positions,
    warm_start_alpha, ContactAssembly, MapOutcome,
};
use crate::{
    config::{ImpulsesToCache, MapConfig, SimConfig},
    constraint::{Constraint, ConstraintCache},
    detection::ActiveSetBuilder,
    scene::BallState,
    solver::{ImpactOperator, LinearMdpOperator},
};

struct Staggered {
    alpha: DVector<f64>,
    beta: DVector<f64>,
    iterations: usize,
    converged: bool,
}

/// Impact response with Coulomb friction, solved by staggered projections.
///
/// Alternates the impact LCP, seeing the current friction impulses, with the
/// friction QP, bounded by the current normal impulses, until neither
/// impulse moves by more than `abs_tol`.
#[derive(Clone, Debug, PartialEq)]
pub struct ImpactFrictionMap {
    impact_operator: ImpactOperator,
    friction_operator: LinearMdpOperator,
    cor: f64,
    mu: f64,
    config: MapConfig,
}

impl ImpactFrictionMap {
    #[must_use]
    pub fn new(config: &SimConfig) -> Self {
        debug_assert!(config.mu >= 0.0);

        Self {
            impact_operator: ImpactOperator::new(&config.impact_solver),
            friction_operator: LinearMdpOperator::new(&config.friction),
            cor: config.cor,
            mu: config.mu,
            config: config.map,
        }
    }

    #[inline]
    #[must_use]
    pub const fn friction_operator(&self) -> &LinearMdpOperator {
        &self.friction_operator
    }

    fn warm_start_beta(
        &self,
        active_set: &[Constraint],
        cache: &ConstraintCache,
    ) -> DVector<f64> {
        let m = self.friction_operator.disk_samples();
        let mut beta = DVector::zeros(active_set.len() * m);
        if self.config.impulses_to_cache == ImpulsesToCache::Normal {
            return beta;
        }

        for (contact, constraint) in active_set.iter().enumerate() {
            if let Some(impulse) = cache.lookup(constraint) {
                self.friction_operator.warm_start_contact(&mut beta, contact, impulse.y);
            }
        }
        beta
    }

    /// Alternates the two solves until the impulses settle. Inner solver
    /// diagnostics are reported once, for the final pass.
    #[allow(clippy::too_many_arguments)]
    fn staggered_projections(
        &self,
        q_nn: &DMatrix<f64>,
        q_nd: &DMatrix<f64>,
        q_dd: &DMatrix<f64>,
        b_free: &DVector<f64>,
        c_free: &DVector<f64>,
        mut alpha: DVector<f64>,
        mut beta: DVector<f64>,
    ) -> Staggered {
        let mut last_pass = None;
        let mut converged = false;
        let mut iterations = 0;
        while iterations < self.config.max_iters {
            iterations += 1;

            let b = b_free + q_nd * &beta;
            let (alpha_next, impact_report) = self.impact_operator.solve_quietly(q_nn, &b, &alpha);

            let c = c_free + q_nd.tr_mul(&alpha_next);
            let bounds: Vec<f64> = alpha_next.iter().map(|a| self.mu * a.max(0.0)).collect();
            let (beta_next, friction_report) =
                self.friction_operator.solve_quietly(q_dd, &c, &bounds, &beta);

            let change = (&alpha_next - &alpha).amax().max((&beta_next - &beta).amax());
            alpha = alpha_next;
            beta = beta_next;
            last_pass = Some((b, impact_report, c, bounds, friction_report));

            if change <= self.config.abs_tol {
                converged = true;
                break;
            }
        }

        if let Some((b, impact_report, c, bounds, friction_report)) = last_pass {
            self.impact_operator.report(q_nn, &b, &alpha, &impact_report);
            self.friction_operator.report(q_dd, &c, &bounds, &beta, &friction_report);
        }

        Staggered {
            alpha,
            beta,
            iterations,
            converged,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn flow(
        &self,
        state: &BallState,
        cache: &mut ConstraintCache,
        q0: &[DVec2],
        v0: &[DVec2],
        dt: f64,
        q1: &mut [DVec2],
        v1: &mut [DVec2],
    ) -> MapOutcome {
        let active_set = ActiveSetBuilder::compute_active_set(state, q0, q1);
        if active_set.is_empty() {
            return MapOutcome::empty();
        }

        let inv_m = state.inv_m();
        let assembly = ContactAssembly::new(
            &active_set,
            q0,
            v0,
            Some(self.friction_operator.coefficients()),
        );
        let q_nn = coupling_matrix(&assembly.normals, &assembly.normals, inv_m);
        let q_nd = coupling_matrix(&assembly.normals, &assembly.friction, inv_m);
        let q_dd = coupling_matrix(&assembly.friction, &assembly.friction, inv_m);

        let b_free = impact_rhs(&assembly, v0, v1, self.cor);
        let c_free = transpose_mul(&assembly.friction, v1) + &assembly.drel;

        let alpha0 = warm_start_alpha(&active_set, cache);
        let beta0 = self.warm_start_beta(&active_set, cache);
        let Staggered {
            alpha,
            beta,
            iterations,
            converged,
        } = self.staggered_projections(&q_nn, &q_nd, &q_dd, &b_free, &c_free, alpha0, beta0);

        if !converged {
            log::warn!(
                "Staggered projections did not converge in {} iterations",
                self.config.max_iters
            );
        }
        log::debug!(
            "Impact friction map: {} constraints, {} iterations",
            active_set.len(),
            iterations
        );

        apply_impulses(&assembly.normals, &alpha, inv_m, v1);
        apply_impulses(&assembly.friction, &beta, inv_m, v1);
        update_positions(&assembly, q0, v1, dt, q1);

        for (contact, (constraint, &impulse)) in
            active_set.iter().zip(alpha.iter()).enumerate()
        {
            let tangential = match self.config.impulses_to_cache {
                ImpulsesToCache::Normal => 0.0,
                ImpulsesToCache::NormalAndFriction => {
                    self.friction_operator.net_tangential_impulse(&beta, contact)
                }
            };
            cache.cache(constraint, DVec2::new(impulse, tangential));
        }

        MapOutcome {
            active_set,
            alpha,
            beta,
        }
    }
}
