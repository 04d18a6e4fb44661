use glam::DVec2;
use nalgebra::DVector;

use super::{
    apply_impulses, coupling_matrix, impact_rhs, update_positions, warm_start_alpha,
    ContactAssembly, MapOutcome,
};
use crate::{
    config::SimConfig,
    constraint::ConstraintCache,
    detection::ActiveSetBuilder,
    scene::BallState,
    solver::ImpactOperator,
};

/// Frictionless impact response.
#[derive(Clone, Debug, PartialEq)]
pub struct ImpactMap {
    impact_operator: ImpactOperator,
    cor: f64,
}

impl ImpactMap {
    #[must_use]
    pub fn new(config: &SimConfig) -> Self {
        Self {
            impact_operator: ImpactOperator::new(&config.impact_solver),
            cor: config.cor,
        }
    }

    #[inline]
    #[must_use]
    pub const fn impact_operator(&self) -> &ImpactOperator {
        &self.impact_operator
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
        let assembly = ContactAssembly::new(&active_set, q0, v0, None);
        let q = coupling_matrix(&assembly.normals, &assembly.normals, inv_m);
        let b = impact_rhs(&assembly, v0, v1, self.cor);

        let alpha0 = warm_start_alpha(&active_set, cache);
        let (alpha, report) = self.impact_operator.solve(&q, &b, &alpha0);
        log::debug!(
            "Impact map: {} constraints, {} iterations",
            active_set.len(),
            report.iterations
        );

        apply_impulses(&assembly.normals, &alpha, inv_m, v1);
        update_positions(&assembly, q0, v1, dt, q1);

        for (constraint, &impulse) in active_set.iter().zip(alpha.iter()) {
            cache.cache(constraint, DVec2::new(impulse, 0.0));
        }

        MapOutcome {
            active_set,
            alpha,
            beta: DVector::zeros(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImpactSolverConfig;

    fn head_on(dt: f64) -> (BallState, Vec<DVec2>, Vec<DVec2>) {
        let state = BallState::new(
            vec![DVec2::new(-2.0, 0.0), DVec2::new(2.0, 0.0)],
            vec![DVec2::new(1.0, 0.0), DVec2::new(-1.0, 0.0)],
            vec![1.0; 2],
            vec![1.0; 2],
        )
        .unwrap();

        let q1 = state.q.iter().zip(&state.v).map(|(&q, &v)| q + dt * v).collect();
        let v1 = state.v.clone();
        (state, q1, v1)
    }

    #[test]
    fn partially_elastic_rebound() {
        let cor = 0.5;
        let (state, mut q1, mut v1) = head_on(1.5);
        let map = ImpactMap::new(&SimConfig::DEFAULT.with_cor(cor).with_dt(1.5));
        let mut cache = ConstraintCache::new();

        let outcome = map.flow(&state, &mut cache, &state.q, &state.v, 1.5, &mut q1, &mut v1);
        assert_eq!(outcome.active_set.len(), 1);
        assert!(outcome.alpha[0] > 0.0);

        let pre = (state.v[0] - state.v[1]).x;
        let post = (v1[0] - v1[1]).x;
        assert!((post + cor * pre).abs() < 1.0e-9);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn inelastic_contacts_do_not_rebound() {
        let (state, mut q1, mut v1) = head_on(1.5);
        let config = SimConfig {
            impact_solver: ImpactSolverConfig {
                kind: crate::config::ImpactSolverKind::QuadraticProgram,
                ..ImpactSolverConfig::DEFAULT
            },
            ..SimConfig::DEFAULT.with_cor(0.0)
        };
        let map = ImpactMap::new(&config);
        let mut cache = ConstraintCache::new();

        let outcome = map.flow(&state, &mut cache, &state.q, &state.v, 1.5, &mut q1, &mut v1);
        assert!(outcome.alpha.iter().all(|&a| a >= 0.0));

        let relative = outcome.active_set[0].relative_normal_velocity(&state.q, &v1);
        assert!(relative >= -1.0e-8);
        assert!(relative.abs() < 1.0e-6);
    }

    #[test]
    fn no_contacts_leaves_tentative_state() {
        let (state, mut q1, mut v1) = head_on(0.5);
        let expected_q1 = q1.clone();
        let map = ImpactMap::new(&SimConfig::DEFAULT);
        let mut cache = ConstraintCache::new();

        let outcome = map.flow(&state, &mut cache, &state.q, &state.v, 0.5, &mut q1, &mut v1);
        assert!(outcome.active_set.is_empty());
        assert_eq!(q1, expected_q1);
        assert_eq!(v1, state.v);
        assert!(cache.is_empty());
    }
}
