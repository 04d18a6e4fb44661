//! Step drivers that turn a tentative state into a contact-resolved one.
//!
//! Each map runs Detect, Assemble, Solve, Apply and Cache-Update in order.

mod assembly;
mod impact_friction_map;
mod impact_map;

pub use assembly::*;
pub use impact_friction_map::*;
pub use impact_map::*;

use glam::DVec2;
use nalgebra::DVector;

use crate::{
    config::SimConfig,
    constraint::{Constraint, ConstraintCache},
    scene::BallState,
};

/// What a map resolved during one step.
#[derive(Clone, Debug)]
pub struct MapOutcome {
    pub active_set: Vec<Constraint>,
    /// Normal impulse per constraint.
    pub alpha: DVector<f64>,
    /// Friction impulse per constraint and sampled direction.
    pub beta: DVector<f64>,
}

impl MapOutcome {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            active_set: Vec::new(),
            alpha: DVector::zeros(0),
            beta: DVector::zeros(0),
        }
    }
}

/// The map selected by the friction coefficient of a [`SimConfig`].
#[derive(Clone, Debug, PartialEq)]
pub enum ConstrainedMap {
    Impact(ImpactMap),
    ImpactFriction(ImpactFrictionMap),
}

impl ConstrainedMap {
    #[must_use]
    pub fn new(config: &SimConfig) -> Self {
        if config.uses_friction() {
            Self::ImpactFriction(ImpactFrictionMap::new(config))
        } else {
            Self::Impact(ImpactMap::new(config))
        }
    }

    /// Resolves contacts between `(q0, v0)` and the tentative `(q1, v1)`,
    /// overwriting the latter.
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
        match self {
            Self::Impact(map) => map.flow(state, cache, q0, v0, dt, q1, v1),
            Self::ImpactFriction(map) => map.flow(state, cache, q0, v0, dt, q1, v1),
        }
    }
}

/// `b = Nᵗv_tent + CoR Nᵗv0 + (1 + CoR) nrel`.
///
/// Restitution acts on the pre-step velocity only, so forces integrated
/// into the tentative velocity are not bounced back.
fn impact_rhs(
    assembly: &ContactAssembly,
    v0: &[DVec2],
    v_tent: &[DVec2],
    cor: f64,
) -> DVector<f64> {
    transpose_mul(&assembly.normals, v_tent)
        + transpose_mul(&assembly.normals, v0) * cor
        + &assembly.nrel * (1.0 + cor)
}

fn warm_start_alpha(active_set: &[Constraint], cache: &ConstraintCache) -> DVector<f64> {
    DVector::from_iterator(
        active_set.len(),
        active_set
            .iter()
            .map(|constraint| {
                cache
                    .lookup(constraint)
                    .map_or(0.0, |impulse| impulse.x.max(0.0))
            }),
    )
}

/// `q1 = q0 + dt v1` for every body touched by a constraint.
fn update_positions(
    assembly: &ContactAssembly,
    q0: &[DVec2],
    v1: &[DVec2],
    dt: f64,
    q1: &mut [DVec2],
) {
    let mut touched = vec![false; q1.len()];
    for &(body, _) in assembly.normals.iter().flatten() {
        touched[body] = true;
    }

    for (body, _) in touched.iter().enumerate().filter(|(_, touched)| **touched) {
        q1[body] = q0[body] + dt * v1[body];
    }
}
