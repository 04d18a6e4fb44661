use std::{
    collections::BTreeMap,
    io::{self, Read, Write},
};

use glam::DVec2;

use super::{NoCallback, Snapshot, StepCallback, SymplecticEuler, UnconstrainedMap};
use crate::{
    config::SimConfig,
    constraint::{Constraint, ConstraintCache},
    detection::ActiveSetBuilder,
    maps::{ConstrainedMap, MapOutcome},
    scene::BallState,
};

/// Owns the scene, the impulse cache and the contact map, and advances them
/// one fixed step at a time.
pub struct Simulation {
    state: BallState,
    cache: ConstraintCache,
    config: SimConfig,
    map: ConstrainedMap,
    integrator: SymplecticEuler,
    iteration: u64,
}

impl Simulation {
    #[must_use]
    pub fn new(state: BallState) -> Self {
        Self::new_with_config(state, SimConfig::DEFAULT)
    }

    #[must_use]
    pub fn new_with_config(state: BallState, config: SimConfig) -> Self {
        assert!(config.dt > 0.0, "dt must be positive");
        assert!(config.cor >= 0.0, "coefficient of restitution must not be negative");
        assert!(config.mu >= 0.0, "friction coefficient must not be negative");

        let map = ConstrainedMap::new(&config);
        log::info!(
            "Simulation with {} balls, {} planes, {} drums, {} portals, dt {}",
            state.num_balls(),
            state.planes().len(),
            state.drums().len(),
            state.portals().len(),
            config.dt
        );

        Self {
            state,
            cache: ConstraintCache::new(),
            config,
            map,
            integrator: SymplecticEuler::BALLISTIC,
            iteration: 0,
        }
    }

    /// Integrator used by [`Self::step`].
    #[must_use]
    pub fn with_integrator(mut self, integrator: SymplecticEuler) -> Self {
        self.integrator = integrator;
        self
    }

    #[inline]
    #[must_use]
    pub const fn state(&self) -> &BallState {
        &self.state
    }

    #[inline]
    #[must_use]
    pub const fn state_mut(&mut self) -> &mut BallState {
        &mut self.state
    }

    #[inline]
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub const fn iteration(&self) -> u64 {
        self.iteration
    }

    #[inline]
    #[must_use]
    pub fn time(&self) -> f64 {
        self.iteration as f64 * self.config.dt
    }

    #[inline]
    #[must_use]
    pub const fn cache(&self) -> &ConstraintCache {
        &self.cache
    }

    #[inline]
    #[must_use]
    pub const fn cache_mut(&mut self) -> &mut ConstraintCache {
        &mut self.cache
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn step(&mut self, steps: u32) -> &BallState {
        let integrator = self.integrator;
        for _ in 0..steps {
            self.step_with(&integrator, &mut NoCallback);
        }
        &self.state
    }

    /// Advances one step with a custom integrator and callback.
    pub fn step_with<U, C>(&mut self, integrator: &U, callback: &mut C) -> MapOutcome
    where
        U: UnconstrainedMap + ?Sized,
        C: StepCallback + ?Sized,
    {
        let dt = self.config.dt;
        // Detection and wrapping act on the end-of-step configuration.
        let end_time = (self.iteration + 1) as f64 * dt;
        self.state.advance_portals(end_time);
        callback.start_of_step(self.iteration, &self.state);

        let n = self.state.num_balls();
        let mut q1 = vec![DVec2::ZERO; n];
        let mut v1 = vec![DVec2::ZERO; n];
        integrator.flow(
            &self.state.q,
            &self.state.v,
            self.state.inv_m(),
            dt,
            &mut q1,
            &mut v1,
        );

        let outcome = self.map.flow(
            &self.state,
            &mut self.cache,
            &self.state.q,
            &self.state.v,
            dt,
            &mut q1,
            &mut v1,
        );

        self.state.q = q1;
        self.state.v = v1;
        self.state.enforce_periodic_boundaries();
        self.iteration += 1;

        callback.end_of_step(self.iteration, &self.state);
        outcome
    }

    /// Constraints that would be active between the current configuration and `q1`.
    #[must_use]
    pub fn compute_active_set(&self, q1: &[DVec2]) -> Vec<Constraint> {
        ActiveSetBuilder::compute_active_set(&self.state, &self.state.q, q1)
    }

    /// Count and summed signed penetration depth of the constraints active at
    /// the current configuration, keyed by constraint type name.
    #[must_use]
    pub fn compute_number_of_collisions(&self) -> BTreeMap<&'static str, (usize, f64)> {
        let mut collisions = BTreeMap::new();
        for constraint in self.compute_active_set(&self.state.q) {
            let entry = collisions.entry(constraint.name()).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += constraint.penetration_depth(&self.state.q);
        }
        collisions
    }

    pub fn write_snapshot<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        Snapshot::write(writer, &self.state, self.iteration, &self.cache)
    }

    /// Restores balls, iteration and cache. The static scene is kept.
    pub fn read_snapshot<R: Read>(&mut self, reader: &mut R) -> io::Result<()> {
        let snapshot = Snapshot::read(reader)?;
        let (iteration, cache) = snapshot.restore_balls(&mut self.state)?;

        self.iteration = iteration;
        self.cache = cache;
        // Offset the writer's portals had at the end of its last step.
        let time = self.time();
        self.state.advance_portals(time);

        log::info!(
            "Loaded snapshot at iteration {} with {} balls and {} cached impulses",
            self.iteration,
            self.state.num_balls(),
            self.cache.len()
        );
        Ok(())
    }
}
