/// Which impact operator the maps use for the normal LCP.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ImpactSolverKind {
    #[default]
    PolicyIteration,
    QuadraticProgram,
}

/// Which portion of the solved impulse is stored for warm starting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ImpulsesToCache {
    Normal,
    #[default]
    NormalAndFriction,
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImpactSolverConfig {
    pub kind: ImpactSolverKind,
    /// Absolute tolerance on the complementarity residual.
    pub tol: f64,
    /// Iteration cap of the policy iteration.
    pub max_iters: usize,
    /// Iteration cap of the projected gradient QP solve.
    pub qp_max_iters: usize,
    /// Run the post-solve optimality checks (logged, never fatal).
    pub check_solution: bool,
}

impl Default for ImpactSolverConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl ImpactSolverConfig {
    pub const DEFAULT: Self = Self {
        kind: ImpactSolverKind::PolicyIteration,
        tol: 1.0e-9,
        max_iters: 100,
        qp_max_iters: 10_000,
        check_solution: cfg!(debug_assertions),
    };
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrictionConfig {
    /// Directions sampled from the Coulomb disk per contact. Must be even.
    pub disk_samples: usize,
    pub tol: f64,
    pub max_iters: usize,
    pub check_solution: bool,
}

impl Default for FrictionConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl FrictionConfig {
    pub const DEFAULT: Self = Self {
        disk_samples: 2,
        tol: 1.0e-9,
        max_iters: 10_000,
        check_solution: cfg!(debug_assertions),
    };
}

/// Controls the staggered impact/friction iteration and impulse caching.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MapConfig {
    pub abs_tol: f64,
    pub max_iters: usize,
    pub impulses_to_cache: ImpulsesToCache,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl MapConfig {
    pub const DEFAULT: Self = Self {
        abs_tol: 1.0e-8,
        max_iters: 50,
        impulses_to_cache: ImpulsesToCache::NormalAndFriction,
    };
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    pub dt: f64,
    /// Coefficient of restitution applied to every contact.
    pub cor: f64,
    /// Coulomb friction coefficient. Zero selects the frictionless map.
    pub mu: f64,
    pub impact_solver: ImpactSolverConfig,
    pub friction: FrictionConfig,
    pub map: MapConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl SimConfig {
    pub const DEFAULT: Self = Self {
        dt: 0.01,
        cor: 1.0,
        mu: 0.0,
        impact_solver: ImpactSolverConfig::DEFAULT,
        friction: FrictionConfig::DEFAULT,
        map: MapConfig::DEFAULT,
    };

    #[must_use]
    pub const fn with_dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    #[must_use]
    pub const fn with_cor(mut self, cor: f64) -> Self {
        self.cor = cor;
        self
    }

    #[must_use]
    pub const fn with_mu(mut self, mu: f64) -> Self {
        self.mu = mu;
        self
    }

    #[must_use]
    pub const fn uses_friction(&self) -> bool {
        self.mu > 0.0
    }
}
