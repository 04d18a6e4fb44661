pub use glam;
pub use nalgebra;

pub mod config;
pub mod constraint;
pub mod detection;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod maps;
pub mod math;
pub mod scene;
pub mod sim;
pub mod solver;

pub use config::{
    FrictionConfig, ImpactSolverConfig, ImpactSolverKind, ImpulsesToCache, MapConfig, SimConfig,
};
pub use constraint::{Constraint, ConstraintCache, ConstraintId, ConstraintKind};
pub use error::SceneError;
pub use scene::{BallState, LeesEdwards, PlanarPortal, PortalSide, StaticDrum, StaticPlane};
pub use sim::{NoCallback, Simulation, StepCallback, SymplecticEuler, UnconstrainedMap};

pub const BALL2D_VERSION: &str = env!("CARGO_PKG_VERSION");
