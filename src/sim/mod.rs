//! Fixed-step driver: unconstrained flow, contact map, periodic wrap.

mod callbacks;
mod simulation;
mod snapshot;
mod unconstrained;

pub use callbacks::*;
pub use simulation::*;
pub use snapshot::*;
pub use unconstrained::*;
