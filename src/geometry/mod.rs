mod aabb;
mod grid_broadphase;
mod pair_cache;

pub use aabb::*;
pub use grid_broadphase::*;
pub use pair_cache::*;
