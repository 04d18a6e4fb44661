mod active_set;
mod teleported_collision;

pub use active_set::*;
pub use teleported_collision::*;
