mod ball_state;
mod planar_portal;
mod static_drum;
mod static_plane;

pub use ball_state::*;
pub use planar_portal::*;
pub use static_drum::*;
pub use static_plane::*;
