use glam::DVec2;

use crate::scene::StaticPlane;

/// Contact between a ball and a static half-plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StaticPlaneConstraint {
    pub(crate) ball: usize,
    pub(crate) plane_idx: usize,
    pub(crate) plane: StaticPlane,
    pub(crate) r: f64,
}

impl StaticPlaneConstraint {
    #[must_use]
    pub const fn new(ball: usize, plane_idx: usize, plane: StaticPlane, r: f64) -> Self {
        Self {
            ball,
            plane_idx,
            plane,
            r,
        }
    }

    /// Active when the ball reaches the plane at the end of the step.
    #[inline]
    #[must_use]
    pub fn is_active(q: DVec2, r: f64, plane: &StaticPlane) -> bool {
        plane.distance(q) - r <= 0.0
    }

    #[inline]
    #[must_use]
    pub const fn ball(&self) -> usize {
        self.ball
    }

    #[inline]
    #[must_use]
    pub const fn plane_idx(&self) -> usize {
        self.plane_idx
    }

    #[must_use]
    pub fn penetration_depth(&self, q: &[DVec2]) -> f64 {
        self.plane.distance(q[self.ball]) - self.r
    }

    #[inline]
    #[must_use]
    pub const fn world_contact_normal(&self) -> DVec2 {
        self.plane.n()
    }
}
