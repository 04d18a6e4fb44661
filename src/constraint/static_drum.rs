use glam::DVec2;

use crate::scene::StaticDrum;

/// Contact between a ball and the inside wall of a drum.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StaticDrumConstraint {
    pub(crate) ball: usize,
    pub(crate) drum_idx: usize,
    pub(crate) drum: StaticDrum,
    pub(crate) r: f64,
}

impl StaticDrumConstraint {
    #[must_use]
    pub const fn new(ball: usize, drum_idx: usize, drum: StaticDrum, r: f64) -> Self {
        Self {
            ball,
            drum_idx,
            drum,
            r,
        }
    }

    /// Active when the ball reaches the wall at the end of the step.
    #[inline]
    #[must_use]
    pub fn is_active(q: DVec2, r: f64, drum: &StaticDrum) -> bool {
        q.distance(drum.x()) + r >= drum.r()
    }

    #[inline]
    #[must_use]
    pub const fn ball(&self) -> usize {
        self.ball
    }

    #[inline]
    #[must_use]
    pub const fn drum_idx(&self) -> usize {
        self.drum_idx
    }

    #[must_use]
    pub fn penetration_depth(&self, q: &[DVec2]) -> f64 {
        self.drum.r() - q[self.ball].distance(self.drum.x()) - self.r
    }

    /// Points from the ball towards the drum center.
    #[must_use]
    pub fn world_contact_normal(&self, q: &[DVec2]) -> DVec2 {
        let dx = self.drum.x() - q[self.ball];
        debug_assert!(dx.length_squared() > 0.0, "ball centered in drum");
        dx.normalize_or(DVec2::X)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wall_contact_from_inside() {
        let drum = StaticDrum::new(DVec2::ZERO, 5.0);
        assert!(!StaticDrumConstraint::is_active(DVec2::new(3.0, 0.0), 1.0, &drum));
        assert!(StaticDrumConstraint::is_active(DVec2::new(4.5, 0.0), 1.0, &drum));

        let contact = StaticDrumConstraint::new(0, 0, drum, 1.0);
        let q = [DVec2::new(4.5, 0.0)];
        assert!((contact.penetration_depth(&q) + 0.5).abs() < 1.0e-12);
        assert_eq!(contact.world_contact_normal(&q), DVec2::NEG_X);
    }
}
