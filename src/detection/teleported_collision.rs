use glam::DVec2;

use crate::{
    constraint::{BallBallConstraint, Constraint, KinematicKickBallBallConstraint},
    scene::{BallState, PortalSide},
};

/// Portal and plane a body image was teleported through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortalCrossing {
    pub portal: usize,
    pub side: PortalSide,
}

/// Overlap between two bodies where at least one is seen through a portal.
///
/// `body0 < body1` always holds. The derived order makes collections of
/// these deterministic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TeleportedCollision {
    pub body0: usize,
    pub body1: usize,
    pub crossing0: Option<PortalCrossing>,
    pub crossing1: Option<PortalCrossing>,
}

impl TeleportedCollision {
    /// Orders the two endpoints canonically.
    #[must_use]
    pub fn new(
        body_a: usize,
        crossing_a: Option<PortalCrossing>,
        body_b: usize,
        crossing_b: Option<PortalCrossing>,
    ) -> Self {
        debug_assert_ne!(body_a, body_b);
        debug_assert!(crossing_a.is_some() || crossing_b.is_some());

        if body_a < body_b {
            Self {
                body0: body_a,
                body1: body_b,
                crossing0: crossing_a,
                crossing1: crossing_b,
            }
        } else {
            Self {
                body0: body_b,
                body1: body_a,
                crossing0: crossing_b,
                crossing1: crossing_a,
            }
        }
    }

    #[inline]
    #[must_use]
    pub const fn body_pair(&self) -> (usize, usize) {
        (self.body0, self.body1)
    }

    /// Builds the contact, with a kinematic kick if one of the crossed portals is sheared.
    ///
    /// # Panics
    ///
    /// If both crossed portals are sheared.
    #[must_use]
    pub fn to_constraint(&self, state: &BallState) -> Constraint {
        let portals = state.portals();
        let shift_of = |crossing: Option<PortalCrossing>| {
            crossing.map_or(DVec2::ZERO, |c| portals[c.portal].shift(c.side))
        };
        let sheared = |crossing: Option<PortalCrossing>| {
            crossing.filter(|c| portals[c.portal].is_sheared())
        };

        let r = state.r();
        let contact = BallBallConstraint::with_shift(
            self.body0,
            self.body1,
            r[self.body0],
            r[self.body1],
            shift_of(self.crossing0) - shift_of(self.crossing1),
        );

        let sheared0 = sheared(self.crossing0);
        let sheared1 = sheared(self.crossing1);
        assert!(
            sheared0.is_none() || sheared1.is_none(),
            "bodies {} and {} collide through two sheared portals",
            self.body0,
            self.body1
        );

        let kick = match (sheared0, sheared1) {
            (Some(c0), _) => Some(portals[c0.portal].side_velocity(c0.side)),
            (_, Some(c1)) => Some(-portals[c1.portal].side_velocity(c1.side)),
            (None, None) => None,
        };

        match kick {
            Some(kick) => KinematicKickBallBallConstraint::new(contact, kick).into(),
            None => contact.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{LeesEdwards, PlanarPortal, StaticPlane};

    #[test]
    fn endpoints_are_canonical() {
        let crossing = PortalCrossing {
            portal: 0,
            side: PortalSide::B,
        };
        let collision = TeleportedCollision::new(4, Some(crossing), 1, None);
        assert_eq!(collision.body_pair(), (1, 4));
        assert_eq!(collision.crossing0, None);
        assert_eq!(collision.crossing1, Some(crossing));
    }

    fn sheared_portal(axis: DVec2) -> PlanarPortal {
        PlanarPortal::new_lees_edwards(
            StaticPlane::new(-5.0 * axis, axis).unwrap(),
            StaticPlane::new(5.0 * axis, -axis).unwrap(),
            LeesEdwards {
                speed: 1.0,
                bounds: 0.0,
            },
        )
        .unwrap()
    }

    #[test]
    #[should_panic(expected = "two sheared portals")]
    fn two_sheared_crossings_are_rejected() {
        let mut state = BallState::new(
            vec![DVec2::new(4.5, 4.5), DVec2::new(-4.5, -4.5)],
            vec![DVec2::ZERO; 2],
            vec![1.0; 2],
            vec![1.0; 2],
        )
        .unwrap();
        state.add_portal(sheared_portal(DVec2::Y)).unwrap();
        state.add_portal(sheared_portal(DVec2::X)).unwrap();

        let collision = TeleportedCollision::new(
            0,
            Some(PortalCrossing {
                portal: 0,
                side: PortalSide::A,
            }),
            1,
            Some(PortalCrossing {
                portal: 1,
                side: PortalSide::B,
            }),
        );
        let _ = collision.to_constraint(&state);
    }
}
