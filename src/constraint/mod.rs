//! Contact constraints between balls and the static scene.
//!
//! A [`Constraint`] is created for every active contact at the start of a
//! step and dropped once its impulse is applied. Only the impulse survives,
//! stored in the [`ConstraintCache`] under the constraint's [`ConstraintId`].

mod ball_ball;
mod constraint_cache;
mod static_drum;
mod static_plane;

pub use ball_ball::*;
pub use constraint_cache::*;
pub use static_drum::*;
pub use static_plane::*;

use arrayvec::ArrayVec;
use glam::{DMat2, DVec2};

use crate::math::{contact_frame, is_orthonormal_frame, FRAME_TOLERANCE};

/// Sparse generalized direction: per-body entries of one column of N or D.
pub type GeneralizedColumn = ArrayVec<(usize, DVec2), 2>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConstraintKind {
    BallBall,
    KinematicKickBallBall,
    StaticPlane,
    StaticDrum,
}

impl ConstraintKind {
    pub const ALL: [Self; 4] = [
        Self::BallBall,
        Self::KinematicKickBallBall,
        Self::StaticPlane,
        Self::StaticDrum,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::BallBall => "ball_ball",
            Self::KinematicKickBallBall => "kinematic_kick_ball_ball",
            Self::StaticPlane => "static_plane",
            Self::StaticDrum => "static_drum",
        }
    }

    #[must_use]
    pub const fn to_u8(self) -> u8 {
        match self {
            Self::BallBall => 0,
            Self::KinematicKickBallBall => 1,
            Self::StaticPlane => 2,
            Self::StaticDrum => 3,
        }
    }

    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::BallBall),
            1 => Some(Self::KinematicKickBallBall),
            2 => Some(Self::StaticPlane),
            3 => Some(Self::StaticDrum),
            _ => None,
        }
    }
}

/// Identity of a contact across steps.
///
/// `body1` is -1 for static geometry, `geometry` is -1 when no static
/// geometry is involved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConstraintId {
    pub kind: ConstraintKind,
    pub body0: i32,
    pub body1: i32,
    pub geometry: i32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Constraint {
    BallBall(BallBallConstraint),
    KinematicKickBallBall(KinematicKickBallBallConstraint),
    StaticPlane(StaticPlaneConstraint),
    StaticDrum(StaticDrumConstraint),
}

impl Constraint {
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> ConstraintKind {
        match self {
            Self::BallBall(_) => ConstraintKind::BallBall,
            Self::KinematicKickBallBall(_) => ConstraintKind::KinematicKickBallBall,
            Self::StaticPlane(_) => ConstraintKind::StaticPlane,
            Self::StaticDrum(_) => ConstraintKind::StaticDrum,
        }
    }

    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Indices of the two endpoints, -1 for the static side.
    #[must_use]
    pub const fn body_indices(&self) -> (i32, i32) {
        match self {
            Self::BallBall(c) => (c.i as i32, c.j as i32),
            Self::KinematicKickBallBall(c) => (c.contact.i as i32, c.contact.j as i32),
            Self::StaticPlane(c) => (c.ball as i32, -1),
            Self::StaticDrum(c) => (c.ball as i32, -1),
        }
    }

    #[must_use]
    pub const fn id(&self) -> ConstraintId {
        let (body0, body1) = self.body_indices();
        let geometry = match self {
            Self::BallBall(_) | Self::KinematicKickBallBall(_) => -1,
            Self::StaticPlane(c) => c.plane_idx as i32,
            Self::StaticDrum(c) => c.drum_idx as i32,
        };

        ConstraintId {
            kind: self.kind(),
            body0,
            body1,
            geometry,
        }
    }

    /// Signed gap at configuration `q`, negative when penetrating.
    #[must_use]
    pub fn penetration_depth(&self, q: &[DVec2]) -> f64 {
        match self {
            Self::BallBall(c) => c.penetration_depth(q),
            Self::KinematicKickBallBall(c) => c.contact.penetration_depth(q),
            Self::StaticPlane(c) => c.penetration_depth(q),
            Self::StaticDrum(c) => c.penetration_depth(q),
        }
    }

    /// Unit normal along which the first body is pushed.
    #[must_use]
    pub fn world_contact_normal(&self, q: &[DVec2]) -> DVec2 {
        match self {
            Self::BallBall(c) => c.world_contact_normal(q),
            Self::KinematicKickBallBall(c) => c.contact.world_contact_normal(q),
            Self::StaticPlane(c) => c.world_contact_normal(),
            Self::StaticDrum(c) => c.world_contact_normal(q),
        }
    }

    /// Orthonormal right-handed frame with the contact normal as first column.
    ///
    /// Balls carry no spin, so the frame does not depend on `v`.
    #[must_use]
    pub fn compute_basis(&self, q: &[DVec2], _v: &[DVec2]) -> DMat2 {
        let n = self.world_contact_normal(q);
        let basis = contact_frame(n);

        debug_assert!(is_orthonormal_frame(&basis), "contact basis is not orthonormal");
        debug_assert!(
            (basis.x_axis - n).abs().max_element() <= FRAME_TOLERANCE,
            "contact basis disagrees with the contact normal"
        );

        basis
    }

    /// Maps a world-space contact direction onto the bodies of the constraint.
    #[must_use]
    pub fn generalized_column(&self, direction: DVec2) -> GeneralizedColumn {
        let mut column = GeneralizedColumn::new();
        match self {
            Self::BallBall(c)
            | Self::KinematicKickBallBall(KinematicKickBallBallConstraint { contact: c, .. }) => {
                column.push((c.i, direction));
                column.push((c.j, -direction));
            }
            Self::StaticPlane(StaticPlaneConstraint { ball, .. })
            | Self::StaticDrum(StaticDrumConstraint { ball, .. }) => {
                column.push((*ball, direction));
            }
        }
        column
    }

    /// Relative velocity contributed by the boundary rather than the bodies.
    #[inline]
    #[must_use]
    pub const fn kinematic_relative_velocity(&self) -> DVec2 {
        match self {
            Self::KinematicKickBallBall(c) => c.kick,
            _ => DVec2::ZERO,
        }
    }

    /// Normal component of the kinematic relative velocity for the frame `basis`.
    #[inline]
    #[must_use]
    pub fn normal_relative_velocity_offset(&self, basis: &DMat2) -> f64 {
        basis.x_axis.dot(self.kinematic_relative_velocity())
    }

    /// Relative normal velocity at the contact, including any kinematic kick.
    #[must_use]
    pub fn relative_normal_velocity(&self, q: &[DVec2], v: &[DVec2]) -> f64 {
        let n = self.world_contact_normal(q);
        let body_term: f64 = self
            .generalized_column(n)
            .iter()
            .map(|&(body, dir)| dir.dot(v[body]))
            .sum();
        body_term + n.dot(self.kinematic_relative_velocity())
    }
}

impl From<BallBallConstraint> for Constraint {
    fn from(c: BallBallConstraint) -> Self {
        Self::BallBall(c)
    }
}

impl From<KinematicKickBallBallConstraint> for Constraint {
    fn from(c: KinematicKickBallBallConstraint) -> Self {
        Self::KinematicKickBallBall(c)
    }
}

impl From<StaticPlaneConstraint> for Constraint {
    fn from(c: StaticPlaneConstraint) -> Self {
        Self::StaticPlane(c)
    }
}

impl From<StaticDrumConstraint> for Constraint {
    fn from(c: StaticDrumConstraint) -> Self {
        Self::StaticDrum(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::StaticPlane;

    #[test]
    fn ids_and_names() {
        let ball_ball = Constraint::from(BallBallConstraint::new(2, 5, 1.0, 1.0));
        assert_eq!(ball_ball.name(), "ball_ball");
        assert_eq!(
            ball_ball.id(),
            ConstraintId {
                kind: ConstraintKind::BallBall,
                body0: 2,
                body1: 5,
                geometry: -1
            }
        );

        let plane = StaticPlane::new(DVec2::ZERO, DVec2::Y).unwrap();
        let plane = Constraint::from(StaticPlaneConstraint::new(3, 7, plane, 1.0));
        assert_eq!(plane.body_indices(), (3, -1));
        assert_eq!(plane.id().geometry, 7);
        assert_eq!(plane.name(), "static_plane");

        for kind in ConstraintKind::ALL {
            assert_eq!(ConstraintKind::from_u8(kind.to_u8()), Some(kind));
        }
    }

    #[test]
    fn kick_enters_relative_velocity() {
        let q = [DVec2::new(0.0, 1.0), DVec2::new(0.0, -1.0)];
        let v = [DVec2::ZERO, DVec2::ZERO];
        let contact = BallBallConstraint::new(0, 1, 1.0, 1.0);

        let plain = Constraint::from(contact);
        assert_eq!(plain.relative_normal_velocity(&q, &v), 0.0);

        let kicked = Constraint::from(KinematicKickBallBallConstraint::new(
            contact,
            DVec2::new(3.0, -2.0),
        ));
        assert_eq!(kicked.relative_normal_velocity(&q, &v), -2.0);
        assert_eq!(kicked.name(), "kinematic_kick_ball_ball");
    }

    #[test]
    fn basis_is_right_handed() {
        let q = [DVec2::new(1.0, 1.0), DVec2::ZERO];
        let contact = Constraint::from(BallBallConstraint::new(0, 1, 1.0, 1.0));
        let basis = contact.compute_basis(&q, &[DVec2::ZERO; 2]);
        assert!(is_orthonormal_frame(&basis));
        assert!((basis.determinant() - 1.0).abs() < 1.0e-12);

        let column = contact.generalized_column(basis.x_axis);
        assert_eq!(column.len(), 2);
        assert_eq!(column[0].1, -column[1].1);
    }
}
