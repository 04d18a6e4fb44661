use glam::DVec2;

use super::StaticPlane;
use crate::{error::SceneError, math::tangent_of};

/// Tolerance on the parallelism check of the two portal planes.
const PARALLEL_TOLERANCE: f64 = 1.0e-9;

/// Which of the two identified planes of a portal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PortalSide {
    A,
    B,
}

impl PortalSide {
    #[inline]
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

/// Tangential shear of a Lees-Edwards boundary.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LeesEdwards {
    /// Speed at which each plane slides along its tangent.
    pub speed: f64,
    /// The offset wraps into `[-bounds, bounds]`. Zero or infinite disables wrapping.
    pub bounds: f64,
}

/// Pair of parallel half-planes that identify two boundaries of the domain.
///
/// Both plane normals point into the simulated domain. A point behind plane
/// A reappears in front of plane B and vice versa. With a Lees-Edwards
/// shear the two planes slide in opposite tangential directions, so the
/// map picks up a time-dependent tangential offset and crossing bodies
/// pick up a velocity jump.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlanarPortal {
    plane_a: StaticPlane,
    plane_b: StaticPlane,
    lees_edwards: Option<LeesEdwards>,
    offset: f64,
}

impl PlanarPortal {
    pub fn new(plane_a: StaticPlane, plane_b: StaticPlane) -> Result<Self, SceneError> {
        Self::validate(0, &plane_a, &plane_b)?;

        Ok(Self {
            plane_a,
            plane_b,
            lees_edwards: None,
            offset: 0.0,
        })
    }

    pub fn new_lees_edwards(
        plane_a: StaticPlane,
        plane_b: StaticPlane,
        lees_edwards: LeesEdwards,
    ) -> Result<Self, SceneError> {
        if !lees_edwards.speed.is_finite() || lees_edwards.bounds < 0.0 {
            return Err(SceneError::InvalidPortal {
                portal: 0,
                reason: "invalid Lees-Edwards parameters",
            });
        }

        let mut portal = Self::new(plane_a, plane_b)?;
        portal.lees_edwards = Some(lees_edwards);
        Ok(portal)
    }

    pub(crate) fn validate(
        portal: usize,
        plane_a: &StaticPlane,
        plane_b: &StaticPlane,
    ) -> Result<(), SceneError> {
        if (plane_a.n().dot(plane_b.n()) + 1.0).abs() > PARALLEL_TOLERANCE {
            return Err(SceneError::InvalidPortal {
                portal,
                reason: "planes must be parallel with opposite normals",
            });
        }

        if plane_a.distance(plane_b.x()) <= 0.0 {
            return Err(SceneError::InvalidPortal {
                portal,
                reason: "planes must face each other",
            });
        }

        Ok(())
    }

    #[inline]
    #[must_use]
    pub const fn plane_a(&self) -> &StaticPlane {
        &self.plane_a
    }

    #[inline]
    #[must_use]
    pub const fn plane_b(&self) -> &StaticPlane {
        &self.plane_b
    }

    #[inline]
    #[must_use]
    pub const fn plane(&self, side: PortalSide) -> &StaticPlane {
        match side {
            PortalSide::A => &self.plane_a,
            PortalSide::B => &self.plane_b,
        }
    }

    #[inline]
    #[must_use]
    pub const fn lees_edwards(&self) -> Option<LeesEdwards> {
        self.lees_edwards
    }

    #[inline]
    #[must_use]
    pub fn is_sheared(&self) -> bool {
        self.lees_edwards.is_some_and(|le| le.speed != 0.0)
    }

    /// Current tangential offset of the planes.
    #[inline]
    #[must_use]
    pub const fn offset(&self) -> f64 {
        self.offset
    }

    /// Updates the Lees-Edwards offset for absolute time `time`.
    pub fn advance(&mut self, time: f64) {
        if let Some(le) = self.lees_edwards {
            self.offset = wrap_offset(le.speed * time, le.bounds);
        }
    }

    /// Side whose plane the point lies behind, if any.
    #[must_use]
    pub fn point_inside(&self, point: DVec2) -> Option<PortalSide> {
        if self.plane_a.point_behind(point) {
            Some(PortalSide::A)
        } else if self.plane_b.point_behind(point) {
            Some(PortalSide::B)
        } else {
            None
        }
    }

    /// Nearest side if a disk of radius `radius` reaches either plane.
    #[must_use]
    pub fn touches(&self, point: DVec2, radius: f64) -> Option<PortalSide> {
        let dist_a = self.plane_a.distance(point);
        let dist_b = self.plane_b.distance(point);

        match (dist_a < radius, dist_b < radius) {
            (false, false) => None,
            (true, false) => Some(PortalSide::A),
            (false, true) => Some(PortalSide::B),
            (true, true) if dist_a <= dist_b => Some(PortalSide::A),
            (true, true) => Some(PortalSide::B),
        }
    }

    /// Translation applied to a point crossing plane `side`.
    #[must_use]
    pub fn shift(&self, side: PortalSide) -> DVec2 {
        let shear = 2.0 * self.offset * tangent_of(self.plane_a.n());
        match side {
            PortalSide::A => (self.plane_b.x() - self.plane_a.x()) - shear,
            PortalSide::B => (self.plane_a.x() - self.plane_b.x()) + shear,
        }
    }

    #[inline]
    #[must_use]
    pub fn teleport_through(&self, point: DVec2, side: PortalSide) -> DVec2 {
        point + self.shift(side)
    }

    /// Maps the point through the plane it is nearest to.
    #[must_use]
    pub fn teleport(&self, point: DVec2) -> DVec2 {
        self.teleport_through(point, self.nearest_side(point))
    }

    /// Velocity jump picked up when crossing plane `side`.
    #[must_use]
    pub fn side_velocity(&self, side: PortalSide) -> DVec2 {
        let Some(le) = self.lees_edwards else {
            return DVec2::ZERO;
        };

        let jump = 2.0 * le.speed * tangent_of(self.plane_a.n());
        match side {
            PortalSide::A => -jump,
            PortalSide::B => jump,
        }
    }

    /// Velocity jump for a point crossing its nearest plane.
    #[must_use]
    pub fn kinematic_velocity(&self, point: DVec2) -> DVec2 {
        self.side_velocity(self.nearest_side(point))
    }

    fn nearest_side(&self, point: DVec2) -> PortalSide {
        if self.plane_a.distance(point) <= self.plane_b.distance(point) {
            PortalSide::A
        } else {
            PortalSide::B
        }
    }
}

fn wrap_offset(offset: f64, bounds: f64) -> f64 {
    if bounds == 0.0 || !bounds.is_finite() {
        return offset;
    }

    (offset + bounds).rem_euclid(2.0 * bounds) - bounds
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box_portal() -> PlanarPortal {
        PlanarPortal::new(
            StaticPlane::new(DVec2::new(0.0, -5.0), DVec2::Y).unwrap(),
            StaticPlane::new(DVec2::new(0.0, 5.0), DVec2::NEG_Y).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn round_trip_returns_original_point() {
        let mut portal = PlanarPortal::new_lees_edwards(
            *unit_box_portal().plane_a(),
            *unit_box_portal().plane_b(),
            LeesEdwards {
                speed: 0.7,
                bounds: 3.0,
            },
        )
        .unwrap();
        portal.advance(2.5);

        let point = DVec2::new(1.25, -5.5);
        let there = portal.teleport_through(point, PortalSide::A);
        let back = portal.teleport_through(there, PortalSide::B);
        assert!((back - point).length() < 1.0e-12);
    }

    #[test]
    fn periodic_teleport_is_a_translation() {
        let portal = unit_box_portal();
        assert_eq!(portal.point_inside(DVec2::new(0.3, -5.2)), Some(PortalSide::A));
        assert_eq!(portal.teleport(DVec2::new(0.3, -5.2)), DVec2::new(0.3, 4.8));
        assert_eq!(portal.kinematic_velocity(DVec2::new(0.3, -5.2)), DVec2::ZERO);
        assert!(!portal.is_sheared());
    }

    #[test]
    fn touches_reports_nearest_side() {
        let portal = unit_box_portal();
        assert_eq!(portal.touches(DVec2::new(0.0, 4.5), 1.0), Some(PortalSide::B));
        assert_eq!(portal.touches(DVec2::new(0.0, -4.5), 1.0), Some(PortalSide::A));
        assert_eq!(portal.touches(DVec2::ZERO, 1.0), None);
    }

    #[test]
    fn offset_wraps_into_bounds() {
        assert!((wrap_offset(3.5, 2.0) + 0.5).abs() < 1.0e-12);
        assert!((wrap_offset(-2.5, 2.0) - 1.5).abs() < 1.0e-12);
        assert_eq!(wrap_offset(7.0, 0.0), 7.0);
        assert_eq!(wrap_offset(7.0, f64::INFINITY), 7.0);
    }

    #[test]
    fn misaligned_planes_are_rejected() {
        let err = PlanarPortal::new(
            StaticPlane::new(DVec2::ZERO, DVec2::Y).unwrap(),
            StaticPlane::new(DVec2::new(0.0, 5.0), DVec2::X).unwrap(),
        );
        assert!(err.is_err());

        let err = PlanarPortal::new(
            StaticPlane::new(DVec2::ZERO, DVec2::NEG_Y).unwrap(),
            StaticPlane::new(DVec2::new(0.0, 5.0), DVec2::Y).unwrap(),
        );
        assert!(err.is_err());
    }
}
