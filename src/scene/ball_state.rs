use glam::DVec2;

use super::{PlanarPortal, StaticDrum, StaticPlane};
use crate::{error::SceneError, math::cross};

/// Configuration and velocity of every ball plus the static scene around them.
///
/// Balls are point masses with a collision radius. Radii and masses are
/// validated on insertion and never change afterwards.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BallState {
    pub q: Vec<DVec2>,
    pub v: Vec<DVec2>,
    r: Vec<f64>,
    m: Vec<f64>,
    inv_m: Vec<f64>,
    planes: Vec<StaticPlane>,
    drums: Vec<StaticDrum>,
    portals: Vec<PlanarPortal>,
}

impl BallState {
    pub fn new(
        q: Vec<DVec2>,
        v: Vec<DVec2>,
        r: Vec<f64>,
        m: Vec<f64>,
    ) -> Result<Self, SceneError> {
        let n = q.len();
        for (len, field) in [(v.len(), "v"), (r.len(), "r"), (m.len(), "m")] {
            if len != n {
                return Err(SceneError::LengthMismatch {
                    expected: n,
                    found: len,
                    field,
                });
            }
        }

        for (ball, (&radius, &mass)) in r.iter().zip(&m).enumerate() {
            validate_ball(ball, radius, mass)?;
        }

        let inv_m = m.iter().map(|mass| mass.recip()).collect();
        Ok(Self {
            q,
            v,
            r,
            m,
            inv_m,
            ..Self::default()
        })
    }

    /// Appends a ball and returns its index.
    pub fn push_ball(&mut self, q: DVec2, v: DVec2, r: f64, m: f64) -> Result<usize, SceneError> {
        let ball = self.num_balls();
        validate_ball(ball, r, m)?;

        self.q.push(q);
        self.v.push(v);
        self.r.push(r);
        self.m.push(m);
        self.inv_m.push(m.recip());
        Ok(ball)
    }

    /// Replaces every ball while keeping the static scene.
    pub fn replace_balls(
        &mut self,
        q: Vec<DVec2>,
        v: Vec<DVec2>,
        r: Vec<f64>,
        m: Vec<f64>,
    ) -> Result<(), SceneError> {
        let balls = Self::new(q, v, r, m)?;
        self.q = balls.q;
        self.v = balls.v;
        self.r = balls.r;
        self.m = balls.m;
        self.inv_m = balls.inv_m;
        Ok(())
    }

    pub fn add_static_plane(&mut self, plane: StaticPlane) -> usize {
        self.planes.push(plane);
        self.planes.len() - 1
    }

    pub fn add_static_drum(&mut self, drum: StaticDrum) -> Result<usize, SceneError> {
        let idx = self.drums.len();
        if !(drum.r() > 0.0 && drum.r().is_finite()) {
            return Err(SceneError::InvalidDrum {
                drum: idx,
                radius: drum.r(),
            });
        }

        self.drums.push(drum);
        Ok(idx)
    }

    pub fn add_portal(&mut self, portal: PlanarPortal) -> Result<usize, SceneError> {
        let idx = self.portals.len();
        PlanarPortal::validate(idx, portal.plane_a(), portal.plane_b())?;

        self.portals.push(portal);
        Ok(idx)
    }

    #[inline]
    #[must_use]
    pub fn num_balls(&self) -> usize {
        self.q.len()
    }

    #[inline]
    #[must_use]
    pub fn r(&self) -> &[f64] {
        &self.r
    }

    #[inline]
    #[must_use]
    pub fn m(&self) -> &[f64] {
        &self.m
    }

    #[inline]
    #[must_use]
    pub fn inv_m(&self) -> &[f64] {
        &self.inv_m
    }

    #[inline]
    #[must_use]
    pub fn planes(&self) -> &[StaticPlane] {
        &self.planes
    }

    #[inline]
    #[must_use]
    pub fn drums(&self) -> &[StaticDrum] {
        &self.drums
    }

    #[inline]
    #[must_use]
    pub fn portals(&self) -> &[PlanarPortal] {
        &self.portals
    }

    /// Moves every portal to absolute time `time`.
    pub fn advance_portals(&mut self, time: f64) {
        for portal in &mut self.portals {
            portal.advance(time);
        }
    }

    /// Teleports balls that left the domain through a portal.
    ///
    /// Each portal moves a ball at most once. Sheared portals also add their
    /// velocity jump.
    pub fn enforce_periodic_boundaries(&mut self) {
        for portal in &self.portals {
            for (q, v) in self.q.iter_mut().zip(&mut self.v) {
                if let Some(side) = portal.point_inside(*q) {
                    *q = portal.teleport_through(*q, side);
                    *v += portal.side_velocity(side);
                }
            }
        }
    }

    #[must_use]
    pub fn momentum(&self) -> DVec2 {
        self.m.iter().zip(&self.v).map(|(&m, &v)| m * v).sum()
    }

    /// Angular momentum about the origin.
    #[must_use]
    pub fn angular_momentum(&self) -> f64 {
        self.m
            .iter()
            .zip(self.q.iter().zip(&self.v))
            .map(|(&m, (&q, &v))| m * cross(q, v))
            .sum()
    }

    #[must_use]
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self
            .m
            .iter()
            .zip(&self.v)
            .map(|(&m, v)| m * v.length_squared())
            .sum::<f64>()
    }
}

fn validate_ball(ball: usize, radius: f64, mass: f64) -> Result<(), SceneError> {
    if !(radius > 0.0 && radius.is_finite()) {
        return Err(SceneError::InvalidRadius { ball, radius });
    }

    if !(mass > 0.0 && mass.is_finite()) {
        return Err(SceneError::InvalidMass { ball, mass });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{LeesEdwards, PlanarPortal};

    #[test]
    fn rejects_bad_balls() {
        let err = BallState::new(vec![DVec2::ZERO], vec![DVec2::ZERO], vec![0.0], vec![1.0]);
        assert_eq!(
            err,
            Err(SceneError::InvalidRadius {
                ball: 0,
                radius: 0.0
            })
        );

        let mut state = BallState::default();
        assert!(state.push_ball(DVec2::ZERO, DVec2::ZERO, 1.0, -2.0).is_err());
        assert_eq!(state.push_ball(DVec2::ZERO, DVec2::ZERO, 1.0, 2.0), Ok(0));
        assert_eq!(state.inv_m(), &[0.5]);
    }

    #[test]
    fn rejects_mismatched_lengths() {
        let err = BallState::new(vec![DVec2::ZERO; 2], vec![DVec2::ZERO], vec![1.0; 2], vec![1.0; 2]);
        assert!(matches!(err, Err(SceneError::LengthMismatch { field: "v", .. })));
    }

    #[test]
    fn enforcement_applies_shear_velocity() {
        let mut state = BallState::new(
            vec![DVec2::new(0.0, -5.1), DVec2::ZERO],
            vec![DVec2::new(0.0, -1.0), DVec2::ZERO],
            vec![0.5; 2],
            vec![1.0; 2],
        )
        .unwrap();

        let portal = PlanarPortal::new_lees_edwards(
            StaticPlane::new(DVec2::new(0.0, -5.0), DVec2::Y).unwrap(),
            StaticPlane::new(DVec2::new(0.0, 5.0), DVec2::NEG_Y).unwrap(),
            LeesEdwards {
                speed: 0.5,
                bounds: 0.0,
            },
        )
        .unwrap();
        state.add_portal(portal).unwrap();

        state.enforce_periodic_boundaries();
        assert!((state.q[0] - DVec2::new(0.0, 4.9)).length() < 1.0e-12);
        // Tangent of +y is -x, crossing A subtracts twice the shear speed along it.
        assert!((state.v[0] - DVec2::new(1.0, -1.0)).length() < 1.0e-12);
        assert_eq!(state.q[1], DVec2::ZERO);
    }

    #[test]
    fn diagnostics() {
        let state = BallState::new(
            vec![DVec2::new(1.0, 0.0), DVec2::new(-1.0, 0.0)],
            vec![DVec2::new(0.0, 1.0), DVec2::new(0.0, -1.0)],
            vec![1.0; 2],
            vec![2.0, 2.0],
        )
        .unwrap();

        assert_eq!(state.momentum(), DVec2::ZERO);
        assert_eq!(state.angular_momentum(), 4.0);
        assert_eq!(state.kinetic_energy(), 2.0);
    }
}
