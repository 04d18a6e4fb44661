use glam::DVec2;

use crate::error::SceneError;

/// Half-plane boundary through `x` with unit normal `n` pointing into the free side.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StaticPlane {
    x: DVec2,
    n: DVec2,
}

impl StaticPlane {
    pub fn new(x: DVec2, n: DVec2) -> Result<Self, SceneError> {
        let n = n.try_normalize().ok_or(SceneError::ZeroLengthNormal {
            context: "static plane",
        })?;

        Ok(Self { x, n })
    }

    #[inline]
    #[must_use]
    pub const fn x(&self) -> DVec2 {
        self.x
    }

    #[inline]
    #[must_use]
    pub const fn n(&self) -> DVec2 {
        self.n
    }

    /// Signed distance of `point` to the plane, positive on the free side.
    #[inline]
    #[must_use]
    pub fn distance(&self, point: DVec2) -> f64 {
        self.n.dot(point - self.x)
    }

    /// True if the point lies strictly behind the plane.
    #[inline]
    #[must_use]
    pub fn point_behind(&self, point: DVec2) -> bool {
        self.distance(point) < 0.0
    }

    /// True if a disk of radius `r` at `center` reaches the plane.
    #[inline]
    #[must_use]
    pub fn disk_touches(&self, center: DVec2, r: f64) -> bool {
        self.distance(center) < r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_is_normalized() {
        let plane = StaticPlane::new(DVec2::ZERO, DVec2::new(0.0, 2.0)).unwrap();
        assert_eq!(plane.n(), DVec2::Y);
        assert_eq!(plane.distance(DVec2::new(5.0, -1.5)), -1.5);
        assert!(plane.point_behind(DVec2::new(0.0, -0.1)));
    }

    #[test]
    fn zero_normal_is_rejected() {
        assert!(StaticPlane::new(DVec2::ZERO, DVec2::ZERO).is_err());
    }
}
