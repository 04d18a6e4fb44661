use glam::DVec2;
use std::ops::Add;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aabb {
    pub min: DVec2,
    pub max: DVec2,
}

impl Aabb {
    #[inline]
    pub const fn new(min: DVec2, max: DVec2) -> Self {
        Self { min, max }
    }

    /// Box around a disk.
    #[inline]
    pub fn from_circle(center: DVec2, radius: f64) -> Self {
        debug_assert!(radius >= 0.0);
        let extent = DVec2::splat(radius);
        Self {
            min: center - extent,
            max: center + extent,
        }
    }

    /// Box around a disk swept linearly from `start` to `end`.
    #[inline]
    pub fn from_swept_circle(start: DVec2, end: DVec2, radius: f64) -> Self {
        Self::from_circle(start, radius) + Self::from_circle(end, radius)
    }

    #[inline]
    pub fn extents(&self) -> DVec2 {
        self.max - self.min
    }

    #[inline]
    pub fn intersects(&self, rhs: &Self) -> bool {
        self.min.cmple(rhs.max).all() && self.max.cmpge(rhs.min).all()
    }
}

/// Union of two boxes.
impl Add for Aabb {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            min: self.min.min(rhs.min),
            max: self.max.max(rhs.max),
        }
    }
}
