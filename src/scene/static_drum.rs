use glam::DVec2;

/// Hollow circular container; balls live inside it.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StaticDrum {
    x: DVec2,
    r: f64,
}

impl StaticDrum {
    #[inline]
    #[must_use]
    pub const fn new(x: DVec2, r: f64) -> Self {
        Self { x, r }
    }

    #[inline]
    #[must_use]
    pub const fn x(&self) -> DVec2 {
        self.x
    }

    #[inline]
    #[must_use]
    pub const fn r(&self) -> f64 {
        self.r
    }
}
