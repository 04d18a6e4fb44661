use glam::DVec2;

/// Produces the tentative end-of-step state before contacts are resolved.
pub trait UnconstrainedMap {
    /// Writes the tentative `(q1, v1)` reached from `(q0, v0)` after `dt`.
    fn flow(
        &self,
        q0: &[DVec2],
        v0: &[DVec2],
        inv_m: &[f64],
        dt: f64,
        q1: &mut [DVec2],
        v1: &mut [DVec2],
    );
}

/// Semi-implicit Euler under a uniform acceleration.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SymplecticEuler {
    pub gravity: DVec2,
}

impl SymplecticEuler {
    pub const BALLISTIC: Self = Self {
        gravity: DVec2::ZERO,
    };

    #[inline]
    #[must_use]
    pub const fn new(gravity: DVec2) -> Self {
        Self { gravity }
    }
}

impl UnconstrainedMap for SymplecticEuler {
    fn flow(
        &self,
        q0: &[DVec2],
        v0: &[DVec2],
        inv_m: &[f64],
        dt: f64,
        q1: &mut [DVec2],
        v1: &mut [DVec2],
    ) {
        debug_assert_eq!(q0.len(), inv_m.len());
        debug_assert_eq!(q0.len(), q1.len());
        debug_assert_eq!(v0.len(), v1.len());

        for ((v1, q1), (&q0, &v0)) in v1.iter_mut().zip(q1.iter_mut()).zip(q0.iter().zip(v0)) {
            *v1 = v0 + dt * self.gravity;
            *q1 = q0 + dt * *v1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_under_gravity() {
        let integrator = SymplecticEuler::new(DVec2::new(0.0, -10.0));
        let mut q1 = [DVec2::ZERO];
        let mut v1 = [DVec2::ZERO];

        integrator.flow(&[DVec2::new(0.0, 5.0)], &[DVec2::new(1.0, 0.0)], &[1.0], 0.1, &mut q1, &mut v1);
        assert!((v1[0] - DVec2::new(1.0, -1.0)).length() < 1.0e-12);
        assert!((q1[0] - DVec2::new(0.1, 4.9)).length() < 1.0e-12);
    }
}
