use glam::DVec2;

/// Earliest fraction of the step at which two linearly moving disks touch.
///
/// `r_sum` is the sum of the radii. Overlapping disks report `0`. Returns
/// `None` when the disks separate or never reach each other within the step.
#[must_use]
pub fn time_of_impact(q0_i: DVec2, q1_i: DVec2, q0_j: DVec2, q1_j: DVec2, r_sum: f64) -> Option<f64> {
    let dx0 = q0_i - q0_j;
    let c = dx0.length_squared() - r_sum * r_sum;
    if c <= 0.0 {
        return Some(0.0);
    }

    let e = (q1_i - q1_j) - dx0;
    let b = dx0.dot(e);
    if b >= 0.0 {
        return None;
    }

    let a = e.length_squared();
    let disc = b * b - a * c;
    if disc < 0.0 {
        return None;
    }

    // Smaller root of a t^2 + 2 b t + c, written to avoid cancellation.
    let tau = c / (-b + disc.sqrt());
    debug_assert!(tau >= 0.0);

    (tau <= 1.0).then_some(tau)
}

/// Contact between two balls.
///
/// `shift` is added to the relative position `q_i - q_j`. It is zero for
/// pairs in real space and the portal translation for pairs that only
/// touch through a periodic boundary.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BallBallConstraint {
    pub(crate) i: usize,
    pub(crate) j: usize,
    pub(crate) r_i: f64,
    pub(crate) r_j: f64,
    pub(crate) shift: DVec2,
}

impl BallBallConstraint {
    #[must_use]
    pub fn new(i: usize, j: usize, r_i: f64, r_j: f64) -> Self {
        Self::with_shift(i, j, r_i, r_j, DVec2::ZERO)
    }

    #[must_use]
    pub fn with_shift(i: usize, j: usize, r_i: f64, r_j: f64, shift: DVec2) -> Self {
        debug_assert_ne!(i, j);
        debug_assert!(r_i > 0.0 && r_j > 0.0);
        Self {
            i,
            j,
            r_i,
            r_j,
            shift,
        }
    }

    /// Swept activity test between the start and end of a step.
    #[inline]
    #[must_use]
    pub fn is_active(q0_i: DVec2, q1_i: DVec2, q0_j: DVec2, q1_j: DVec2, r_i: f64, r_j: f64) -> bool {
        time_of_impact(q0_i, q1_i, q0_j, q1_j, r_i + r_j).is_some()
    }

    /// Discrete activity test, used for pairs seen through a portal.
    #[inline]
    #[must_use]
    pub fn is_overlapping(x_i: DVec2, x_j: DVec2, r_i: f64, r_j: f64) -> bool {
        let r_sum = r_i + r_j;
        x_i.distance_squared(x_j) <= r_sum * r_sum
    }

    #[inline]
    #[must_use]
    pub const fn bodies(&self) -> (usize, usize) {
        (self.i, self.j)
    }

    #[inline]
    #[must_use]
    pub const fn shift(&self) -> DVec2 {
        self.shift
    }

    #[inline]
    fn separation(&self, q: &[DVec2]) -> DVec2 {
        q[self.i] - q[self.j] + self.shift
    }

    #[must_use]
    pub fn penetration_depth(&self, q: &[DVec2]) -> f64 {
        self.separation(q).length() - self.r_i - self.r_j
    }

    /// Unit normal pointing from ball `j` towards ball `i`.
    #[must_use]
    pub fn world_contact_normal(&self, q: &[DVec2]) -> DVec2 {
        let dx = self.separation(q);
        debug_assert!(dx.length_squared() > 0.0, "coincident ball centers");
        dx.normalize_or(DVec2::X)
    }
}

/// Ball-ball contact across a sheared portal.
///
/// `kick` is added to the relative velocity `v_i - v_j` seen by the solver.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KinematicKickBallBallConstraint {
    pub(crate) contact: BallBallConstraint,
    pub(crate) kick: DVec2,
}

impl KinematicKickBallBallConstraint {
    #[must_use]
    pub const fn new(contact: BallBallConstraint, kick: DVec2) -> Self {
        Self { contact, kick }
    }

    #[inline]
    #[must_use]
    pub const fn contact(&self) -> &BallBallConstraint {
        &self.contact
    }

    #[inline]
    #[must_use]
    pub const fn kick(&self) -> DVec2 {
        self.kick
    }
}
