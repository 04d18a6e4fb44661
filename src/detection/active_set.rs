use std::collections::{btree_map::Entry, BTreeMap, BTreeSet};

use glam::DVec2;

use super::{PortalCrossing, TeleportedCollision};
use crate::{
    constraint::{BallBallConstraint, Constraint, StaticDrumConstraint, StaticPlaneConstraint},
    geometry::{Aabb, GridBroadphase},
    scene::BallState,
};

/// Finds every contact that is active over one step.
///
/// Constraints come out grouped as ball-ball, ball-drum, ball-plane. The
/// order fixes the column layout of the assembled matrices.
pub struct ActiveSetBuilder;

impl ActiveSetBuilder {
    /// Active set between the start configuration `q0` and the tentative end configuration `q1`.
    #[must_use]
    pub fn compute_active_set(state: &BallState, q0: &[DVec2], q1: &[DVec2]) -> Vec<Constraint> {
        debug_assert_eq!(q0.len(), state.num_balls());
        debug_assert_eq!(q1.len(), state.num_balls());

        let mut active_set = Vec::new();

        if state.portals().is_empty() {
            Self::compute_ball_ball_active_set(state, q0, q1, &mut active_set);
        } else {
            Self::compute_ball_ball_active_set_portals(state, q0, q1, &mut active_set);
        }
        Self::compute_ball_drum_active_set(state, q1, &mut active_set);
        Self::compute_ball_plane_active_set(state, q1, &mut active_set);

        debug_assert!(
            !has_duplicate_body_pairs(&active_set),
            "active set contains two constraints on the same pair of balls"
        );

        log::debug!("Active set has {} constraints", active_set.len());
        active_set
    }

    fn swept_aabbs(state: &BallState, q0: &[DVec2], q1: &[DVec2]) -> Vec<Aabb> {
        q0.iter()
            .zip(q1)
            .zip(state.r())
            .map(|((&start, &end), &r)| Aabb::from_swept_circle(start, end, r))
            .collect()
    }

    fn compute_ball_ball_active_set(
        state: &BallState,
        q0: &[DVec2],
        q1: &[DVec2],
        active_set: &mut Vec<Constraint>,
    ) {
        let r = state.r();
        let aabbs = Self::swept_aabbs(state, q0, q1);

        active_set.extend(
            GridBroadphase::potential_overlaps(&aabbs)
                .into_iter()
                .filter(|&(i, j)| {
                    BallBallConstraint::is_active(q0[i], q1[i], q0[j], q1[j], r[i], r[j])
                })
                .map(|(i, j)| Constraint::from(BallBallConstraint::new(i, j, r[i], r[j]))),
        );
    }

    fn compute_ball_ball_active_set_portals(
        state: &BallState,
        q0: &[DVec2],
        q1: &[DVec2],
        active_set: &mut Vec<Constraint>,
    ) {
        let r = state.r();
        let num_balls = state.num_balls();

        // Real boxes first, then one image box per ball and portal it touches.
        let mut aabbs = Self::swept_aabbs(state, q0, q1);
        let mut images: Vec<(usize, PortalCrossing, DVec2)> = Vec::new();
        for (ball, (&x, &radius)) in q1.iter().zip(r).enumerate() {
            for (portal_idx, portal) in state.portals().iter().enumerate() {
                if let Some(side) = portal.touches(x, radius) {
                    let image = portal.teleport_through(x, side);
                    aabbs.push(Aabb::from_circle(image, radius));
                    images.push((
                        ball,
                        PortalCrossing {
                            portal: portal_idx,
                            side,
                        },
                        image,
                    ));
                }
            }
        }

        // Resolves a broad phase handle to (ball, crossing, end position).
        let resolve = |handle: usize| -> (usize, Option<PortalCrossing>, DVec2) {
            if handle < num_balls {
                (handle, None, q1[handle])
            } else {
                let (ball, crossing, image) = images[handle - num_balls];
                (ball, Some(crossing), image)
            }
        };

        let mut contacts: BTreeMap<(usize, usize), Constraint> = BTreeMap::new();
        let mut teleported_collisions = BTreeSet::new();

        for (a, b) in GridBroadphase::potential_overlaps(&aabbs) {
            if b < num_balls {
                if BallBallConstraint::is_active(q0[a], q1[a], q0[b], q1[b], r[a], r[b]) {
                    contacts.insert((a, b), BallBallConstraint::new(a, b, r[a], r[b]).into());
                }
                continue;
            }

            let (ball_a, crossing_a, x_a) = resolve(a);
            let (ball_b, crossing_b, x_b) = resolve(b);
            if ball_a == ball_b {
                continue;
            }

            if BallBallConstraint::is_overlapping(x_a, x_b, r[ball_a], r[ball_b]) {
                teleported_collisions.insert(TeleportedCollision::new(
                    ball_a, crossing_a, ball_b, crossing_b,
                ));
            }
        }

        // Pairs already found in real space keep their real-space constraint.
        for collision in &teleported_collisions {
            if let Entry::Vacant(entry) = contacts.entry(collision.body_pair()) {
                entry.insert(collision.to_constraint(state));
            }
        }

        active_set.extend(contacts.into_values());
    }

    fn compute_ball_drum_active_set(
        state: &BallState,
        q1: &[DVec2],
        active_set: &mut Vec<Constraint>,
    ) {
        for (ball, (&x, &r)) in q1.iter().zip(state.r()).enumerate() {
            for (drum_idx, drum) in state.drums().iter().enumerate() {
                if StaticDrumConstraint::is_active(x, r, drum) {
                    active_set.push(StaticDrumConstraint::new(ball, drum_idx, *drum, r).into());
                }
            }
        }
    }

    fn compute_ball_plane_active_set(
        state: &BallState,
        q1: &[DVec2],
        active_set: &mut Vec<Constraint>,
    ) {
        for (ball, (&x, &r)) in q1.iter().zip(state.r()).enumerate() {
            for (plane_idx, plane) in state.planes().iter().enumerate() {
                if StaticPlaneConstraint::is_active(x, r, plane) {
                    active_set.push(StaticPlaneConstraint::new(ball, plane_idx, *plane, r).into());
                }
            }
        }
    }
}

/// All-pairs scan for two ball-ball constraints on the same unordered pair.
///
/// Static contacts share the `-1` endpoint and are not compared.
fn has_duplicate_body_pairs(active_set: &[Constraint]) -> bool {
    let pairs: Vec<(i32, i32)> = active_set
        .iter()
        .map(Constraint::body_indices)
        .filter(|&(b0, b1)| b0 >= 0 && b1 >= 0)
        .map(|(b0, b1)| (b0.min(b1), b0.max(b1)))
        .collect();

    pairs
        .iter()
        .enumerate()
        .any(|(i, pair)| pairs[i + 1..].contains(pair))
}
