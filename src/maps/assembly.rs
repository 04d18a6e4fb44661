use glam::{DMat2, DVec2};
use nalgebra::{DMatrix, DVector};

use crate::constraint::{Constraint, GeneralizedColumn};

/// Per-step contact data: bases, generalized directions and kinematic terms.
///
/// Columns follow the active set order. Friction columns are stored contact
/// by contact, `disk_samples` each.
#[derive(Clone, Debug)]
pub struct ContactAssembly {
    pub bases: Vec<DMat2>,
    pub normals: Vec<GeneralizedColumn>,
    pub friction: Vec<GeneralizedColumn>,
    /// Normal relative velocity injected by sheared portals.
    pub nrel: DVector<f64>,
    /// Same for every friction direction.
    pub drel: DVector<f64>,
}

impl ContactAssembly {
    /// `friction_coefficients` scales the contact tangent into each sampled
    /// friction direction. `None` skips the friction columns.
    #[must_use]
    pub fn new(
        active_set: &[Constraint],
        q: &[DVec2],
        v: &[DVec2],
        friction_coefficients: Option<&[f64]>,
    ) -> Self {
        let num_samples = friction_coefficients.map_or(0, <[f64]>::len);

        let mut assembly = Self {
            bases: Vec::with_capacity(active_set.len()),
            normals: Vec::with_capacity(active_set.len()),
            friction: Vec::with_capacity(active_set.len() * num_samples),
            nrel: DVector::zeros(active_set.len()),
            drel: DVector::zeros(active_set.len() * num_samples),
        };

        for (i, constraint) in active_set.iter().enumerate() {
            let basis = constraint.compute_basis(q, v);
            let kick = constraint.kinematic_relative_velocity();

            assembly.normals.push(constraint.generalized_column(basis.x_axis));
            assembly.nrel[i] = basis.x_axis.dot(kick);

            if let Some(coefficients) = friction_coefficients {
                for (k, &coeff) in coefficients.iter().enumerate() {
                    let direction = coeff * basis.y_axis;
                    assembly.friction.push(constraint.generalized_column(direction));
                    assembly.drel[i * num_samples + k] = direction.dot(kick);
                }
            }

            assembly.bases.push(basis);
        }

        assembly
    }

    #[inline]
    #[must_use]
    pub fn num_contacts(&self) -> usize {
        self.normals.len()
    }
}

/// `RᵗM⁻¹C` for sparse generalized columns `R` and `C`.
///
/// Only column pairs that share a body contribute, so the cost is linear in
/// the number of nonzeros of the result.
#[must_use]
pub fn coupling_matrix(
    rows: &[GeneralizedColumn],
    cols: &[GeneralizedColumn],
    inv_m: &[f64],
) -> DMatrix<f64> {
    let mut by_body: Vec<Vec<(usize, DVec2)>> = vec![Vec::new(); inv_m.len()];
    for (c, column) in cols.iter().enumerate() {
        for &(body, dir) in column {
            by_body[body].push((c, dir));
        }
    }

    let mut coupling = DMatrix::zeros(rows.len(), cols.len());
    for (r, row) in rows.iter().enumerate() {
        for &(body, a) in row {
            for &(c, d) in &by_body[body] {
                coupling[(r, c)] += a.dot(d) * inv_m[body];
            }
        }
    }
    coupling
}

/// `Cᵗv` for generalized columns `C`.
#[must_use]
pub fn transpose_mul(cols: &[GeneralizedColumn], v: &[DVec2]) -> DVector<f64> {
    DVector::from_iterator(
        cols.len(),
        cols.iter()
            .map(|column| column.iter().map(|&(body, dir)| dir.dot(v[body])).sum::<f64>()),
    )
}

/// `v += M⁻¹C λ`.
pub fn apply_impulses(
    cols: &[GeneralizedColumn],
    impulses: &DVector<f64>,
    inv_m: &[f64],
    v: &mut [DVec2],
) {
    debug_assert_eq!(cols.len(), impulses.len());

    for (column, &impulse) in cols.iter().zip(impulses.iter()) {
        for &(body, dir) in column {
            v[body] += inv_m[body] * impulse * dir;
        }
    }
}
