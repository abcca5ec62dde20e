//! Block-vector kernels over per-node 3-vectors
//!
//! Every reduction runs as a rayon parallel sum over disjoint node ranges and
//! accumulates in [`Scalar`], so no mixed precision enters the solve.

use rayon::prelude::*;

use super::{Scalar, Vec3};

/// `x += a * y`
pub fn add_scaled(x: &mut [Vec3], y: &[Vec3], a: Scalar) {
    debug_assert_eq!(x.len(), y.len());
    x.par_iter_mut()
        .zip(y.par_iter())
        .for_each(|(xi, yi)| *xi += yi * a);
}

/// `x = y + a * x`
pub fn scale_and_add(x: &mut [Vec3], y: &[Vec3], a: Scalar) {
    debug_assert_eq!(x.len(), y.len());
    x.par_iter_mut()
        .zip(y.par_iter())
        .for_each(|(xi, yi)| *xi = yi + *xi * a);
}

/// Dot product over all DOFs of two block vectors
pub fn dot(a: &[Vec3], b: &[Vec3]) -> Scalar {
    debug_assert_eq!(a.len(), b.len());
    a.par_iter().zip(b.par_iter()).map(|(ai, bi)| ai.dot(bi)).sum()
}

/// Squared Euclidean norm over all DOFs
pub fn norm2(a: &[Vec3]) -> Scalar {
    a.par_iter().map(|ai| ai.norm_squared()).sum()
}

/// Apply a diagonal (Jacobi) preconditioner, `z = diag ⊙ r`, returning `r·z`.
///
/// `diag` is laid out per DOF, i.e. `diag[3 * node + component]`.
pub fn apply_diagonal(z: &mut [Vec3], diag: &[Scalar], r: &[Vec3]) -> Scalar {
    debug_assert_eq!(z.len(), r.len());
    debug_assert_eq!(diag.len(), 3 * r.len());
    z.par_iter_mut()
        .zip(r.par_iter())
        .zip(diag.par_chunks_exact(3))
        .map(|((zi, ri), d)| {
            *zi = Vec3::new(d[0] * ri.x, d[1] * ri.y, d[2] * ri.z);
            ri.dot(zi)
        })
        .sum()
}

/// Set every entry of a block vector to zero
pub fn zero(x: &mut [Vec3]) {
    x.par_iter_mut().for_each(|xi| *xi = Vec3::zeros());
}

/// Flatten a block vector into a DOF-ordered scalar vector
pub fn flatten(x: &[Vec3]) -> Vec<Scalar> {
    x.iter().flat_map(|xi| [xi.x, xi.y, xi.z]).collect()
}
