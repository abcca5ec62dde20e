//! Mathematical utilities for viscosity assembly and solves

pub mod block;
pub mod pattern;
pub mod sparse;

use nalgebra::{DMatrix, Matrix3, SMatrix, Vector3};

pub use pattern::{Contribution, SparsityPatternBuilder};
pub use sparse::ViscosityMatrix;

/// Accumulation precision used for every value and reduction in the solver
pub type Scalar = f64;

pub type Mat = DMatrix<Scalar>;
pub type Mat3 = Matrix3<Scalar>;
pub type Vec3 = Vector3<Scalar>;

/// 12x12 local viscosity matrix of a tetrahedron's corner nodes,
/// indexed `[node + 4 * component]`
pub type Mat12 = SMatrix<Scalar, 12, 12>;

/// Number of spatial components per node
pub const DIM: usize = 3;

/// Global DOF index of a node component
#[inline]
pub fn dof(node: usize, component: usize) -> usize {
    DIM * node + component
}

/// Index into a local viscosity matrix for a corner node component
#[inline]
pub fn local_index(corner: usize, component: usize) -> usize {
    corner + 4 * component
}
