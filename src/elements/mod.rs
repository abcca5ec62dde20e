//! Mesh-side types consumed by the viscosity assembly

mod material;
mod node;
mod pinned;
mod tetra;

pub use material::ViscousMaterial;
pub use node::MeshNode;
pub use pinned::PinnedNodes;
pub use tetra::{TetraElement, EDGE_CORNERS};

use rayon::prelude::*;

use crate::error::{SolverError, SolverResult};
use crate::math::Scalar;

/// Nodes per element (4 corners + 6 edge mid-nodes)
pub const NUM_ELEMENT_NODES: usize = 10;
/// Corner nodes per element; only these carry viscous coupling
pub const NUM_CORNER_NODES: usize = 4;

/// An element that owns a local 12x12 viscosity matrix over its corner nodes
///
/// The assembled matrix holds references into this matrix by
/// `(element, row, col)` and re-reads them on every refresh, so
/// implementations must keep `viscosity_entry` cheap.
pub trait ViscousElement: Sync {
    /// Global node indices, corners first
    fn nodes(&self) -> &[usize; NUM_ELEMENT_NODES];

    /// Entry of the local viscosity matrix, indexed `[node + 4 * component]`
    fn viscosity_entry(&self, row: usize, col: usize) -> Scalar;

    /// Recompute Jacobian, shape-function derivatives, volume and the local
    /// viscosity matrix from current node positions
    fn update_viscosity_matrix(&mut self, nodes: &[MeshNode]) -> SolverResult<()>;
}

/// Recompute every element's local viscosity matrix in parallel
pub fn update_viscosity_matrices<E>(elements: &mut [E], nodes: &[MeshNode]) -> SolverResult<()>
where
    E: ViscousElement + Send,
{
    elements
        .par_iter_mut()
        .enumerate()
        .try_for_each(|(element, e)| {
            e.update_viscosity_matrix(nodes).map_err(|err| match err {
                SolverError::InvalidGeometry(reason) => {
                    SolverError::InvalidElement { element, reason }
                }
                other => other,
            })
        })
}
