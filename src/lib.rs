//! Viscous Solver - massless viscosity solves for tetrahedral FEM
//!
//! In the overdamped regime the nodal velocities `x` of an elastic body
//! follow from the nodal forces `f` through a sparse viscosity matrix,
//! `V x = f`. This library provides:
//! - A sparsity pattern discovered once from mesh topology, whose entries
//!   reference element-local viscosity matrices instead of copying them
//! - Pinned nodes (isolated identity rows) and optional per-node Stokes drag
//! - A Jacobi-preconditioned conjugate gradient solve, re-assembling the
//!   matrix values every timestep without rebuilding its structure
//!
//! ## Example
//! ```rust
//! use viscous_solver::prelude::*;
//!
//! // Two unit cubes of 10-node tetrahedra
//! let mut mesh = TetMesh::block(2, 1, 1, 1.0, ViscousMaterial::new(1.0, 1.0)).unwrap();
//! mesh.set_stokes_drag(0.1, 1.0);
//!
//! let pinned = PinnedNodes::none(mesh.num_nodes());
//! let options = SolverOptions::default().with_stokes_drag(true);
//! let mut solver = ViscositySolver::new(&mesh.nodes, &mesh.elements, &pinned, options).unwrap();
//!
//! // Each timestep: update element matrices, then solve in place
//! mesh.update_viscosity_matrices().unwrap();
//! let mut velocity = vec![Vec3::new(0.0, 0.0, -1.0); mesh.num_nodes()];
//! let report = solver.solve(&mesh.nodes, &mesh.elements, &mut velocity).unwrap();
//! assert!(report.relative_residual < 1e-12);
//! ```

pub mod analysis;
pub mod elements;
pub mod error;
pub mod math;
pub mod model;
pub mod results;

// Re-export common types
pub mod prelude {
    pub use crate::analysis::{SolverOptions, ViscositySolver};
    pub use crate::elements::{
        update_viscosity_matrices, MeshNode, PinnedNodes, TetraElement, ViscousElement,
        ViscousMaterial,
    };
    pub use crate::error::{SolverError, SolverResult};
    pub use crate::math::{Contribution, Scalar, SparsityPatternBuilder, Vec3, ViscosityMatrix};
    pub use crate::model::TetMesh;
    pub use crate::results::{EnergyBalance, SolveReport};
}
