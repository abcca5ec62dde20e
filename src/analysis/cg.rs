//! Jacobi-preconditioned conjugate gradient solve of `V x = f`
//!
//! The solver is built once per mesh. Every timestep, [`ViscositySolver::solve`]
//! re-sums the viscosity matrix from the current element matrices, rebuilds
//! the preconditioner and runs CG from a zero initial guess. The force vector
//! passed in is overwritten with the velocity.

use std::io::Write;

use log::{debug, error, info, trace};

use super::SolverOptions;
use crate::elements::{MeshNode, PinnedNodes, ViscousElement};
use crate::error::{SolverError, SolverResult};
use crate::math::{block, Scalar, SparsityPatternBuilder, Vec3, ViscosityMatrix, DIM};
use crate::results::{EnergyBalance, SolveReport};

/// Allocate a zero-filled buffer, reporting allocation failure as an error
fn work_vector<T: Clone>(what: &'static str, len: usize, fill: T) -> SolverResult<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| SolverError::AllocationFailed { what, len })?;
    v.resize(len, fill);
    Ok(v)
}

/// Massless viscosity solver for one mesh
#[derive(Debug, Clone)]
pub struct ViscositySolver {
    num_nodes: usize,
    num_elements: usize,
    options: SolverOptions,
    matrix: ViscosityMatrix,
    /// Reciprocal diagonal, one entry per DOF
    preconditioner: Vec<Scalar>,

    // CG work vectors, reused across iterations and timesteps
    r: Vec<Vec3>,
    p: Vec<Vec3>,
    z: Vec<Vec3>,
    q: Vec<Vec3>,
    f: Vec<Vec3>,

    residuals: Vec<Scalar>,
}

impl ViscositySolver {
    /// Discover the sparsity pattern of the viscosity matrix and allocate the
    /// solver state. The mesh topology must not change afterwards.
    pub fn new<E: ViscousElement>(
        nodes: &[MeshNode],
        elements: &[E],
        pinned: &PinnedNodes,
        options: SolverOptions,
    ) -> SolverResult<Self> {
        options.validate()?;
        let num_nodes = nodes.len();
        let num_rows = DIM * num_nodes;

        let matrix =
            SparsityPatternBuilder::from_mesh(num_nodes, elements, pinned, options.calc_stokes)?
                .finalize()?;

        info!(
            "Viscosity matrix: {} rows, {} nonzeros, {} contributions, {} pinned nodes",
            num_rows,
            matrix.nnz(),
            matrix.contribution_count(),
            pinned.count()
        );

        Ok(Self {
            num_nodes,
            num_elements: elements.len(),
            preconditioner: work_vector("preconditioner", num_rows, 0.0)?,
            r: work_vector("residual vector", num_nodes, Vec3::zeros())?,
            p: work_vector("search direction vector", num_nodes, Vec3::zeros())?,
            z: work_vector("preconditioned residual vector", num_nodes, Vec3::zeros())?,
            q: work_vector("matrix-vector product vector", num_nodes, Vec3::zeros())?,
            f: work_vector("force snapshot vector", num_nodes, Vec3::zeros())?,
            residuals: Vec::new(),
            matrix,
            options,
        })
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn num_rows(&self) -> usize {
        DIM * self.num_nodes
    }

    /// The assembled matrix, holding the values of the last solve
    pub fn matrix(&self) -> &ViscosityMatrix {
        &self.matrix
    }

    /// Jacobi preconditioner of the last solve
    pub fn preconditioner(&self) -> &[Scalar] {
        &self.preconditioner
    }

    /// Relative residual after each iteration of the last solve. Empty
    /// unless `record_residuals` is set.
    pub fn residual_history(&self) -> &[Scalar] {
        &self.residuals
    }

    /// Solve `V x = b` in place: `b` holds the nodal forces on entry and the
    /// nodal velocities on success.
    ///
    /// Element matrices must already be up to date for this timestep.
    pub fn solve<E: ViscousElement>(
        &mut self,
        nodes: &[MeshNode],
        elements: &[E],
        b: &mut [Vec3],
    ) -> SolverResult<SolveReport> {
        if b.len() != self.num_nodes {
            return Err(SolverError::SizeMismatch {
                what: "force vector",
                expected: self.num_nodes,
                actual: b.len(),
            });
        }
        if elements.len() != self.num_elements {
            return Err(SolverError::SizeMismatch {
                what: "element array",
                expected: self.num_elements,
                actual: elements.len(),
            });
        }

        self.matrix.refresh(nodes, elements)?;
        self.matrix
            .extract_inverse_diagonal(&mut self.preconditioner)?;
        self.residuals.clear();

        let mut delta_new = self.residual_assume_x_zero(b);
        let force_norm2 = block::norm2(&self.f);
        let epsilon2 = self.options.epsilon2;

        for iteration in 1..=self.options.max_iterations {
            self.matrix.apply(&self.p, &mut self.q)?;
            let p_dot_q = block::dot(&self.p, &self.q);

            let alpha = if p_dot_q != 0.0 {
                delta_new / p_dot_q
            } else if delta_new == 0.0 {
                0.0
            } else {
                return Err(SolverError::Breakdown { iteration });
            };

            block::add_scaled(b, &self.p, alpha);
            block::add_scaled(&mut self.r, &self.q, -alpha);

            let relative_residual = self.relative_residual(force_norm2);
            trace!("CG iteration {iteration}: relative residual {relative_residual:e}");
            if self.options.record_residuals {
                self.residuals.push(relative_residual);
            }

            if relative_residual < epsilon2 {
                debug!(
                    "CG converged in {iteration} iterations (relative residual {relative_residual:e})"
                );
                return Ok(SolveReport {
                    iterations: iteration,
                    relative_residual,
                    force_norm2,
                });
            }

            let delta_old = delta_new;
            if delta_old == 0.0 {
                // r·z vanished with a non-zero residual; p would become NaN
                return Err(SolverError::Breakdown { iteration });
            }
            delta_new = block::apply_diagonal(&mut self.z, &self.preconditioner, &self.r);
            block::scale_and_add(&mut self.p, &self.z, delta_new / delta_old);
        }

        error!(
            "Conjugate gradient solver could not converge after {} iterations (epsilon2 = {:e})",
            self.options.max_iterations, epsilon2
        );
        Err(SolverError::ConvergenceFailed {
            max_iterations: self.options.max_iterations,
            epsilon2,
        })
    }

    /// Initial residual for `x = 0`: `r = f = b`, then `b` is zeroed to become
    /// the solution accumulator. Returns `r·z`.
    fn residual_assume_x_zero(&mut self, b: &mut [Vec3]) -> Scalar {
        self.r.copy_from_slice(b);
        self.f.copy_from_slice(b);
        block::zero(b);
        let delta = block::apply_diagonal(&mut self.z, &self.preconditioner, &self.r);
        self.p.copy_from_slice(&self.z);
        delta
    }

    /// `(r·r)/(f·f)`, defined as zero for a zero force
    fn relative_residual(&self, force_norm2: Scalar) -> Scalar {
        if force_norm2 == 0.0 {
            0.0
        } else {
            block::norm2(&self.r) / force_norm2
        }
    }

    /// Compare the power injected by the last solve's force with the power
    /// dissipated by the velocity `x`
    pub fn energy_balance(&self, x: &[Vec3]) -> SolverResult<EnergyBalance> {
        let mut vx = work_vector("energy check vector", self.num_nodes, Vec3::zeros())?;
        self.matrix.apply(x, &mut vx)?;
        Ok(EnergyBalance {
            power: block::dot(x, &self.f),
            dissipation: block::dot(x, &vx),
        })
    }

    /// Squared norm of a velocity field
    pub fn velocity_norm2(x: &[Vec3]) -> Scalar {
        block::norm2(x)
    }

    /// Dump the dense matrix of the last solve alongside a reference vector
    pub fn print_matrices<W: Write>(&self, reference: &[Vec3], writer: W) -> SolverResult<()> {
        self.matrix.dump_dense(reference, writer)
    }
}
