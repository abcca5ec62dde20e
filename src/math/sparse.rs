//! Assembled viscosity matrix with a fixed sparsity pattern
//!
//! Viscosity matrices of tetrahedral meshes are typically >99% sparse. The
//! structure is stored once in CSR form; the numeric values are re-summed
//! from their live contributions every timestep.

use std::io::Write;

use nalgebra_sparse::CsrMatrix;
use rayon::prelude::*;

use super::pattern::Contribution;
use super::{block, Mat, Scalar, Vec3, DIM};
use crate::elements::{MeshNode, ViscousElement};
use crate::error::{SolverError, SolverResult};

/// Sparse `3N x 3N` viscosity matrix
///
/// Only [`SparsityPatternBuilder::finalize`](super::SparsityPatternBuilder::finalize)
/// creates one, so a matrix always has a complete structure.
#[derive(Debug, Clone)]
pub struct ViscosityMatrix {
    csr: CsrMatrix<Scalar>,
    /// `contributions[contribution_offsets[k]..contribution_offsets[k + 1]]`
    /// are the sources of CSR entry `k`
    contribution_offsets: Vec<usize>,
    contributions: Vec<Contribution>,
    /// CSR entry index of each row's diagonal, if it exists
    diagonal: Vec<Option<usize>>,
    /// Smallest element count every `Element` contribution can be resolved against
    required_elements: usize,
}

impl ViscosityMatrix {
    pub(crate) fn from_parts(
        csr: CsrMatrix<Scalar>,
        contribution_offsets: Vec<usize>,
        contributions: Vec<Contribution>,
        diagonal: Vec<Option<usize>>,
    ) -> Self {
        let required_elements = contributions
            .iter()
            .filter_map(|c| match c {
                Contribution::Element { element, .. } => Some(element + 1),
                _ => None,
            })
            .max()
            .unwrap_or(0);

        Self {
            csr,
            contribution_offsets,
            contributions,
            diagonal,
            required_elements,
        }
    }

    pub fn num_rows(&self) -> usize {
        self.csr.nrows()
    }

    /// Number of nodes (block rows)
    pub fn num_nodes(&self) -> usize {
        self.csr.nrows() / DIM
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.csr.nnz()
    }

    /// Total number of registered contributions over all entries
    pub fn contribution_count(&self) -> usize {
        self.contributions.len()
    }

    /// Underlying CSR storage
    pub fn csr(&self) -> &CsrMatrix<Scalar> {
        &self.csr
    }

    fn entry_index(&self, row: usize, col: usize) -> Option<usize> {
        if row >= self.num_rows() {
            return None;
        }
        let offsets = self.csr.row_offsets();
        let start = offsets[row];
        let end = offsets[row + 1];
        self.csr.col_indices()[start..end]
            .binary_search(&col)
            .ok()
            .map(|k| start + k)
    }

    /// Current value of an existing entry, or `None` outside the pattern
    pub fn entry(&self, row: usize, col: usize) -> Option<Scalar> {
        self.entry_index(row, col).map(|k| self.csr.values()[k])
    }

    /// Sources registered for an entry
    pub fn contributions_at(&self, row: usize, col: usize) -> Option<&[Contribution]> {
        self.entry_index(row, col).map(|k| {
            &self.contributions[self.contribution_offsets[k]..self.contribution_offsets[k + 1]]
        })
    }

    /// `(col, value)` pairs of a row in column order
    pub fn row_entries(&self, row: usize) -> impl Iterator<Item = (usize, Scalar)> + '_ {
        let offsets = self.csr.row_offsets();
        let range = offsets[row]..offsets[row + 1];
        self.csr.col_indices()[range.clone()]
            .iter()
            .copied()
            .zip(self.csr.values()[range].iter().copied())
    }

    /// Re-sum every entry from the current values of its contributions.
    ///
    /// Must run after element matrices have been updated and before the
    /// matrix is used in a timestep.
    pub fn refresh<E: ViscousElement>(
        &mut self,
        nodes: &[MeshNode],
        elements: &[E],
    ) -> SolverResult<()> {
        if nodes.len() != self.num_nodes() {
            return Err(SolverError::SizeMismatch {
                what: "node array",
                expected: self.num_nodes(),
                actual: nodes.len(),
            });
        }
        if elements.len() < self.required_elements {
            return Err(SolverError::SizeMismatch {
                what: "element array",
                expected: self.required_elements,
                actual: elements.len(),
            });
        }

        let offsets = &self.contribution_offsets;
        let contributions = &self.contributions;
        self.csr
            .values_mut()
            .par_iter_mut()
            .enumerate()
            .for_each(|(k, value)| {
                *value = contributions[offsets[k]..offsets[k + 1]]
                    .iter()
                    .map(|c| c.value(nodes, elements))
                    .sum();
            });
        Ok(())
    }

    /// Sparse matrix-vector product `y = V x`
    pub fn apply(&self, x: &[Vec3], y: &mut [Vec3]) -> SolverResult<()> {
        let num_nodes = self.num_nodes();
        for (what, len) in [("input vector", x.len()), ("output vector", y.len())] {
            if len != num_nodes {
                return Err(SolverError::SizeMismatch {
                    what,
                    expected: num_nodes,
                    actual: len,
                });
            }
        }

        let row_offsets = self.csr.row_offsets();
        let col_indices = self.csr.col_indices();
        let values = self.csr.values();

        y.par_iter_mut().enumerate().for_each(|(node, yi)| {
            for c in 0..DIM {
                let row = DIM * node + c;
                let mut sum = 0.0;
                for k in row_offsets[row]..row_offsets[row + 1] {
                    let col = col_indices[k];
                    sum += values[k] * x[col / DIM][col % DIM];
                }
                yi[c] = sum;
            }
        });
        Ok(())
    }

    /// Write the reciprocal of every diagonal entry into `out`
    pub fn extract_inverse_diagonal(&self, out: &mut [Scalar]) -> SolverResult<()> {
        if out.len() != self.num_rows() {
            return Err(SolverError::SizeMismatch {
                what: "preconditioner",
                expected: self.num_rows(),
                actual: out.len(),
            });
        }

        let values = self.csr.values();
        let diagonal_value = |diag: &Option<usize>| diag.map(|k| values[k]).unwrap_or(0.0);

        // Report the lowest failing DOF
        if let Some(dof) = self
            .diagonal
            .iter()
            .position(|diag| diagonal_value(diag) == 0.0)
        {
            return Err(SolverError::ZeroDiagonal { dof });
        }

        out.par_iter_mut()
            .zip(self.diagonal.par_iter())
            .for_each(|(inv, diag)| *inv = 1.0 / diagonal_value(diag));
        Ok(())
    }

    /// Dense copy of the current values (for comparison/debugging)
    pub fn to_dense(&self) -> Mat {
        let n = self.num_rows();
        let mut mat = Mat::zeros(n, n);
        for (row, col, &val) in self.csr.triplet_iter() {
            mat[(row, col)] = val;
        }
        mat
    }

    /// Write the full dense matrix, one row per line, followed by a blank
    /// line and the flattened reference vector, one value per line.
    pub fn dump_dense<W: Write>(&self, reference: &[Vec3], mut writer: W) -> SolverResult<()> {
        if reference.len() != self.num_nodes() {
            return Err(SolverError::SizeMismatch {
                what: "reference vector",
                expected: self.num_nodes(),
                actual: reference.len(),
            });
        }

        let dense = self.to_dense();
        for row in dense.row_iter() {
            let line: Vec<String> = row.iter().map(|v| format!("{v:e}")).collect();
            writeln!(writer, "{}", line.join(" "))?;
        }
        writeln!(writer)?;
        for v in block::flatten(reference) {
            writeln!(writer, "{v:e}")?;
        }
        writer.flush()?;
        Ok(())
    }
}
