//! Sparsity pattern discovery for the viscosity matrix
//!
//! The topology walk runs once per solver. It records, for every nonzero
//! entry, the list of sources whose sum gives that entry's value. Refreshing
//! the numeric values later only re-reads those sources.

use std::collections::BTreeMap;

use nalgebra_sparse::CsrMatrix;

use super::sparse::ViscosityMatrix;
use super::{dof, local_index, Scalar, DIM};
use crate::elements::{MeshNode, PinnedNodes, ViscousElement, NUM_CORNER_NODES, NUM_ELEMENT_NODES};
use crate::error::{SolverError, SolverResult};

/// A source of one additive term of a matrix entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contribution {
    /// Entry `[row][col]` of an element's local viscosity matrix
    Element { element: usize, row: u8, col: u8 },
    /// The constant 1
    Identity,
    /// A node's ambient drag coefficient
    StokesDrag { node: usize },
}

impl Contribution {
    /// Current value of the referenced source
    #[inline]
    pub fn value<E: ViscousElement>(&self, nodes: &[MeshNode], elements: &[E]) -> Scalar {
        match *self {
            Contribution::Element { element, row, col } => {
                elements[element].viscosity_entry(row as usize, col as usize)
            }
            Contribution::Identity => 1.0,
            Contribution::StokesDrag { node } => nodes[node].stokes_drag,
        }
    }
}

/// Incremental builder for a fixed sparsity pattern with live contributions
#[derive(Debug, Clone)]
pub struct SparsityPatternBuilder {
    num_rows: usize,
    rows: Vec<BTreeMap<usize, Vec<Contribution>>>,
}

impl SparsityPatternBuilder {
    /// Create an empty `num_rows x num_rows` pattern
    pub fn new(num_rows: usize) -> Self {
        Self {
            num_rows,
            rows: vec![BTreeMap::new(); num_rows],
        }
    }

    /// Append a contribution to entry `(row, col)`, creating the entry if absent
    pub fn register(&mut self, row: usize, col: usize, contribution: Contribution) -> SolverResult<()> {
        if row >= self.num_rows || col >= self.num_rows {
            return Err(SolverError::DofOutOfRange {
                row,
                col,
                num_rows: self.num_rows,
            });
        }
        self.rows[row].entry(col).or_default().push(contribution);
        Ok(())
    }

    /// Whether entry `(row, col)` already exists
    pub fn has_entry(&self, row: usize, col: usize) -> bool {
        self.rows.get(row).is_some_and(|r| r.contains_key(&col))
    }

    /// Put a 1 on the diagonal of `dof` unless something is already there
    fn register_identity_once(&mut self, dof: usize) -> SolverResult<()> {
        if !self.has_entry(dof, dof) {
            self.register(dof, dof, Contribution::Identity)?;
        }
        Ok(())
    }

    /// Walk the mesh topology and register every contribution of the
    /// viscosity matrix.
    ///
    /// Corner-corner pairs of unpinned nodes reference the element's local
    /// matrix. Every other DOF touched by an element only gets an identity
    /// diagonal if nothing else drives it. Pinned DOFs never receive an
    /// off-diagonal entry.
    pub fn from_mesh<E: ViscousElement>(
        num_nodes: usize,
        elements: &[E],
        pinned: &PinnedNodes,
        include_drag: bool,
    ) -> SolverResult<Self> {
        if pinned.num_nodes() != num_nodes {
            return Err(SolverError::SizeMismatch {
                what: "pinned node lookup",
                expected: num_nodes,
                actual: pinned.num_nodes(),
            });
        }

        let mut builder = Self::new(DIM * num_nodes);

        for (n, elem) in elements.iter().enumerate() {
            let nodes = elem.nodes();
            if let Some(&bad) = nodes.iter().find(|&&node| node >= num_nodes) {
                return Err(SolverError::InvalidElement {
                    element: n,
                    reason: format!("node index {bad} out of range for {num_nodes} nodes"),
                });
            }

            for ni in 0..NUM_ELEMENT_NODES {
                for nj in 0..NUM_ELEMENT_NODES {
                    let ni_index = nodes[ni];
                    let nj_index = nodes[nj];
                    let either_pinned = pinned.is_pinned(ni_index) || pinned.is_pinned(nj_index);
                    let corner_pair = ni < NUM_CORNER_NODES && nj < NUM_CORNER_NODES;

                    for i in 0..DIM {
                        for j in 0..DIM {
                            let row = dof(ni_index, i);
                            let col = dof(nj_index, j);
                            let diagonal = ni == nj && i == j;

                            if !either_pinned && corner_pair {
                                builder.register(
                                    row,
                                    col,
                                    Contribution::Element {
                                        element: n,
                                        row: local_index(ni, i) as u8,
                                        col: local_index(nj, j) as u8,
                                    },
                                )?;
                            } else if diagonal {
                                builder.register_identity_once(row)?;
                            }
                        }
                    }
                }
            }
        }

        if include_drag {
            for node in (0..num_nodes).filter(|&n| !pinned.is_pinned(n)) {
                for i in 0..DIM {
                    let d = dof(node, i);
                    builder.register(d, d, Contribution::StokesDrag { node })?;
                }
            }
        }

        Ok(builder)
    }

    /// Number of entries discovered so far
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(BTreeMap::len).sum()
    }

    /// Freeze the pattern into CSR form. Values are zero until the first refresh.
    pub fn finalize(self) -> SolverResult<ViscosityMatrix> {
        let nnz = self.nnz();
        let mut row_offsets = Vec::with_capacity(self.num_rows + 1);
        let mut col_indices = Vec::with_capacity(nnz);
        let mut contribution_offsets = Vec::with_capacity(nnz + 1);
        let mut contributions = Vec::new();
        let mut diagonal = vec![None; self.num_rows];

        row_offsets.push(0);
        contribution_offsets.push(0);
        for (row, entries) in self.rows.into_iter().enumerate() {
            for (col, sources) in entries {
                if col == row {
                    diagonal[row] = Some(col_indices.len());
                }
                col_indices.push(col);
                contributions.extend(sources);
                contribution_offsets.push(contributions.len());
            }
            row_offsets.push(col_indices.len());
        }

        let values = vec![0.0; nnz];
        let csr = CsrMatrix::try_from_csr_data(
            self.num_rows,
            self.num_rows,
            row_offsets,
            col_indices,
            values,
        )
        .map_err(|e| SolverError::Pattern(e.to_string()))?;

        Ok(ViscosityMatrix::from_parts(
            csr,
            contribution_offsets,
            contributions,
            diagonal,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_creates_entry_once() {
        let mut builder = SparsityPatternBuilder::new(6);
        assert!(!builder.has_entry(1, 2));

        builder.register(1, 2, Contribution::Identity).unwrap();
        builder.register(1, 2, Contribution::StokesDrag { node: 0 }).unwrap();

        assert!(builder.has_entry(1, 2));
        assert!(!builder.has_entry(2, 1));
        assert_eq!(builder.nnz(), 1);
    }

    #[test]
    fn test_register_out_of_range() {
        let mut builder = SparsityPatternBuilder::new(3);
        let err = builder.register(0, 3, Contribution::Identity).unwrap_err();
        assert!(matches!(err, SolverError::DofOutOfRange { row: 0, col: 3, num_rows: 3 }));
    }

    #[test]
    fn test_identity_once() {
        let mut builder = SparsityPatternBuilder::new(3);
        builder.register_identity_once(1).unwrap();
        builder.register_identity_once(1).unwrap();
        let matrix = builder.finalize().unwrap();
        assert_eq!(matrix.contributions_at(1, 1), Some(&[Contribution::Identity][..]));
    }

    #[test]
    fn test_finalize_sorted_rows() {
        let mut builder = SparsityPatternBuilder::new(3);
        builder.register(0, 2, Contribution::Identity).unwrap();
        builder.register(0, 0, Contribution::Identity).unwrap();
        builder.register(2, 1, Contribution::Identity).unwrap();

        let matrix = builder.finalize().unwrap();
        assert_eq!(matrix.nnz(), 3);
        assert_eq!(matrix.csr().row_offsets(), &[0, 2, 2, 3]);
        assert_eq!(matrix.csr().col_indices(), &[0, 2, 1]);
    }
}
