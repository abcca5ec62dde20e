//! Tetrahedral mesh container

use std::collections::HashMap;

use crate::elements::{
    update_viscosity_matrices, MeshNode, TetraElement, ViscousMaterial, EDGE_CORNERS,
    NUM_CORNER_NODES, NUM_ELEMENT_NODES,
};
use crate::error::{SolverError, SolverResult};
use crate::math::{Scalar, Vec3};

/// A mesh of 10-node tetrahedra
///
/// Edge mid-nodes are created on demand and shared between the elements
/// meeting at an edge.
#[derive(Debug, Clone, Default)]
pub struct TetMesh {
    pub nodes: Vec<MeshNode>,
    pub elements: Vec<TetraElement>,
    edge_nodes: HashMap<(usize, usize), usize>,
}

impl TetMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    /// Add a corner node, returning its index
    pub fn add_node(&mut self, position: Vec3) -> usize {
        self.nodes.push(MeshNode::at(position));
        self.nodes.len() - 1
    }

    fn edge_node(&mut self, a: usize, b: usize) -> usize {
        let key = (a.min(b), a.max(b));
        if let Some(&node) = self.edge_nodes.get(&key) {
            return node;
        }
        let midpoint = (self.nodes[a].position + self.nodes[b].position) * 0.5;
        let node = self.add_node(midpoint);
        self.edge_nodes.insert(key, node);
        node
    }

    /// Add a tetrahedron over four existing corner nodes, returning its index
    pub fn add_element(
        &mut self,
        corners: [usize; NUM_CORNER_NODES],
        material: ViscousMaterial,
    ) -> SolverResult<usize> {
        let num_nodes = self.nodes.len();
        if let Some(&node) = corners.iter().find(|&&c| c >= num_nodes) {
            return Err(SolverError::NodeNotFound { node, num_nodes });
        }

        let mut nodes = [0; NUM_ELEMENT_NODES];
        nodes[..NUM_CORNER_NODES].copy_from_slice(&corners);
        for (e, (a, b)) in EDGE_CORNERS.iter().enumerate() {
            nodes[NUM_CORNER_NODES + e] = self.edge_node(corners[*a], corners[*b]);
        }

        self.elements.push(TetraElement::new(nodes, material));
        Ok(self.elements.len() - 1)
    }

    /// Block of `nx * ny * nz` cubes of side `spacing`, each split into six
    /// tetrahedra around its main diagonal
    pub fn block(
        nx: usize,
        ny: usize,
        nz: usize,
        spacing: Scalar,
        material: ViscousMaterial,
    ) -> SolverResult<Self> {
        let mut mesh = Self::new();
        let grid = |i: usize, j: usize, k: usize| i + (nx + 1) * (j + (ny + 1) * k);

        for k in 0..=nz {
            for j in 0..=ny {
                for i in 0..=nx {
                    mesh.add_node(Vec3::new(i as Scalar, j as Scalar, k as Scalar) * spacing);
                }
            }
        }

        // Paths from the cube's origin corner to its opposite corner
        const AXIS_ORDERS: [[usize; 3]; 6] =
            [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];

        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    for order in AXIS_ORDERS {
                        let mut corner = [i, j, k];
                        let mut tet = [grid(i, j, k); NUM_CORNER_NODES];
                        for (step, axis) in order.iter().enumerate() {
                            corner[*axis] += 1;
                            tet[step + 1] = grid(corner[0], corner[1], corner[2]);
                        }
                        mesh.add_element(tet, material)?;
                    }
                }
            }
        }

        Ok(mesh)
    }

    /// Set the same ambient drag on every node
    pub fn set_stokes_drag(&mut self, radius: Scalar, viscosity: Scalar) {
        for node in &mut self.nodes {
            node.set_stokes_radius(radius, viscosity);
        }
    }

    /// Recompute every element's viscosity matrix from current positions
    pub fn update_viscosity_matrices(&mut self) -> SolverResult<()> {
        update_viscosity_matrices(&mut self.elements, &self.nodes)
    }

    /// Indices of all nodes on the plane `coordinate[axis] == value`
    pub fn nodes_on_plane(&self, axis: usize, value: Scalar) -> Vec<usize> {
        let tol = 1e-9 * (1.0 + value.abs());
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| (n.position[axis] - value).abs() <= tol)
            .map(|(i, _)| i)
            .collect()
    }

    /// Total volume from the last element update
    pub fn volume(&self) -> Scalar {
        self.elements.iter().map(TetraElement::volume).sum()
    }
}
