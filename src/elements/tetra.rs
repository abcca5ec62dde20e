//! 10-node tetrahedral element with a linear viscosity formulation
//!
//! Nodes 0-3 are the corners, nodes 4-9 the edge mid-nodes in the order
//! (0,1), (0,2), (0,3), (1,2), (1,3), (2,3). Viscous coupling is carried by
//! the corner nodes only, through linear shape functions.

use super::{MeshNode, ViscousElement, ViscousMaterial, NUM_CORNER_NODES, NUM_ELEMENT_NODES};
use crate::error::{SolverError, SolverResult};
use crate::math::{local_index, Mat12, Mat3, Scalar, Vec3, DIM};

/// Local corner pairs of the six edge mid-nodes
pub const EDGE_CORNERS: [(usize, usize); 6] = [(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)];

/// A 10-node tetrahedron
#[derive(Debug, Clone)]
pub struct TetraElement {
    /// Global node indices, corners first
    pub nodes: [usize; NUM_ELEMENT_NODES],
    /// Internal viscosity
    pub material: ViscousMaterial,

    viscosity_matrix: Mat12,
    shape_derivatives: [Vec3; NUM_CORNER_NODES],
    volume: Scalar,
}

impl TetraElement {
    /// Create a new element. The viscosity matrix is zero until
    /// [`ViscousElement::update_viscosity_matrix`] is called.
    pub fn new(nodes: [usize; NUM_ELEMENT_NODES], material: ViscousMaterial) -> Self {
        Self {
            nodes,
            material,
            viscosity_matrix: Mat12::zeros(),
            shape_derivatives: [Vec3::zeros(); NUM_CORNER_NODES],
            volume: 0.0,
        }
    }

    /// Local viscosity matrix from the last update
    pub fn viscosity_matrix(&self) -> &Mat12 {
        &self.viscosity_matrix
    }

    /// Gradients of the four linear shape functions from the last update
    pub fn shape_derivatives(&self) -> &[Vec3; NUM_CORNER_NODES] {
        &self.shape_derivatives
    }

    /// Cell volume from the last update
    pub fn volume(&self) -> Scalar {
        self.volume
    }

    /// Jacobian of the map from the reference tetrahedron, columns are the
    /// edges from corner 0
    pub fn jacobian(&self, nodes: &[MeshNode]) -> SolverResult<Mat3> {
        let corner = |k: usize| -> SolverResult<Vec3> {
            let node = self.nodes[k];
            nodes
                .get(node)
                .map(|n| n.position)
                .ok_or(SolverError::NodeNotFound {
                    node,
                    num_nodes: nodes.len(),
                })
        };
        let x0 = corner(0)?;
        Ok(Mat3::from_columns(&[
            corner(1)? - x0,
            corner(2)? - x0,
            corner(3)? - x0,
        ]))
    }

    /// Shape-function gradients and volume from the Jacobian
    fn calc_shape_function_derivatives_and_volume(&mut self, j: &Mat3) -> SolverResult<()> {
        let det = j.determinant();
        let inv = j
            .try_inverse()
            .filter(|_| det.is_finite() && det != 0.0)
            .ok_or_else(|| {
                SolverError::InvalidGeometry(format!("degenerate tetrahedron (det J = {det:e})"))
            })?;

        // Row k of J^-1 is the gradient of the k-th barycentric coordinate
        let g1 = inv.row(0).transpose();
        let g2 = inv.row(1).transpose();
        let g3 = inv.row(2).transpose();
        self.shape_derivatives = [-(g1 + g2 + g3), g1, g2, g3];
        self.volume = det.abs() / 6.0;
        Ok(())
    }

    fn create_viscosity_matrix(&mut self) {
        let eta = self.material.shear_viscosity;
        let lambda = self.material.lambda();
        let g = &self.shape_derivatives;

        for a in 0..NUM_CORNER_NODES {
            for b in 0..NUM_CORNER_NODES {
                let ga_gb = g[a].dot(&g[b]);
                for i in 0..DIM {
                    for j in 0..DIM {
                        let mut v = eta * g[a][j] * g[b][i] + lambda * g[a][i] * g[b][j];
                        if i == j {
                            v += eta * ga_gb;
                        }
                        self.viscosity_matrix[(local_index(a, i), local_index(b, j))] =
                            self.volume * v;
                    }
                }
            }
        }
    }
}

impl ViscousElement for TetraElement {
    fn nodes(&self) -> &[usize; NUM_ELEMENT_NODES] {
        &self.nodes
    }

    #[inline]
    fn viscosity_entry(&self, row: usize, col: usize) -> Scalar {
        self.viscosity_matrix[(row, col)]
    }

    fn update_viscosity_matrix(&mut self, nodes: &[MeshNode]) -> SolverResult<()> {
        let j = self.jacobian(nodes)?;
        self.calc_shape_function_derivatives_and_volume(&j)?;
        self.create_viscosity_matrix();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::SVector;

    fn unit_tet() -> (Vec<MeshNode>, TetraElement) {
        let corners = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        ];
        let mut nodes: Vec<MeshNode> = corners.iter().map(|&c| MeshNode::at(c)).collect();
        for (a, b) in EDGE_CORNERS {
            nodes.push(MeshNode::at((corners[a] + corners[b]) * 0.5));
        }
        let indices = std::array::from_fn(|i| i);
        let elem = TetraElement::new(indices, ViscousMaterial::new(2.0, 1.5));
        (nodes, elem)
    }

    /// Local velocity vector from a per-corner velocity function
    fn local_velocity(nodes: &[MeshNode], v: impl Fn(&Vec3) -> Vec3) -> SVector<Scalar, 12> {
        let mut out = SVector::<Scalar, 12>::zeros();
        for a in 0..NUM_CORNER_NODES {
            let va = v(&nodes[a].position);
            for i in 0..DIM {
                out[local_index(a, i)] = va[i];
            }
        }
        out
    }

    #[test]
    fn test_volume_and_gradients() {
        let (nodes, mut elem) = unit_tet();
        elem.update_viscosity_matrix(&nodes).unwrap();

        assert_relative_eq!(elem.volume(), 1.0 / 6.0, epsilon = 1e-14);
        let g = elem.shape_derivatives();
        assert_relative_eq!(g[0], Vec3::new(-1.0, -1.0, -1.0), epsilon = 1e-14);
        assert_relative_eq!(g[1], Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-14);
    }

    #[test]
    fn test_matrix_is_symmetric() {
        let (nodes, mut elem) = unit_tet();
        elem.update_viscosity_matrix(&nodes).unwrap();
        let k = elem.viscosity_matrix();
        assert_relative_eq!(*k, k.transpose(), epsilon = 1e-14);
    }

    #[test]
    fn test_rigid_motions_dissipate_nothing() {
        let (nodes, mut elem) = unit_tet();
        elem.update_viscosity_matrix(&nodes).unwrap();
        let k = elem.viscosity_matrix();

        let translation = local_velocity(&nodes, |_| Vec3::new(0.3, -1.0, 2.0));
        assert_relative_eq!(k * translation, SVector::<Scalar, 12>::zeros(), epsilon = 1e-12);

        let omega = Vec3::new(0.5, 1.0, -0.25);
        let rotation = local_velocity(&nodes, |x| omega.cross(x));
        assert_relative_eq!(k * rotation, SVector::<Scalar, 12>::zeros(), epsilon = 1e-12);
    }

    #[test]
    fn test_expansion_dissipates() {
        let (nodes, mut elem) = unit_tet();
        elem.update_viscosity_matrix(&nodes).unwrap();
        let expansion = local_velocity(&nodes, |x| *x);
        let power = expansion.dot(&(elem.viscosity_matrix() * expansion));
        assert!(power > 0.0);
    }

    #[test]
    fn test_degenerate_element() {
        let (mut nodes, mut elem) = unit_tet();
        nodes[3].position = Vec3::new(1.0, 1.0, 0.0);
        let err = elem.update_viscosity_matrix(&nodes).unwrap_err();
        assert!(matches!(err, SolverError::InvalidGeometry(_)));
    }
}
