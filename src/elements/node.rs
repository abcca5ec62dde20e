//! Mesh node - a point of the tetrahedral mesh with its ambient drag

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::math::{Scalar, Vec3};

/// A node of the finite element mesh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshNode {
    /// Current position
    pub position: Vec3,
    /// Ambient (Stokes) drag coefficient, added to the node's diagonal
    /// when drag is enabled
    pub stokes_drag: Scalar,
}

impl MeshNode {
    /// Create a new node at the given coordinates, with no drag
    pub fn new(x: Scalar, y: Scalar, z: Scalar) -> Self {
        Self::at(Vec3::new(x, y, z))
    }

    /// Create a node at a position
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            stokes_drag: 0.0,
        }
    }

    /// Set the drag coefficient directly
    pub fn with_stokes_drag(mut self, drag: Scalar) -> Self {
        self.stokes_drag = drag;
        self
    }

    /// Set the drag of a sphere of `radius` in a fluid of `viscosity`: 6πηr
    pub fn set_stokes_radius(&mut self, radius: Scalar, viscosity: Scalar) {
        self.stokes_drag = 6.0 * PI * viscosity * radius;
    }

}

impl Default for MeshNode {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_creation() {
        let node = MeshNode::new(1.0, 2.0, 3.0);
        assert_eq!(node.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(node.stokes_drag, 0.0);
    }

    #[test]
    fn test_stokes_radius() {
        let mut node = MeshNode::default();
        node.set_stokes_radius(2.0, 0.5);
        assert!((node.stokes_drag - 6.0 * PI).abs() < 1e-12);
    }
}
