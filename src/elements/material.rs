//! Viscous material properties

use serde::{Deserialize, Serialize};

use crate::math::Scalar;

/// Internal viscosity of an element, in Pa·s
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViscousMaterial {
    /// Shear viscosity
    pub shear_viscosity: Scalar,
    /// Bulk viscosity
    pub bulk_viscosity: Scalar,
}

impl ViscousMaterial {
    /// Create a new material with given viscosities
    pub fn new(shear_viscosity: Scalar, bulk_viscosity: Scalar) -> Self {
        Self {
            shear_viscosity,
            bulk_viscosity,
        }
    }

    /// Second viscosity coefficient multiplying the divergence term,
    /// `bulk - 2/3 shear`
    pub fn lambda(&self) -> Scalar {
        self.bulk_viscosity - 2.0 / 3.0 * self.shear_viscosity
    }
}

impl Default for ViscousMaterial {
    fn default() -> Self {
        Self::new(1e-3, 1e-3)
    }
}
