//! Result types for viscosity solves

use serde::{Deserialize, Serialize};

use crate::math::Scalar;

/// Outcome of a converged solve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolveReport {
    /// Iterations performed, counting the one that reached the tolerance
    pub iterations: usize,
    /// Final relative residual `(r·r)/(f·f)`
    pub relative_residual: Scalar,
    /// Squared norm of the applied force `f·f`
    pub force_norm2: Scalar,
}

/// Power balance of a velocity field against the force that produced it
///
/// For a converged solve, the power injected by the force equals the power
/// dissipated by viscosity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyBalance {
    /// `x·f`
    pub power: Scalar,
    /// `xᵀ V x`
    pub dissipation: Scalar,
}

impl EnergyBalance {
    /// Absolute mismatch between injected and dissipated power
    pub fn mismatch(&self) -> Scalar {
        (self.dissipation - self.power).abs()
    }

    /// Mismatch relative to the injected power, zero when nothing was injected
    pub fn relative_mismatch(&self) -> Scalar {
        if self.power == 0.0 {
            0.0
        } else {
            self.mismatch() / self.power.abs()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_energy_mismatch() {
        let balance = EnergyBalance {
            power: 2.0,
            dissipation: 2.5,
        };
        assert!((balance.mismatch() - 0.5).abs() < 1e-12);
        assert!((balance.relative_mismatch() - 0.25).abs() < 1e-12);

        let idle = EnergyBalance {
            power: 0.0,
            dissipation: 0.0,
        };
        assert_eq!(idle.relative_mismatch(), 0.0);
    }
}
