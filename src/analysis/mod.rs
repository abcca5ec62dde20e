//! Solver options and the conjugate gradient viscosity solver

pub mod cg;

pub use cg::ViscositySolver;

use serde::{Deserialize, Serialize};

use crate::error::{SolverError, SolverResult};
use crate::math::Scalar;

/// Options for the viscosity solve
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    /// Squared relative residual tolerance, `(r·r)/(f·f) < epsilon2`
    pub epsilon2: Scalar,
    /// Maximum conjugate gradient iterations per solve
    pub max_iterations: usize,
    /// Add each node's ambient drag to its diagonal
    pub calc_stokes: bool,
    /// Keep the relative residual of every iteration of the last solve
    pub record_residuals: bool,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            epsilon2: 1e-12,
            max_iterations: 1000,
            calc_stokes: false,
            record_residuals: false,
        }
    }
}

impl SolverOptions {
    /// Set convergence tolerance (squared)
    pub fn with_tolerance(mut self, epsilon2: Scalar) -> Self {
        self.epsilon2 = epsilon2;
        self
    }

    /// Set maximum iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iterations = max_iter;
        self
    }

    /// Enable or disable ambient drag on the diagonal
    pub fn with_stokes_drag(mut self, enabled: bool) -> Self {
        self.calc_stokes = enabled;
        self
    }

    /// Record the residual history of each solve
    pub fn with_residual_history(mut self) -> Self {
        self.record_residuals = true;
        self
    }

    /// Parse options from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> SolverResult<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn to_json(&self) -> SolverResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject tolerances and caps the solver cannot work with
    pub fn validate(&self) -> SolverResult<()> {
        if !self.epsilon2.is_finite() || self.epsilon2 <= 0.0 {
            return Err(SolverError::InvalidInput(format!(
                "epsilon2 must be positive and finite, got {}",
                self.epsilon2
            )));
        }
        if self.max_iterations == 0 {
            return Err(SolverError::InvalidInput(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
