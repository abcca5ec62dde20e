//! Error types for the viscosity solver

use thiserror::Error;

/// Main error type for viscosity assembly and solve operations
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Failed to allocate {what} ({len} entries)")]
    AllocationFailed { what: &'static str, len: usize },

    #[error("DOF ({row}, {col}) is outside a {num_rows}x{num_rows} matrix")]
    DofOutOfRange {
        row: usize,
        col: usize,
        num_rows: usize,
    },

    #[error("Node {node} not found in mesh of {num_nodes} nodes")]
    NodeNotFound { node: usize, num_nodes: usize },

    #[error("Element {element} is invalid: {reason}")]
    InvalidElement { element: usize, reason: String },

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{what} has length {actual}, expected {expected}")]
    SizeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Zero diagonal at DOF {dof} - cannot build Jacobi preconditioner")]
    ZeroDiagonal { dof: usize },

    #[error("Conjugate gradient breakdown at iteration {iteration}: p^T V p is zero with a non-zero residual")]
    Breakdown { iteration: usize },

    #[error("Conjugate gradient solver could not converge after {max_iterations} iterations (epsilon2 = {epsilon2:e}); either the tolerance or the iteration cap is too low, or the simulation is unstable")]
    ConvergenceFailed { max_iterations: usize, epsilon2: f64 },

    #[error("Sparsity pattern error: {0}")]
    Pattern(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Result type for solver operations
pub type SolverResult<T> = Result<T, SolverError>;
