// =============================================================================
// Linear System Circuits - Solver Error Types
// =============================================================================
// Table of Contents:
//   1. SolverError - Algorithm-level error enum
//   2. Conversions from engine errors
// =============================================================================
// Purpose: Errors raised while analysing the input system, composing the
//          circuit stages, or deriving statistics from sampled counts. Engine
//          failures are wrapped unchanged.
// =============================================================================

use statevector_engine::error::{CircuitError, MeasurementError, QuantumRuntimeError};
use thiserror::Error;

// =============================================================================
// 1. SolverError - Algorithm-level error enum
// =============================================================================

#[derive(Debug, Error)]
pub enum SolverError {
    #[error("Division by zero: {quantity} is zero")]
    DivisionByZero { quantity: &'static str },

    #[error("Matrix is not Hermitian (deviation {deviation:e})")]
    NotHermitian { deviation: f64 },

    #[error("Eigenvalues {eigenvalues:?} are not supported; the bit-swap inversion needs exactly {{1, 2}}")]
    UnsupportedEigenvalues { eigenvalues: [f64; 2] },

    #[error("Invalid state vector: {0}")]
    InvalidStateVector(String),

    #[error("Unknown outcome {0:?}")]
    UnknownOutcome(String),

    #[error("Runtime error: {0}")]
    Runtime(#[from] QuantumRuntimeError),
}

pub type SolverResult<T> = Result<T, SolverError>;

// =============================================================================
// 2. Conversions from engine errors
// =============================================================================

impl From<CircuitError> for SolverError {
    fn from(error: CircuitError) -> Self {
        SolverError::Runtime(error.into())
    }
}

impl From<MeasurementError> for SolverError {
    fn from(error: MeasurementError) -> Self {
        SolverError::Runtime(error.into())
    }
}
