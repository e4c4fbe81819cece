// =============================================================================
// Linear System Circuits - Unified Error Types
// =============================================================================
// Table of Contents:
//   1. QuantumRuntimeError - Main error enum
//   2. CircuitError - Circuit construction errors
//   3. ExecutionError - Execution-time errors
//   4. MeasurementError - Measurement and sampling errors
//   5. BackendError - Backend and configuration errors
// =============================================================================
// Purpose: Unified error handling across the state vector engine. Construction
//          errors are raised while a circuit is being built and never at
//          execution time; execution errors cover engine-level misuse.
// =============================================================================

use crate::gate_library::Opcode;
use thiserror::Error;

// =============================================================================
// 1. QuantumRuntimeError - Main error enum
// =============================================================================

#[derive(Debug, Error)]
pub enum QuantumRuntimeError {
    #[error("Circuit error: {0}")]
    Circuit(#[from] CircuitError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Measurement error: {0}")]
    Measurement(#[from] MeasurementError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Internal error: {0}")]
    Internal(String),
}

// =============================================================================
// 2. CircuitError - Circuit construction errors
// =============================================================================

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CircuitError {
    #[error("Invalid qubit index {index}: circuit has {total} qubits")]
    InvalidQubitIndex { index: usize, total: usize },

    #[error("Invalid classical bit index {index}: circuit has {total} classical bits")]
    InvalidClassicalBitIndex { index: usize, total: usize },

    #[error("Qubit {0} appears as both control and target")]
    ControlTargetOverlap(usize),

    #[error("Duplicate qubit in gate operands: qubit {0}")]
    DuplicateQubit(usize),

    #[error("{opcode} takes {required} {role} qubits, but {provided} were provided")]
    QubitCountMismatch {
        opcode: Opcode,
        role: &'static str,
        required: usize,
        provided: usize,
    },

    #[error("{opcode} takes {expected} parameters, got {actual}")]
    ParameterCountMismatch {
        opcode: Opcode,
        expected: usize,
        actual: usize,
    },

    #[error("Gate parameter {0} is not finite")]
    NonFiniteParameter(f64),

    #[error("Qubit {qubit} is used by {opcode} after being measured")]
    GateAfterMeasurement { qubit: usize, opcode: Opcode },

    #[error("Circuit too large: {qubits} qubits exceeds maximum {max}")]
    CircuitTooLarge { qubits: usize, max: usize },

    #[error("Measurement of qubit {0} has no inverse")]
    MeasurementNotInvertible(usize),

    #[error("Circuit description could not be decoded: {0}")]
    Decoding(String),
}

impl CircuitError {
    /// True for every variant the construction API reports as an invalid index.
    pub fn is_invalid_index(&self) -> bool {
        matches!(
            self,
            CircuitError::InvalidQubitIndex { .. }
                | CircuitError::InvalidClassicalBitIndex { .. }
                | CircuitError::ControlTargetOverlap(_)
                | CircuitError::DuplicateQubit(_)
        )
    }
}

// =============================================================================
// 3. ExecutionError - Execution-time errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Qubit index {index} out of range for a {total}-qubit register")]
    QubitIndexOutOfRange { index: usize, total: usize },

    #[error("Invalid operator: {0}")]
    InvalidOperator(String),

    #[error("Invalid shot count: {0} (must be > 0)")]
    InvalidShotCount(usize),

    #[error("Register size mismatch: circuit has {circuit} qubits, state has {state}")]
    RegisterSizeMismatch { circuit: usize, state: usize },

    #[error("Async execution error: {0}")]
    AsyncError(String),
}

// =============================================================================
// 4. MeasurementError - Measurement and sampling errors
// =============================================================================

#[derive(Debug, Error)]
pub enum MeasurementError {
    #[error("Classical bit {0} has no bound qubit")]
    UnboundClassicalBit(usize),

    #[error("Invalid shot count: {0} (must be > 0)")]
    InvalidShotCount(usize),

    #[error("Qubit index {index} out of range for a {total}-qubit register")]
    QubitIndexOutOfRange { index: usize, total: usize },

    #[error("Invalid bitstring {bitstring:?}: expected {expected} characters of 0/1")]
    InvalidBitstring { bitstring: String, expected: usize },

    #[error("Classical register of {0} bits cannot be keyed by a 64-bit outcome")]
    ClassicalRegisterTooWide(usize),

    #[error("Probability distribution is empty or degenerate")]
    DegenerateDistribution,
}

// =============================================================================
// 5. BackendError - Backend and configuration errors
// =============================================================================

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Dense backend: state vector too large for {qubits} qubits (maximum {max})")]
    DenseStateTooLarge { qubits: usize, max: usize },

    #[error("Backend configuration error: {0}")]
    ConfigError(String),
}

// =============================================================================
// Result type alias
// =============================================================================

pub type QuantumResult<T> = Result<T, QuantumRuntimeError>;

// =============================================================================
// Error context extension trait
// =============================================================================

pub trait ErrorContext<T> {
    fn context(self, msg: impl Into<String>) -> QuantumResult<T>;
    fn with_context<F>(self, f: F) -> QuantumResult<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: std::error::Error> ErrorContext<T> for Result<T, E> {
    fn context(self, msg: impl Into<String>) -> QuantumResult<T> {
        self.map_err(|e| QuantumRuntimeError::Internal(format!("{}: {}", msg.into(), e)))
    }

    fn with_context<F>(self, f: F) -> QuantumResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| QuantumRuntimeError::Internal(format!("{}: {}", f(), e)))
    }
}
