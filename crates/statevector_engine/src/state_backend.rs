// =============================================================================
// Linear System Circuits - State Backend
// =============================================================================
// Table of Contents:
//   1. QuantumStateVector - Dense amplitude buffer
//   2. Norm bookkeeping
//   3. Read-only views
// =============================================================================
// Purpose: Owns the 2^N complex amplitudes of an N-qubit register. Qubit i
//          occupies bit position i of the basis-state index.
// =============================================================================

use crate::error::ExecutionError;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);

// =============================================================================
// 1. QuantumStateVector - Dense amplitude buffer
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantumStateVector {
    amplitudes: Vec<Complex64>,
    number_of_quantum_bits: usize,
}

fn checked_dimension(number_of_quantum_bits: usize) -> Option<usize> {
    u32::try_from(number_of_quantum_bits)
        .ok()
        .and_then(|bits| 1usize.checked_shl(bits))
}

impl QuantumStateVector {
    /// # Panics
    /// If `number_of_quantum_bits >= usize::BITS`. Callers that take widths
    /// from outside go through `CircuitExecutor`, which enforces the
    /// configured ceiling first.
    pub fn zero_state(number_of_quantum_bits: usize) -> Self {
        let dimension = checked_dimension(number_of_quantum_bits).unwrap_or_else(|| {
            panic!("{number_of_quantum_bits} qubits cannot be addressed by a usize basis index")
        });
        let mut amplitudes = vec![ZERO; dimension];
        amplitudes[0] = ONE;
        Self {
            amplitudes,
            number_of_quantum_bits,
        }
    }

    pub fn basis_state(number_of_quantum_bits: usize, index: usize) -> Result<Self, ExecutionError> {
        let dimension = checked_dimension(number_of_quantum_bits).ok_or_else(|| {
            ExecutionError::InvalidOperator(format!(
                "{number_of_quantum_bits} qubits cannot be addressed by a usize basis index"
            ))
        })?;
        if index >= dimension {
            return Err(ExecutionError::InvalidOperator(format!(
                "basis index {index} outside a {dimension}-dimensional register"
            )));
        }
        let mut amplitudes = vec![ZERO; dimension];
        amplitudes[index] = ONE;
        Ok(Self {
            amplitudes,
            number_of_quantum_bits,
        })
    }

    /// Wraps caller-supplied amplitudes. The length must be a power of two;
    /// the vector is not renormalized.
    pub fn from_amplitudes(amplitudes: Vec<Complex64>) -> Result<Self, ExecutionError> {
        let dimension = amplitudes.len();
        if dimension == 0 || !dimension.is_power_of_two() {
            return Err(ExecutionError::InvalidOperator(format!(
                "amplitude vector length {dimension} is not a power of two"
            )));
        }
        let number_of_quantum_bits = dimension.trailing_zeros() as usize;
        Ok(Self {
            amplitudes,
            number_of_quantum_bits,
        })
    }

    pub fn number_of_quantum_bits(&self) -> usize {
        self.number_of_quantum_bits
    }

    pub fn dimension(&self) -> usize {
        self.amplitudes.len()
    }

    pub fn amplitude(&self, index: usize) -> Complex64 {
        self.amplitudes[index]
    }

    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    pub fn amplitudes_mut(&mut self) -> &mut [Complex64] {
        &mut self.amplitudes
    }

    pub fn into_amplitudes(self) -> Vec<Complex64> {
        self.amplitudes
    }

    // =========================================================================
    // 2. Norm bookkeeping
    // =========================================================================

    pub fn norm_squared(&self) -> f64 {
        self.amplitudes.iter().map(|a| a.norm_sqr()).sum()
    }

    pub fn is_normalized(&self, tolerance: f64) -> bool {
        (self.norm_squared() - 1.0).abs() <= tolerance
    }

    /// Rescales to unit norm. Returns the squared norm seen before rescaling.
    pub fn normalize(&mut self) -> f64 {
        let norm_squared = self.norm_squared();
        let norm = norm_squared.sqrt();
        if norm > 1e-15 {
            for amp in &mut self.amplitudes {
                *amp /= norm;
            }
        }
        norm_squared
    }

    // =========================================================================
    // 3. Read-only views
    // =========================================================================

    pub fn probability_distribution(&self) -> Vec<f64> {
        self.amplitudes.iter().map(|a| a.norm_sqr()).collect()
    }

    pub fn inner_product(&self, other: &Self) -> Result<Complex64, ExecutionError> {
        if self.dimension() != other.dimension() {
            return Err(ExecutionError::RegisterSizeMismatch {
                circuit: other.number_of_quantum_bits,
                state: self.number_of_quantum_bits,
            });
        }
        Ok(self
            .amplitudes
            .iter()
            .zip(other.amplitudes.iter())
            .map(|(a, b)| a.conj() * b)
            .sum())
    }

    /// Largest per-amplitude distance to `other`, or infinity on size mismatch.
    pub fn max_amplitude_distance(&self, other: &Self) -> f64 {
        if self.dimension() != other.dimension() {
            return f64::INFINITY;
        }
        self.amplitudes
            .iter()
            .zip(other.amplitudes.iter())
            .map(|(a, b)| (a - b).norm())
            .fold(0.0, f64::max)
    }
}
