// =============================================================================
// Linear System Circuits - Simulator Configuration
// =============================================================================
// Table of Contents:
//   1. SimulatorConfiguration - Tunables for execution and sampling
//   2. Loading and validation
// =============================================================================
// Purpose: Holds the host-imposed limits and performance knobs of the dense
//          simulator. Loadable from TOML; every field has a default.
// =============================================================================

use crate::error::{BackendError, ErrorContext, QuantumResult};
use serde::{Deserialize, Serialize};

// =============================================================================
// 1. SimulatorConfiguration - Tunables for execution and sampling
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfiguration {
    /// Largest register the dense backend accepts. 2^N amplitudes are allocated.
    pub maximum_quantum_bits: usize,
    /// Allowed deviation of the squared norm from 1 before renormalizing.
    pub normalization_tolerance: f64,
    /// Register size from which kernels and sampling use rayon workers.
    pub parallel_threshold_qubits: usize,
    /// Number of independent shot partitions, each with its own derived seed.
    pub sampling_partitions: usize,
}

impl Default for SimulatorConfiguration {
    fn default() -> Self {
        Self {
            maximum_quantum_bits: 16,
            normalization_tolerance: 1e-9,
            parallel_threshold_qubits: 14,
            sampling_partitions: 4,
        }
    }
}

impl SimulatorConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_maximum_quantum_bits(mut self, maximum_quantum_bits: usize) -> Self {
        self.maximum_quantum_bits = maximum_quantum_bits;
        self
    }

    pub fn with_normalization_tolerance(mut self, tolerance: f64) -> Self {
        self.normalization_tolerance = tolerance;
        self
    }

    pub fn with_parallel_threshold_qubits(mut self, qubits: usize) -> Self {
        self.parallel_threshold_qubits = qubits;
        self
    }

    pub fn with_sampling_partitions(mut self, partitions: usize) -> Self {
        self.sampling_partitions = partitions;
        self
    }

    // =========================================================================
    // 2. Loading and validation
    // =========================================================================

    pub fn from_toml_str(source: &str) -> QuantumResult<Self> {
        let configuration: Self =
            toml::from_str(source).context("Failed to parse simulator configuration")?;
        configuration.validate()?;
        Ok(configuration)
    }

    pub fn validate(&self) -> Result<(), BackendError> {
        if self.maximum_quantum_bits == 0 || self.maximum_quantum_bits >= usize::BITS as usize {
            return Err(BackendError::ConfigError(format!(
                "maximum_quantum_bits must be in 1..{}, got {}",
                usize::BITS,
                self.maximum_quantum_bits
            )));
        }
        if !(self.normalization_tolerance.is_finite() && self.normalization_tolerance > 0.0) {
            return Err(BackendError::ConfigError(format!(
                "normalization_tolerance must be positive, got {}",
                self.normalization_tolerance
            )));
        }
        if self.sampling_partitions == 0 {
            return Err(BackendError::ConfigError(
                "sampling_partitions must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SimulatorConfiguration::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let configuration =
            SimulatorConfiguration::from_toml_str("maximum_quantum_bits = 8\n").unwrap();
        assert_eq!(configuration.maximum_quantum_bits, 8);
        assert_eq!(configuration.sampling_partitions, 4);
    }

    #[test]
    fn test_zero_partitions_rejected() {
        let result = SimulatorConfiguration::from_toml_str("sampling_partitions = 0\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_toml_rejected() {
        assert!(SimulatorConfiguration::from_toml_str("maximum_quantum_bits = \"many\"").is_err());
    }
}
