// =============================================================================
// Linear System Circuits - Execution Engine
// =============================================================================
// Table of Contents:
//   1. SimulationBackendInterface - Uniform build/run contract
//   2. CircuitExecutor - Dense state vector executor
//   3. ExecutionResult - Result container
// =============================================================================
// Purpose: Walks a finalized circuit, applies each gate through the state
//          vector engine, keeps the buffer normalized, and hands the final
//          buffer to the measurement module for exact or sampled results.
// =============================================================================

use crate::circuit_program::{Circuit, Instruction};
use crate::configuration::SimulatorConfiguration;
use crate::error::{BackendError, ExecutionError, QuantumResult};
use crate::measurement::{self, CountsTable};
use crate::state_backend::QuantumStateVector;
use crate::state_vector_engine;
use serde::Serialize;
use std::time::Instant;
use uuid::Uuid;

// =============================================================================
// 1. SimulationBackendInterface - Uniform build/run contract
// =============================================================================

pub trait SimulationBackendInterface: Send + Sync {
    fn backend_name(&self) -> &str;

    /// Final amplitude vector of the circuit; measurement declarations are ignored.
    fn run_exact(&self, circuit: &Circuit) -> QuantumResult<QuantumStateVector>;

    fn run_sampled(&self, circuit: &Circuit, shots: usize, seed: u64) -> QuantumResult<CountsTable>;
}

// =============================================================================
// 2. CircuitExecutor - Dense state vector executor
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct CircuitExecutor {
    configuration: SimulatorConfiguration,
}

/// Final buffer plus how many times drift forced a renormalization.
#[derive(Debug, Clone)]
pub struct EvolvedState {
    pub state: QuantumStateVector,
    pub renormalizations: usize,
}

impl CircuitExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_configuration(configuration: SimulatorConfiguration) -> Result<Self, BackendError> {
        configuration.validate()?;
        Ok(Self { configuration })
    }

    pub fn configuration(&self) -> &SimulatorConfiguration {
        &self.configuration
    }

    fn check_register_size(&self, circuit: &Circuit) -> Result<(), BackendError> {
        let qubits = circuit.number_of_quantum_bits();
        if qubits > self.configuration.maximum_quantum_bits {
            return Err(BackendError::DenseStateTooLarge {
                qubits,
                max: self.configuration.maximum_quantum_bits,
            });
        }
        Ok(())
    }

    pub fn evolve(&self, circuit: &Circuit) -> QuantumResult<EvolvedState> {
        self.check_register_size(circuit)?;
        let state = QuantumStateVector::zero_state(circuit.number_of_quantum_bits());
        self.evolve_from(circuit, state)
    }

    /// Applies every gate of `circuit` to `state`, which must match its width.
    pub fn evolve_from(
        &self,
        circuit: &Circuit,
        mut state: QuantumStateVector,
    ) -> QuantumResult<EvolvedState> {
        self.check_register_size(circuit)?;
        if state.number_of_quantum_bits() != circuit.number_of_quantum_bits() {
            return Err(ExecutionError::RegisterSizeMismatch {
                circuit: circuit.number_of_quantum_bits(),
                state: state.number_of_quantum_bits(),
            }
            .into());
        }

        let tolerance = self.configuration.normalization_tolerance;
        let threshold = self.configuration.parallel_threshold_qubits;
        let mut renormalizations = 0;

        for (position, instruction) in circuit.instructions().iter().enumerate() {
            let Instruction::Gate(gate) = instruction else {
                continue;
            };
            state_vector_engine::apply_gate_with_threshold(&mut state, gate, threshold)?;

            let norm_squared = state.norm_squared();
            if (norm_squared - 1.0).abs() > tolerance {
                tracing::warn!(
                    circuit_id = %circuit.id(),
                    instruction = position,
                    opcode = %gate.opcode,
                    norm_squared,
                    "norm drift beyond tolerance, renormalizing"
                );
                state.normalize();
                renormalizations += 1;
            }
        }

        tracing::debug!(
            circuit_id = %circuit.id(),
            gates = circuit.gate_count(),
            renormalizations,
            "circuit evolved"
        );
        Ok(EvolvedState {
            state,
            renormalizations,
        })
    }

    pub fn execute(&self, circuit: &Circuit, shots: usize, seed: u64) -> QuantumResult<ExecutionResult> {
        if shots == 0 {
            return Err(ExecutionError::InvalidShotCount(shots).into());
        }
        let job_id = Uuid::new_v4();
        let start_time = Instant::now();

        let evolved = self.evolve(circuit)?;
        let run_in_parallel =
            circuit.number_of_quantum_bits() >= self.configuration.parallel_threshold_qubits;
        let counts = measurement::sample_partitioned(
            &evolved.state,
            &circuit.classical_register_map(),
            shots,
            seed,
            self.configuration.sampling_partitions,
            run_in_parallel,
        )?;

        let execution_time = start_time.elapsed();
        tracing::info!(
            job_id = %job_id,
            circuit_id = %circuit.id(),
            shots,
            distinct_outcomes = counts.distinct_outcomes(),
            elapsed_us = execution_time.as_micros() as u64,
            "sampled run complete"
        );

        Ok(ExecutionResult {
            job_id,
            circuit_id: circuit.id(),
            counts,
            final_state: evolved.state,
            renormalizations: evolved.renormalizations,
            execution_time_microseconds: execution_time.as_micros() as u64,
        })
    }
}

impl SimulationBackendInterface for CircuitExecutor {
    fn backend_name(&self) -> &str {
        "dense_state_vector"
    }

    fn run_exact(&self, circuit: &Circuit) -> QuantumResult<QuantumStateVector> {
        Ok(self.evolve(circuit)?.state)
    }

    fn run_sampled(&self, circuit: &Circuit, shots: usize, seed: u64) -> QuantumResult<CountsTable> {
        Ok(self.execute(circuit, shots, seed)?.counts)
    }
}

// =============================================================================
// 3. ExecutionResult - Result container
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub job_id: Uuid,
    pub circuit_id: Uuid,
    pub counts: CountsTable,
    pub final_state: QuantumStateVector,
    pub renormalizations: usize,
    pub execution_time_microseconds: u64,
}

impl ExecutionResult {
    pub fn total_shots(&self) -> usize {
        self.counts.total_shots()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit_program::CircuitBuilder;
    use crate::error::{MeasurementError, QuantumRuntimeError};

    fn bell_circuit() -> Circuit {
        let mut builder = CircuitBuilder::new(2, 2);
        builder.hadamard(0).unwrap().controlled_not(0, 1).unwrap();
        builder.measure(0, 0).unwrap().measure(1, 1).unwrap();
        builder.finalize()
    }

    #[test]
    fn test_circuit_execution() {
        let executor = CircuitExecutor::new();
        let result = executor.execute(&bell_circuit(), 100, 5).unwrap();
        assert_eq!(result.total_shots(), 100);
        assert_eq!(result.counts.count_of(0b00) + result.counts.count_of(0b11), 100);
        assert_eq!(result.renormalizations, 0);
    }

    #[test]
    fn test_run_exact_is_normalized() {
        let executor = CircuitExecutor::new();
        let state = executor.run_exact(&bell_circuit()).unwrap();
        assert!(state.is_normalized(1e-9));
        assert!((state.amplitude(0b11).norm_sqr() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_same_seed_same_counts() {
        let executor = CircuitExecutor::new();
        let circuit = bell_circuit();
        let first = executor.run_sampled(&circuit, 257, 99).unwrap();
        let second = executor.run_sampled(&circuit, 257, 99).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_zero_shots_rejected() {
        let executor = CircuitExecutor::new();
        assert!(matches!(
            executor.run_sampled(&bell_circuit(), 0, 1),
            Err(QuantumRuntimeError::Execution(ExecutionError::InvalidShotCount(0)))
        ));
    }

    #[test]
    fn test_unbound_classical_bit_surfaces() {
        let mut builder = CircuitBuilder::new(1, 2);
        builder.hadamard(0).unwrap().measure(0, 0).unwrap();
        let executor = CircuitExecutor::new();
        assert!(matches!(
            executor.run_sampled(&builder.finalize(), 10, 1),
            Err(QuantumRuntimeError::Measurement(MeasurementError::UnboundClassicalBit(1)))
        ));
    }

    #[test]
    fn test_register_ceiling() {
        let configuration = SimulatorConfiguration::default().with_maximum_quantum_bits(2);
        let executor = CircuitExecutor::with_configuration(configuration).unwrap();
        let circuit = CircuitBuilder::new(3, 0).finalize();
        assert!(matches!(
            executor.run_exact(&circuit),
            Err(QuantumRuntimeError::Backend(BackendError::DenseStateTooLarge { qubits: 3, max: 2 }))
        ));
    }

    #[test]
    fn test_drift_triggers_renormalization() {
        let configuration = SimulatorConfiguration::default().with_normalization_tolerance(1e-3);
        let executor = CircuitExecutor::with_configuration(configuration).unwrap();
        let mut builder = CircuitBuilder::new(1, 0);
        builder.hadamard(0).unwrap();
        let circuit = builder.finalize();

        let drifted = QuantumStateVector::from_amplitudes(vec![
            num_complex::Complex64::new(1.1, 0.0),
            num_complex::Complex64::new(0.0, 0.0),
        ])
        .unwrap();
        let evolved = executor.evolve_from(&circuit, drifted).unwrap();
        assert_eq!(evolved.renormalizations, 1);
        assert!(evolved.state.is_normalized(1e-12));
    }

    #[test]
    fn test_evolve_from_rejects_wrong_width() {
        let executor = CircuitExecutor::new();
        let result = executor.evolve_from(&bell_circuit(), QuantumStateVector::zero_state(3));
        assert!(matches!(
            result,
            Err(QuantumRuntimeError::Execution(ExecutionError::RegisterSizeMismatch { .. }))
        ));
    }

    #[test]
    fn test_backend_trait_object() {
        let backend: Box<dyn SimulationBackendInterface> = Box::new(CircuitExecutor::new());
        assert_eq!(backend.backend_name(), "dense_state_vector");
        assert_eq!(backend.run_sampled(&bell_circuit(), 10, 0).unwrap().total_shots(), 10);
    }
}
