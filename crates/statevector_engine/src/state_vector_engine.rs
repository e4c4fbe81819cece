// =============================================================================
// Linear System Circuits - State Vector Engine
// =============================================================================
// Table of Contents:
//   1. GateKernel - Precomputed bit masks for one gate application
//   2. apply_gate - Public entry point
//   3. Chunk kernels (matrix, conditional flip, swap)
//   4. Chunk dispatch (sequential or rayon)
// =============================================================================
// Purpose: Applies a gate to the amplitude buffer in place without building
//          the full 2^N x 2^N operator. Basis indices are grouped by the
//          values of the non-target bits; only groups whose control bits are
//          all 1 are touched, and each group's 2^k amplitudes are replaced by
//          the gate matrix times the group sub-vector.
//
//          The buffer is split into chunks of 2^(highest operand + 1)
//          amplitudes. Every group lies inside a single chunk, so chunks are
//          independent and can be processed by separate workers.
// =============================================================================

use crate::circuit_program::GateDescriptor;
use crate::error::{CircuitError, ExecutionError};
use crate::gate_library::{self, GateMatrix, Opcode};
use crate::state_backend::QuantumStateVector;
use num_complex::Complex64;

// =============================================================================
// 1. GateKernel - Precomputed bit masks for one gate application
// =============================================================================

#[derive(Debug, Clone)]
enum GateKernel {
    Matrix {
        matrix: GateMatrix,
        target_masks: Vec<usize>,
        control_mask: usize,
    },
    ConditionalFlip {
        target_mask: usize,
        control_mask: usize,
    },
    Swap {
        mask_a: usize,
        mask_b: usize,
    },
}

fn mask_of(qubits: &[usize]) -> usize {
    qubits.iter().fold(0, |mask, &qubit| mask | (1usize << qubit))
}

impl GateKernel {
    fn for_gate(gate: &GateDescriptor) -> Result<Self, ExecutionError> {
        let control_mask = mask_of(&gate.controls);
        let kernel = match gate.opcode {
            Opcode::CX | Opcode::CCX => GateKernel::ConditionalFlip {
                target_mask: mask_of(&gate.targets),
                control_mask,
            },
            Opcode::SWAP => GateKernel::Swap {
                mask_a: 1usize << gate.targets[0],
                mask_b: 1usize << gate.targets[1],
            },
            opcode => GateKernel::Matrix {
                matrix: gate_library::target_matrix(opcode, &gate.parameters)?,
                target_masks: gate.targets.iter().map(|&q| 1usize << q).collect(),
                control_mask,
            },
        };
        Ok(kernel)
    }

    fn for_matrix(matrix: GateMatrix, targets: &[usize], controls: &[usize]) -> Self {
        GateKernel::Matrix {
            matrix,
            target_masks: targets.iter().map(|&q| 1usize << q).collect(),
            control_mask: mask_of(controls),
        }
    }

    fn apply_to_chunk(&self, chunk: &mut [Complex64]) {
        match self {
            GateKernel::Matrix {
                matrix,
                target_masks,
                control_mask,
            } => apply_matrix_to_chunk(chunk, matrix, target_masks, *control_mask),
            GateKernel::ConditionalFlip {
                target_mask,
                control_mask,
            } => apply_flip_to_chunk(chunk, *target_mask, *control_mask),
            GateKernel::Swap { mask_a, mask_b } => apply_swap_to_chunk(chunk, *mask_a, *mask_b),
        }
    }
}

// =============================================================================
// 2. apply_gate - Public entry point
// =============================================================================

fn check_operands(
    state: &QuantumStateVector,
    operands: impl Iterator<Item = usize>,
) -> Result<usize, ExecutionError> {
    let total = state.number_of_quantum_bits();
    let mut highest = 0;
    for qubit in operands {
        if qubit >= total {
            return Err(ExecutionError::QubitIndexOutOfRange {
                index: qubit,
                total,
            });
        }
        highest = highest.max(qubit);
    }
    Ok(highest)
}

/// Left-multiplies the buffer by `gate` tensored with identities.
pub fn apply_gate(state: &mut QuantumStateVector, gate: &GateDescriptor) -> Result<(), ExecutionError> {
    apply_gate_with_threshold(state, gate, usize::MAX)
}

/// As [`apply_gate`], running chunks on rayon workers once the register has
/// at least `parallel_threshold_qubits` qubits (feature `parallel`).
pub fn apply_gate_with_threshold(
    state: &mut QuantumStateVector,
    gate: &GateDescriptor,
    parallel_threshold_qubits: usize,
) -> Result<(), ExecutionError> {
    gate.validate(state.number_of_quantum_bits())
        .map_err(|error| match error {
            CircuitError::InvalidQubitIndex { index, total } => {
                ExecutionError::QubitIndexOutOfRange { index, total }
            }
            other => ExecutionError::InvalidOperator(other.to_string()),
        })?;
    let highest = check_operands(state, gate.quantum_bits())?;
    let kernel = GateKernel::for_gate(gate)?;
    let run_in_parallel = state.number_of_quantum_bits() >= parallel_threshold_qubits;
    dispatch_chunks(state.amplitudes_mut(), 1usize << (highest + 1), &kernel, run_in_parallel);
    Ok(())
}

/// Applies an arbitrary matrix over `targets`, conditioned on `controls`.
/// The matrix is validated for shape and unitarity first.
pub fn apply_matrix(
    state: &mut QuantumStateVector,
    matrix: &GateMatrix,
    targets: &[usize],
    controls: &[usize],
) -> Result<(), ExecutionError> {
    gate_library::validate_unitary(matrix)?;
    let dimension = matrix.nrows();
    if targets.is_empty() || dimension != 1usize << targets.len() {
        return Err(ExecutionError::InvalidOperator(format!(
            "{dimension}x{dimension} matrix cannot act on {} target qubits",
            targets.len()
        )));
    }
    let all_distinct = targets
        .iter()
        .chain(controls)
        .enumerate()
        .all(|(i, q)| !targets.iter().chain(controls).take(i).any(|p| p == q));
    if !all_distinct {
        return Err(ExecutionError::InvalidOperator(
            "matrix operands must be distinct qubits".to_string(),
        ));
    }
    let highest = check_operands(state, targets.iter().chain(controls).copied())?;
    let kernel = GateKernel::for_matrix(matrix.clone(), targets, controls);
    dispatch_chunks(state.amplitudes_mut(), 1usize << (highest + 1), &kernel, false);
    Ok(())
}

// =============================================================================
// 3. Chunk kernels
// =============================================================================

fn apply_matrix_to_chunk(
    chunk: &mut [Complex64],
    matrix: &GateMatrix,
    target_masks: &[usize],
    control_mask: usize,
) {
    let group_size = 1usize << target_masks.len();
    let target_mask: usize = target_masks.iter().sum();
    let offsets: Vec<usize> = (0..group_size)
        .map(|member| {
            target_masks
                .iter()
                .enumerate()
                .filter(|(bit, _)| (member >> bit) & 1 == 1)
                .map(|(_, mask)| mask)
                .sum()
        })
        .collect();

    let mut gathered = vec![Complex64::new(0.0, 0.0); group_size];
    for base in 0..chunk.len() {
        if base & target_mask != 0 || base & control_mask != control_mask {
            continue;
        }
        for (slot, offset) in gathered.iter_mut().zip(&offsets) {
            *slot = chunk[base | offset];
        }
        for (row, offset) in offsets.iter().enumerate() {
            chunk[base | offset] = matrix
                .row(row)
                .iter()
                .zip(&gathered)
                .map(|(entry, amp)| entry * amp)
                .sum();
        }
    }
}

fn apply_flip_to_chunk(chunk: &mut [Complex64], target_mask: usize, control_mask: usize) {
    for index in 0..chunk.len() {
        if index & target_mask == 0 && index & control_mask == control_mask {
            chunk.swap(index, index | target_mask);
        }
    }
}

fn apply_swap_to_chunk(chunk: &mut [Complex64], mask_a: usize, mask_b: usize) {
    for index in 0..chunk.len() {
        if index & mask_a != 0 && index & mask_b == 0 {
            chunk.swap(index, (index & !mask_a) | mask_b);
        }
    }
}

// =============================================================================
// 4. Chunk dispatch
// =============================================================================

#[cfg(feature = "parallel")]
fn dispatch_chunks(
    amplitudes: &mut [Complex64],
    chunk_size: usize,
    kernel: &GateKernel,
    run_in_parallel: bool,
) {
    use rayon::prelude::*;
    if run_in_parallel && amplitudes.len() > chunk_size {
        amplitudes
            .par_chunks_mut(chunk_size)
            .for_each(|chunk| kernel.apply_to_chunk(chunk));
    } else {
        amplitudes
            .chunks_mut(chunk_size)
            .for_each(|chunk| kernel.apply_to_chunk(chunk));
    }
}

#[cfg(not(feature = "parallel"))]
fn dispatch_chunks(
    amplitudes: &mut [Complex64],
    chunk_size: usize,
    kernel: &GateKernel,
    _run_in_parallel: bool,
) {
    amplitudes
        .chunks_mut(chunk_size)
        .for_each(|chunk| kernel.apply_to_chunk(chunk));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn gate(opcode: Opcode, targets: &[usize], controls: &[usize], parameters: &[f64]) -> GateDescriptor {
        GateDescriptor::new(opcode, targets, controls, parameters)
    }

    fn close(a: Complex64, b: Complex64) -> bool {
        (a - b).norm() < 1e-12
    }

    #[test]
    fn test_hadamard_creates_superposition() {
        let mut state = QuantumStateVector::zero_state(1);
        apply_gate(&mut state, &gate(Opcode::H, &[0], &[], &[])).unwrap();
        assert!((state.amplitude(0).norm_sqr() - 0.5).abs() < 1e-12);
        assert!((state.amplitude(1).norm_sqr() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_cnot_entanglement() {
        let mut state = QuantumStateVector::zero_state(2);
        apply_gate(&mut state, &gate(Opcode::H, &[0], &[], &[])).unwrap();
        apply_gate(&mut state, &gate(Opcode::CX, &[1], &[0], &[])).unwrap();
        assert!((state.amplitude(0b00).norm_sqr() - 0.5).abs() < 1e-12);
        assert!((state.amplitude(0b11).norm_sqr() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_qubit_i_is_bit_i() {
        let mut state = QuantumStateVector::zero_state(3);
        apply_gate(&mut state, &gate(Opcode::RY, &[2], &[], &[PI])).unwrap();
        assert!(close(state.amplitude(0b100), Complex64::new(1.0, 0.0)));
    }

    #[test]
    fn test_control_on_zero_is_identity() {
        let mut state = QuantumStateVector::zero_state(2);
        apply_gate(&mut state, &gate(Opcode::CU3, &[1], &[0], &[PI, 0.0, 0.0])).unwrap();
        assert!(close(state.amplitude(0), Complex64::new(1.0, 0.0)));
    }

    #[test]
    fn test_controlled_phase_only_touches_one_one() {
        let mut state = QuantumStateVector::zero_state(2);
        apply_gate(&mut state, &gate(Opcode::H, &[0], &[], &[])).unwrap();
        apply_gate(&mut state, &gate(Opcode::H, &[1], &[], &[])).unwrap();
        apply_gate(&mut state, &gate(Opcode::CU1, &[1], &[0], &[PI / 2.0])).unwrap();
        assert!(close(state.amplitude(0b01), Complex64::new(0.5, 0.0)));
        assert!(close(state.amplitude(0b10), Complex64::new(0.5, 0.0)));
        assert!(close(state.amplitude(0b11), Complex64::new(0.0, 0.5)));
    }

    #[test]
    fn test_toffoli_needs_both_controls() {
        let mut state = QuantumStateVector::basis_state(3, 0b001).unwrap();
        apply_gate(&mut state, &gate(Opcode::CCX, &[2], &[0, 1], &[])).unwrap();
        assert!(close(state.amplitude(0b001), Complex64::new(1.0, 0.0)));

        let mut state = QuantumStateVector::basis_state(3, 0b011).unwrap();
        apply_gate(&mut state, &gate(Opcode::CCX, &[2], &[0, 1], &[])).unwrap();
        assert!(close(state.amplitude(0b111), Complex64::new(1.0, 0.0)));
    }

    #[test]
    fn test_swap_exchanges_qubits() {
        let mut state = QuantumStateVector::basis_state(3, 0b001).unwrap();
        apply_gate(&mut state, &gate(Opcode::SWAP, &[0, 2], &[], &[])).unwrap();
        assert!(close(state.amplitude(0b100), Complex64::new(1.0, 0.0)));
    }

    #[test]
    fn test_permutation_paths_match_matrix_path() {
        let mut seeded = QuantumStateVector::zero_state(3);
        for (qubit, angle) in [(0, 0.3), (1, 1.1), (2, -0.7)] {
            apply_gate(&mut seeded, &gate(Opcode::RY, &[qubit], &[], &[angle])).unwrap();
            apply_gate(&mut seeded, &gate(Opcode::RZ, &[qubit], &[], &[angle * 2.0])).unwrap();
        }

        let mut fast = seeded.clone();
        apply_gate(&mut fast, &gate(Opcode::SWAP, &[2, 0], &[], &[])).unwrap();
        apply_gate(&mut fast, &gate(Opcode::CCX, &[1], &[2, 0], &[])).unwrap();

        let mut slow = seeded;
        apply_matrix(&mut slow, &gate_library::swap_matrix(), &[2, 0], &[]).unwrap();
        apply_matrix(&mut slow, &gate_library::pauli_x_matrix(), &[1], &[2, 0]).unwrap();

        assert!(fast.max_amplitude_distance(&slow) < 1e-12);
    }

    #[test]
    fn test_out_of_range_qubit() {
        let mut state = QuantumStateVector::zero_state(2);
        let result = apply_gate(&mut state, &gate(Opcode::H, &[2], &[], &[]));
        assert!(matches!(
            result,
            Err(ExecutionError::QubitIndexOutOfRange { index: 2, total: 2 })
        ));
    }

    #[test]
    fn test_swap_with_one_target_rejected() {
        let mut state = QuantumStateVector::basis_state(2, 0b01).unwrap();
        let result = apply_gate(&mut state, &gate(Opcode::SWAP, &[0], &[], &[]));
        assert!(matches!(result, Err(ExecutionError::InvalidOperator(_))));
        assert!(close(state.amplitude(0b01), Complex64::new(1.0, 0.0)));
    }

    #[test]
    fn test_control_equal_to_target_rejected() {
        let mut state = QuantumStateVector::basis_state(2, 0b01).unwrap();
        let result = apply_gate(&mut state, &gate(Opcode::CX, &[0], &[0], &[]));
        assert!(matches!(result, Err(ExecutionError::InvalidOperator(_))));
    }

    #[test]
    fn test_missing_parameter_rejected() {
        let mut state = QuantumStateVector::zero_state(1);
        let result = apply_gate(&mut state, &gate(Opcode::RZ, &[0], &[], &[]));
        assert!(matches!(result, Err(ExecutionError::InvalidOperator(_))));
    }

    #[test]
    fn test_non_unitary_matrix_rejected() {
        let mut state = QuantumStateVector::zero_state(1);
        let mut matrix = gate_library::hadamard_matrix();
        matrix[[0, 0]] = Complex64::new(2.0, 0.0);
        assert!(matches!(
            apply_matrix(&mut state, &matrix, &[0], &[]),
            Err(ExecutionError::InvalidOperator(_))
        ));
    }

    #[test]
    fn test_matrix_shape_must_match_targets() {
        let mut state = QuantumStateVector::zero_state(2);
        let result = apply_matrix(&mut state, &gate_library::swap_matrix(), &[0], &[]);
        assert!(matches!(result, Err(ExecutionError::InvalidOperator(_))));
    }

    #[test]
    fn test_two_hadamards_restore_state() {
        let mut state = QuantumStateVector::zero_state(2);
        apply_gate(&mut state, &gate(Opcode::H, &[1], &[], &[])).unwrap();
        apply_gate(&mut state, &gate(Opcode::H, &[1], &[], &[])).unwrap();
        assert!(close(state.amplitude(0), Complex64::new(1.0, 0.0)));
        assert!(state.amplitude(0b10).norm() < 1e-12);
    }
}
