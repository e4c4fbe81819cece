// =============================================================================
// Linear System Circuits - Post-Selection Statistics
// =============================================================================
// Table of Contents:
//   1. PostSelectionStatistics - Rotation/swap tallies
//   2. Free functions over counts and states
// =============================================================================
// Purpose: Reduces sampled counts to the conditional success ratio
//          P(swap = 0 | rotation = 1) and the overlap estimate it implies, and
//          extracts the post-selected work-qubit state from an exact buffer.
// =============================================================================

use crate::composer::QubitLayout;
use crate::error::{SolverError, SolverResult};
use crate::state_preparation::{fix_global_phase, ANGLE_TOLERANCE};
use num_complex::Complex64;
use serde::Serialize;
use statevector_engine::measurement::CountsTable;
use statevector_engine::state_backend::QuantumStateVector;
use std::collections::BTreeMap;

// =============================================================================
// 1. PostSelectionStatistics - Rotation/swap tallies
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PostSelectionStatistics {
    pub total_shots: usize,
    /// Shots with the rotation ancilla reading 1 ("01" + "11").
    pub rotation_successes: usize,
    /// Rotation successes whose swap test also reported equality ("01").
    pub swap_successes: usize,
}

impl PostSelectionStatistics {
    pub fn from_counts(counts: &CountsTable, layout: &QubitLayout) -> Self {
        let mut statistics = Self {
            total_shots: counts.total_shots(),
            ..Self::default()
        };
        for (outcome, occurrences) in counts.iter() {
            let rotation = (outcome >> layout.rotation_classical_bit) & 1 == 1;
            let swap = (outcome >> layout.swap_classical_bit) & 1 == 1;
            if rotation {
                statistics.rotation_successes += occurrences;
                if !swap {
                    statistics.swap_successes += occurrences;
                }
            }
        }
        statistics
    }

    /// Same tallies from the external bitstring representation, where the
    /// rightmost character is classical bit 0.
    pub fn from_bitstring_counts(
        counts: &BTreeMap<String, usize>,
        layout: &QubitLayout,
    ) -> SolverResult<Self> {
        let mut table = CountsTable::new(layout.number_of_classical_bits());
        for (bitstring, &occurrences) in counts {
            let outcome = table
                .parse_bitstring(bitstring)
                .map_err(|_| SolverError::UnknownOutcome(bitstring.clone()))?;
            table.record(outcome, occurrences);
        }
        Ok(Self::from_counts(&table, layout))
    }

    pub fn ratio(&self) -> SolverResult<f64> {
        if self.rotation_successes == 0 {
            return Err(SolverError::DivisionByZero {
                quantity: "rotation success count",
            });
        }
        Ok(self.swap_successes as f64 / self.rotation_successes as f64)
    }

    /// P(swap = 0) = (1 + F) / 2 for overlap F = |<x|r>|^2, so F = 2 ratio - 1.
    /// Shot noise can push the estimate slightly below zero.
    pub fn fidelity_estimate(&self) -> SolverResult<f64> {
        Ok(2.0 * self.ratio()? - 1.0)
    }

    pub fn rotation_success_rate(&self) -> SolverResult<f64> {
        if self.total_shots == 0 {
            return Err(SolverError::DivisionByZero {
                quantity: "total shot count",
            });
        }
        Ok(self.rotation_successes as f64 / self.total_shots as f64)
    }
}

// =============================================================================
// 2. Free functions over counts and states
// =============================================================================

pub fn post_selection_ratio(counts: &CountsTable) -> SolverResult<f64> {
    PostSelectionStatistics::from_counts(counts, &QubitLayout::default()).ratio()
}

pub fn fidelity_estimate(counts: &CountsTable) -> SolverResult<f64> {
    PostSelectionStatistics::from_counts(counts, &QubitLayout::default()).fidelity_estimate()
}

/// Work-qubit amplitudes conditioned on the rotation ancilla being 1 and
/// every other qubit 0, normalized with the first non-zero amplitude made
/// real and positive. Meaningful for the state before the swap test.
pub fn post_selected_state(
    state: &QuantumStateVector,
    layout: &QubitLayout,
) -> SolverResult<[Complex64; 2]> {
    if state.number_of_quantum_bits() != layout.number_of_quantum_bits() {
        return Err(SolverError::InvalidStateVector(format!(
            "expected {} qubits, got {}",
            layout.number_of_quantum_bits(),
            state.number_of_quantum_bits()
        )));
    }
    let base = 1usize << layout.rotation_ancilla;
    let selected = [
        state.amplitude(base),
        state.amplitude(base | (1usize << layout.work)),
    ];
    let norm = (selected[0].norm_sqr() + selected[1].norm_sqr()).sqrt();
    if norm < ANGLE_TOLERANCE {
        return Err(SolverError::DivisionByZero {
            quantity: "post-selection probability",
        });
    }
    Ok(fix_global_phase([selected[0] / norm, selected[1] / norm]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts_from(entries: &[(u64, usize)]) -> CountsTable {
        let mut counts = CountsTable::new(2);
        for &(outcome, occurrences) in entries {
            counts.record(outcome, occurrences);
        }
        counts
    }

    #[test]
    fn test_ratio_formula() {
        // "01" = rotation 1, swap 0; "11" = rotation 1, swap 1.
        let counts = counts_from(&[(0b00, 300), (0b01, 450), (0b10, 100), (0b11, 150)]);
        let statistics = PostSelectionStatistics::from_counts(&counts, &QubitLayout::default());
        assert_eq!(statistics.rotation_successes, 600);
        assert_eq!(statistics.swap_successes, 450);
        assert!((statistics.ratio().unwrap() - 0.75).abs() < 1e-12);
        assert!((statistics.fidelity_estimate().unwrap() - 0.5).abs() < 1e-12);
        assert!((statistics.rotation_success_rate().unwrap() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_all_zero_outcomes_divide_by_zero() {
        let counts = counts_from(&[(0b00, 1000)]);
        assert!(matches!(
            post_selection_ratio(&counts),
            Err(SolverError::DivisionByZero { .. })
        ));
        assert!(fidelity_estimate(&counts).is_err());
    }

    #[test]
    fn test_bitstring_counts() {
        let counts: BTreeMap<String, usize> =
            [("01".to_string(), 7), ("11".to_string(), 1), ("10".to_string(), 2)]
                .into_iter()
                .collect();
        let statistics =
            PostSelectionStatistics::from_bitstring_counts(&counts, &QubitLayout::default()).unwrap();
        assert_eq!(statistics.total_shots, 10);
        assert_eq!(statistics.rotation_successes, 8);
        assert_eq!(statistics.swap_successes, 7);
    }

    #[test]
    fn test_unknown_bitstring() {
        let counts: BTreeMap<String, usize> = [("0x".to_string(), 1)].into_iter().collect();
        assert!(matches!(
            PostSelectionStatistics::from_bitstring_counts(&counts, &QubitLayout::default()),
            Err(SolverError::UnknownOutcome(outcome)) if outcome == "0x"
        ));
    }

    #[test]
    fn test_post_selected_state_phase_and_norm() {
        let mut amplitudes = vec![Complex64::new(0.0, 0.0); 64];
        amplitudes[0] = Complex64::new(0.6, 0.0);
        amplitudes[1] = Complex64::new(0.0, 0.48);
        amplitudes[1 | 8] = Complex64::new(0.0, -0.64);
        let state = QuantumStateVector::from_amplitudes(amplitudes).unwrap();

        let selected = post_selected_state(&state, &QubitLayout::default()).unwrap();
        assert!((selected[0] - Complex64::new(0.6, 0.0)).norm() < 1e-12);
        assert!((selected[1] - Complex64::new(-0.8, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_post_selected_state_rejects_empty_branch() {
        let state = QuantumStateVector::zero_state(6);
        assert!(matches!(
            post_selected_state(&state, &QubitLayout::default()),
            Err(SolverError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_post_selected_state_rejects_wrong_width() {
        let state = QuantumStateVector::zero_state(4);
        assert!(matches!(
            post_selected_state(&state, &QubitLayout::default()),
            Err(SolverError::InvalidStateVector(_))
        ));
    }
}
