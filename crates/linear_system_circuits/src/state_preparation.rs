// =============================================================================
// Linear System Circuits - Single-Qubit State Preparation
// =============================================================================
// Table of Contents:
//   1. Vector helpers
//   2. StatePreparation - RY/RZ angles for a target qubit state
//   3. ReferenceSolutionOracle - Source of the expected answer
// =============================================================================
// Purpose: Loads a normalized 2-vector onto one qubit with an RY followed by
//          an RZ. Used for the right-hand side b and for the swap-test
//          reference state supplied by a reference oracle.
// =============================================================================

use crate::error::{SolverError, SolverResult};
use crate::hermitian::{wrap_angle, HermitianMatrix2};
use num_complex::Complex64;
use statevector_engine::circuit_program::CircuitBuilder;
use statevector_engine::error::CircuitError;

/// Angles below this are treated as zero and their gate is skipped.
pub const ANGLE_TOLERANCE: f64 = 1e-12;

// =============================================================================
// 1. Vector helpers
// =============================================================================

pub fn normalize_pair(vector: [Complex64; 2]) -> SolverResult<[Complex64; 2]> {
    if !vector.iter().all(|entry| entry.re.is_finite() && entry.im.is_finite()) {
        return Err(SolverError::InvalidStateVector(format!(
            "non-finite entry in {vector:?}"
        )));
    }
    let norm = (vector[0].norm_sqr() + vector[1].norm_sqr()).sqrt();
    if norm < ANGLE_TOLERANCE {
        return Err(SolverError::InvalidStateVector(
            "vector has zero norm".to_string(),
        ));
    }
    Ok([vector[0] / norm, vector[1] / norm])
}

/// Multiplies by a global phase so the first non-zero entry is real and positive.
pub fn fix_global_phase(vector: [Complex64; 2]) -> [Complex64; 2] {
    let Some(pivot) = vector.iter().find(|entry| entry.norm() > ANGLE_TOLERANCE) else {
        return vector;
    };
    let correction = Complex64::from_polar(1.0, -pivot.arg());
    vector.map(|entry| entry * correction)
}

// =============================================================================
// 2. StatePreparation - RY/RZ angles for a target qubit state
// =============================================================================

/// RZ(phi) RY(theta) |0> equals the prepared vector up to global phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatePreparation {
    pub theta: f64,
    pub phi: f64,
}

impl StatePreparation {
    pub fn for_vector(vector: [Complex64; 2]) -> SolverResult<Self> {
        let [zero, one] = normalize_pair(vector)?;
        let theta = 2.0 * one.norm().atan2(zero.norm());
        let phi = if zero.norm() > ANGLE_TOLERANCE && one.norm() > ANGLE_TOLERANCE {
            wrap_angle(one.arg() - zero.arg())
        } else {
            0.0
        };
        Ok(Self { theta, phi })
    }

    pub fn append_to(&self, builder: &mut CircuitBuilder, qubit: usize) -> Result<(), CircuitError> {
        if self.theta.abs() > ANGLE_TOLERANCE {
            builder.rotation_y(qubit, self.theta)?;
        }
        if self.phi.abs() > ANGLE_TOLERANCE {
            builder.rotation_z(qubit, self.phi)?;
        }
        Ok(())
    }

    pub fn prepared_state(&self) -> [Complex64; 2] {
        let (sine, cosine) = (self.theta / 2.0).sin_cos();
        [
            Complex64::from_polar(cosine, -self.phi / 2.0),
            Complex64::from_polar(sine, self.phi / 2.0),
        ]
    }
}

// =============================================================================
// 3. ReferenceSolutionOracle - Source of the expected answer
// =============================================================================

pub trait ReferenceSolutionOracle {
    fn reference_solution(
        &self,
        matrix: &HermitianMatrix2,
        vector: [Complex64; 2],
    ) -> SolverResult<[Complex64; 2]>;
}

/// A caller-provided answer, returned as given (after normalization).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedReferenceSolution {
    solution: [Complex64; 2],
}

impl FixedReferenceSolution {
    pub fn new(solution: [Complex64; 2]) -> SolverResult<Self> {
        Ok(Self {
            solution: normalize_pair(solution)?,
        })
    }

    pub fn from_real(first: f64, second: f64) -> SolverResult<Self> {
        Self::new([Complex64::new(first, 0.0), Complex64::new(second, 0.0)])
    }
}

impl ReferenceSolutionOracle for FixedReferenceSolution {
    fn reference_solution(
        &self,
        _matrix: &HermitianMatrix2,
        _vector: [Complex64; 2],
    ) -> SolverResult<[Complex64; 2]> {
        Ok(self.solution)
    }
}

/// Classical A^{-1} b through the closed-form spectrum, normalized.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpectralInverseSolution;

impl ReferenceSolutionOracle for SpectralInverseSolution {
    fn reference_solution(
        &self,
        matrix: &HermitianMatrix2,
        vector: [Complex64; 2],
    ) -> SolverResult<[Complex64; 2]> {
        let solution = matrix.eigen_decomposition().solve(vector)?;
        normalize_pair(solution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn overlap(left: [Complex64; 2], right: [Complex64; 2]) -> f64 {
        (left[0].conj() * right[0] + left[1].conj() * right[1]).norm()
    }

    #[test]
    fn test_basis_state_needs_no_gates() {
        let preparation =
            StatePreparation::for_vector([Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)]).unwrap();
        let mut builder = CircuitBuilder::new(1, 0);
        preparation.append_to(&mut builder, 0).unwrap();
        assert_eq!(builder.instruction_count(), 0);
    }

    #[test]
    fn test_negative_component_uses_phase() {
        let target = normalize_pair([Complex64::new(3.0, 0.0), Complex64::new(-1.0, 0.0)]).unwrap();
        let preparation = StatePreparation::for_vector(target).unwrap();
        assert!((preparation.phi - PI).abs() < 1e-12);
        assert!((overlap(preparation.prepared_state(), target) - 1.0).abs() < 1e-12);

        let mut builder = CircuitBuilder::new(1, 0);
        preparation.append_to(&mut builder, 0).unwrap();
        assert_eq!(builder.instruction_count(), 2);
    }

    #[test]
    fn test_complex_target() {
        let target = normalize_pair([Complex64::new(0.2, 0.4), Complex64::new(-0.5, 0.1)]).unwrap();
        let preparation = StatePreparation::for_vector(target).unwrap();
        assert!((overlap(preparation.prepared_state(), target) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_vector_rejected() {
        let zero = Complex64::new(0.0, 0.0);
        assert!(matches!(
            StatePreparation::for_vector([zero, zero]),
            Err(SolverError::InvalidStateVector(_))
        ));
    }

    #[test]
    fn test_fix_global_phase() {
        let fixed = fix_global_phase([Complex64::new(0.0, -0.6), Complex64::new(0.8, 0.0)]);
        assert!((fixed[0] - Complex64::new(0.6, 0.0)).norm() < 1e-12);
        assert!((fixed[1] - Complex64::new(0.0, 0.8)).norm() < 1e-12);
    }

    #[test]
    fn test_spectral_inverse_reference() {
        let matrix = HermitianMatrix2::real_symmetric(1.5, 0.5, 1.5).unwrap();
        let b = [Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)];
        let solution = SpectralInverseSolution.reference_solution(&matrix, b).unwrap();
        let expected = 1.0 / 10f64.sqrt();
        assert!((solution[0].re - 3.0 * expected).abs() < 1e-12);
        assert!((solution[1].re + expected).abs() < 1e-12);
    }

    #[test]
    fn test_fixed_reference_is_normalized() {
        let oracle = FixedReferenceSolution::from_real(3.0, -1.0).unwrap();
        let matrix = HermitianMatrix2::real_symmetric(1.5, 0.5, 1.5).unwrap();
        let solution = oracle
            .reference_solution(&matrix, [Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)])
            .unwrap();
        assert!((solution[0].norm_sqr() + solution[1].norm_sqr() - 1.0).abs() < 1e-12);
    }
}
