// =============================================================================
// Linear System Circuits - Hermitian Matrix Analysis
// =============================================================================
// Table of Contents:
//   1. Matrix2 helpers
//   2. HermitianMatrix2 - Validated 2x2 Hermitian input
//   3. EigenDecomposition - Closed-form spectrum
//   4. SingleQubitDecomposition - ZYZ angles plus global phase
// =============================================================================
// Purpose: Everything the composer needs to know about the input matrix:
//          its spectrum, the evolution operator e^{iAt} and its powers, and
//          the (theta, phi, lambda, alpha) angles that realize a controlled
//          power as CU3 plus a controlled global phase.
// =============================================================================

use crate::error::{SolverError, SolverResult};
use num_complex::Complex64;
use std::f64::consts::PI;

pub const HERMITIAN_TOLERANCE: f64 = 1e-9;

pub type Matrix2 = [[Complex64; 2]; 2];

// =============================================================================
// 1. Matrix2 helpers
// =============================================================================

pub fn multiply(left: &Matrix2, right: &Matrix2) -> Matrix2 {
    let mut product = [[Complex64::new(0.0, 0.0); 2]; 2];
    for row in 0..2 {
        for column in 0..2 {
            product[row][column] = left[row][0] * right[0][column] + left[row][1] * right[1][column];
        }
    }
    product
}

pub fn max_entry_distance(left: &Matrix2, right: &Matrix2) -> f64 {
    let mut distance: f64 = 0.0;
    for row in 0..2 {
        for column in 0..2 {
            distance = distance.max((left[row][column] - right[row][column]).norm());
        }
    }
    distance
}

/// Maps an angle into (-pi, pi].
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped <= -PI { wrapped + 2.0 * PI } else { wrapped }
}

pub fn pauli_x() -> Matrix2 {
    let zero = Complex64::new(0.0, 0.0);
    let one = Complex64::new(1.0, 0.0);
    [[zero, one], [one, zero]]
}

/// U3(theta, phi, lambda) = [[c, -e^{i lambda} s], [e^{i phi} s, e^{i(phi+lambda)} c]].
pub fn u3(theta: f64, phi: f64, lambda: f64) -> Matrix2 {
    let (s, c) = (theta / 2.0).sin_cos();
    [
        [
            Complex64::new(c, 0.0),
            -Complex64::from_polar(s, lambda),
        ],
        [
            Complex64::from_polar(s, phi),
            Complex64::from_polar(c, phi + lambda),
        ],
    ]
}

// =============================================================================
// 2. HermitianMatrix2 - Validated 2x2 Hermitian input
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HermitianMatrix2 {
    entries: Matrix2,
}

impl HermitianMatrix2 {
    pub fn new(entries: Matrix2) -> SolverResult<Self> {
        let finite = entries
            .iter()
            .flatten()
            .all(|entry| entry.re.is_finite() && entry.im.is_finite());
        if !finite {
            return Err(SolverError::NotHermitian {
                deviation: f64::INFINITY,
            });
        }
        let deviation = (entries[0][1] - entries[1][0].conj())
            .norm()
            .max(entries[0][0].im.abs())
            .max(entries[1][1].im.abs());
        if deviation > HERMITIAN_TOLERANCE {
            return Err(SolverError::NotHermitian { deviation });
        }
        Ok(Self { entries })
    }

    /// [[diagonal_0, off_diagonal], [off_diagonal, diagonal_1]].
    pub fn real_symmetric(diagonal_0: f64, off_diagonal: f64, diagonal_1: f64) -> SolverResult<Self> {
        let off = Complex64::new(off_diagonal, 0.0);
        Self::new([
            [Complex64::new(diagonal_0, 0.0), off],
            [off, Complex64::new(diagonal_1, 0.0)],
        ])
    }

    pub fn entries(&self) -> &Matrix2 {
        &self.entries
    }

    pub fn apply(&self, vector: [Complex64; 2]) -> [Complex64; 2] {
        [
            self.entries[0][0] * vector[0] + self.entries[0][1] * vector[1],
            self.entries[1][0] * vector[0] + self.entries[1][1] * vector[1],
        ]
    }

    pub fn eigen_decomposition(&self) -> EigenDecomposition {
        let a = self.entries[0][0].re;
        let d = self.entries[1][1].re;
        let b = self.entries[0][1];

        let mean = (a + d) / 2.0;
        let radius = (((a - d) / 2.0).powi(2) + b.norm_sqr()).sqrt();
        let eigenvalues = [mean - radius, mean + radius];

        let eigenvectors = if b.norm() < HERMITIAN_TOLERANCE {
            let zero = Complex64::new(0.0, 0.0);
            let one = Complex64::new(1.0, 0.0);
            if a <= d {
                [[one, zero], [zero, one]]
            } else {
                [[zero, one], [one, zero]]
            }
        } else {
            // (b, lambda - a) solves the first row of (A - lambda) v = 0.
            eigenvalues.map(|eigenvalue| {
                let vector = [b, Complex64::new(eigenvalue - a, 0.0)];
                let norm = (vector[0].norm_sqr() + vector[1].norm_sqr()).sqrt();
                [vector[0] / norm, vector[1] / norm]
            })
        };

        EigenDecomposition {
            eigenvalues,
            eigenvectors,
        }
    }

    /// e^{i A time}, built from the spectral decomposition.
    pub fn evolution_operator(&self, time: f64) -> Matrix2 {
        self.eigen_decomposition()
            .spectral_sum(|eigenvalue| Complex64::from_polar(1.0, eigenvalue * time))
    }

    /// Fails unless the spectrum is exactly {1, 2}.
    pub fn require_eigenvalues_one_and_two(&self) -> SolverResult<EigenDecomposition> {
        let decomposition = self.eigen_decomposition();
        let [low, high] = decomposition.eigenvalues;
        if (low - 1.0).abs() > HERMITIAN_TOLERANCE || (high - 2.0).abs() > HERMITIAN_TOLERANCE {
            return Err(SolverError::UnsupportedEigenvalues {
                eigenvalues: decomposition.eigenvalues,
            });
        }
        Ok(decomposition)
    }
}

// =============================================================================
// 3. EigenDecomposition - Closed-form spectrum
// =============================================================================

/// Eigenvalues in ascending order; `eigenvectors[k]` belongs to `eigenvalues[k]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EigenDecomposition {
    pub eigenvalues: [f64; 2],
    pub eigenvectors: [[Complex64; 2]; 2],
}

impl EigenDecomposition {
    /// Sum over k of f(lambda_k) |v_k><v_k|.
    pub fn spectral_sum<F>(&self, f: F) -> Matrix2
    where
        F: Fn(f64) -> Complex64,
    {
        let mut result = [[Complex64::new(0.0, 0.0); 2]; 2];
        for (eigenvalue, vector) in self.eigenvalues.iter().zip(&self.eigenvectors) {
            let weight = f(*eigenvalue);
            for row in 0..2 {
                for column in 0..2 {
                    result[row][column] += weight * vector[row] * vector[column].conj();
                }
            }
        }
        result
    }

    pub fn solve(&self, vector: [Complex64; 2]) -> SolverResult<[Complex64; 2]> {
        if self.eigenvalues.iter().any(|eigenvalue| eigenvalue.abs() < HERMITIAN_TOLERANCE) {
            return Err(SolverError::DivisionByZero {
                quantity: "matrix eigenvalue",
            });
        }
        let inverse = self.spectral_sum(|eigenvalue| Complex64::new(1.0 / eigenvalue, 0.0));
        Ok([
            inverse[0][0] * vector[0] + inverse[0][1] * vector[1],
            inverse[1][0] * vector[0] + inverse[1][1] * vector[1],
        ])
    }
}

// =============================================================================
// 4. SingleQubitDecomposition - ZYZ angles plus global phase
// =============================================================================

/// unitary = e^{i global_phase} U3(theta, phi, lambda).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SingleQubitDecomposition {
    pub theta: f64,
    pub phi: f64,
    pub lambda: f64,
    pub global_phase: f64,
}

impl SingleQubitDecomposition {
    pub fn from_unitary(unitary: &Matrix2) -> Self {
        let cosine = unitary[0][0].norm();
        let sine = unitary[1][0].norm();
        let theta = 2.0 * sine.atan2(cosine);

        if sine < HERMITIAN_TOLERANCE {
            // Diagonal: lambda is free, fold it into phi.
            let global_phase = unitary[0][0].arg();
            return Self {
                theta,
                phi: wrap_angle(unitary[1][1].arg() - global_phase),
                lambda: 0.0,
                global_phase,
            };
        }
        if cosine < HERMITIAN_TOLERANCE {
            // Anti-diagonal: only phi + lambda relative to alpha is fixed.
            let global_phase = (-unitary[0][1]).arg();
            return Self {
                theta,
                phi: wrap_angle(unitary[1][0].arg() - global_phase),
                lambda: 0.0,
                global_phase,
            };
        }

        let global_phase = unitary[0][0].arg();
        Self {
            theta,
            phi: wrap_angle(unitary[1][0].arg() - global_phase),
            lambda: wrap_angle((-unitary[0][1]).arg() - global_phase),
            global_phase,
        }
    }

    pub fn to_matrix(&self) -> Matrix2 {
        let phase = Complex64::from_polar(1.0, self.global_phase);
        u3(self.theta, self.phi, self.lambda).map(|row| row.map(|entry| phase * entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

    fn textbook_matrix() -> HermitianMatrix2 {
        HermitianMatrix2::real_symmetric(1.5, 0.5, 1.5).unwrap()
    }

    #[test]
    fn test_textbook_spectrum() {
        let decomposition = textbook_matrix().require_eigenvalues_one_and_two().unwrap();
        assert!((decomposition.eigenvalues[0] - 1.0).abs() < 1e-12);
        assert!((decomposition.eigenvalues[1] - 2.0).abs() < 1e-12);

        let low = decomposition.eigenvectors[0];
        let applied = textbook_matrix().apply(low);
        assert!((applied[0] - low[0]).norm() < 1e-12);
        assert!((applied[1] - low[1]).norm() < 1e-12);
    }

    #[test]
    fn test_diagonal_spectrum_order() {
        let matrix = HermitianMatrix2::real_symmetric(2.0, 0.0, 1.0).unwrap();
        let decomposition = matrix.eigen_decomposition();
        assert_eq!(decomposition.eigenvalues, [1.0, 2.0]);
        assert_eq!(decomposition.eigenvectors[0][1], Complex64::new(1.0, 0.0));
    }

    #[test]
    fn test_not_hermitian() {
        let one = Complex64::new(1.0, 0.0);
        let result = HermitianMatrix2::new([[one, Complex64::new(0.0, 1.0)], [Complex64::new(0.0, 1.0), one]]);
        assert!(matches!(result, Err(SolverError::NotHermitian { .. })));
    }

    #[test]
    fn test_unsupported_eigenvalues() {
        let matrix = HermitianMatrix2::real_symmetric(2.0, 1.0, 2.0).unwrap();
        assert!(matches!(
            matrix.require_eigenvalues_one_and_two(),
            Err(SolverError::UnsupportedEigenvalues { .. })
        ));
    }

    #[test]
    fn test_evolution_operator_angles() {
        let unitary = textbook_matrix().evolution_operator(FRAC_PI_2);
        let decomposition = SingleQubitDecomposition::from_unitary(&unitary);
        assert!((decomposition.theta - FRAC_PI_2).abs() < 1e-12);
        assert!((decomposition.phi - FRAC_PI_2).abs() < 1e-12);
        assert!((decomposition.lambda + FRAC_PI_2).abs() < 1e-12);
        assert!((decomposition.global_phase - 3.0 * FRAC_PI_4).abs() < 1e-12);
        assert!(max_entry_distance(&decomposition.to_matrix(), &unitary) < 1e-12);
    }

    #[test]
    fn test_squared_evolution_is_pauli_x() {
        let squared = textbook_matrix().evolution_operator(PI);
        assert!(max_entry_distance(&squared, &pauli_x()) < 1e-12);

        let half = textbook_matrix().evolution_operator(FRAC_PI_2);
        assert!(max_entry_distance(&multiply(&half, &half), &squared) < 1e-12);
    }

    #[test]
    fn test_decomposition_round_trip_for_degenerate_shapes() {
        let diagonal = [
            [Complex64::from_polar(1.0, 0.3), Complex64::new(0.0, 0.0)],
            [Complex64::new(0.0, 0.0), Complex64::from_polar(1.0, -1.1)],
        ];
        let anti_diagonal = [
            [Complex64::new(0.0, 0.0), Complex64::from_polar(1.0, 0.7)],
            [Complex64::from_polar(1.0, 2.0), Complex64::new(0.0, 0.0)],
        ];
        for unitary in [diagonal, anti_diagonal, pauli_x()] {
            let decomposition = SingleQubitDecomposition::from_unitary(&unitary);
            assert!(max_entry_distance(&decomposition.to_matrix(), &unitary) < 1e-12);
        }
    }

    #[test]
    fn test_wrap_angle() {
        assert!((wrap_angle(-1.5 * PI) - FRAC_PI_2).abs() < 1e-12);
        assert!((wrap_angle(-PI) - PI).abs() < 1e-12);
        assert!((wrap_angle(0.25) - 0.25).abs() < 1e-15);
    }

    #[test]
    fn test_solve() {
        let decomposition = textbook_matrix().eigen_decomposition();
        let one = Complex64::new(1.0, 0.0);
        let zero = Complex64::new(0.0, 0.0);
        let solution = decomposition.solve([one, zero]).unwrap();
        assert!((solution[0].re - 0.75).abs() < 1e-12);
        assert!((solution[1].re + 0.25).abs() < 1e-12);
    }
}
