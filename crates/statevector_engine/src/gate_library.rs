// =============================================================================
// Linear System Circuits - Gate Library
// =============================================================================
// Table of Contents:
//   1. Opcode - Enumerated gate kinds with fixed arities
//   2. Single-qubit matrices (Hadamard, Rotations, Phase, U3)
//   3. Target matrices per opcode
//   4. Unitarity checks
// =============================================================================
// Purpose: Stateless constructors for the unitary matrices of every supported
//          gate. Matrices are expanded over target qubits only; controls are
//          handled by the state vector engine. For multi-target matrices the
//          first target is the least significant bit of the row index.
// =============================================================================

use crate::error::ExecutionError;
use ndarray::{Array2, array};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type GateMatrix = Array2<Complex64>;

/// Tolerance used by the unitarity checks in tests and debug validation.
pub const UNITARITY_TOLERANCE: f64 = 1e-9;

// =============================================================================
// 1. Opcode - Enumerated gate kinds with fixed arities
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    H,
    RZ,
    RY,
    U1,
    CU1,
    CU3,
    CX,
    CCX,
    SWAP,
}

/// (targets, controls, params) counts of an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeArity {
    pub targets: usize,
    pub controls: usize,
    pub parameters: usize,
}

impl Opcode {
    pub const ALL: [Opcode; 9] = [
        Opcode::H,
        Opcode::RZ,
        Opcode::RY,
        Opcode::U1,
        Opcode::CU1,
        Opcode::CU3,
        Opcode::CX,
        Opcode::CCX,
        Opcode::SWAP,
    ];

    pub fn arity(self) -> OpcodeArity {
        let (targets, controls, parameters) = match self {
            Opcode::H => (1, 0, 0),
            Opcode::RZ | Opcode::RY | Opcode::U1 => (1, 0, 1),
            Opcode::CU1 => (1, 1, 1),
            Opcode::CU3 => (1, 1, 3),
            Opcode::CX => (1, 1, 0),
            Opcode::CCX => (1, 2, 0),
            Opcode::SWAP => (2, 0, 0),
        };
        OpcodeArity {
            targets,
            controls,
            parameters,
        }
    }

    pub fn is_self_inverse(self) -> bool {
        matches!(self, Opcode::H | Opcode::CX | Opcode::CCX | Opcode::SWAP)
    }

    /// Parameters of the algebraic inverse gate of the same opcode.
    pub fn inverse_parameters(self, parameters: &[f64]) -> Vec<f64> {
        match self {
            Opcode::CU3 if parameters.len() == 3 => {
                vec![-parameters[0], -parameters[2], -parameters[1]]
            }
            _ => parameters.iter().map(|p| -p).collect(),
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::H => "H",
            Opcode::RZ => "RZ",
            Opcode::RY => "RY",
            Opcode::U1 => "U1",
            Opcode::CU1 => "CU1",
            Opcode::CU3 => "CU3",
            Opcode::CX => "CX",
            Opcode::CCX => "CCX",
            Opcode::SWAP => "SWAP",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

// =============================================================================
// 2. Single-qubit matrices
// =============================================================================

fn real(value: f64) -> Complex64 {
    Complex64::new(value, 0.0)
}

fn phase(angle: f64) -> Complex64 {
    Complex64::from_polar(1.0, angle)
}

pub fn hadamard_matrix() -> GateMatrix {
    let inv_sqrt2 = real(std::f64::consts::FRAC_1_SQRT_2);
    array![[inv_sqrt2, inv_sqrt2], [inv_sqrt2, -inv_sqrt2]]
}

pub fn pauli_x_matrix() -> GateMatrix {
    array![[real(0.0), real(1.0)], [real(1.0), real(0.0)]]
}

pub fn rotation_z_matrix(theta: f64) -> GateMatrix {
    array![
        [phase(-theta / 2.0), real(0.0)],
        [real(0.0), phase(theta / 2.0)]
    ]
}

pub fn rotation_y_matrix(theta: f64) -> GateMatrix {
    let (sin, cos) = (theta / 2.0).sin_cos();
    array![[real(cos), real(-sin)], [real(sin), real(cos)]]
}

pub fn phase_matrix(theta: f64) -> GateMatrix {
    array![[real(1.0), real(0.0)], [real(0.0), phase(theta)]]
}

/// General single-qubit unitary `RZ(φ)·RY(θ)·RZ(λ)` up to the global phase
/// `e^{i(φ+λ)/2}`, in the usual U3 form.
pub fn u3_matrix(theta: f64, phi: f64, lambda: f64) -> GateMatrix {
    let (sin, cos) = (theta / 2.0).sin_cos();
    array![
        [real(cos), -phase(lambda) * sin],
        [phase(phi) * sin, phase(phi + lambda) * cos]
    ]
}

pub fn swap_matrix() -> GateMatrix {
    let mut matrix = Array2::zeros((4, 4));
    matrix[[0, 0]] = real(1.0);
    matrix[[1, 2]] = real(1.0);
    matrix[[2, 1]] = real(1.0);
    matrix[[3, 3]] = real(1.0);
    matrix
}

// =============================================================================
// 3. Target matrices per opcode
// =============================================================================

/// Matrix acting on the opcode's target qubits. Parameter counts are checked
/// by the circuit builder; a short slice here is an engine misuse.
pub fn target_matrix(opcode: Opcode, parameters: &[f64]) -> Result<GateMatrix, ExecutionError> {
    let expected = opcode.arity().parameters;
    if parameters.len() != expected {
        return Err(ExecutionError::InvalidOperator(format!(
            "{opcode} expects {expected} parameters, got {}",
            parameters.len()
        )));
    }
    let matrix = match opcode {
        Opcode::H => hadamard_matrix(),
        Opcode::RZ => rotation_z_matrix(parameters[0]),
        Opcode::RY => rotation_y_matrix(parameters[0]),
        Opcode::U1 | Opcode::CU1 => phase_matrix(parameters[0]),
        Opcode::CU3 => u3_matrix(parameters[0], parameters[1], parameters[2]),
        Opcode::CX | Opcode::CCX => pauli_x_matrix(),
        Opcode::SWAP => swap_matrix(),
    };
    Ok(matrix)
}

// =============================================================================
// 4. Unitarity checks
// =============================================================================

pub fn conjugate_transpose(matrix: &GateMatrix) -> GateMatrix {
    matrix.t().mapv(|z| z.conj())
}

/// Largest entry-wise deviation of `M·M†` from the identity.
pub fn unitarity_deviation(matrix: &GateMatrix) -> f64 {
    let product = matrix.dot(&conjugate_transpose(matrix));
    product
        .indexed_iter()
        .map(|((row, column), value)| {
            let expected = if row == column { 1.0 } else { 0.0 };
            (value - real(expected)).norm()
        })
        .fold(0.0, f64::max)
}

pub fn validate_unitary(matrix: &GateMatrix) -> Result<(), ExecutionError> {
    let (rows, columns) = matrix.dim();
    if rows != columns || rows == 0 || !rows.is_power_of_two() {
        return Err(ExecutionError::InvalidOperator(format!(
            "matrix of shape {rows}x{columns} is not a square power-of-two operator"
        )));
    }
    let deviation = unitarity_deviation(matrix);
    if deviation > UNITARITY_TOLERANCE {
        return Err(ExecutionError::InvalidOperator(format!(
            "matrix deviates from unitarity by {deviation:e}"
        )));
    }
    Ok(())
}
