// =============================================================================
// Linear System Circuits - Circuit Program IR
// =============================================================================
// Table of Contents:
//   1. GateDescriptor - Opcode + operands + angles
//   2. Instruction - Gate application or measurement declaration
//   3. Circuit - Immutable, finalized instruction sequence
//   4. CircuitBuilder - Validating incremental construction
//   5. JSON encoding
// =============================================================================
// Purpose: The instruction format consumed by the executor. Every index and
//          parameter check happens at append time, so a finalized Circuit
//          never fails validation during execution.
// =============================================================================

use crate::error::CircuitError;
use crate::gate_library::Opcode;
use crate::measurement::ClassicalRegisterMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// 1. GateDescriptor - Opcode + operands + angles
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateDescriptor {
    pub opcode: Opcode,
    pub targets: Vec<usize>,
    pub controls: Vec<usize>,
    pub parameters: Vec<f64>,
}

impl GateDescriptor {
    pub fn new(
        opcode: Opcode,
        targets: impl Into<Vec<usize>>,
        controls: impl Into<Vec<usize>>,
        parameters: impl Into<Vec<f64>>,
    ) -> Self {
        Self {
            opcode,
            targets: targets.into(),
            controls: controls.into(),
            parameters: parameters.into(),
        }
    }

    /// The algebraic inverse: same operands, inverted parameters.
    pub fn inverse(&self) -> Self {
        let parameters = if self.opcode.is_self_inverse() {
            self.parameters.clone()
        } else {
            self.opcode.inverse_parameters(&self.parameters)
        };
        Self {
            opcode: self.opcode,
            targets: self.targets.clone(),
            controls: self.controls.clone(),
            parameters,
        }
    }

    pub fn quantum_bits(&self) -> impl Iterator<Item = usize> + '_ {
        self.controls.iter().chain(self.targets.iter()).copied()
    }

    /// Validates arity, index range, operand disjointness and parameter values
    /// against a register of `number_of_quantum_bits`.
    pub fn validate(&self, number_of_quantum_bits: usize) -> Result<(), CircuitError> {
        let arity = self.opcode.arity();
        if self.targets.len() != arity.targets {
            return Err(CircuitError::QubitCountMismatch {
                opcode: self.opcode,
                role: "target",
                required: arity.targets,
                provided: self.targets.len(),
            });
        }
        if self.controls.len() != arity.controls {
            return Err(CircuitError::QubitCountMismatch {
                opcode: self.opcode,
                role: "control",
                required: arity.controls,
                provided: self.controls.len(),
            });
        }
        if self.parameters.len() != arity.parameters {
            return Err(CircuitError::ParameterCountMismatch {
                opcode: self.opcode,
                expected: arity.parameters,
                actual: self.parameters.len(),
            });
        }

        for qubit in self.quantum_bits() {
            if qubit >= number_of_quantum_bits {
                return Err(CircuitError::InvalidQubitIndex {
                    index: qubit,
                    total: number_of_quantum_bits,
                });
            }
        }
        if let Some(&qubit) = self.targets.iter().find(|q| self.controls.contains(q)) {
            return Err(CircuitError::ControlTargetOverlap(qubit));
        }
        for operands in [&self.targets, &self.controls] {
            for (position, qubit) in operands.iter().enumerate() {
                if operands[..position].contains(qubit) {
                    return Err(CircuitError::DuplicateQubit(*qubit));
                }
            }
        }

        if let Some(&value) = self.parameters.iter().find(|p| !p.is_finite()) {
            return Err(CircuitError::NonFiniteParameter(value));
        }
        Ok(())
    }
}

// =============================================================================
// 2. Instruction - Gate application or measurement declaration
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Instruction {
    Gate(GateDescriptor),
    Measure {
        quantum_bit: usize,
        classical_bit: usize,
    },
}

impl Instruction {
    pub fn as_gate(&self) -> Option<&GateDescriptor> {
        match self {
            Instruction::Gate(gate) => Some(gate),
            Instruction::Measure { .. } => None,
        }
    }
}

// =============================================================================
// 3. Circuit - Immutable, finalized instruction sequence
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Circuit {
    id: Uuid,
    number_of_quantum_bits: usize,
    number_of_classical_bits: usize,
    instructions: Vec<Instruction>,
}

impl Circuit {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn number_of_quantum_bits(&self) -> usize {
        self.number_of_quantum_bits
    }

    pub fn number_of_classical_bits(&self) -> usize {
        self.number_of_classical_bits
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn gates(&self) -> impl Iterator<Item = &GateDescriptor> {
        self.instructions.iter().filter_map(Instruction::as_gate)
    }

    pub fn gate_count(&self) -> usize {
        self.gates().count()
    }

    pub fn measurement_count(&self) -> usize {
        self.instructions.len() - self.gate_count()
    }

    pub fn classical_register_map(&self) -> ClassicalRegisterMap {
        ClassicalRegisterMap::from_instructions(self.number_of_classical_bits, &self.instructions)
    }
}

// =============================================================================
// 4. CircuitBuilder - Validating incremental construction
// =============================================================================

#[derive(Debug, Clone)]
pub struct CircuitBuilder {
    number_of_quantum_bits: usize,
    number_of_classical_bits: usize,
    instructions: Vec<Instruction>,
    measured_quantum_bits: Vec<bool>,
}

impl CircuitBuilder {
    pub fn new(number_of_quantum_bits: usize, number_of_classical_bits: usize) -> Self {
        Self {
            number_of_quantum_bits,
            number_of_classical_bits,
            instructions: Vec::new(),
            measured_quantum_bits: vec![false; number_of_quantum_bits],
        }
    }

    /// Like `new`, but refuses registers wider than `maximum_quantum_bits`.
    pub fn with_limit(
        number_of_quantum_bits: usize,
        number_of_classical_bits: usize,
        maximum_quantum_bits: usize,
    ) -> Result<Self, CircuitError> {
        if number_of_quantum_bits > maximum_quantum_bits {
            return Err(CircuitError::CircuitTooLarge {
                qubits: number_of_quantum_bits,
                max: maximum_quantum_bits,
            });
        }
        Ok(Self::new(number_of_quantum_bits, number_of_classical_bits))
    }

    pub fn number_of_quantum_bits(&self) -> usize {
        self.number_of_quantum_bits
    }

    pub fn number_of_classical_bits(&self) -> usize {
        self.number_of_classical_bits
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }

    pub fn append(
        &mut self,
        opcode: Opcode,
        targets: &[usize],
        controls: &[usize],
        parameters: &[f64],
    ) -> Result<&mut Self, CircuitError> {
        self.append_gate(GateDescriptor::new(opcode, targets, controls, parameters))
    }

    pub fn append_gate(&mut self, gate: GateDescriptor) -> Result<&mut Self, CircuitError> {
        gate.validate(self.number_of_quantum_bits)?;
        if let Some(qubit) = gate.quantum_bits().find(|&q| self.measured_quantum_bits[q]) {
            return Err(CircuitError::GateAfterMeasurement {
                qubit,
                opcode: gate.opcode,
            });
        }
        self.instructions.push(Instruction::Gate(gate));
        Ok(self)
    }

    /// Binds `quantum_bit` to `classical_bit`. A later binding of the same
    /// classical bit replaces the earlier one.
    pub fn measure(
        &mut self,
        quantum_bit: usize,
        classical_bit: usize,
    ) -> Result<&mut Self, CircuitError> {
        if quantum_bit >= self.number_of_quantum_bits {
            return Err(CircuitError::InvalidQubitIndex {
                index: quantum_bit,
                total: self.number_of_quantum_bits,
            });
        }
        if classical_bit >= self.number_of_classical_bits {
            return Err(CircuitError::InvalidClassicalBitIndex {
                index: classical_bit,
                total: self.number_of_classical_bits,
            });
        }
        self.measured_quantum_bits[quantum_bit] = true;
        self.instructions.push(Instruction::Measure {
            quantum_bit,
            classical_bit,
        });
        Ok(self)
    }

    pub fn append_instructions(
        &mut self,
        instructions: &[Instruction],
    ) -> Result<&mut Self, CircuitError> {
        for instruction in instructions {
            match instruction {
                Instruction::Gate(gate) => self.append_gate(gate.clone())?,
                Instruction::Measure {
                    quantum_bit,
                    classical_bit,
                } => self.measure(*quantum_bit, *classical_bit)?,
            };
        }
        Ok(self)
    }

    /// Appends the inverse of `instructions`: reverse order, each gate inverted.
    pub fn append_inverse_of(
        &mut self,
        instructions: &[Instruction],
    ) -> Result<&mut Self, CircuitError> {
        for instruction in instructions.iter().rev() {
            match instruction {
                Instruction::Gate(gate) => self.append_gate(gate.inverse())?,
                Instruction::Measure { quantum_bit, .. } => {
                    return Err(CircuitError::MeasurementNotInvertible(*quantum_bit));
                }
            };
        }
        Ok(self)
    }

    pub fn hadamard(&mut self, qubit: usize) -> Result<&mut Self, CircuitError> {
        self.append(Opcode::H, &[qubit], &[], &[])
    }

    pub fn rotation_z(&mut self, qubit: usize, theta: f64) -> Result<&mut Self, CircuitError> {
        self.append(Opcode::RZ, &[qubit], &[], &[theta])
    }

    pub fn rotation_y(&mut self, qubit: usize, theta: f64) -> Result<&mut Self, CircuitError> {
        self.append(Opcode::RY, &[qubit], &[], &[theta])
    }

    pub fn phase(&mut self, qubit: usize, theta: f64) -> Result<&mut Self, CircuitError> {
        self.append(Opcode::U1, &[qubit], &[], &[theta])
    }

    pub fn controlled_phase(
        &mut self,
        control: usize,
        target: usize,
        theta: f64,
    ) -> Result<&mut Self, CircuitError> {
        self.append(Opcode::CU1, &[target], &[control], &[theta])
    }

    pub fn controlled_u3(
        &mut self,
        control: usize,
        target: usize,
        theta: f64,
        phi: f64,
        lambda: f64,
    ) -> Result<&mut Self, CircuitError> {
        self.append(Opcode::CU3, &[target], &[control], &[theta, phi, lambda])
    }

    pub fn controlled_not(&mut self, control: usize, target: usize) -> Result<&mut Self, CircuitError> {
        self.append(Opcode::CX, &[target], &[control], &[])
    }

    pub fn toffoli(
        &mut self,
        control_a: usize,
        control_b: usize,
        target: usize,
    ) -> Result<&mut Self, CircuitError> {
        self.append(Opcode::CCX, &[target], &[control_a, control_b], &[])
    }

    pub fn swap(&mut self, qubit_a: usize, qubit_b: usize) -> Result<&mut Self, CircuitError> {
        self.append(Opcode::SWAP, &[qubit_a, qubit_b], &[], &[])
    }

    pub fn finalize(self) -> Circuit {
        let circuit = Circuit {
            id: Uuid::new_v4(),
            number_of_quantum_bits: self.number_of_quantum_bits,
            number_of_classical_bits: self.number_of_classical_bits,
            instructions: self.instructions,
        };
        tracing::debug!(
            circuit_id = %circuit.id,
            qubits = circuit.number_of_quantum_bits,
            gates = circuit.gate_count(),
            measurements = circuit.measurement_count(),
            "circuit finalized"
        );
        circuit
    }
}

// =============================================================================
// 5. JSON encoding
// =============================================================================

#[derive(Debug, Deserialize)]
struct CircuitDescription {
    id: Option<Uuid>,
    number_of_quantum_bits: usize,
    number_of_classical_bits: usize,
    instructions: Vec<Instruction>,
}

impl Circuit {
    pub fn to_json(&self) -> Result<String, CircuitError> {
        serde_json::to_string_pretty(self).map_err(|e| CircuitError::Decoding(e.to_string()))
    }

    /// Decodes a circuit and rebuilds it through the builder, so a decoded
    /// circuit satisfies the same invariants as a built one.
    pub fn from_json(source: &str) -> Result<Self, CircuitError> {
        let description: CircuitDescription =
            serde_json::from_str(source).map_err(|e| CircuitError::Decoding(e.to_string()))?;
        let mut builder = CircuitBuilder::new(
            description.number_of_quantum_bits,
            description.number_of_classical_bits,
        );
        builder.append_instructions(&description.instructions)?;
        let mut circuit = builder.finalize();
        if let Some(id) = description.id {
            circuit.id = id;
        }
        Ok(circuit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circuit_creation() {
        let mut builder = CircuitBuilder::new(2, 2);
        builder.hadamard(0).unwrap().controlled_not(0, 1).unwrap();
        builder.measure(0, 0).unwrap().measure(1, 1).unwrap();
        let circuit = builder.finalize();

        assert_eq!(circuit.number_of_quantum_bits(), 2);
        assert_eq!(circuit.gate_count(), 2);
        assert_eq!(circuit.measurement_count(), 2);
    }

    #[test]
    fn test_target_equal_to_qubit_count_is_invalid_index() {
        let mut builder = CircuitBuilder::new(3, 0);
        let err = builder.append(Opcode::H, &[3], &[], &[]).unwrap_err();
        assert_eq!(err, CircuitError::InvalidQubitIndex { index: 3, total: 3 });
        assert!(err.is_invalid_index());
    }

    #[test]
    fn test_control_target_overlap_rejected() {
        let mut builder = CircuitBuilder::new(3, 0);
        let err = builder.append(Opcode::CX, &[1], &[1], &[]).unwrap_err();
        assert_eq!(err, CircuitError::ControlTargetOverlap(1));
        assert!(err.is_invalid_index());
    }

    #[test]
    fn test_duplicate_controls_rejected() {
        let mut builder = CircuitBuilder::new(3, 0);
        let err = builder.toffoli(0, 0, 2).unwrap_err();
        assert_eq!(err, CircuitError::DuplicateQubit(0));
    }

    #[test]
    fn test_parameter_count_mismatch() {
        let mut builder = CircuitBuilder::new(2, 0);
        let err = builder.append(Opcode::CU3, &[1], &[0], &[0.1]).unwrap_err();
        assert_eq!(
            err,
            CircuitError::ParameterCountMismatch {
                opcode: Opcode::CU3,
                expected: 3,
                actual: 1
            }
        );
        assert!(builder.append(Opcode::H, &[0], &[], &[0.5]).is_err());
    }

    #[test]
    fn test_wrong_operand_count() {
        let mut builder = CircuitBuilder::new(3, 0);
        let err = builder.append(Opcode::SWAP, &[0], &[], &[]).unwrap_err();
        assert!(matches!(err, CircuitError::QubitCountMismatch { required: 2, .. }));
    }

    #[test]
    fn test_non_finite_parameter_rejected() {
        let mut builder = CircuitBuilder::new(1, 0);
        assert!(matches!(
            builder.rotation_y(0, f64::NAN),
            Err(CircuitError::NonFiniteParameter(_))
        ));
    }

    #[test]
    fn test_measure_validates_both_registers() {
        let mut builder = CircuitBuilder::new(2, 1);
        assert!(matches!(
            builder.measure(2, 0),
            Err(CircuitError::InvalidQubitIndex { index: 2, total: 2 })
        ));
        assert!(matches!(
            builder.measure(0, 1),
            Err(CircuitError::InvalidClassicalBitIndex { index: 1, total: 1 })
        ));
    }

    #[test]
    fn test_gate_after_measurement_rejected() {
        let mut builder = CircuitBuilder::new(2, 1);
        builder.measure(0, 0).unwrap();
        assert!(builder.hadamard(1).is_ok());
        assert_eq!(
            builder.controlled_not(1, 0).unwrap_err(),
            CircuitError::GateAfterMeasurement {
                qubit: 0,
                opcode: Opcode::CX
            }
        );
    }

    #[test]
    fn test_failed_append_leaves_builder_untouched() {
        let mut builder = CircuitBuilder::new(2, 0);
        builder.hadamard(0).unwrap();
        let _ = builder.hadamard(7);
        assert_eq!(builder.instruction_count(), 1);
    }

    #[test]
    fn test_append_inverse_reverses_and_inverts() {
        let mut forward = CircuitBuilder::new(2, 0);
        forward
            .hadamard(0)
            .unwrap()
            .controlled_u3(0, 1, 0.5, 0.25, -0.75)
            .unwrap()
            .rotation_z(1, 0.3)
            .unwrap();
        let forward_instructions = forward.instructions().to_vec();

        let mut builder = CircuitBuilder::new(2, 0);
        builder.append_inverse_of(&forward_instructions).unwrap();
        let inverse = builder.finalize();
        let gates: Vec<_> = inverse.gates().collect();

        assert_eq!(gates[0].opcode, Opcode::RZ);
        assert_eq!(gates[0].parameters, vec![-0.3]);
        assert_eq!(gates[1].opcode, Opcode::CU3);
        assert_eq!(gates[1].parameters, vec![-0.5, 0.75, -0.25]);
        assert_eq!(gates[2].opcode, Opcode::H);
    }

    #[test]
    fn test_measurement_is_not_invertible() {
        let mut builder = CircuitBuilder::new(1, 1);
        let measurement = [Instruction::Measure {
            quantum_bit: 0,
            classical_bit: 0,
        }];
        assert_eq!(
            builder.append_inverse_of(&measurement).unwrap_err(),
            CircuitError::MeasurementNotInvertible(0)
        );
    }

    #[test]
    fn test_with_limit() {
        assert!(CircuitBuilder::with_limit(4, 0, 4).is_ok());
        assert_eq!(
            CircuitBuilder::with_limit(5, 0, 4).unwrap_err(),
            CircuitError::CircuitTooLarge { qubits: 5, max: 4 }
        );
    }

    #[test]
    fn test_json_round_trip_keeps_identity() {
        let mut builder = CircuitBuilder::new(2, 1);
        builder.rotation_y(0, 0.4).unwrap().controlled_not(0, 1).unwrap();
        builder.measure(1, 0).unwrap();
        let circuit = builder.finalize();

        let decoded = Circuit::from_json(&circuit.to_json().unwrap()).unwrap();
        assert_eq!(decoded, circuit);
    }

    #[test]
    fn test_json_decoding_revalidates() {
        let source = r#"{
            "number_of_quantum_bits": 1,
            "number_of_classical_bits": 0,
            "instructions": [
                {"kind": "gate", "opcode": "CX", "targets": [0], "controls": [1], "parameters": []}
            ]
        }"#;
        assert_eq!(
            Circuit::from_json(source).unwrap_err(),
            CircuitError::InvalidQubitIndex { index: 1, total: 1 }
        );
    }
}
