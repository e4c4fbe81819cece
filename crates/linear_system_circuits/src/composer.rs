// =============================================================================
// Linear System Circuits - Algorithm Composer
// =============================================================================
// Table of Contents:
//   1. QubitLayout - Shared qubit and classical bit roles
//   2. CompositionStage / Subcircuit - Named instruction blocks
//   3. AlgorithmComposer - Stage builders
//   4. Circuit assembly
//   5. LinearSystemReport - Exact and sampled results
// =============================================================================
// Purpose: Builds the 2x2 linear-system circuit as named stages over one
//          qubit layout: load b, phase-estimate e^{iAt} into a two-qubit
//          clock, swap the clock bits to turn {1, 2} into their reciprocals,
//          rotate an ancilla by C/lambda, uncompute the clock, and compare the
//          work qubit against a reference state with a swap test.
// =============================================================================

use crate::error::SolverResult;
use crate::hermitian::{
    max_entry_distance, pauli_x, EigenDecomposition, HermitianMatrix2, SingleQubitDecomposition,
    HERMITIAN_TOLERANCE,
};
use crate::state_preparation::{normalize_pair, ReferenceSolutionOracle, StatePreparation, ANGLE_TOLERANCE};
use crate::statistics::{post_selected_state, PostSelectionStatistics};

use num_complex::Complex64;
use serde::Serialize;
use statevector_engine::circuit_program::{Circuit, CircuitBuilder, Instruction};
use statevector_engine::error::CircuitError;
use statevector_engine::execution::SimulationBackendInterface;
use statevector_engine::measurement::{self, CountsTable};
use std::f64::consts::FRAC_PI_2;

/// Evolution time t in U = e^{iAt}; maps eigenvalues 1 and 2 onto clock values 1 and 2.
pub const EVOLUTION_TIME: f64 = FRAC_PI_2;

/// C in the rotation amplitude C / lambda.
pub const ROTATION_CONSTANT: f64 = 1.0;

// =============================================================================
// 1. QubitLayout - Shared qubit and classical bit roles
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QubitLayout {
    pub rotation_ancilla: usize,
    /// clock[j] carries weight 2^j.
    pub clock: [usize; 2],
    pub work: usize,
    pub reference: usize,
    pub swap_ancilla: usize,
    pub rotation_classical_bit: usize,
    pub swap_classical_bit: usize,
}

impl Default for QubitLayout {
    fn default() -> Self {
        Self {
            rotation_ancilla: 0,
            clock: [1, 2],
            work: 3,
            reference: 4,
            swap_ancilla: 5,
            rotation_classical_bit: 0,
            swap_classical_bit: 1,
        }
    }
}

impl QubitLayout {
    pub fn quantum_bits(&self) -> [usize; 6] {
        [
            self.rotation_ancilla,
            self.clock[0],
            self.clock[1],
            self.work,
            self.reference,
            self.swap_ancilla,
        ]
    }

    pub fn number_of_quantum_bits(&self) -> usize {
        self.quantum_bits().iter().max().map_or(0, |highest| highest + 1)
    }

    pub fn number_of_classical_bits(&self) -> usize {
        self.rotation_classical_bit.max(self.swap_classical_bit) + 1
    }

    /// Every role needs its own qubit, and the two readouts their own bits.
    pub fn validate(&self) -> Result<(), CircuitError> {
        let qubits = self.quantum_bits();
        for (position, qubit) in qubits.iter().enumerate() {
            if qubits[..position].contains(qubit) {
                return Err(CircuitError::DuplicateQubit(*qubit));
            }
        }
        if self.rotation_classical_bit == self.swap_classical_bit {
            return Err(CircuitError::InvalidClassicalBitIndex {
                index: self.swap_classical_bit,
                total: self.number_of_classical_bits(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// 2. CompositionStage / Subcircuit - Named instruction blocks
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompositionStage {
    StatePreparation,
    PhaseEstimation,
    ConditionalRotation,
    Uncomputation,
    SwapTest,
}

impl CompositionStage {
    pub fn name(self) -> &'static str {
        match self {
            CompositionStage::StatePreparation => "state_preparation",
            CompositionStage::PhaseEstimation => "phase_estimation",
            CompositionStage::ConditionalRotation => "conditional_rotation",
            CompositionStage::Uncomputation => "uncomputation",
            CompositionStage::SwapTest => "swap_test",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Subcircuit {
    pub stage: CompositionStage,
    pub instructions: Vec<Instruction>,
}

// =============================================================================
// 3. AlgorithmComposer - Stage builders
// =============================================================================

#[derive(Debug, Clone)]
pub struct AlgorithmComposer {
    matrix: HermitianMatrix2,
    vector: [Complex64; 2],
    spectrum: EigenDecomposition,
    layout: QubitLayout,
}

impl AlgorithmComposer {
    /// Accepts any Hermitian `matrix` with eigenvalues exactly {1, 2}; `vector`
    /// is normalized.
    pub fn new(matrix: HermitianMatrix2, vector: [Complex64; 2]) -> SolverResult<Self> {
        let spectrum = matrix.require_eigenvalues_one_and_two()?;
        Ok(Self {
            matrix,
            vector: normalize_pair(vector)?,
            spectrum,
            layout: QubitLayout::default(),
        })
    }

    pub fn with_layout(mut self, layout: QubitLayout) -> SolverResult<Self> {
        layout.validate()?;
        self.layout = layout;
        Ok(self)
    }

    pub fn matrix(&self) -> &HermitianMatrix2 {
        &self.matrix
    }

    pub fn vector(&self) -> [Complex64; 2] {
        self.vector
    }

    pub fn spectrum(&self) -> &EigenDecomposition {
        &self.spectrum
    }

    pub fn layout(&self) -> &QubitLayout {
        &self.layout
    }

    fn scratch_builder(&self) -> CircuitBuilder {
        CircuitBuilder::new(
            self.layout.number_of_quantum_bits(),
            self.layout.number_of_classical_bits(),
        )
    }

    fn finish(stage: CompositionStage, builder: CircuitBuilder) -> Subcircuit {
        Subcircuit {
            stage,
            instructions: builder.instructions().to_vec(),
        }
    }

    pub fn state_preparation(&self) -> SolverResult<Subcircuit> {
        let mut builder = self.scratch_builder();
        StatePreparation::for_vector(self.vector)?.append_to(&mut builder, self.layout.work)?;
        Ok(Self::finish(CompositionStage::StatePreparation, builder))
    }

    /// Controlled-U^{2^j} on clock[j], inverse QFT, then the reciprocal clock swap.
    pub fn phase_estimation(&self) -> SolverResult<Subcircuit> {
        let [low, high] = self.layout.clock;
        let mut builder = self.scratch_builder();
        builder.hadamard(low)?.hadamard(high)?;

        for (exponent, &control) in self.layout.clock.iter().enumerate() {
            self.append_controlled_evolution(&mut builder, control, 1 << exponent)?;
        }

        builder
            .swap(low, high)?
            .hadamard(low)?
            .controlled_phase(low, high, -FRAC_PI_2)?
            .hadamard(high)?;

        // Clock value 1 <-> 2, i.e. lambda -> 2 / lambda for lambda in {1, 2}.
        builder.swap(low, high)?;
        Ok(Self::finish(CompositionStage::PhaseEstimation, builder))
    }

    /// Appends controlled-U^power, U = e^{iAt}, as CU3 plus a controlled
    /// global phase, or as a bare CX when U^power is Pauli-X.
    fn append_controlled_evolution(
        &self,
        builder: &mut CircuitBuilder,
        control: usize,
        power: u32,
    ) -> Result<(), CircuitError> {
        let target = self.layout.work;
        let unitary = self.matrix.evolution_operator(EVOLUTION_TIME * f64::from(power));

        if max_entry_distance(&unitary, &pauli_x()) < HERMITIAN_TOLERANCE {
            builder.controlled_not(control, target)?;
            return Ok(());
        }

        let angles = SingleQubitDecomposition::from_unitary(&unitary);
        builder.controlled_u3(control, target, angles.theta, angles.phi, angles.lambda)?;
        if angles.global_phase.abs() > ANGLE_TOLERANCE {
            builder
                .controlled_not(control, target)?
                .controlled_phase(control, target, angles.global_phase)?
                .controlled_not(control, target)?
                .controlled_phase(control, target, angles.global_phase)?;
        }
        Ok(())
    }

    pub fn conditional_rotation(&self) -> SolverResult<Subcircuit> {
        let mut builder = self.scratch_builder();
        for (exponent, &control) in self.layout.clock.iter().enumerate().rev() {
            // clock[j] set means 2 / lambda = 2^j.
            let amplitude = ROTATION_CONSTANT * f64::from(1u32 << exponent) / 2.0;
            let theta = 2.0 * amplitude.asin();
            builder.controlled_u3(control, self.layout.rotation_ancilla, theta, 0.0, 0.0)?;
        }
        Ok(Self::finish(CompositionStage::ConditionalRotation, builder))
    }

    /// The exact inverse of `phase_estimation`, returning the clock to |00>.
    pub fn uncomputation(&self, phase_estimation: &Subcircuit) -> SolverResult<Subcircuit> {
        let mut builder = self.scratch_builder();
        builder.append_inverse_of(&phase_estimation.instructions)?;
        Ok(Self::finish(CompositionStage::Uncomputation, builder))
    }

    pub fn swap_test(&self, reference: [Complex64; 2]) -> SolverResult<Subcircuit> {
        let layout = &self.layout;
        let mut builder = self.scratch_builder();
        StatePreparation::for_vector(reference)?.append_to(&mut builder, layout.reference)?;

        builder
            .hadamard(layout.swap_ancilla)?
            .controlled_not(layout.reference, layout.work)?
            .toffoli(layout.swap_ancilla, layout.work, layout.reference)?
            .controlled_not(layout.reference, layout.work)?
            .hadamard(layout.swap_ancilla)?;

        builder
            .measure(layout.rotation_ancilla, layout.rotation_classical_bit)?
            .measure(layout.swap_ancilla, layout.swap_classical_bit)?;
        Ok(Self::finish(CompositionStage::SwapTest, builder))
    }

    // =========================================================================
    // 4. Circuit assembly
    // =========================================================================

    pub fn solution_stages(&self) -> SolverResult<Vec<Subcircuit>> {
        let phase_estimation = self.phase_estimation()?;
        let uncomputation = self.uncomputation(&phase_estimation)?;
        Ok(vec![
            self.state_preparation()?,
            phase_estimation,
            self.conditional_rotation()?,
            uncomputation,
        ])
    }

    pub fn stages(&self, oracle: &dyn ReferenceSolutionOracle) -> SolverResult<Vec<Subcircuit>> {
        let reference = oracle.reference_solution(&self.matrix, self.vector)?;
        let mut stages = self.solution_stages()?;
        stages.push(self.swap_test(reference)?);
        Ok(stages)
    }

    fn assemble(&self, stages: &[Subcircuit], number_of_classical_bits: usize) -> SolverResult<CircuitBuilder> {
        let mut builder =
            CircuitBuilder::new(self.layout.number_of_quantum_bits(), number_of_classical_bits);
        for subcircuit in stages {
            builder.append_instructions(&subcircuit.instructions)?;
            tracing::debug!(
                stage = subcircuit.stage.name(),
                instructions = subcircuit.instructions.len(),
                "stage appended"
            );
        }
        Ok(builder)
    }

    /// The circuit up to uncomputation, with only the rotation ancilla measured.
    /// Its exact final state holds the post-selected solution.
    pub fn compose_solution_circuit(&self) -> SolverResult<Circuit> {
        let mut builder = self.assemble(&self.solution_stages()?, 1)?;
        builder.measure(self.layout.rotation_ancilla, 0)?;
        Ok(builder.finalize())
    }

    pub fn compose(&self, oracle: &dyn ReferenceSolutionOracle) -> SolverResult<Circuit> {
        let builder = self.assemble(&self.stages(oracle)?, self.layout.number_of_classical_bits())?;
        Ok(builder.finalize())
    }

    // =========================================================================
    // 5. LinearSystemReport - Exact and sampled results
    // =========================================================================

    pub fn run(
        &self,
        backend: &dyn SimulationBackendInterface,
        oracle: &dyn ReferenceSolutionOracle,
        shots: usize,
        seed: u64,
    ) -> SolverResult<LinearSystemReport> {
        let solution_circuit = self.compose_solution_circuit()?;
        let final_state = backend.run_exact(&solution_circuit)?;
        let solution = post_selected_state(&final_state, &self.layout)?;
        let rotation_success_probability =
            measurement::probability_of(&final_state, self.layout.rotation_ancilla, true)?;

        let full_circuit = self.compose(oracle)?;
        let counts = backend.run_sampled(&full_circuit, shots, seed)?;
        let statistics = PostSelectionStatistics::from_counts(&counts, &self.layout);

        tracing::info!(
            backend = backend.backend_name(),
            shots,
            rotation_successes = statistics.rotation_successes,
            swap_successes = statistics.swap_successes,
            "linear system run complete"
        );

        Ok(LinearSystemReport {
            backend: backend.backend_name().to_string(),
            solution,
            rotation_success_probability,
            counts,
            statistics,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LinearSystemReport {
    pub backend: String,
    /// Post-selected work-qubit state, global phase fixed.
    pub solution: [Complex64; 2],
    pub rotation_success_probability: f64,
    pub counts: CountsTable,
    pub statistics: PostSelectionStatistics,
}

impl LinearSystemReport {
    pub fn post_selection_ratio(&self) -> SolverResult<f64> {
        self.statistics.ratio()
    }

    pub fn fidelity_estimate(&self) -> SolverResult<f64> {
        self.statistics.fidelity_estimate()
    }
}
