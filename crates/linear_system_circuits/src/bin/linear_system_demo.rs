// =============================================================================
// Linear System Circuits - Linear System Demo
// =============================================================================
// Table of Contents:
//   1. Problem setup and spectrum
//   2. Stage-by-stage composition
//   3. Exact solution
//   4. Sampled swap test and statistics
// =============================================================================
// Purpose: Walks the 2x2 example A = [[1.5, 0.5], [0.5, 1.5]], b = [1, 0]
//          through every stage and prints the recovered solution next to the
//          classical answer. Set RUST_LOG=debug to see per-stage events.
// =============================================================================

use anyhow::Result;
use linear_system_circuits::prelude::*;
use num_complex::Complex64;
use statevector_engine::execution::{CircuitExecutor, SimulationBackendInterface};
use tracing_subscriber::EnvFilter;

const SHOTS: usize = 1000;
const SEED: u64 = 2024;

fn format_vector(vector: &[Complex64; 2]) -> String {
    format!("[{:+.4}, {:+.4}]", vector[0].re, vector[1].re)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║        Linear System Circuits - 2x2 Linear System Demo           ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    // =========================================================================
    // 1. Problem setup and spectrum
    // =========================================================================
    println!("📐 Step 1: Analysing A and b");
    let matrix = HermitianMatrix2::real_symmetric(1.5, 0.5, 1.5)?;
    let vector = [Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)];
    let composer = AlgorithmComposer::new(matrix, vector)?;

    let spectrum = composer.spectrum();
    println!("   Eigenvalues: {:?}", spectrum.eigenvalues);
    for (eigenvalue, eigenvector) in spectrum.eigenvalues.iter().zip(&spectrum.eigenvectors) {
        println!("     λ = {:.1}  v = {}", eigenvalue, format_vector(eigenvector));
    }
    println!();

    // =========================================================================
    // 2. Stage-by-stage composition
    // =========================================================================
    println!("🔧 Step 2: Composing stages");
    let oracle = SpectralInverseSolution;
    for subcircuit in composer.stages(&oracle)? {
        println!(
            "   - {:<22} {:>2} instructions",
            subcircuit.stage.name(),
            subcircuit.instructions.len()
        );
    }
    let circuit = composer.compose(&oracle)?;
    println!("   Circuit ID: {}", circuit.id());
    println!("   Number of quantum bits: {}", circuit.number_of_quantum_bits());
    println!("   Gate count: {}", circuit.gate_count());
    println!();

    // =========================================================================
    // 3. Exact solution
    // =========================================================================
    let backend = CircuitExecutor::new();
    println!("⚡ Step 3: Running on backend '{}'", backend.backend_name());
    let report = composer.run(&backend, &oracle, SHOTS, SEED)?;
    let classical = oracle.reference_solution(composer.matrix(), composer.vector())?;

    println!("   Post-selected solution: {}", format_vector(&report.solution));
    println!("   Classical solution:     {}", format_vector(&classical));
    println!(
        "   P(rotation ancilla = 1): {:.4}",
        report.rotation_success_probability
    );
    println!();

    // =========================================================================
    // 4. Sampled swap test and statistics
    // =========================================================================
    println!("📊 Step 4: Swap test over {} shots (seed {})", SHOTS, SEED);
    for (bitstring, count) in report.counts.to_bitstring_map() {
        let bar: String = "█".repeat(count * 50 / SHOTS);
        println!("     \"{}\": {:>4} {}", bitstring, count, bar);
    }
    println!(
        "   Rotation successes: {}  Swap successes: {}",
        report.statistics.rotation_successes, report.statistics.swap_successes
    );
    println!("   Post-selection ratio: {:.4}", report.post_selection_ratio()?);
    println!("   Fidelity estimate:    {:.4}", report.fidelity_estimate()?);
    println!();

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║                         Demo Complete                            ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    Ok(())
}
