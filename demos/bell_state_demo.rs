// =============================================================================
// Linear System Circuits - Bell State Demo
// =============================================================================
// Table of Contents:
//   1. Circuit construction with the builder
//   2. Exact execution
//   3. Sampled execution
//   4. Async job submission
// =============================================================================
// Purpose: Demonstrates the engine on its own: build, validate, run exactly,
//          sample with a fixed seed, and submit the same circuit as an async
//          job.
// =============================================================================

use statevector_engine::prelude::*;

#[tokio::main]
async fn main() -> QuantumResult<()> {
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║        Linear System Circuits - Bell State Demonstration         ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    // =========================================================================
    // 1. Circuit construction with the builder
    // =========================================================================
    println!("📐 Step 1: Building the Bell circuit");
    println!("   - hadamard on qubit 0");
    println!("   - controlled_not with control=0, target=1");
    println!();

    let mut builder = CircuitBuilder::new(2, 2);
    builder.hadamard(0)?.controlled_not(0, 1)?;
    builder.measure(0, 0)?.measure(1, 1)?;

    match builder.clone().hadamard(2) {
        Err(error) => println!("   Rejected out-of-range gate: {}", error),
        Ok(_) => println!("   Unexpectedly accepted qubit 2"),
    }

    let circuit = builder.finalize();
    println!("   Circuit ID: {}", circuit.id());
    println!("   Number of quantum bits: {}", circuit.number_of_quantum_bits());
    println!("   Gate count: {}", circuit.gate_count());
    println!();

    // =========================================================================
    // 2. Exact execution
    // =========================================================================
    println!("⚡ Step 2: Exact amplitudes");
    let executor = CircuitExecutor::new();
    let state = executor.run_exact(&circuit)?;
    for (index, amplitude) in state.amplitudes().iter().enumerate() {
        println!("     |{:02b}⟩: {:+.4}{:+.4}i", index, amplitude.re, amplitude.im);
    }
    println!();

    // =========================================================================
    // 3. Sampled execution
    // =========================================================================
    println!("📊 Step 3: 1000 shots, seed 7");
    let result = executor.execute(&circuit, 1000, 7)?;
    for (bitstring, count) in result.counts.to_bitstring_map() {
        let bar: String = "█".repeat(count / 20);
        println!("     \"{}\": {:>4} {}", bitstring, count, bar);
    }
    println!("   Elapsed: {} µs", result.execution_time_microseconds);
    println!();

    // =========================================================================
    // 4. Async job submission
    // =========================================================================
    println!("🔧 Step 4: Async job");
    let engine = AsyncExecutionEngine::new(executor);
    let job = engine.submit_sampled(circuit, 1000, 7);
    let job_id = job.job_id();
    let async_result = job.await_result().await?;
    println!("   Job {} -> {:?}", job_id, engine.job_status(job_id));
    println!("   Same counts as sync run: {}", async_result.counts == result.counts);
    println!();

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║                         Demo Complete                            ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    Ok(())
}
