// =============================================================================
// Linear System Circuits - Measurement Module
// =============================================================================
// Table of Contents:
//   1. ClassicalRegisterMap - Classical bit to qubit bindings
//   2. Exact probabilities
//   3. CountsTable - Outcome histogram
//   4. Categorical sampling
//   5. Partitioned sampling (sequential or rayon)
// =============================================================================
// Purpose: Reads measurement statistics out of an amplitude buffer without
//          collapsing it. Each shot is an independent draw from the joint
//          distribution of the measured classical bits, which matches
//          rerunning the whole circuit once per shot.
// =============================================================================

use crate::circuit_program::Instruction;
use crate::error::MeasurementError;
use crate::state_backend::QuantumStateVector;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// 1. ClassicalRegisterMap - Classical bit to qubit bindings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassicalRegisterMap {
    bound_quantum_bits: Vec<Option<usize>>,
}

impl ClassicalRegisterMap {
    pub fn new(number_of_classical_bits: usize) -> Self {
        Self {
            bound_quantum_bits: vec![None; number_of_classical_bits],
        }
    }

    /// Collects measurement declarations; later declarations on the same
    /// classical bit win.
    pub fn from_instructions(number_of_classical_bits: usize, instructions: &[Instruction]) -> Self {
        let mut map = Self::new(number_of_classical_bits);
        for instruction in instructions {
            if let Instruction::Measure {
                quantum_bit,
                classical_bit,
            } = instruction
            {
                map.bind(*classical_bit, *quantum_bit);
            }
        }
        map
    }

    pub fn bind(&mut self, classical_bit: usize, quantum_bit: usize) {
        if let Some(slot) = self.bound_quantum_bits.get_mut(classical_bit) {
            *slot = Some(quantum_bit);
        }
    }

    pub fn number_of_classical_bits(&self) -> usize {
        self.bound_quantum_bits.len()
    }

    pub fn quantum_bit_for(&self, classical_bit: usize) -> Option<usize> {
        self.bound_quantum_bits.get(classical_bit).copied().flatten()
    }

    fn resolved(&self, number_of_quantum_bits: usize) -> Result<Vec<usize>, MeasurementError> {
        self.bound_quantum_bits
            .iter()
            .enumerate()
            .map(|(classical_bit, slot)| match slot {
                None => Err(MeasurementError::UnboundClassicalBit(classical_bit)),
                Some(qubit) if *qubit >= number_of_quantum_bits => {
                    Err(MeasurementError::QubitIndexOutOfRange {
                        index: *qubit,
                        total: number_of_quantum_bits,
                    })
                }
                Some(qubit) => Ok(*qubit),
            })
            .collect()
    }
}

// =============================================================================
// 2. Exact probabilities
// =============================================================================

pub fn probability_of(
    state: &QuantumStateVector,
    qubit: usize,
    value: bool,
) -> Result<f64, MeasurementError> {
    let total = state.number_of_quantum_bits();
    if qubit >= total {
        return Err(MeasurementError::QubitIndexOutOfRange {
            index: qubit,
            total,
        });
    }
    let mask = 1usize << qubit;
    Ok(state
        .amplitudes()
        .iter()
        .enumerate()
        .filter(|(index, _)| ((index & mask) != 0) == value)
        .map(|(_, amp)| amp.norm_sqr())
        .sum())
}

/// Exact distribution over the 2^M classical outcomes, marginalizing every
/// unmeasured qubit. Entry `k` has classical bit `i` equal to bit `i` of `k`.
pub fn outcome_distribution(
    state: &QuantumStateVector,
    register: &ClassicalRegisterMap,
) -> Result<Vec<f64>, MeasurementError> {
    let number_of_classical_bits = register.number_of_classical_bits();
    if number_of_classical_bits >= u64::BITS as usize {
        return Err(MeasurementError::ClassicalRegisterTooWide(number_of_classical_bits));
    }
    let quantum_bits = register.resolved(state.number_of_quantum_bits())?;

    let mut distribution = vec![0.0; 1usize << number_of_classical_bits];
    for (index, amp) in state.amplitudes().iter().enumerate() {
        let outcome = quantum_bits
            .iter()
            .enumerate()
            .fold(0usize, |acc, (classical_bit, qubit)| {
                acc | (((index >> qubit) & 1) << classical_bit)
            });
        distribution[outcome] += amp.norm_sqr();
    }
    Ok(distribution)
}

// =============================================================================
// 3. CountsTable - Outcome histogram
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountsTable {
    number_of_classical_bits: usize,
    counts: BTreeMap<u64, usize>,
    total_shots: usize,
}

impl CountsTable {
    pub fn new(number_of_classical_bits: usize) -> Self {
        Self {
            number_of_classical_bits,
            counts: BTreeMap::new(),
            total_shots: 0,
        }
    }

    pub fn record(&mut self, outcome: u64, occurrences: usize) {
        if occurrences == 0 {
            return;
        }
        *self.counts.entry(outcome).or_insert(0) += occurrences;
        self.total_shots += occurrences;
    }

    pub fn merge(&mut self, other: &CountsTable) {
        for (&outcome, &occurrences) in &other.counts {
            self.record(outcome, occurrences);
        }
    }

    pub fn number_of_classical_bits(&self) -> usize {
        self.number_of_classical_bits
    }

    pub fn total_shots(&self) -> usize {
        self.total_shots
    }

    pub fn distinct_outcomes(&self) -> usize {
        self.counts.len()
    }

    pub fn count_of(&self, outcome: u64) -> usize {
        self.counts.get(&outcome).copied().unwrap_or(0)
    }

    /// Count for an MSB-first bitstring: the leftmost character is the
    /// highest classical bit.
    pub fn count_of_bitstring(&self, bitstring: &str) -> Result<usize, MeasurementError> {
        Ok(self.count_of(self.parse_bitstring(bitstring)?))
    }

    pub fn probability_of(&self, outcome: u64) -> f64 {
        if self.total_shots == 0 {
            return 0.0;
        }
        self.count_of(outcome) as f64 / self.total_shots as f64
    }

    pub fn most_frequent(&self) -> Option<(u64, usize)> {
        self.counts
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
            .map(|(&outcome, &count)| (outcome, count))
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, usize)> + '_ {
        self.counts.iter().map(|(&outcome, &count)| (outcome, count))
    }

    pub fn format_outcome(&self, outcome: u64) -> String {
        (0..self.number_of_classical_bits)
            .rev()
            .map(|bit| if (outcome >> bit) & 1 == 1 { '1' } else { '0' })
            .collect()
    }

    pub fn parse_bitstring(&self, bitstring: &str) -> Result<u64, MeasurementError> {
        let invalid = || MeasurementError::InvalidBitstring {
            bitstring: bitstring.to_string(),
            expected: self.number_of_classical_bits,
        };
        if bitstring.len() != self.number_of_classical_bits {
            return Err(invalid());
        }
        bitstring.chars().try_fold(0u64, |acc, c| match c {
            '0' => Ok(acc << 1),
            '1' => Ok((acc << 1) | 1),
            _ => Err(invalid()),
        })
    }

    pub fn to_bitstring_map(&self) -> BTreeMap<String, usize> {
        self.iter()
            .map(|(outcome, count)| (self.format_outcome(outcome), count))
            .collect()
    }
}

impl fmt::Display for CountsTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (position, (outcome, count)) in self.iter().enumerate() {
            if position > 0 {
                write!(f, ", ")?;
            }
            write!(f, "\"{}\": {}", self.format_outcome(outcome), count)?;
        }
        write!(f, "}}")
    }
}

// =============================================================================
// 4. Categorical sampling
// =============================================================================

struct CumulativeDistribution {
    cumulative: Vec<f64>,
    last_supported: usize,
}

impl CumulativeDistribution {
    fn new(distribution: &[f64]) -> Result<Self, MeasurementError> {
        let mut cumulative = Vec::with_capacity(distribution.len());
        let mut running = 0.0;
        let mut last_supported = None;
        for (outcome, &probability) in distribution.iter().enumerate() {
            running += probability;
            cumulative.push(running);
            if probability > 0.0 {
                last_supported = Some(outcome);
            }
        }
        let last_supported = last_supported.ok_or(MeasurementError::DegenerateDistribution)?;
        Ok(Self {
            cumulative,
            last_supported,
        })
    }

    fn total(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Draws relative to the accumulated total, so a buffer whose norm has
    /// drifted slightly still samples the right proportions.
    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        let target = rng.r#gen::<f64>() * self.total();
        let outcome = self.cumulative.partition_point(|&c| c <= target);
        outcome.min(self.last_supported) as u64
    }
}

pub fn sample<R: Rng + ?Sized>(
    state: &QuantumStateVector,
    register: &ClassicalRegisterMap,
    shots: usize,
    rng: &mut R,
) -> Result<CountsTable, MeasurementError> {
    if shots == 0 {
        return Err(MeasurementError::InvalidShotCount(shots));
    }
    let distribution = outcome_distribution(state, register)?;
    let cumulative = CumulativeDistribution::new(&distribution)?;
    Ok(draw_counts(&cumulative, register.number_of_classical_bits(), shots, rng))
}

fn draw_counts<R: Rng + ?Sized>(
    cumulative: &CumulativeDistribution,
    number_of_classical_bits: usize,
    shots: usize,
    rng: &mut R,
) -> CountsTable {
    let mut raw_counts = vec![0usize; cumulative.cumulative.len()];
    for _ in 0..shots {
        raw_counts[cumulative.draw(rng) as usize] += 1;
    }
    let mut counts = CountsTable::new(number_of_classical_bits);
    for (outcome, &occurrences) in raw_counts.iter().enumerate() {
        counts.record(outcome as u64, occurrences);
    }
    counts
}

// =============================================================================
// 5. Partitioned sampling (sequential or rayon)
// =============================================================================

/// Splits `shots` into `partitions` blocks, each drawn from its own RNG
/// seeded from `seed`. The merged table depends only on the seed and the
/// partition count, never on whether the blocks ran in parallel.
pub fn sample_partitioned(
    state: &QuantumStateVector,
    register: &ClassicalRegisterMap,
    shots: usize,
    seed: u64,
    partitions: usize,
    run_in_parallel: bool,
) -> Result<CountsTable, MeasurementError> {
    if shots == 0 {
        return Err(MeasurementError::InvalidShotCount(shots));
    }
    let distribution = outcome_distribution(state, register)?;
    let cumulative = CumulativeDistribution::new(&distribution)?;
    let number_of_classical_bits = register.number_of_classical_bits();

    let partitions = partitions.clamp(1, shots);
    let mut seeder = StdRng::seed_from_u64(seed);
    let blocks: Vec<(usize, u64)> = (0..partitions)
        .map(|block| {
            let block_shots = shots / partitions + usize::from(block < shots % partitions);
            (block_shots, seeder.next_u64())
        })
        .collect();

    let draw_block = |&(block_shots, block_seed): &(usize, u64)| {
        let mut rng = StdRng::seed_from_u64(block_seed);
        draw_counts(&cumulative, number_of_classical_bits, block_shots, &mut rng)
    };

    let partial_tables = collect_blocks(&blocks, draw_block, run_in_parallel);

    let mut counts = CountsTable::new(number_of_classical_bits);
    for table in &partial_tables {
        counts.merge(table);
    }
    Ok(counts)
}

#[cfg(feature = "parallel")]
fn collect_blocks<F>(blocks: &[(usize, u64)], draw_block: F, run_in_parallel: bool) -> Vec<CountsTable>
where
    F: Fn(&(usize, u64)) -> CountsTable + Sync + Send,
{
    use rayon::prelude::*;
    if run_in_parallel {
        blocks.par_iter().map(draw_block).collect()
    } else {
        blocks.iter().map(draw_block).collect()
    }
}

#[cfg(not(feature = "parallel"))]
fn collect_blocks<F>(blocks: &[(usize, u64)], draw_block: F, _run_in_parallel: bool) -> Vec<CountsTable>
where
    F: Fn(&(usize, u64)) -> CountsTable,
{
    blocks.iter().map(draw_block).collect()
}
