// =============================================================================
// Linear System Circuits - Async Execution Runtime
// =============================================================================
// Table of Contents:
//   1. AsyncExecutionEngine - Non-blocking circuit submission
//   2. JobStatus - Job registry entries
//   3. SampledJobFuture - Awaitable job handle
// =============================================================================
// Purpose: Lets an async host submit sampled runs without blocking its
//          executor threads. The compute itself stays synchronous and runs on
//          tokio's blocking pool; awaiting the job handle is the only
//          suspension point.
// =============================================================================

use crate::circuit_program::Circuit;
use crate::error::{ExecutionError, QuantumResult, QuantumRuntimeError};
use crate::execution::{CircuitExecutor, ExecutionResult};

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::oneshot;
use uuid::Uuid;

// =============================================================================
// 1. AsyncExecutionEngine - Non-blocking circuit submission
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct AsyncExecutionEngine {
    executor: Arc<CircuitExecutor>,
    jobs: Arc<RwLock<HashMap<Uuid, JobStatus>>>,
}

impl AsyncExecutionEngine {
    pub fn new(executor: CircuitExecutor) -> Self {
        Self {
            executor: Arc::new(executor),
            jobs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn execute_sampled_async(
        &self,
        circuit: Circuit,
        shots: usize,
        seed: u64,
    ) -> QuantumResult<ExecutionResult> {
        self.submit_sampled(circuit, shots, seed).await_result().await
    }

    /// Queues a sampled run and returns immediately. Must be called from
    /// within a tokio runtime.
    pub fn submit_sampled(&self, circuit: Circuit, shots: usize, seed: u64) -> SampledJobFuture {
        let job_id = Uuid::new_v4();
        let (result_tx, result_rx) = oneshot::channel();
        self.jobs.write().insert(job_id, JobStatus::Queued);

        let executor = Arc::clone(&self.executor);
        let jobs = Arc::clone(&self.jobs);

        tokio::spawn(async move {
            set_status(&jobs, job_id, JobStatus::Running);
            let outcome = tokio::task::spawn_blocking(move || executor.execute(&circuit, shots, seed))
                .await
                .map_err(|e| {
                    QuantumRuntimeError::Execution(ExecutionError::AsyncError(e.to_string()))
                })
                .and_then(|result| result);

            let status = match &outcome {
                Ok(_) => JobStatus::Completed,
                Err(e) => {
                    tracing::warn!(job_id = %job_id, error = %e, "sampled job failed");
                    JobStatus::Failed
                }
            };
            set_status(&jobs, job_id, status);
            let _ = result_tx.send(outcome);
        });

        tracing::debug!(job_id = %job_id, shots, "sampled job submitted");
        SampledJobFuture { job_id, result_rx }
    }

    pub fn job_status(&self, job_id: Uuid) -> Option<JobStatus> {
        self.jobs.read().get(&job_id).copied()
    }

    pub fn job_count(&self) -> usize {
        self.jobs.read().len()
    }

    /// Drops finished jobs from the registry, returning how many were removed.
    pub fn clear_finished(&self) -> usize {
        let mut jobs = self.jobs.write();
        let before = jobs.len();
        jobs.retain(|_, status| !status.is_finished());
        before - jobs.len()
    }
}

fn set_status(jobs: &RwLock<HashMap<Uuid, JobStatus>>, job_id: Uuid, status: JobStatus) {
    if let Some(entry) = jobs.write().get_mut(&job_id) {
        *entry = status;
    }
}

// =============================================================================
// 2. JobStatus - Job registry entries
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_finished(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

// =============================================================================
// 3. SampledJobFuture - Awaitable job handle
// =============================================================================

#[derive(Debug)]
pub struct SampledJobFuture {
    job_id: Uuid,
    result_rx: oneshot::Receiver<QuantumResult<ExecutionResult>>,
}

impl SampledJobFuture {
    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    pub async fn await_result(self) -> QuantumResult<ExecutionResult> {
        self.result_rx.await.map_err(|_| {
            QuantumRuntimeError::Execution(ExecutionError::AsyncError(
                "Job result channel closed".to_string(),
            ))
        })?
    }
}
