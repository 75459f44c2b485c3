//! Job handles and the job registry.
//!
//! Every job publishes its [`JobState`] on a watch channel. The worker side
//! holds a [`JobReporter`]; anyone waiting on the job holds a cloneable
//! [`JobHandle`]. A parent job blocks on its child's handle rather than
//! polling or registering callbacks.
//!
//! ```ignore
//! let (handle, reporter) = JobHandle::channel(info);
//! tokio::spawn(async move {
//!     reporter.activate();
//!     reporter.complete();
//! });
//! handle.wait().await?;
//! ```

use dashmap::DashMap;
use tokio::sync::watch;
use tracing::debug;

use super::{JobId, JobInfo, JobState, JobStatus, PipelineError};

/// Cloneable handle for observing and awaiting a job.
#[derive(Clone)]
pub struct JobHandle {
    info: JobInfo,
    state_rx: watch::Receiver<JobState>,
}

impl JobHandle {
    /// Creates a handle and the reporter that drives it.
    pub fn channel(info: JobInfo) -> (JobHandle, JobReporter) {
        let (state_tx, state_rx) = watch::channel(JobState::default());
        debug!(job_id = %info.id, stage = %info.stage, "Job queued");
        (
            JobHandle {
                info: info.clone(),
                state_rx,
            },
            JobReporter { info, state_tx },
        )
    }

    pub fn id(&self) -> JobId {
        self.info.id
    }

    pub fn info(&self) -> &JobInfo {
        &self.info
    }

    /// Current state without waiting.
    pub fn state(&self) -> JobState {
        self.state_rx.borrow().clone()
    }

    pub fn status(&self) -> JobStatus {
        self.state_rx.borrow().status
    }

    /// Waits until the job is terminal.
    ///
    /// A failed job is reported as [`PipelineError::DependencyFailed`]. A
    /// reporter dropped before reaching a terminal state counts as failed.
    pub async fn wait(&self) -> Result<(), PipelineError> {
        let mut rx = self.state_rx.clone();
        let outcome = rx
            .wait_for(|s| s.status.is_terminal())
            .await
            .map(|state| state.clone());
        let state = match outcome {
            Ok(state) => state,
            Err(_) => {
                let last = rx.borrow().clone();
                if last.status.is_terminal() {
                    last
                } else {
                    return Err(PipelineError::DependencyFailed {
                        stage: self.info.stage,
                        reason: "job ended without reporting a result".to_string(),
                    });
                }
            }
        };

        match state.status {
            JobStatus::Done => Ok(()),
            _ => Err(PipelineError::DependencyFailed {
                stage: self.info.stage,
                reason: state.error.unwrap_or_else(|| "unknown error".to_string()),
            }),
        }
    }
}

impl std::fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobHandle")
            .field("job_id", &self.info.id)
            .field("stage", &self.info.stage)
            .field("status", &self.status())
            .finish()
    }
}

/// Worker-side half of a job's state channel.
pub struct JobReporter {
    info: JobInfo,
    state_tx: watch::Sender<JobState>,
}

impl JobReporter {
    pub fn info(&self) -> &JobInfo {
        &self.info
    }

    /// A worker claimed the job.
    pub fn activate(&self) {
        self.state_tx.send_modify(|s| {
            s.status = JobStatus::Active;
            s.attempts += 1;
        });
        debug!(job_id = %self.info.id, stage = %self.info.stage, "Job active");
    }

    /// The job goes back to the queue after a retryable failure.
    pub fn requeue(&self) {
        self.state_tx.send_modify(|s| s.status = JobStatus::Queued);
        debug!(job_id = %self.info.id, stage = %self.info.stage, "Job requeued");
    }

    /// Raises progress to `progress`; lower values are ignored.
    pub fn progress(&self, progress: u8) {
        let progress = progress.min(100);
        self.state_tx.send_if_modified(|s| {
            if progress > s.progress {
                s.progress = progress;
                true
            } else {
                false
            }
        });
    }

    pub fn complete(&self) {
        self.state_tx.send_modify(|s| {
            s.status = JobStatus::Done;
            s.progress = 100;
        });
        debug!(job_id = %self.info.id, stage = %self.info.stage, "Job done");
    }

    pub fn fail(&self, error: &PipelineError) {
        self.state_tx.send_modify(|s| {
            s.status = JobStatus::Failed;
            s.error = Some(error.to_string());
        });
        debug!(job_id = %self.info.id, stage = %self.info.stage, error = %error, "Job failed");
    }

    /// Completes or fails the job from `result`, passing it through.
    pub fn finish<T>(&self, result: Result<T, PipelineError>) -> Result<T, PipelineError> {
        match &result {
            Ok(_) => self.complete(),
            Err(e) => self.fail(e),
        }
        result
    }
}

/// Every job created by an orchestrator, for listings and inspection.
#[derive(Default)]
pub struct JobRegistry {
    jobs: DashMap<JobId, JobHandle>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, handle: &JobHandle) {
        self.jobs.insert(handle.id(), handle.clone());
    }

    pub fn get(&self, id: JobId) -> Option<JobHandle> {
        self.jobs.get(&id).map(|h| h.clone())
    }

    /// All jobs in creation order.
    pub fn jobs(&self) -> Vec<JobHandle> {
        let mut jobs: Vec<JobHandle> = self.jobs.iter().map(|e| e.value().clone()).collect();
        jobs.sort_by_key(|h| h.id());
        jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
