//! Bounded worker pools, one per stage.
//!
//! A pool is a semaphore with in-flight and peak counters. Pools of
//! provider-facing stages also hold the queue's [`CooldownGate`], so new
//! work is not admitted while the queue is paused.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

use super::{CooldownGate, PipelineError, Stage};

/// Semaphore-backed worker pool for one stage.
pub struct StagePool {
    stage: Stage,
    semaphore: Arc<Semaphore>,
    capacity: usize,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: AtomicUsize,
    gate: Option<Arc<CooldownGate>>,
    shutdown: CancellationToken,
}

impl StagePool {
    /// Creates a pool of `capacity` workers (at least one).
    pub fn new(stage: Stage, capacity: usize, shutdown: CancellationToken) -> Self {
        let capacity = capacity.max(1);
        Self {
            stage,
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: AtomicUsize::new(0),
            gate: None,
            shutdown,
        }
    }

    /// Makes admission wait on `gate`.
    pub fn with_gate(mut self, gate: Arc<CooldownGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn gate(&self) -> Option<&Arc<CooldownGate>> {
        self.gate.as_ref()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Highest number of workers ever busy at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::Relaxed)
    }

    /// Waits for the gate to open and a worker slot to free up.
    pub async fn acquire(&self) -> Result<StagePermit, PipelineError> {
        if let Some(gate) = &self.gate {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return Err(PipelineError::ShuttingDown),
                _ = gate.wait_ready() => {}
            }
        }

        let permit = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => return Err(PipelineError::ShuttingDown),
            permit = Arc::clone(&self.semaphore).acquire_owned() => {
                permit.map_err(|_| PipelineError::ShuttingDown)?
            }
        };

        let current = self.in_flight.fetch_add(1, Ordering::Relaxed) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::Relaxed);

        Ok(StagePermit {
            _permit: permit,
            in_flight: Arc::clone(&self.in_flight),
        })
    }
}

/// A busy worker slot; released on drop.
pub struct StagePermit {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for StagePermit {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}
