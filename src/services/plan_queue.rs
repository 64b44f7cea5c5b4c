//! Bounded worker pool for whole plans.
//!
//! A counted semaphore caps the number of plans in flight. Once the ceiling
//! is reached, admission either waits for a slot (FIFO) or fails fast with
//! [`DomainError::QueueFull`], depending on the [`AdmissionPolicy`].

use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{AdmissionPolicy, QueueConfig};

/// Point-in-time queue figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueStatus {
    /// Submissions waiting for a slot.
    pub queued: usize,
    /// Plans currently running.
    pub active: usize,
    /// Plans finished since start.
    pub completed: usize,
    /// Concurrency ceiling.
    pub max_concurrent: usize,
    /// Waiting submissions allowed.
    pub capacity: usize,
}

#[derive(Debug, Default)]
struct Counters {
    queued: AtomicUsize,
    active: AtomicUsize,
    completed: AtomicUsize,
}

/// Decrements the queued count however the wait ends.
struct QueuedGuard<'a>(&'a AtomicUsize);

impl Drop for QueuedGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Moves a plan from active to completed however the job ends, panics
/// included.
struct ActiveGuard(Arc<Counters>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.active.fetch_sub(1, Ordering::SeqCst);
        self.0.completed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Concurrency-bounded plan executor.
#[derive(Debug)]
pub struct PlanQueue {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    capacity: usize,
    admission: AdmissionPolicy,
    counters: Arc<Counters>,
    closed: AtomicBool,
}

impl PlanQueue {
    pub fn new(max_concurrent: usize, capacity: usize, admission: AdmissionPolicy) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            capacity,
            admission,
            counters: Arc::new(Counters::default()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn from_config(config: &QueueConfig) -> Self {
        Self::new(config.max_concurrent, config.capacity, config.admission)
    }

    /// Admit `job` and start it once a slot is held.
    ///
    /// Returns after admission, not after completion; await the handle for
    /// the job's output.
    pub async fn submit<F, T>(&self, job: F) -> DomainResult<JoinHandle<T>>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DomainError::QueueClosed);
        }

        let permit = match self.admission {
            AdmissionPolicy::Reject => self.semaphore.clone().try_acquire_owned().map_err(|_| {
                warn!(max_concurrent = self.max_concurrent, "plan rejected, queue at ceiling");
                DomainError::QueueFull(self.max_concurrent)
            })?,
            AdmissionPolicy::Block => match self.semaphore.clone().try_acquire_owned() {
                Ok(permit) => permit,
                Err(_) => {
                    let waiting = self.counters.queued.fetch_add(1, Ordering::SeqCst);
                    let _guard = QueuedGuard(&self.counters.queued);
                    if waiting >= self.capacity {
                        warn!(capacity = self.capacity, "plan rejected, wait queue full");
                        return Err(DomainError::QueueFull(self.capacity));
                    }
                    self.semaphore
                        .clone()
                        .acquire_owned()
                        .await
                        .map_err(|_| DomainError::QueueClosed)?
                }
            },
        };

        let counters = self.counters.clone();
        counters.active.fetch_add(1, Ordering::SeqCst);
        debug!(active = counters.active.load(Ordering::SeqCst), "plan admitted");

        let guard = ActiveGuard(counters);

        Ok(tokio::spawn(async move {
            let _permit = permit;
            let _guard = guard;
            job.await
        }))
    }

    /// Admit `job` and wait for its output.
    pub async fn run<F, T>(&self, job: F) -> DomainResult<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        self.submit(job).await?.await.map_err(|e| DomainError::InvocationFailed {
            executor: "plan-queue".to_string(),
            reason: e.to_string(),
        })
    }

    pub fn status(&self) -> QueueStatus {
        QueueStatus {
            queued: self.counters.queued.load(Ordering::SeqCst),
            active: self.counters.active.load(Ordering::SeqCst),
            completed: self.counters.completed.load(Ordering::SeqCst),
            max_concurrent: self.max_concurrent,
            capacity: self.capacity,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Stop admitting plans and wait for in-flight plans to finish.
    pub async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let slots = u32::try_from(self.max_concurrent).unwrap_or(u32::MAX);
        if let Ok(all) = self.semaphore.acquire_many(slots).await {
            all.forget();
        }
        self.semaphore.close();
        info!(completed = self.status().completed, "plan queue shut down");
    }
}
