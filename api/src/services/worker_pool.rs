//! Bounded Worker Pool
//!
//! Proving and verification are CPU-bound and must not run on the async
//! executor. Each unit of work takes a semaphore permit, then runs under
//! `spawn_blocking` with the permit moved into the closure, so at most
//! `size` units compute at once regardless of how many requests are queued.
//!
//! # Cancellation
//!
//! The caller's timeout covers queueing and computation. On expiry the
//! caller gets [`ServiceError::Cancelled`]; a unit that already started
//! keeps its permit until it finishes and its result is dropped. Groth16
//! proving has no safe abort point.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::error::ServiceError;

#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    /// `size` is clamped to at least one worker
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Workers not currently running a unit
    pub fn idle(&self) -> usize {
        self.permits.available_permits()
    }

    /// Run `job` on a blocking worker, giving up after `timeout`.
    ///
    /// Queueing counts against `timeout`. On expiry the job still runs to
    /// completion and its result is discarded.
    pub async fn run<F, T>(&self, timeout: Duration, job: F) -> Result<T, ServiceError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        match tokio::time::timeout(timeout, self.execute(job)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(timeout_ms = timeout.as_millis() as u64, "Work unit timed out");
                Err(ServiceError::Cancelled(timeout))
            }
        }
    }

    /// Run `job` on a blocking worker and wait for it however long it takes.
    pub async fn execute<F, T>(&self, job: F) -> Result<T, ServiceError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ServiceError::WorkerPanicked("worker pool closed".to_string()))?;

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job()
        })
        .await
        .map_err(|e| {
            if e.is_panic() {
                tracing::error!("Worker panicked: {}", e);
            }
            ServiceError::WorkerPanicked(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    #[tokio::test]
    async fn test_runs_job() {
        let pool = WorkerPool::new(2);
        let value = pool.run(Duration::from_secs(5), || 6 * 7).await.unwrap();
        assert_eq!(value, 42);
        assert_eq!(pool.idle(), 2);
    }

    #[tokio::test]
    async fn test_execute_waits_for_completion() {
        let pool = WorkerPool::new(1);
        let value = pool
            .execute(|| {
                std::thread::sleep(Duration::from_millis(50));
                7
            })
            .await
            .unwrap();
        assert_eq!(value, 7);
        assert_eq!(pool.idle(), 1);
    }

    #[tokio::test]
    async fn test_timeout_reports_cancelled() {
        let pool = WorkerPool::new(1);
        let result = pool
            .run(Duration::from_millis(20), || {
                std::thread::sleep(Duration::from_millis(300));
                "late"
            })
            .await;

        assert!(matches!(result, Err(ServiceError::Cancelled(d)) if d == Duration::from_millis(20)));
    }

    #[tokio::test]
    async fn test_queue_wait_counts_against_timeout() {
        let pool = WorkerPool::new(1);

        let busy = pool.clone();
        let blocker = tokio::spawn(async move {
            busy.run(Duration::from_secs(5), || {
                std::thread::sleep(Duration::from_millis(300));
            })
            .await
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Never gets a worker within its budget
        let queued = pool.run(Duration::from_millis(20), || ()).await;
        assert!(matches!(queued, Err(ServiceError::Cancelled(_))));

        blocker.await.unwrap().unwrap();
        assert_eq!(pool.idle(), 1);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let pool = WorkerPool::new(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pool = pool.clone();
                let running = running.clone();
                let peak = peak.clone();
                tokio::spawn(async move {
                    pool.run(Duration::from_secs(10), move || {
                        let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        std::thread::sleep(Duration::from_millis(30));
                        running.fetch_sub(1, Ordering::SeqCst);
                    })
                    .await
                })
            })
            .collect();

        let started = Instant::now();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
        // 8 jobs of 30ms on 2 workers take at least 4 rounds
        assert!(started.elapsed() >= Duration::from_millis(120));
    }

    #[tokio::test]
    async fn test_panicking_job_is_an_error() {
        let pool = WorkerPool::new(1);
        let result: Result<(), _> = pool
            .run(Duration::from_secs(5), || panic!("boom"))
            .await;
        assert!(matches!(result, Err(ServiceError::WorkerPanicked(_))));

        // Permit was released by the unwinding worker
        assert_eq!(pool.idle(), 1);
    }
}
