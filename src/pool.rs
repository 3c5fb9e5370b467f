//! Worker pool — fixed-size set of workers draining an unbounded task queue
//!
//! Jobs are boxed futures pushed onto an unbounded FIFO channel; N worker
//! tasks take turns pulling from it. Shutdown closes the channel and joins
//! every worker, which gives a barrier: the channel is FIFO and only closes
//! after everything already scheduled, so every job runs to completion
//! before any worker observes the closed channel and exits.
//!
//! There is deliberately no backpressure: a producer faster than the workers
//! grows the queue without bound, which is acceptable for the moderate,
//! human-generated identifier streams this pipeline consumes.

use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

type Job = BoxFuture<'static, ()>;

/// Fixed-size pool of workers over a shared unbounded FIFO queue
pub struct WorkerPool {
    tx: mpsc::UnboundedSender<Job>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn a pool with `count` workers (clamped to at least 1).
    pub fn new(count: usize) -> Self {
        let (tx, rx) = mpsc::unbounded_channel::<Job>();
        let rx = Arc::new(Mutex::new(rx));
        let workers = (0..count.max(1))
            .map(|index| {
                let rx = Arc::clone(&rx);
                tokio::spawn(worker_loop(index, rx))
            })
            .collect();
        Self { tx, workers }
    }

    /// Enqueue a job without blocking the caller.
    ///
    /// The queue is unbounded, so this only fails after `shutdown` has
    /// closed the channel; such a job is logged and dropped.
    pub fn schedule<F>(&self, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.tx.send(Box::pin(job)).is_err() {
            tracing::error!("Task queue closed, dropping scheduled job");
        }
    }

    /// Close the queue and wait for every worker to drain it and exit.
    ///
    /// All jobs scheduled before this call complete before it returns.
    pub async fn shutdown(self) {
        drop(self.tx);
        for (index, worker) in self.workers.into_iter().enumerate() {
            if let Err(error) = worker.await {
                tracing::error!(worker = index, %error, "Worker exited abnormally");
            }
        }
    }
}

async fn worker_loop(index: usize, rx: Arc<Mutex<mpsc::UnboundedReceiver<Job>>>) {
    loop {
        // Hold the receiver lock only across the dequeue, never while the
        // job runs, so the other workers keep pulling work in parallel.
        let job = { rx.lock().await.recv().await };
        match job {
            Some(job) => job.await,
            None => break,
        }
    }
    tracing::debug!(worker = index, "Worker drained queue and exiting");
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn all_scheduled_jobs_complete_before_shutdown_returns() {
        for workers in [1, 4, 16] {
            let pool = WorkerPool::new(workers);
            let counter = Arc::new(AtomicUsize::new(0));

            for _ in 0..50 {
                let counter = Arc::clone(&counter);
                pool.schedule(async move {
                    // Force a yield so completion actually races shutdown.
                    tokio::time::sleep(Duration::from_millis(1)).await;
                    counter.fetch_add(1, Ordering::SeqCst);
                });
            }

            pool.shutdown().await;
            assert_eq!(
                counter.load(Ordering::SeqCst),
                50,
                "with {workers} workers every job must finish before shutdown"
            );
        }
    }

    #[tokio::test]
    async fn shutdown_with_no_jobs_returns_immediately() {
        let pool = WorkerPool::new(8);
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn zero_worker_request_still_makes_progress() {
        let pool = WorkerPool::new(0);
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);
        pool.schedule(async move {
            c.fetch_add(1, Ordering::SeqCst);
        });
        pool.shutdown().await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn jobs_run_concurrently_up_to_pool_size() {
        let pool = WorkerPool::new(2);
        // Both jobs wait on the same rendezvous; they can only finish if the
        // pool runs them at the same time.
        let barrier = Arc::new(tokio::sync::Barrier::new(2));
        for _ in 0..2 {
            let barrier = Arc::clone(&barrier);
            pool.schedule(async move {
                barrier.wait().await;
            });
        }
        tokio::time::timeout(Duration::from_secs(5), pool.shutdown())
            .await
            .expect("two workers must execute the two jobs in parallel");
    }

    #[tokio::test]
    async fn single_worker_runs_jobs_in_fifo_order() {
        let pool = WorkerPool::new(1);
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..10 {
            let order = Arc::clone(&order);
            pool.schedule(async move {
                order.lock().await.push(i);
            });
        }
        pool.shutdown().await;
        assert_eq!(*order.lock().await, (0..10).collect::<Vec<_>>());
    }

}
