//! Fixed-size worker pool for batch recommendation.
//!
//! Workers are named OS threads consuming a bounded crossbeam queue. Each one
//! holds its own `Arc` to the read-only engine, so no locking is involved on
//! the query path.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, bounded};

use crate::config::WorkerConfig;
use crate::engine::RecommendEngine;
use crate::error::{PoolError, PoolResult};
use crate::types::ApiRecommendation;

struct Task {
    query: String,
    k: usize,
    reply: Sender<Vec<ApiRecommendation>>,
}

/// Reply handle for one submitted query.
#[derive(Debug)]
pub struct PendingRecommendation {
    reply: Receiver<Vec<ApiRecommendation>>,
}

impl PendingRecommendation {
    /// Block until the worker answers.
    pub fn wait(self) -> PoolResult<Vec<ApiRecommendation>> {
        self.reply.recv().map_err(|_| PoolError::WorkerLost)
    }
}

/// Pool of worker threads sharing one engine.
pub struct WorkerPool {
    sender: Option<Sender<Task>>,
    workers: Vec<JoinHandle<()>>,
    /// Tasks completed per worker (for tracing)
    completed: Arc<Vec<AtomicUsize>>,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers.len())
            .field("open", &self.sender.is_some())
            .finish()
    }
}

impl WorkerPool {
    /// Spawn `pool_size` workers (at least one) over a queue of `queue_size` tasks.
    pub fn new(engine: Arc<RecommendEngine>, pool_size: usize, queue_size: usize) -> PoolResult<Self> {
        let pool_size = pool_size.max(1);
        let (sender, receiver) = bounded::<Task>(queue_size.max(1));
        let completed: Arc<Vec<AtomicUsize>> =
            Arc::new((0..pool_size).map(|_| AtomicUsize::new(0)).collect());

        let mut pool = Self {
            sender: Some(sender),
            workers: Vec::with_capacity(pool_size),
            completed,
        };

        for id in 0..pool_size {
            let receiver = receiver.clone();
            let engine = Arc::clone(&engine);
            let completed = Arc::clone(&pool.completed);
            // On spawn failure `pool` is dropped, which joins the workers already started
            let handle = std::thread::Builder::new()
                .name(format!("apirec-worker-{id}"))
                .spawn(move || worker_loop(id, &engine, &receiver, &completed))?;
            pool.workers.push(handle);
        }

        tracing::info!(target: "pool", "worker pool ready: {pool_size} workers, queue {queue_size}");
        Ok(pool)
    }

    pub fn from_config(engine: Arc<RecommendEngine>, config: &WorkerConfig) -> PoolResult<Self> {
        Self::new(engine, config.pool_size, config.queue_size)
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Queue a query. Blocks while the queue is full.
    pub fn submit(&self, query: impl Into<String>, k: usize) -> PoolResult<PendingRecommendation> {
        let sender = self.sender.as_ref().ok_or(PoolError::Disconnected)?;
        let (reply, receiver) = bounded(1);
        sender
            .send(Task {
                query: query.into(),
                k,
                reply,
            })
            .map_err(|_| PoolError::Disconnected)?;
        Ok(PendingRecommendation { reply: receiver })
    }

    /// Recommend for every query; results are in input order.
    ///
    /// Submission and collection overlap, so batches larger than the queue do
    /// not deadlock.
    pub fn recommend_batch<S: AsRef<str> + Sync>(
        &self,
        queries: &[S],
        k: usize,
    ) -> PoolResult<Vec<Vec<ApiRecommendation>>> {
        self.recommend_batch_with(queries, k, |_| {})
    }

    /// [`recommend_batch`](Self::recommend_batch) with a callback after each completed query.
    pub fn recommend_batch_with<S: AsRef<str> + Sync>(
        &self,
        queries: &[S],
        k: usize,
        mut on_done: impl FnMut(usize),
    ) -> PoolResult<Vec<Vec<ApiRecommendation>>> {
        std::thread::scope(|scope| {
            let (pending_tx, pending_rx) = bounded::<PendingRecommendation>(queries.len().max(1));
            let submitter = scope.spawn(move || -> PoolResult<()> {
                for query in queries {
                    pending_tx
                        .send(self.submit(query.as_ref(), k)?)
                        .map_err(|_| PoolError::Disconnected)?;
                }
                Ok(())
            });

            let mut results = Vec::with_capacity(queries.len());
            for (index, pending) in pending_rx.iter().enumerate() {
                results.push(pending.wait()?);
                on_done(index);
            }

            submitter.join().map_err(|_| PoolError::WorkerLost)??;
            Ok(results)
        })
    }

    /// Close the queue and join every worker. Queued tasks are still answered.
    pub fn shutdown(mut self) {
        self.close();
    }

    fn close(&mut self) {
        if self.sender.take().is_none() {
            return;
        }
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::error!(target: "pool", "worker thread panicked");
            }
        }
        let counts: Vec<String> = self
            .completed
            .iter()
            .enumerate()
            .map(|(i, c)| format!("worker[{i}]={}", c.load(Ordering::Relaxed)))
            .collect();
        tracing::debug!(target: "pool", "worker pool shut down: {}", counts.join(", "));
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.close();
    }
}

fn worker_loop(
    id: usize,
    engine: &RecommendEngine,
    tasks: &Receiver<Task>,
    completed: &[AtomicUsize],
) {
    tracing::trace!(target: "pool", "worker {id} started");
    for task in tasks.iter() {
        let recommendations = engine.recommend(&task.query, task.k);
        // The caller may have dropped its handle; that is not an error
        let _ = task.reply.send(recommendations);
        completed[id].fetch_add(1, Ordering::Relaxed);
    }
    tracing::trace!(target: "pool", "worker {id} stopped");
}
