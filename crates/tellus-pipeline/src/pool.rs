//! Fixed worker pool with fork-join stage dispatch.
//!
//! Stages fork N independent tasks over disjoint index ranges; the
//! returned [`StageHandle`] is polled once per external tick (or waited
//! on) and completes only when every task has finished. Workers run each
//! task to completion without yielding; stage transitions are the only
//! suspension points.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::JoinHandle;

use crossbeam_channel::Sender;
use tellus_config::PipelineConfig;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Completion handle for one forked stage.
///
/// The counter decrement uses release ordering and [`is_complete`]
/// acquires it, so everything a task wrote is visible to whoever observes
/// completion. That pairing is the stage barrier the pipeline relies on.
///
/// [`is_complete`]: StageHandle::is_complete
#[derive(Clone)]
pub struct StageHandle {
    remaining: Arc<AtomicUsize>,
}

impl StageHandle {
    /// A handle that is already complete (used for empty stages).
    pub fn completed() -> Self {
        Self {
            remaining: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Returns `true` once every task in the stage has finished.
    pub fn is_complete(&self) -> bool {
        self.remaining.load(Ordering::Acquire) == 0
    }

    /// Block until the stage completes. Used by tests and teardown; the
    /// per-frame path polls [`is_complete`](Self::is_complete) instead.
    pub fn wait(&self) {
        while !self.is_complete() {
            std::thread::sleep(std::time::Duration::from_micros(50));
        }
    }
}

/// A fixed-size pool of named worker threads fed through a channel.
pub struct WorkerPool {
    job_sender: Option<Sender<Job>>,
    worker_handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn a pool with `worker_count` threads (clamped to at least 1).
    pub fn new(worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let (job_sender, job_receiver) = crossbeam_channel::unbounded::<Job>();

        let mut worker_handles = Vec::with_capacity(worker_count);
        for _ in 0..worker_count {
            let receiver = job_receiver.clone();
            let handle = std::thread::Builder::new()
                .name("subdivide-worker".into())
                .spawn(move || {
                    while let Ok(job) = receiver.recv() {
                        job();
                    }
                })
                .expect("Failed to spawn subdivision worker thread");
            worker_handles.push(handle);
        }

        Self {
            job_sender: Some(job_sender),
            worker_handles,
        }
    }

    /// Pool sized from the CPU count, leaving headroom for the main and
    /// render threads.
    pub fn with_defaults() -> Self {
        let cpus = num_cpus::get().max(2);
        Self::new((cpus - 2).max(1))
    }

    /// Pool sized from loaded settings: an explicit thread count, or the
    /// CPU-derived default when `worker_threads` is zero.
    pub fn from_config(config: &PipelineConfig) -> Self {
        if config.worker_threads == 0 {
            Self::with_defaults()
        } else {
            Self::new(config.worker_threads)
        }
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.worker_handles.len()
    }

    /// Fork `task_count` tasks running `body(task_index)` and return the
    /// stage's completion handle.
    ///
    /// Each task drops its shared-state clone *before* signalling
    /// completion, so once the handle reports complete the orchestrator
    /// holds the only references to stage resources.
    pub fn fork<F>(&self, task_count: usize, body: F) -> StageHandle
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        let remaining = Arc::new(AtomicUsize::new(task_count));
        let handle = StageHandle {
            remaining: Arc::clone(&remaining),
        };
        if task_count == 0 {
            return handle;
        }

        let body = Arc::new(body);
        let sender = self
            .job_sender
            .as_ref()
            .expect("fork called on a shut-down worker pool");
        for task in 0..task_count {
            let body = Arc::clone(&body);
            let remaining = Arc::clone(&remaining);
            let job: Job = Box::new(move || {
                body(task);
                drop(body);
                remaining.fetch_sub(1, Ordering::Release);
            });
            sender
                .send(job)
                .expect("worker pool channel closed while forking");
        }
        handle
    }

    /// Shut down: close the channel and join every worker.
    pub fn shutdown(&mut self) {
        self.job_sender.take();
        for handle in self.worker_handles.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
