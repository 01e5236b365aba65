//! The worker pool.

use std::collections::BinaryHeap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, Weak};
use std::thread;

use caldera_core::profiling::profile_scope;

use crate::handle::{panic_message, CancelOnDrop, JobError, JobHandle, TaskState};
use crate::job::{Priority, QueuedJob};

/// Worker count used when hardware concurrency detection yields zero.
const FALLBACK_WORKERS: usize = 4;

/// Hook invoked on the worker thread when a job panics.
pub type PanicHandler = Box<dyn Fn(&JobError) + Send + Sync>;

struct QueueState {
    queue: BinaryHeap<QueuedJob>,
    stop: bool,
    next_seq: u64,
}

struct Shared {
    state: Mutex<QueueState>,
    work_available: Condvar,
    panic_handler: Mutex<Option<PanicHandler>>,
}

impl Shared {
    fn report_panic(&self, err: &JobError) {
        if let Some(handler) = self.panic_handler.lock().unwrap().as_ref() {
            handler(err);
        }
    }
}

/// A fixed pool of worker threads consuming a shared priority queue.
///
/// The scheduler owns no domain knowledge; it executes whatever closures
/// are submitted to it. Jobs are dequeued strictly by priority, with
/// submission order breaking ties within a band.
///
/// Shutdown discards jobs that have not started. Anything a worker has
/// already begun runs to completion; there is no cooperative cancellation.
pub struct JobScheduler {
    shared: Arc<Shared>,
    workers: Mutex<Vec<thread::JoinHandle<()>>>,
    thread_override: Option<usize>,
}

impl JobScheduler {
    /// Create a scheduler that will size its pool from the detected
    /// hardware concurrency. No threads run until [`start`](Self::start).
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create a scheduler with an explicit worker count.
    pub fn with_threads(count: usize) -> Self {
        assert!(count > 0, "scheduler requires at least one worker");
        Self::build(Some(count))
    }

    fn build(thread_override: Option<usize>) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(QueueState {
                    queue: BinaryHeap::new(),
                    stop: false,
                    next_seq: 0,
                }),
                work_available: Condvar::new(),
                panic_handler: Mutex::new(None),
            }),
            workers: Mutex::new(Vec::new()),
            thread_override,
        }
    }

    /// Spawn the worker threads. Calling this while workers already exist
    /// is a no-op.
    pub fn start(&self) {
        let mut workers = self.workers.lock().unwrap();
        if !workers.is_empty() {
            return;
        }

        self.shared.state.lock().unwrap().stop = false;

        let detected = num_cpus::get();
        let count = self.thread_override.unwrap_or(if detected == 0 {
            FALLBACK_WORKERS
        } else {
            detected
        });

        workers.reserve(count);
        for i in 0..count {
            let shared = Arc::clone(&self.shared);
            let handle = thread::Builder::new()
                .name(format!("caldera-worker-{}", i))
                .spawn(move || worker_loop(shared))
                .expect("failed to spawn worker thread");
            workers.push(handle);
        }

        tracing::debug!("job scheduler started with {} workers", count);
    }

    /// Number of live worker threads.
    pub fn thread_count(&self) -> usize {
        self.workers.lock().unwrap().len()
    }

    /// Register a hook that observes job panics.
    ///
    /// The hook runs on the worker thread that caught the panic, after the
    /// failure has been logged and before the job's handle resolves.
    pub fn set_panic_handler(&self, handler: impl Fn(&JobError) + Send + Sync + 'static) {
        *self.shared.panic_handler.lock().unwrap() = Some(Box::new(handler));
    }

    /// Submit a job at [`Priority::Normal`].
    pub fn submit<T, F>(&self, f: F) -> JobHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.submit_with_priority(Priority::Normal, f)
    }

    /// Submit a job at the given priority.
    ///
    /// Returns immediately; the queue lock is held only for the push. The
    /// returned handle resolves once a worker has run the closure, or with
    /// [`JobError::Cancelled`] if shutdown discards the job first.
    pub fn submit_with_priority<T, F>(&self, priority: Priority, f: F) -> JobHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let state = Arc::new(TaskState::new());
        let handle = JobHandle::new(Arc::clone(&state));

        let guard = CancelOnDrop::new(state);
        let observer: Weak<Shared> = Arc::downgrade(&self.shared);
        let run = Box::new(move || {
            match panic::catch_unwind(AssertUnwindSafe(f)) {
                Ok(value) => guard.state().complete(Ok(value)),
                Err(payload) => {
                    let err = JobError::Panicked(panic_message(payload.as_ref()));
                    tracing::error!("background job failed: {}", err);
                    if let Some(shared) = observer.upgrade() {
                        shared.report_panic(&err);
                    }
                    guard.state().complete(Err(err));
                }
            }
        });

        {
            let mut state = self.shared.state.lock().unwrap();
            if state.stop {
                // Dropping `run` resolves the handle as cancelled.
                tracing::debug!("job submitted after shutdown, discarding");
                return handle;
            }
            let seq = state.next_seq;
            state.next_seq += 1;
            state.queue.push(QueuedJob { priority, seq, run });
        }
        self.shared.work_available.notify_one();

        handle
    }

    /// Stop the pool: raise the stop flag, wake every worker, join them.
    ///
    /// Queued jobs that no worker has begun are discarded; their handles
    /// resolve with [`JobError::Cancelled`]. Idempotent.
    pub fn shutdown(&self) {
        let discarded: Vec<QueuedJob> = {
            let mut state = self.shared.state.lock().unwrap();
            state.stop = true;
            state.queue.drain().collect()
        };
        self.shared.work_available.notify_all();

        let workers = std::mem::take(&mut *self.workers.lock().unwrap());
        let joined = workers.len();
        for handle in workers {
            if let Err(e) = handle.join() {
                tracing::error!("worker thread panicked: {:?}", e);
            }
        }

        // Resolves the discarded jobs' handles outside any lock.
        let dropped = discarded.len();
        drop(discarded);

        if joined > 0 {
            tracing::debug!(
                "job scheduler stopped, {} queued jobs discarded",
                dropped
            );
        }
    }
}

impl Default for JobScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for JobScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(shared: Arc<Shared>) {
    loop {
        let job = {
            let mut state = shared.state.lock().unwrap();
            loop {
                // The stop check comes first: anything still queued at
                // shutdown is discarded, not drained.
                if state.stop {
                    return;
                }
                if let Some(job) = state.queue.pop() {
                    break job;
                }
                state = shared.work_available.wait(state).unwrap();
            }
        };

        // The closure catches panics internally, so nothing can unwind
        // across the queue lock or kill this thread.
        profile_scope!("job");
        (job.run)();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::Duration;

    /// A gate that keeps the single worker busy until opened, so tests
    /// can control exactly what sits in the queue.
    fn blocking_job(
        scheduler: &JobScheduler,
    ) -> (JobHandle<()>, Arc<(Mutex<bool>, Condvar)>) {
        let gate = Arc::new((Mutex::new(false), Condvar::new()));
        let (started_tx, started_rx) = mpsc::channel();

        let worker_gate = Arc::clone(&gate);
        let handle = scheduler.submit(move || {
            started_tx.send(()).unwrap();
            let (lock, cvar) = &*worker_gate;
            let mut open = lock.lock().unwrap();
            while !*open {
                open = cvar.wait(open).unwrap();
            }
        });

        // Only return once the worker is actually inside the job.
        started_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("blocking job never started");
        (handle, gate)
    }

    fn open_gate(gate: &(Mutex<bool>, Condvar)) {
        let (lock, cvar) = gate;
        *lock.lock().unwrap() = true;
        cvar.notify_all();
    }

    #[test]
    fn test_start_is_idempotent() {
        let scheduler = JobScheduler::with_threads(2);
        scheduler.start();
        scheduler.start();
        assert_eq!(scheduler.thread_count(), 2);
        scheduler.shutdown();
    }

    #[test]
    fn test_submit_and_wait() {
        let scheduler = JobScheduler::with_threads(2);
        scheduler.start();

        let handle = scheduler.submit(|| 40 + 2);
        assert_eq!(handle.wait().unwrap(), 42);

        scheduler.shutdown();
    }

    #[test]
    fn test_high_priority_jumps_the_queue() {
        let scheduler = JobScheduler::with_threads(1);
        scheduler.start();

        let (blocker, gate) = blocking_job(&scheduler);

        let order = Arc::new(Mutex::new(Vec::new()));
        let mut handles = Vec::new();
        for i in 0..8 {
            let order = Arc::clone(&order);
            handles.push(scheduler.submit_with_priority(Priority::Low, move || {
                order.lock().unwrap().push(format!("low-{}", i));
            }));
        }
        {
            let order = Arc::clone(&order);
            handles.push(scheduler.submit_with_priority(Priority::High, move || {
                order.lock().unwrap().push("high".to_string());
            }));
        }

        open_gate(&gate);
        blocker.wait().unwrap();
        for handle in handles {
            handle.wait().unwrap();
        }

        let order = order.lock().unwrap();
        assert_eq!(order.len(), 9);
        assert_eq!(order[0], "high");
        scheduler.shutdown();
    }

    #[test]
    fn test_submission_order_within_band() {
        let scheduler = JobScheduler::with_threads(1);
        scheduler.start();

        let (blocker, gate) = blocking_job(&scheduler);

        let order = Arc::new(Mutex::new(Vec::new()));
        let mut handles = Vec::new();
        for i in 0..4 {
            let order = Arc::clone(&order);
            handles.push(scheduler.submit(move || {
                order.lock().unwrap().push(i);
            }));
        }

        open_gate(&gate);
        blocker.wait().unwrap();
        for handle in handles {
            handle.wait().unwrap();
        }

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3]);
        scheduler.shutdown();
    }

    #[test]
    fn test_panicking_job_does_not_kill_the_pool() {
        let scheduler = JobScheduler::with_threads(1);
        scheduler.start();

        let observed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&observed);
        scheduler.set_panic_handler(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let bad = scheduler.submit(|| panic!("decode exploded"));
        match bad.wait() {
            Err(JobError::Panicked(msg)) => assert!(msg.contains("decode exploded")),
            other => panic!("expected panic outcome, got {:?}", other.map(|_| ())),
        }

        // The same worker keeps servicing the queue.
        let next = scheduler.submit(|| 7);
        assert_eq!(next.wait().unwrap(), 7);
        assert_eq!(observed.load(Ordering::SeqCst), 1);

        scheduler.shutdown();
    }

    #[test]
    fn test_shutdown_discards_queued_jobs() {
        let scheduler = Arc::new(JobScheduler::with_threads(1));
        scheduler.start();

        let (blocker, gate) = blocking_job(&scheduler);

        let ran = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ran);
        let queued = scheduler.submit(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        // Open the gate only after shutdown has raised the stop flag, so
        // the worker observes it before it could dequeue the next job.
        let opener_gate = Arc::clone(&gate);
        let opener = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            open_gate(&opener_gate);
        });

        scheduler.shutdown();
        opener.join().unwrap();

        blocker.wait().unwrap();
        assert!(matches!(queued.wait(), Err(JobError::Cancelled)));
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_submit_after_shutdown_is_cancelled() {
        let scheduler = JobScheduler::with_threads(1);
        scheduler.start();
        scheduler.shutdown();

        let handle = scheduler.submit(|| 1);
        assert!(matches!(handle.wait(), Err(JobError::Cancelled)));
    }
}
