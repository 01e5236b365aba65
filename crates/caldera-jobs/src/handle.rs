//! Future-like observation of a submitted job's result.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Condvar, Mutex};

/// Ways a job can fail to produce a value.
#[derive(Debug, Clone)]
pub enum JobError {
    /// The job body panicked. The panic was caught at the worker boundary;
    /// the worker thread keeps running.
    Panicked(String),

    /// The job was discarded before a worker started it (scheduler
    /// shutdown raced ahead of it).
    Cancelled,
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobError::Panicked(msg) => write!(f, "job panicked: {}", msg),
            JobError::Cancelled => write!(f, "job cancelled before execution"),
        }
    }
}

impl std::error::Error for JobError {}

/// Extract a printable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Shared slot a worker writes the job outcome into.
pub(crate) struct TaskState<T> {
    result: Mutex<Option<Result<T, JobError>>>,
    ready: Condvar,
}

impl<T> TaskState<T> {
    pub(crate) fn new() -> Self {
        Self {
            result: Mutex::new(None),
            ready: Condvar::new(),
        }
    }

    /// Store the outcome and wake waiters. The first write wins; later
    /// calls (e.g. the cancellation guard firing after a normal
    /// completion) are ignored.
    pub(crate) fn complete(&self, outcome: Result<T, JobError>) {
        let mut slot = self.result.lock().unwrap();
        if slot.is_none() {
            *slot = Some(outcome);
            self.ready.notify_all();
        }
    }
}

/// Completes the task with [`JobError::Cancelled`] if it is dropped
/// without the job ever running.
pub(crate) struct CancelOnDrop<T> {
    state: Arc<TaskState<T>>,
}

impl<T> CancelOnDrop<T> {
    pub(crate) fn new(state: Arc<TaskState<T>>) -> Self {
        Self { state }
    }

    pub(crate) fn state(&self) -> &Arc<TaskState<T>> {
        &self.state
    }
}

impl<T> Drop for CancelOnDrop<T> {
    fn drop(&mut self) {
        self.state.complete(Err(JobError::Cancelled));
    }
}

/// Handle to a submitted job's eventual result.
///
/// Dropping the handle is fine; the result is simply discarded. The
/// asset pipeline never blocks on these (it observes completion through
/// its per-tick pump), but the handle is there for callers that want the
/// value or the failure.
pub struct JobHandle<T> {
    state: Arc<TaskState<T>>,
}

impl<T> JobHandle<T> {
    pub(crate) fn new(state: Arc<TaskState<T>>) -> Self {
        Self { state }
    }

    /// Whether the job has finished (successfully or not).
    pub fn is_finished(&self) -> bool {
        self.state.result.lock().unwrap().is_some()
    }

    /// Take the outcome if the job has finished.
    pub fn try_take(&self) -> Option<Result<T, JobError>> {
        self.state.result.lock().unwrap().take()
    }

    /// Block until the job finishes and return its outcome.
    pub fn wait(self) -> Result<T, JobError> {
        let mut slot = self.state.result.lock().unwrap();
        loop {
            if let Some(outcome) = slot.take() {
                return outcome;
            }
            slot = self.state.ready.wait(slot).unwrap();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_completion_wins() {
        let state = Arc::new(TaskState::new());
        state.complete(Ok(1));
        state.complete(Ok(2));

        let handle = JobHandle::new(state);
        assert_eq!(handle.wait().unwrap(), 1);
    }

    #[test]
    fn test_cancel_on_drop() {
        let state: Arc<TaskState<u32>> = Arc::new(TaskState::new());
        let handle = JobHandle::new(state.clone());

        drop(CancelOnDrop::new(state));

        assert!(matches!(handle.wait(), Err(JobError::Cancelled)));
    }

    #[test]
    fn test_try_take_before_completion() {
        let state: Arc<TaskState<u32>> = Arc::new(TaskState::new());
        let handle = JobHandle::new(state.clone());

        assert!(!handle.is_finished());
        assert!(handle.try_take().is_none());

        state.complete(Ok(7));
        assert!(handle.is_finished());
        assert_eq!(handle.try_take().unwrap().unwrap(), 7);
    }
}
