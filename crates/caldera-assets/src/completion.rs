//! Worker-to-consumer handoff of finish work.

use std::sync::Mutex;

/// A finish closure produced by a worker thread, to be run on the
/// consumer thread.
pub type Completion = Box<dyn FnOnce() + Send>;

struct Inner {
    open: bool,
    pending: Vec<Completion>,
}

/// A thread-safe list of finish closures.
///
/// Worker threads append; the consumer thread drains once per tick via
/// [`take`](Self::take) and runs the closures outside the lock. Closing
/// the queue drops whatever is pending and rejects later pushes, which is
/// how loader shutdown stops callback delivery for jobs that finish
/// concurrently.
pub struct CompletionQueue {
    inner: Mutex<Inner>,
}

impl Default for CompletionQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                open: true,
                pending: Vec::new(),
            }),
        }
    }

    /// Append a finish closure. Returns `false` (and drops the closure)
    /// if the queue has been closed.
    pub fn push(&self, completion: impl FnOnce() + Send + 'static) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if !inner.open {
            return false;
        }
        inner.pending.push(Box::new(completion));
        true
    }

    /// Swap the pending list out, leaving an empty one behind. The lock
    /// is held only for the swap, never while closures run.
    pub fn take(&self) -> Vec<Completion> {
        let mut inner = self.inner.lock().unwrap();
        std::mem::take(&mut inner.pending)
    }

    /// Drop pending closures and reject future pushes.
    pub fn close(&self) {
        let dropped = {
            let mut inner = self.inner.lock().unwrap();
            inner.open = false;
            std::mem::take(&mut inner.pending)
        };
        drop(dropped);
    }

    /// Number of closures waiting for the next drain.
    pub fn pending(&self) -> usize {
        self.inner.lock().unwrap().pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_take_runs_in_insertion_order() {
        let queue = CompletionQueue::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let order = Arc::clone(&order);
            queue.push(move || order.lock().unwrap().push(i));
        }

        for completion in queue.take() {
            completion();
        }
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn test_close_drops_pending_and_rejects_pushes() {
        let queue = CompletionQueue::new();
        let ran = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&ran);
        assert!(queue.push(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        queue.close();
        assert_eq!(queue.pending(), 0);

        let counter = Arc::clone(&ran);
        assert!(!queue.push(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        for completion in queue.take() {
            completion();
        }
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }
}
