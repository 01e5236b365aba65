//! Background job execution for the Caldera engine.
//!
//! A fixed pool of worker threads consumes a shared priority queue of
//! closures. Submission never blocks beyond a short critical section, and
//! a submitted job can be observed through the [`JobHandle`] it returns.
//!
//! # Example
//!
//! ```
//! use caldera_jobs::{JobScheduler, Priority};
//!
//! let scheduler = JobScheduler::new();
//! scheduler.start();
//!
//! let handle = scheduler.submit_with_priority(Priority::High, || 2 + 2);
//! assert_eq!(handle.wait().unwrap(), 4);
//!
//! scheduler.shutdown();
//! ```

mod handle;
mod job;
mod scheduler;

pub use handle::{JobError, JobHandle};
pub use job::Priority;
pub use scheduler::JobScheduler;
