//! Bounded worker pool used to run compile jobs
//!
//! Each worker thread takes one job at a time from a bounded crossbeam
//! channel. Compile jobs spend their time in an external backend process, so
//! `N` workers means at most `N` backend processes alive at once.
//!
//! ```text
//! producer ──▶ [bounded work queue] ──▶ worker 0..N ──▶ [results] ──▶ collector
//!                                           │
//!                                           └─ on_complete(result, done, total)
//! ```
//!
//! # Example
//!
//! ```rust
//! use docbatch::parallel::ExecutionStrategy;
//!
//! let workers = ExecutionStrategy::calculate_optimal_workers(0, 100);
//! let strategy = ExecutionStrategy::auto(3, workers);
//! let doubled = strategy
//!     .execute(vec![1, 2, 3], |x, _worker_id| x * 2, None::<fn(&i32, usize, usize)>)
//!     .unwrap();
//! assert_eq!(doubled.iter().sum::<i32>(), 12);
//! ```

pub mod core;
pub mod progress;

pub use self::core::{ExecutionStrategy, ParallelExecutor, SequentialExecutor};
pub use progress::ProgressReporter;
