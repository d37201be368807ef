//! The compile engine
//!
//! ```text
//! dispatch::auto_run ─┐
//!                     ├─▶ pipeline::run_format ─▶ planner::plan
//! direct format run ──┘           │              scheduler::run_all ─▶ executor::execute
//!                                 │              cleanup hook
//!                                 └─▶ FormatReport
//! ```

pub mod cleanup;
pub mod dispatch;
pub mod executor;
pub mod pipeline;
pub mod planner;
pub mod scheduler;
pub mod types;

pub use dispatch::{auto_run, detect_subdirectories};
pub use executor::execute;
pub use pipeline::{CompileOptions, prepare_output_dir, run_format};
pub use planner::plan;
pub use scheduler::{ScheduleOptions, run_all};
pub use types::{CompileResult, CompileTask};
