//! Worker pool scheduling for one format's task list.

use console::style;
use std::any::Any;
use std::ffi::OsString;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::executor::{execute, read_log_tail};
use super::{CompileResult, CompileTask};
use crate::backend::CommandBuilder;
use crate::parallel::{ExecutionStrategy, ProgressReporter};

/// Knobs shared by every job of one scheduling round
#[derive(Debug, Clone)]
pub struct ScheduleOptions {
    pub max_workers: usize,
    pub timeout: Option<Duration>,
    /// Backend log lines appended to a failed job's log text
    pub log_tail_lines: usize,
}

impl Default for ScheduleOptions {
    fn default() -> Self {
        Self {
            max_workers: 1,
            timeout: None,
            log_tail_lines: 30,
        }
    }
}

/// Run every task on a bounded pool and return one result per task, in
/// completion order.
///
/// A panic while handling a task becomes that task's failed result; the
/// remaining tasks keep running.
pub fn run_all(
    tasks: Vec<CompileTask>,
    builder: Arc<dyn CommandBuilder>,
    backend_label: &str,
    options: &ScheduleOptions,
    progress: &ProgressReporter,
) -> Vec<CompileResult> {
    if tasks.is_empty() {
        return Vec::new();
    }

    let strategy = ExecutionStrategy::auto(tasks.len(), options.max_workers);
    tracing::debug!("Scheduling {} {} jobs with {:?}", tasks.len(), backend_label, strategy);

    let fallback_tasks = tasks.clone();
    let label = backend_label.to_string();
    let timeout = options.timeout;
    let log_tail_lines = options.log_tail_lines;

    let processor = move |task: &CompileTask, _worker_id: usize| {
        let start = Instant::now();
        catch_unwind(AssertUnwindSafe(|| {
            compile_one(task, builder.as_ref(), &label, timeout, log_tail_lines)
        }))
        .unwrap_or_else(|payload| {
            let message = panic_message(payload.as_ref());
            tracing::error!("Worker crashed on {}: {}", task.input_path.display(), message);
            CompileResult::failed(
                task,
                start.elapsed().as_secs_f64(),
                format!("Worker crashed while compiling {}: {}", task.file_name(), message),
            )
        })
    };

    let reporter = progress.clone();
    let on_complete = move |result: &CompileResult, _current: usize, _total: usize| {
        let line = status_line(result);
        if catch_unwind(AssertUnwindSafe(|| reporter.job_finished(&line))).is_err() {
            tracing::warn!("Could not report progress for {}", result.file_name);
        }
    };

    match strategy.execute(tasks, processor, Some(on_complete)) {
        Ok(results) => results,
        Err(e) => {
            tracing::error!("Worker pool failed: {e}");
            fallback_tasks
                .iter()
                .map(|task| CompileResult::failed(task, 0.0, format!("Worker pool failed: {e}")))
                .collect()
        }
    }
}

fn compile_one(
    task: &CompileTask,
    builder: &dyn CommandBuilder,
    label: &str,
    timeout: Option<Duration>,
    log_tail_lines: usize,
) -> CompileResult {
    let command: Vec<OsString> = builder.build(&task.input_path, &task.output_path, &task.working_dir);
    let mut result = execute(task, &command, label, timeout);

    if !result.success
        && let Some(log_path) = builder.diagnostic_log(task)
        && let Some(tail) = read_log_tail(&log_path, log_tail_lines)
    {
        let log_name = log_path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        result.log_text.push_str(&format!("\n--- tail of {log_name} ---\n{tail}\n"));
    }

    result
}

/// One colored line per finished job: `✔ x.tex (1.23s)` or `✖ y.tex (exit 2)`
pub fn status_line(result: &CompileResult) -> String {
    if result.success {
        format!("{} {} ({:.2}s)", style("✔").green(), result.file_name, result.duration_seconds)
    } else {
        let reason = match result.exit_code {
            Some(code) => format!("exit {code}"),
            None => "error".to_string(),
        };
        format!("{} {} ({})", style("✖").red(), result.file_name, reason)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
