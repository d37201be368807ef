//! Job execution: one task, one backend process, one [`CompileResult`].

use std::ffi::OsString;
use std::io::{self, Read};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use super::{CompileResult, CompileTask};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Exit status and decoded output streams of a finished process
#[derive(Debug)]
pub struct CapturedOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CapturedOutput {
    /// stdout followed by stderr
    pub fn combined(&self) -> String {
        let mut text = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&self.stderr);
        }
        text
    }
}

/// Spawn `command` and wait for it, capturing both output streams.
///
/// With a timeout the process runs in its own process group (on unix), the
/// whole group is killed once the deadline passes and the call fails with
/// [`io::ErrorKind::TimedOut`].
pub fn run_captured(command: &[OsString], timeout: Option<Duration>) -> io::Result<CapturedOutput> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command"))?;

    let mut process = Command::new(program);
    process
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    #[cfg(unix)]
    if timeout.is_some() {
        use std::os::unix::process::CommandExt;
        process.process_group(0);
    }

    let mut child = process.spawn()?;

    // Drain both pipes concurrently so a chatty backend never blocks on a full pipe
    let stdout_reader = child.stdout.take().map(spawn_reader);
    let stderr_reader = child.stderr.take().map(spawn_reader);

    // After a timeout the readers are left to finish on their own; they hit
    // EOF once the killed group releases the pipes.
    let status = match timeout {
        None => child.wait()?,
        Some(limit) => wait_with_deadline(&mut child, limit)?,
    };

    Ok(CapturedOutput {
        status,
        stdout: join_reader(stdout_reader),
        stderr: join_reader(stderr_reader),
    })
}

fn spawn_reader<R: Read + Send + 'static>(mut stream: R) -> JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buffer = Vec::new();
        let _ = stream.read_to_end(&mut buffer);
        buffer
    })
}

fn join_reader(reader: Option<JoinHandle<Vec<u8>>>) -> String {
    reader
        .and_then(|handle| handle.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

fn wait_with_deadline(child: &mut Child, limit: Duration) -> io::Result<ExitStatus> {
    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            kill_process_tree(child);
            let _ = child.wait();
            return Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("killed after {}s without finishing", limit.as_secs_f64()),
            ));
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Kill the backend and anything it forked
#[cfg(unix)]
fn kill_process_tree(child: &mut Child) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let group = Pid::from_raw(child.id() as i32);
    if let Err(e) = killpg(group, Signal::SIGKILL) {
        tracing::debug!("killpg({group}) failed: {e}; killing the process only");
        let _ = child.kill();
    }
}

#[cfg(not(unix))]
fn kill_process_tree(child: &mut Child) {
    let _ = child.kill();
}

/// Run one compile job. Never fails: every fault becomes a failed result.
///
/// Creates the task's output directory (concurrent creation by sibling
/// jobs is fine), runs the backend and checks that the PDF exists.
pub fn execute(task: &CompileTask, command: &[OsString], backend_label: &str, timeout: Option<Duration>) -> CompileResult {
    let start = Instant::now();

    if let Err(e) = std::fs::create_dir_all(&task.working_dir) {
        return CompileResult::failed(
            task,
            start.elapsed().as_secs_f64(),
            format!("Failed to create output directory {}: {}", task.working_dir.display(), e),
        );
    }

    let executable = command
        .first()
        .map(|exe| exe.to_string_lossy().into_owned())
        .unwrap_or_default();
    tracing::debug!("Running {:?}", command);

    let captured = run_captured(command, timeout);
    let duration_seconds = start.elapsed().as_secs_f64();

    let output = match captured {
        Ok(output) => output,
        Err(e) => {
            let log_text = match e.kind() {
                io::ErrorKind::NotFound => {
                    format!("{backend_label} backend executable '{executable}' not found: {e}")
                }
                io::ErrorKind::TimedOut => format!("{backend_label} backend timed out: {e}"),
                _ => format!("Failed to run {backend_label} backend '{executable}': {e}"),
            };
            tracing::warn!("{}: {}", task.file_name(), log_text);
            return CompileResult::failed(task, duration_seconds, log_text);
        }
    };

    let exit_code = output.status.code();
    let captured_text = output.combined();

    let (success, log_text) = if !output.status.success() {
        let reason = match exit_code {
            Some(code) => format!("{backend_label} failed with exit code {code}"),
            None => format!("{backend_label} was terminated by a signal"),
        };
        (false, format!("{reason}\n{captured_text}"))
    } else if !output_exists(&task.output_path) {
        (
            false,
            format!(
                "{backend_label} exited with code 0 but no PDF was produced at {}\n{captured_text}",
                task.output_path.display()
            ),
        )
    } else {
        (true, captured_text)
    };

    if !success {
        tracing::warn!("{} failed ({:.2}s)", task.file_name(), duration_seconds);
    }

    CompileResult {
        file_name: task.file_name(),
        input_path: task.input_path.clone(),
        output_path: task.output_path.clone(),
        success,
        duration_seconds,
        exit_code,
        log_text,
    }
}

fn output_exists(path: &Path) -> bool {
    path.is_file()
}

/// Last `lines` lines of a backend log, decoded lossily
pub fn read_log_tail(path: &Path, lines: usize) -> Option<String> {
    if lines == 0 {
        return None;
    }
    let bytes = std::fs::read(path).ok()?;
    let text = String::from_utf8_lossy(&bytes);
    let all: Vec<&str> = text.lines().collect();
    let start = all.len().saturating_sub(lines);
    Some(all[start..].join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sh(script: &str) -> Vec<OsString> {
        vec!["sh".into(), "-c".into(), script.into()]
    }

    fn task_in(dir: &TempDir) -> CompileTask {
        let working_dir = dir.path().join("out/a");
        CompileTask::new(dir.path().join("src/a/x.tex"), working_dir.join("x.pdf"), working_dir)
    }

    #[test]
    fn test_empty_command_is_rejected() {
        let err = run_captured(&[], None).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_both_streams() {
        let output = run_captured(&sh("echo out; echo err >&2; exit 3"), None).unwrap();
        assert_eq!(output.status.code(), Some(3));
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
        assert_eq!(output.combined(), "out\nerr\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_the_process() {
        let start = Instant::now();
        let err = run_captured(&sh("sleep 5"), Some(Duration::from_millis(200))).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_forked_children() {
        let dir = TempDir::new().unwrap();
        let marker = dir.path().join("survived");
        let script = format!("(sleep 1; touch '{}') & wait", marker.display());

        let err = run_captured(&sh(&script), Some(Duration::from_millis(200))).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);

        std::thread::sleep(Duration::from_millis(1500));
        assert!(!marker.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_successful_job_with_pdf() {
        let dir = TempDir::new().unwrap();
        let task = task_in(&dir);
        let script = format!("echo compiled; touch '{}'", task.output_path.display());

        let result = execute(&task, &sh(&script), "TeX", None);
        assert!(result.success, "{}", result.log_text);
        assert_eq!(result.exit_code, Some(0));
        assert_eq!(result.file_name, "x.tex");
        assert!(result.duration_seconds >= 0.0);
        assert!(result.log_text.contains("compiled"));
        assert!(task.working_dir.is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_keeps_output() {
        let dir = TempDir::new().unwrap();
        let task = task_in(&dir);

        let result = execute(&task, &sh("echo 'Missing font'; echo oops >&2; exit 2"), "TeX", None);
        assert!(!result.success);
        assert_eq!(result.exit_code, Some(2));
        assert!(result.log_text.contains("exit code 2"));
        assert!(result.log_text.contains("Missing font"));
        assert!(result.log_text.contains("oops"));
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_zero_without_pdf_fails() {
        let dir = TempDir::new().unwrap();
        let task = task_in(&dir);

        let result = execute(&task, &sh("true"), "Typst", None);
        assert!(!result.success);
        assert_eq!(result.exit_code, Some(0));
        assert!(result.log_text.contains("no PDF was produced"));
    }

    #[test]
    fn test_missing_executable_is_a_job_failure() {
        let dir = TempDir::new().unwrap();
        let task = task_in(&dir);
        let command = vec![OsString::from("docbatch-no-such-backend-12345"), OsString::from("x.tex")];

        let result = execute(&task, &command, "TeX", None);
        assert!(!result.success);
        assert!(result.exit_code.is_none());
        assert!(result.log_text.contains("docbatch-no-such-backend-12345"));
        assert!(result.log_text.contains("not found"));
    }

    #[cfg(unix)]
    #[test]
    fn test_unwritable_output_dir_is_a_job_failure() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("out");
        std::fs::write(&blocker, "a file, not a directory").unwrap();
        let task = task_in(&dir);

        let result = execute(&task, &sh("true"), "TeX", None);
        assert!(!result.success);
        assert!(result.log_text.contains("Failed to create output directory"));
    }

    #[test]
    fn test_log_tail() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("x.log");
        std::fs::write(&log, "one\ntwo\nthree\nfour\n").unwrap();

        assert_eq!(read_log_tail(&log, 2).as_deref(), Some("three\nfour"));
        assert_eq!(read_log_tail(&log, 10).as_deref(), Some("one\ntwo\nthree\nfour"));
        assert!(read_log_tail(&log, 0).is_none());
        assert!(read_log_tail(&dir.path().join("missing.log"), 5).is_none());
    }
}
