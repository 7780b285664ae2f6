//! Executing a single run: append its settings, then run the tuning tool in
//! its directory.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::process::{Command, Stdio};
use std::time::Instant;

use tracing::{debug, info, warn};

use tb_types::{ExecutionError, FailurePolicy, RunDescriptor, RunRecord, RunResult, TuningCommand};

/// Append the seed, scenario id and thread count to the run's scenario file.
/// The file is created if the template did not provide one.
pub fn append_run_settings(run: &RunDescriptor, scenario_file: &str) -> Result<(), ExecutionError> {
    let path = run.path.join(scenario_file);
    let write_failed = |e: std::io::Error| ExecutionError::ScenarioFileWrite {
        path: path.clone(),
        message: e.to_string(),
    };

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(write_failed)?;
    file.write_all(run.settings_block().as_bytes())
        .map_err(write_failed)?;
    file.flush().map_err(write_failed)
}

/// Run `command` inside the run directory and wait for it to exit.
///
/// Stdout and stderr both go to the command's log file.  A command that
/// cannot be started yields a result without an exit code; only failing to
/// open the log file is an error.
pub fn run_command(run: &RunDescriptor, command: &TuningCommand) -> Result<RunResult, ExecutionError> {
    let log_path = run.path.join(&command.log_file);
    let log_failed = |e: std::io::Error| ExecutionError::LogFile {
        path: log_path.clone(),
        message: e.to_string(),
    };

    let stdout = File::create(&log_path).map_err(log_failed)?;
    let stderr = stdout.try_clone().map_err(log_failed)?;

    let started = Instant::now();
    let status = Command::new(&command.program)
        .args(&command.args)
        .current_dir(&run.path)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(stderr))
        .status();

    match status {
        Ok(status) => {
            let result = RunResult::from_exit_code(status.code(), started.elapsed().as_secs_f64());
            debug!(
                path = %run.path.display(),
                exit_code = ?result.exit_code,
                "Tuning command finished"
            );
            Ok(result)
        }
        Err(e) => {
            let error = ExecutionError::SpawnFailed {
                program: command.program.clone(),
                message: e.to_string(),
            };
            warn!(path = %run.path.display(), "{error}");
            Ok(RunResult::from_exit_code(None, started.elapsed().as_secs_f64()))
        }
    }
}

/// Execute one run end to end and return its finished record.
///
/// Never panics and never returns an error: filesystem failures mark the
/// record failed, and the subprocess outcome is judged by `policy`.
pub fn execute(
    run: RunDescriptor,
    command: &TuningCommand,
    policy: FailurePolicy,
    worker_id: Option<String>,
) -> RunRecord {
    let mut record = RunRecord::new(run);
    record.mark_running(worker_id);

    let outcome = append_run_settings(&record.run, &command.scenario_file)
        .and_then(|()| run_command(&record.run, command));

    match outcome {
        Ok(result) => {
            record.finish(result, policy);
            if record.is_failed() {
                warn!(
                    path = %record.run.path.display(),
                    error = record.error.as_deref().unwrap_or_default(),
                    "Run failed"
                );
            } else {
                info!(
                    path = %record.run.path.display(),
                    seed = record.run.seed,
                    run_id = record.run.run_index,
                    "Run finished"
                );
            }
        }
        Err(e) => {
            warn!(path = %record.run.path.display(), "Run aborted: {e}");
            record.mark_failed(e.to_string());
        }
    }

    record
}
