//! Human-readable progress lines and the JSON batch report.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tb_types::{BatchStatus, LaunchConfig, LaunchResult, RunRecord};

/// Header printed before the batch starts.
pub fn batch_header(config: &LaunchConfig, total_runs: usize) -> Vec<String> {
    vec![
        format!("Total number of scenarios: {total_runs}"),
        format!(
            "Maximum number of simultaneous executions: {}",
            config.max_workers
        ),
        format!(
            "Number of threads for each scenario: {}",
            config.threads_per_run
        ),
    ]
}

/// Line printed once a run's subprocess has exited.
pub fn ready_line(record: &RunRecord) -> String {
    format!(
        "Scenario {} ready (path={}, seed={})",
        record.run.run_index,
        record.run.path.display(),
        record.run.seed
    )
}

/// Line printed as each run is collected.
pub fn completed_line(record: &RunRecord) -> String {
    let mut line = format!(
        "Scenario {} completed (seed={}, run_id={})",
        record.run.path.display(),
        record.run.seed,
        record.run.run_index
    );
    if let Some(error) = &record.error {
        line.push_str(&format!(" [failed: {error}]"));
    }
    line
}

pub fn summary_line(status: &BatchStatus) -> String {
    if status.is_success() {
        "All scenarios executed successfully.".to_string()
    } else {
        format!(
            "{} of {} scenarios failed.",
            status.runs_failed, status.total_runs
        )
    }
}

/// Write the batch status, including every run record, as pretty JSON.
pub fn write_report(path: &Path, status: &BatchStatus) -> LaunchResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, status)?;
    writer.flush()?;
    Ok(())
}
