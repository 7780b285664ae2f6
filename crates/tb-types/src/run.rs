//! Run lifecycle tracking and batch status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::FailurePolicy;
use crate::scenario::RunDescriptor;

/// Unique batch identifier.
pub type BatchId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Outcome of the tuning subprocess of a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// True only when the subprocess exited with status 0.
    pub ok: bool,
    /// Exit code, `None` if the process could not be started or was
    /// killed by a signal.
    pub exit_code: Option<i32>,
    pub duration_seconds: f64,
}

impl RunResult {
    pub fn from_exit_code(exit_code: Option<i32>, duration_seconds: f64) -> Self {
        Self {
            ok: exit_code == Some(0),
            exit_code,
            duration_seconds,
        }
    }
}

/// A single run together with its lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run: RunDescriptor,
    pub status: RunStatus,
    pub result: Option<RunResult>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub worker_id: Option<String>,
    pub error: Option<String>,
}

impl RunRecord {
    pub fn new(run: RunDescriptor) -> Self {
        Self {
            run,
            status: RunStatus::Pending,
            result: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            worker_id: None,
            error: None,
        }
    }

    pub fn mark_running(&mut self, worker_id: Option<String>) {
        self.status = RunStatus::Running;
        self.started_at = Some(Utc::now());
        self.worker_id = worker_id;
    }

    pub fn mark_completed(&mut self, result: RunResult) {
        self.status = RunStatus::Completed;
        self.finished_at = Some(Utc::now());
        self.result = Some(result);
    }

    pub fn mark_failed(&mut self, error: String) {
        self.status = RunStatus::Failed;
        self.finished_at = Some(Utc::now());
        self.error = Some(error);
    }

    /// Record the subprocess outcome, judged by `policy`.
    ///
    /// Under [`FailurePolicy::Lenient`] every finished subprocess counts as
    /// completed.
    pub fn finish(&mut self, result: RunResult, policy: FailurePolicy) {
        if result.ok || policy == FailurePolicy::Lenient {
            self.mark_completed(result);
        } else {
            let message = match result.exit_code {
                Some(code) => format!("tuning command exited with status {code}"),
                None => "tuning command did not exit normally".to_string(),
            };
            self.result = Some(result);
            self.mark_failed(message);
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == RunStatus::Failed
    }
}

/// Lifecycle state for a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchState {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Aggregate status of a batch of runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchStatus {
    pub id: BatchId,
    pub state: BatchState,
    pub total_runs: usize,
    pub runs_completed: usize,
    pub runs_failed: usize,
    pub runs_running: usize,
    pub records: Vec<RunRecord>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl BatchStatus {
    pub fn new(total_runs: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: BatchState::Pending,
            total_runs,
            runs_completed: 0,
            runs_failed: 0,
            runs_running: 0,
            records: Vec::with_capacity(total_runs),
            started_at: None,
            finished_at: None,
        }
    }

    pub fn mark_running(&mut self) {
        self.state = BatchState::Running;
        self.started_at = Some(Utc::now());
    }

    pub fn run_started(&mut self) {
        self.runs_running += 1;
    }

    /// Fold a finished run into the counters.  Records are kept in
    /// completion order.
    pub fn record(&mut self, record: RunRecord) {
        self.runs_running = self.runs_running.saturating_sub(1);
        if record.is_failed() {
            self.runs_failed += 1;
        } else {
            self.runs_completed += 1;
        }
        self.records.push(record);
    }

    /// Close the batch.  It fails if any run failed.
    pub fn finish(&mut self) {
        self.state = if self.runs_failed == 0 {
            BatchState::Completed
        } else {
            BatchState::Failed
        };
        self.finished_at = Some(Utc::now());
    }

    pub fn is_success(&self) -> bool {
        self.state == BatchState::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::ScenarioTemplate;

    fn sample_run(seed: u64, run_index: usize) -> RunDescriptor {
        let template = ScenarioTemplate::new("A/Base", "A/Runs", "A");
        RunDescriptor::new(&template, seed, run_index, 2)
    }

    #[test]
    fn run_lifecycle() {
        let mut record = RunRecord::new(sample_run(1, 1));
        assert_eq!(record.status, RunStatus::Pending);

        record.mark_running(Some("tb-worker-0".into()));
        assert_eq!(record.status, RunStatus::Running);
        assert_eq!(record.worker_id.as_deref(), Some("tb-worker-0"));
        assert!(record.started_at.is_some());

        record.mark_completed(RunResult::from_exit_code(Some(0), 1.5));
        assert_eq!(record.status, RunStatus::Completed);
        assert!(record.finished_at.is_some());
        assert!(record.result.as_ref().unwrap().ok);
    }

    #[test]
    fn lenient_policy_completes_failed_exit() {
        let mut record = RunRecord::new(sample_run(1, 1));
        record.finish(RunResult::from_exit_code(Some(2), 0.1), FailurePolicy::Lenient);

        assert_eq!(record.status, RunStatus::Completed);
        let result = record.result.unwrap();
        assert!(!result.ok);
        assert_eq!(result.exit_code, Some(2));
    }

    #[test]
    fn strict_policy_fails_on_nonzero_exit() {
        let mut record = RunRecord::new(sample_run(1, 1));
        record.finish(RunResult::from_exit_code(Some(2), 0.1), FailurePolicy::Strict);

        assert_eq!(record.status, RunStatus::Failed);
        assert_eq!(record.result.as_ref().unwrap().exit_code, Some(2));
        assert!(record.error.as_deref().unwrap().contains("status 2"));
    }

    #[test]
    fn strict_policy_completes_zero_exit() {
        let mut record = RunRecord::new(sample_run(1, 1));
        record.finish(RunResult::from_exit_code(Some(0), 0.1), FailurePolicy::Strict);
        assert_eq!(record.status, RunStatus::Completed);
    }

    #[test]
    fn batch_status_counts_and_state() {
        let mut batch = BatchStatus::new(2);
        assert_eq!(batch.state, BatchState::Pending);

        batch.mark_running();
        batch.run_started();
        batch.run_started();
        assert_eq!(batch.runs_running, 2);

        let mut ok = RunRecord::new(sample_run(1, 1));
        ok.mark_completed(RunResult::from_exit_code(Some(0), 0.0));
        batch.record(ok);

        let mut bad = RunRecord::new(sample_run(2, 2));
        bad.mark_failed("disk full".into());
        batch.record(bad);

        batch.finish();
        assert_eq!(batch.runs_completed, 1);
        assert_eq!(batch.runs_failed, 1);
        assert_eq!(batch.runs_running, 0);
        assert_eq!(batch.state, BatchState::Failed);
        assert!(!batch.is_success());
        assert!(batch.finished_at.is_some());
    }

    #[test]
    fn batch_status_serializes_records() {
        let mut batch = BatchStatus::new(1);
        let mut record = RunRecord::new(sample_run(5, 1));
        record.mark_completed(RunResult::from_exit_code(Some(0), 2.0));
        batch.record(record);
        batch.finish();

        let json = serde_json::to_value(&batch).unwrap();
        assert_eq!(json["state"], "Completed");
        assert_eq!(json["records"][0]["run"]["seed"], 5);
        assert_eq!(json["records"][0]["result"]["exit_code"], 0);
    }
}
