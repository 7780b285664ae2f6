//! Bounded worker pool that executes planned runs.
//!
//! Runs are executed on a fixed-size [`rayon::ThreadPool`]; workers report
//! lifecycle events over a channel and the calling thread consumes them in
//! arrival order, which is completion order rather than submission order.

use crossbeam_channel::unbounded;
use rayon::ThreadPoolBuilder;
use tracing::{debug, info};

use tb_types::{BatchStatus, ExecutionError, LaunchConfig, LaunchResult, RunDescriptor, RunRecord};

use crate::execute::execute;

/// Progress notifications emitted while a batch runs.
#[derive(Debug, Clone, PartialEq)]
pub enum LaunchEvent {
    /// A worker picked up a run.
    Started {
        run: RunDescriptor,
        worker_id: String,
    },
    /// A run finished, successfully or not.
    Finished(RunRecord),
}

/// Executes planned runs under the pool bound of a [`LaunchConfig`].
pub struct Launcher {
    config: LaunchConfig,
}

impl Launcher {
    pub fn new(config: LaunchConfig) -> Self {
        Self { config }
    }

    /// Execute every run with at most `max_workers` running at once, calling
    /// `on_event` from the current thread for each event as it arrives.
    ///
    /// A failing run never cancels its siblings; the returned batch status
    /// holds one record per run in completion order. An invalid config is
    /// rejected before any run starts.
    pub fn run_all<F>(&self, runs: Vec<RunDescriptor>, mut on_event: F) -> LaunchResult<BatchStatus>
    where
        F: FnMut(&LaunchEvent),
    {
        self.config.validate()?;

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.config.max_workers)
            .thread_name(|i| format!("tb-worker-{i}"))
            .build()
            .map_err(|e| ExecutionError::WorkerPool {
                message: e.to_string(),
            })?;

        let mut status = BatchStatus::new(runs.len());
        status.mark_running();
        info!(
            batch = %status.id,
            runs = runs.len(),
            workers = self.config.max_workers,
            "Launching batch"
        );

        let (tx, rx) = unbounded::<LaunchEvent>();
        let total = runs.len();
        let command = &self.config.command;
        let policy = self.config.failure_policy;

        pool.in_place_scope(|scope| {
            for run in runs {
                let tx = tx.clone();
                scope.spawn(move |_| {
                    let worker_id = std::thread::current()
                        .name()
                        .unwrap_or("tb-worker")
                        .to_string();
                    let _ = tx.send(LaunchEvent::Started {
                        run: run.clone(),
                        worker_id: worker_id.clone(),
                    });
                    let record = execute(run, command, policy, Some(worker_id));
                    let _ = tx.send(LaunchEvent::Finished(record));
                });
            }
            drop(tx);

            let mut finished = 0;
            while finished < total {
                let Ok(event) = rx.recv() else { break };
                match &event {
                    LaunchEvent::Started { run, worker_id } => {
                        debug!(worker = %worker_id, "Started {}", run);
                        status.run_started();
                    }
                    LaunchEvent::Finished(record) => {
                        finished += 1;
                        status.record(record.clone());
                    }
                }
                on_event(&event);
            }
        });

        status.finish();
        info!(
            batch = %status.id,
            completed = status.runs_completed,
            failed = status.runs_failed,
            "Batch finished"
        );
        Ok(status)
    }
}
