//! Launch a batch of tuning runs: one run directory per scenario template
//! and seed, executed by a bounded pool of workers.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tb_launcher::{materialize, plan_runs, report, LaunchEvent, Launcher};
use tb_types::{FailurePolicy, LaunchConfig, Preset};

#[derive(Parser, Debug)]
#[command(name = "tunebatch")]
#[command(about = "Clone scenario templates per seed and run the tuning tool in each", long_about = None)]
struct Cli {
    /// Built-in batch to launch
    #[arg(long, default_value_t = Preset::AcotspRaceData)]
    preset: Preset,

    /// TOML launch config, used instead of the preset
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Resolve relative scenario directories against this directory
    #[arg(long)]
    root: Option<PathBuf>,

    /// Maximum number of simultaneous executions
    #[arg(long)]
    max_workers: Option<usize>,

    /// Number of threads handed to each tuning run
    #[arg(long)]
    threads: Option<usize>,

    /// Treat a non-zero exit of the tuning tool as a failed run
    #[arg(long)]
    strict: bool,

    /// Print the planned runs without copying or executing anything
    #[arg(long)]
    dry_run: bool,

    /// Write the final batch status as JSON
    #[arg(long)]
    report: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn launch_config(&self) -> Result<LaunchConfig> {
        let mut config = match &self.config {
            Some(path) => LaunchConfig::from_file(path)
                .with_context(|| format!("loading launch config {}", path.display()))?,
            None => self.preset.config(),
        };
        if let Some(root) = &self.root {
            config = config.rebased(root);
        }
        if let Some(n) = self.max_workers {
            config = config.with_max_workers(n);
        }
        if let Some(n) = self.threads {
            config = config.with_threads_per_run(n);
        }
        if self.strict {
            config = config.with_failure_policy(FailurePolicy::Strict);
        }
        Ok(config)
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "tb_launcher=debug,tunebatch=debug,info"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.launch_config()?;
    info!(
        scenarios = config.scenarios.len(),
        seeds = config.seeds.len(),
        command = %config.command.display_line(),
        "Loaded launch config"
    );

    let runs = plan_runs(&config).context("planning runs")?;

    if cli.dry_run {
        for run in &runs {
            println!("{run}");
        }
        return Ok(ExitCode::SUCCESS);
    }

    materialize(&config, &runs).context("preparing run directories")?;

    for line in report::batch_header(&config, runs.len()) {
        println!("{line}\n");
    }
    println!("Executing scenarios...\n");

    let launcher = Launcher::new(config);
    let status = launcher.run_all(runs, |event| {
        if let LaunchEvent::Finished(record) = event {
            println!("{}", report::ready_line(record));
            println!("{}\n", report::completed_line(record));
        }
    })?;

    println!("{}\n", report::summary_line(&status));

    if let Some(path) = &cli.report {
        report::write_report(path, &status)
            .with_context(|| format!("writing report {}", path.display()))?;
        info!("Report written to {}", path.display());
    }

    Ok(if status.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
