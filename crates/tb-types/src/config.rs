//! Launch configuration: which templates, which seeds, how many workers, and
//! what command to run in each run directory.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::errors::LaunchResult;
use crate::scenario::ScenarioTemplate;
use crate::{config_error, validation_error};

/// How a non-zero exit of the tuning tool is judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Every subprocess that finishes counts as completed; the exit code is
    /// recorded but not judged.
    #[default]
    Lenient,
    /// A non-zero exit or a failed launch marks the run (and the batch) failed.
    Strict,
}

/// The external command run inside every run directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningCommand {
    pub program: String,
    pub args: Vec<String>,
    /// File inside the run directory that receives the run settings.
    pub scenario_file: String,
    /// File inside the run directory that receives stdout and stderr.
    pub log_file: String,
}

impl Default for TuningCommand {
    fn default() -> Self {
        Self {
            program: "Rscript".to_string(),
            args: vec!["execute_irace.R".to_string()],
            scenario_file: "scenario.txt".to_string(),
            log_file: "output.log".to_string(),
        }
    }
}

impl TuningCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            ..Self::default()
        }
    }

    /// Shell-like rendering for logs.
    pub fn display_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Top-level configuration for one batch of tuning runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchConfig {
    pub scenarios: Vec<ScenarioTemplate>,
    pub seeds: Vec<u64>,

    /// Maximum number of simultaneous executions.
    pub max_workers: usize,

    /// Number of threads each tuning run is told to use.
    pub threads_per_run: usize,

    pub command: TuningCommand,

    pub failure_policy: FailurePolicy,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            scenarios: Vec::new(),
            seeds: Vec::new(),
            max_workers: 1,
            threads_per_run: 1,
            command: TuningCommand::default(),
            failure_policy: FailurePolicy::Lenient,
        }
    }
}

impl LaunchConfig {
    pub fn new(scenarios: Vec<ScenarioTemplate>, seeds: Vec<u64>) -> Self {
        Self {
            scenarios,
            seeds,
            ..Self::default()
        }
    }

    pub fn with_max_workers(mut self, n: usize) -> Self {
        self.max_workers = n;
        self
    }

    pub fn with_threads_per_run(mut self, n: usize) -> Self {
        self.threads_per_run = n;
        self
    }

    pub fn with_command(mut self, command: TuningCommand) -> Self {
        self.command = command;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Resolve every relative template directory against `root`.
    pub fn rebased(mut self, root: &Path) -> Self {
        self.scenarios = self.scenarios.iter().map(|s| s.rebased(root)).collect();
        self
    }

    /// Total number of runs this configuration plans.
    pub fn total_runs(&self) -> usize {
        self.scenarios.len() * self.seeds.len()
    }

    /// Parse a TOML document.  Omitted fields take their defaults.
    pub fn from_toml_str(source: &str) -> LaunchResult<Self> {
        toml::from_str(source).map_err(|e| config_error!("invalid launch config: {e}"))
    }

    /// Load and validate a TOML config file.
    pub fn from_file(path: &Path) -> LaunchResult<Self> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| config_error!("cannot read {}: {e}", path.display()))?;
        let config = Self::from_toml_str(&source)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration before any directory is touched.
    pub fn validate(&self) -> LaunchResult<()> {
        if self.scenarios.is_empty() {
            return Err(validation_error!("no scenario templates configured"));
        }
        if self.seeds.is_empty() {
            return Err(validation_error!("no seeds configured"));
        }
        if self.max_workers == 0 {
            return Err(validation_error!("max_workers must be at least 1"));
        }
        if self.threads_per_run == 0 {
            return Err(validation_error!("threads_per_run must be at least 1"));
        }
        if self.command.program.trim().is_empty() {
            return Err(validation_error!("tuning command program is empty"));
        }
        if self.command.scenario_file.is_empty() || self.command.log_file.is_empty() {
            return Err(validation_error!("scenario_file and log_file must be set"));
        }

        let mut seen_seeds = HashSet::new();
        for seed in &self.seeds {
            if !seen_seeds.insert(seed) {
                return Err(validation_error!("seed {seed} is listed more than once"));
            }
        }

        // Two templates may share a dest_dir, but then their labels must differ.
        let mut seen_targets: HashSet<(PathBuf, &str)> = HashSet::new();
        for scenario in &self.scenarios {
            if scenario.label.trim().is_empty() {
                return Err(validation_error!(
                    "scenario with base dir {} has an empty label",
                    scenario.base_dir.display()
                ));
            }
            if !seen_targets.insert((scenario.dest_dir.clone(), scenario.label.as_str())) {
                return Err(validation_error!(
                    "scenario label {} is used twice under {}",
                    scenario.label,
                    scenario.dest_dir.display()
                ));
            }
        }

        Ok(())
    }
}

/// Built-in batches matching the tuning experiments this tool was written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    /// ACOTSP race-data experiments: four scenarios, two workers.
    AcotspRaceData,
    /// PSO-X experiments: two mixed scenarios, one worker.
    PsoX,
}

impl Preset {
    pub const ALL: [Preset; 2] = [Preset::AcotspRaceData, Preset::PsoX];

    pub fn name(&self) -> &'static str {
        match self {
            Self::AcotspRaceData => "acotsp-race-data",
            Self::PsoX => "pso-x",
        }
    }

    pub fn config(&self) -> LaunchConfig {
        match self {
            Self::AcotspRaceData => LaunchConfig::new(
                ["BL-22", "BL-45", "BH-45", "BH-90"]
                    .into_iter()
                    .map(|label| ScenarioTemplate::under("Scenarios", label))
                    .collect(),
                vec![2314, 9876543210],
            )
            .with_max_workers(2)
            .with_threads_per_run(10),
            Self::PsoX => LaunchConfig::new(
                ["BH-Mixed-32", "BH-Mixed-65"]
                    .into_iter()
                    .map(|label| ScenarioTemplate::under("Scenarios", label))
                    .collect(),
                vec![839201, 198347562],
            )
            .with_max_workers(1)
            .with_threads_per_run(10),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.name() == s)
            .ok_or_else(|| {
                let names: Vec<_> = Self::ALL.iter().map(Preset::name).collect();
                format!("unknown preset '{s}' (expected one of: {})", names.join(", "))
            })
    }
}
