//! Scenario templates and the run descriptors planned from them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// A directory of tuning-tool configuration files defining one experiment
/// variant.  Read-only: runs are cloned from it, never written into it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScenarioTemplate {
    /// Directory whose contents are copied into every run directory.
    pub base_dir: PathBuf,
    /// Parent directory under which run directories are created.
    pub dest_dir: PathBuf,
    /// Scenario label (e.g. "BL-22"), used to name run directories.
    pub label: String,
}

impl ScenarioTemplate {
    pub fn new(
        base_dir: impl Into<PathBuf>,
        dest_dir: impl Into<PathBuf>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            base_dir: base_dir.into(),
            dest_dir: dest_dir.into(),
            label: label.into(),
        }
    }

    /// Template following the `<root>/<label>/Base` → `<root>/<label>/Runs`
    /// layout used by the tuning experiments.
    pub fn under(root: impl AsRef<Path>, label: impl Into<String>) -> Self {
        let label = label.into();
        let scenario_root = root.as_ref().join(&label);
        Self::new(scenario_root.join("Base"), scenario_root.join("Runs"), label)
    }

    /// Directory name of the run for `seed`.
    pub fn run_dir_name(&self, seed: u64) -> String {
        format!("{}_seed_{}", self.label, seed)
    }

    /// Full path of the run directory for `seed`.
    pub fn run_path(&self, seed: u64) -> PathBuf {
        self.dest_dir.join(self.run_dir_name(seed))
    }

    /// Resolve relative directories against `root`.  Absolute paths are kept.
    pub fn rebased(&self, root: &Path) -> Self {
        Self {
            base_dir: root.join(&self.base_dir),
            dest_dir: root.join(&self.dest_dir),
            label: self.label.clone(),
        }
    }
}

/// One planned (template, seed) run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunDescriptor {
    /// Run directory, `{dest_dir}/{label}_seed_{seed}`.
    pub path: PathBuf,
    /// Label of the template the run was cloned from.
    pub label: String,
    /// Random seed handed to the tuning tool.
    pub seed: u64,
    /// 1-based index of this run within its template.
    pub run_index: usize,
    /// Thread count handed to the tuning tool.
    pub threads: usize,
}

impl RunDescriptor {
    pub fn new(template: &ScenarioTemplate, seed: u64, run_index: usize, threads: usize) -> Self {
        Self {
            path: template.run_path(seed),
            label: template.label.clone(),
            seed,
            run_index,
            threads,
        }
    }

    /// The settings block appended to the tuning tool's scenario file.
    pub fn settings_block(&self) -> String {
        format!(
            "\n## Seed\nseed={}\n\n## Scenario ID\n#id_scenario={}\n\n## Number of threads\nparallel={}\n",
            self.seed, self.run_index, self.threads
        )
    }
}

impl fmt::Display for RunDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (seed={}, run_id={})",
            self.path.display(),
            self.seed,
            self.run_index
        )
    }
}
