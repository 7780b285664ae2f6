//! Planning: turn a [`LaunchConfig`] into run descriptors and materialize
//! their directories.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use tracing::{debug, info};
use walkdir::WalkDir;

use tb_types::{LaunchConfig, LaunchResult, PlanError, RunDescriptor};

/// Validate the configuration and compute every run, without touching the
/// filesystem beyond existence checks.
///
/// All base directories are checked before anything is returned, so a
/// missing one aborts planning before any run directory is created.
/// Runs are ordered template by template, seeds in configured order.
pub fn plan_runs(config: &LaunchConfig) -> LaunchResult<Vec<RunDescriptor>> {
    config.validate()?;

    for scenario in &config.scenarios {
        if !scenario.base_dir.exists() {
            return Err(PlanError::BaseDirMissing {
                path: scenario.base_dir.clone(),
            }
            .into());
        }
        if !scenario.base_dir.is_dir() {
            return Err(PlanError::BaseDirNotDirectory {
                path: scenario.base_dir.clone(),
            }
            .into());
        }
    }

    let mut runs = Vec::with_capacity(config.total_runs());
    let mut destinations = HashSet::with_capacity(config.total_runs());

    for scenario in &config.scenarios {
        for (offset, seed) in config.seeds.iter().enumerate() {
            let run = RunDescriptor::new(scenario, *seed, offset + 1, config.threads_per_run);
            if !destinations.insert(run.path.clone()) {
                return Err(PlanError::DuplicateDestination { path: run.path }.into());
            }
            runs.push(run);
        }
    }

    debug!("Planned {} runs across {} scenarios", runs.len(), config.scenarios.len());
    Ok(runs)
}

/// Copy every run's template into its run directory.
///
/// `runs` must be the output of [`plan_runs`] for the same `config`; each run
/// is paired with its template by position, not looked up by label.
pub fn materialize(config: &LaunchConfig, runs: &[RunDescriptor]) -> LaunchResult<()> {
    if runs.len() != config.total_runs() {
        return Err(tb_types::internal_error!(
            "expected {} planned runs, got {}",
            config.total_runs(),
            runs.len()
        ));
    }

    let templates = config
        .scenarios
        .iter()
        .flat_map(|scenario| config.seeds.iter().map(move |_| scenario));

    for (scenario, run) in templates.zip(runs) {
        if run.path != scenario.run_path(run.seed) {
            return Err(tb_types::internal_error!(
                "run {} was not planned from scenario {}",
                run,
                scenario.label
            ));
        }

        copy_tree(&scenario.base_dir, &run.path)?;
        info!("Prepared {}", run.path.display());
    }
    Ok(())
}

/// Plan the batch and create all run directories.
pub fn plan(config: &LaunchConfig) -> LaunchResult<Vec<RunDescriptor>> {
    let runs = plan_runs(config)?;
    materialize(config, &runs)?;
    Ok(runs)
}

/// Recursively copy the contents of `src` into `dst`.
///
/// Parent directories are created as needed and existing files at the
/// destination are overwritten; files only present in `dst` are left alone.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<(), PlanError> {
    let copy_failed = |to: &Path, message: String| PlanError::CopyFailed {
        from: src.to_path_buf(),
        to: to.to_path_buf(),
        message,
    };

    if !src.is_dir() {
        return Err(copy_failed(dst, "source is not a directory".to_string()));
    }
    fs::create_dir_all(dst).map_err(|e| copy_failed(dst, e.to_string()))?;

    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry.map_err(|e| copy_failed(dst, e.to_string()))?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| copy_failed(dst, e.to_string()))?;
        if rel.as_os_str().is_empty() {
            continue;
        }

        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| copy_failed(&target, e.to_string()))?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| copy_failed(parent, e.to_string()))?;
            }
            fs::copy(entry.path(), &target).map_err(|e| copy_failed(&target, e.to_string()))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tb_types::{LaunchError, ScenarioTemplate};
    use tempfile::tempdir;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn two_scenario_config(root: &Path) -> LaunchConfig {
        for label in ["A", "B"] {
            write(&root.join(label).join("Base/scenario.txt"), "maxExperiments=100\n");
            write(&root.join(label).join("Base/instances/i1.tsp"), "NODE 1\n");
        }
        LaunchConfig::new(
            vec![
                ScenarioTemplate::under(root, "A"),
                ScenarioTemplate::under(root, "B"),
            ],
            vec![1, 2],
        )
        .with_threads_per_run(3)
    }

    #[test]
    fn plan_runs_assigns_paths_and_indices() {
        let tmp = tempdir().unwrap();
        let config = two_scenario_config(tmp.path());
        let runs = plan_runs(&config).unwrap();

        let summary: Vec<(String, u64, usize)> = runs
            .iter()
            .map(|r| {
                let name = r.path.file_name().unwrap().to_string_lossy().into_owned();
                (name, r.seed, r.run_index)
            })
            .collect();
        assert_eq!(
            summary,
            vec![
                ("A_seed_1".to_string(), 1, 1),
                ("A_seed_2".to_string(), 2, 2),
                ("B_seed_1".to_string(), 1, 1),
                ("B_seed_2".to_string(), 2, 2),
            ]
        );
        assert!(runs.iter().all(|r| r.threads == 3));
        assert_eq!(runs[0].path, tmp.path().join("A/Runs/A_seed_1"));

        // Dry planning creates nothing.
        assert!(!tmp.path().join("A/Runs").exists());
    }

    #[test]
    fn missing_base_dir_creates_nothing() {
        let tmp = tempdir().unwrap();
        let mut config = two_scenario_config(tmp.path());
        config
            .scenarios
            .push(ScenarioTemplate::under(tmp.path(), "Missing"));

        let err = plan(&config).unwrap_err();
        match err {
            LaunchError::Plan(PlanError::BaseDirMissing { path }) => {
                assert_eq!(path, tmp.path().join("Missing/Base"));
            }
            other => panic!("expected BaseDirMissing, got {other:?}"),
        }
        assert!(!tmp.path().join("A/Runs").exists());
        assert!(!tmp.path().join("B/Runs").exists());
    }

    #[test]
    fn file_as_base_dir_creates_nothing() {
        let tmp = tempdir().unwrap();
        let mut config = two_scenario_config(tmp.path());
        write(&tmp.path().join("C/Base"), "not a directory\n");
        config.scenarios.push(ScenarioTemplate::under(tmp.path(), "C"));

        let err = plan(&config).unwrap_err();
        match err {
            LaunchError::Plan(PlanError::BaseDirNotDirectory { path }) => {
                assert_eq!(path, tmp.path().join("C/Base"));
            }
            other => panic!("expected BaseDirNotDirectory, got {other:?}"),
        }
        assert!(!tmp.path().join("A/Runs").exists());
        assert!(!tmp.path().join("C/Runs").exists());
    }

    #[test]
    fn same_label_in_nested_dest_dirs_copies_own_template() {
        let tmp = tempdir().unwrap();
        write(&tmp.path().join("one/scenario.txt"), "from-one\n");
        write(&tmp.path().join("two/scenario.txt"), "from-two\n");
        let runs_root = tmp.path().join("R");
        let config = LaunchConfig::new(
            vec![
                ScenarioTemplate::new(tmp.path().join("one"), &runs_root, "A"),
                ScenarioTemplate::new(tmp.path().join("two"), runs_root.join("x"), "A"),
            ],
            vec![1],
        );

        plan(&config).unwrap();

        assert_eq!(
            fs::read_to_string(runs_root.join("A_seed_1/scenario.txt")).unwrap(),
            "from-one\n"
        );
        assert_eq!(
            fs::read_to_string(runs_root.join("x/A_seed_1/scenario.txt")).unwrap(),
            "from-two\n"
        );
    }

    #[test]
    fn materialize_rejects_runs_from_another_config() {
        let tmp = tempdir().unwrap();
        let config = two_scenario_config(tmp.path());
        let mut runs = plan_runs(&config).unwrap();
        runs.swap(0, 2);

        let err = materialize(&config, &runs).unwrap_err();
        assert!(matches!(err, LaunchError::Internal(_)));

        let err = materialize(&config, &runs[..1]).unwrap_err();
        assert!(matches!(err, LaunchError::Internal(_)));
    }

    #[test]
    fn copy_tree_rejects_file_source() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("file.txt");
        write(&src, "x");

        let err = copy_tree(&src, &tmp.path().join("dst")).unwrap_err();
        assert!(matches!(err, PlanError::CopyFailed { .. }));
        assert!(!tmp.path().join("dst").exists());
    }

    #[test]
    fn plan_copies_full_tree() {
        let tmp = tempdir().unwrap();
        let config = two_scenario_config(tmp.path());
        let runs = plan(&config).unwrap();

        for run in &runs {
            assert_eq!(
                fs::read_to_string(run.path.join("scenario.txt")).unwrap(),
                "maxExperiments=100\n"
            );
            assert!(run.path.join("instances/i1.tsp").is_file());
        }
        // The template itself is untouched.
        assert!(!tmp.path().join("A/Base/A_seed_1").exists());
    }

    #[test]
    fn copy_tree_overwrites_and_keeps_unrelated_files() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write(&src.join("scenario.txt"), "fresh\n");
        write(&src.join("nested/deep/params.txt"), "a\n");
        write(&dst.join("scenario.txt"), "stale\n");
        write(&dst.join("irace.Rdata"), "previous results");

        copy_tree(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(dst.join("scenario.txt")).unwrap(), "fresh\n");
        assert_eq!(
            fs::read_to_string(dst.join("nested/deep/params.txt")).unwrap(),
            "a\n"
        );
        assert_eq!(
            fs::read_to_string(dst.join("irace.Rdata")).unwrap(),
            "previous results"
        );
    }

    #[test]
    fn copy_tree_of_empty_dir_creates_destination() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("empty");
        fs::create_dir_all(&src).unwrap();
        let dst = tmp.path().join("out/run");

        copy_tree(&src, &dst).unwrap();
        assert!(dst.is_dir());
    }

    #[test]
    fn invalid_config_is_rejected_before_fs_checks() {
        let config = LaunchConfig::new(vec![ScenarioTemplate::under("/nonexistent", "A")], vec![]);
        let err = plan_runs(&config).unwrap_err();
        assert!(matches!(err, LaunchError::Validation(_)));
    }
}
