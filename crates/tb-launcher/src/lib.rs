//! # tb-launcher
//!
//! Plans tuning runs from a [`LaunchConfig`](tb_types::LaunchConfig), clones
//! each scenario template into its run directory, and executes the tuning
//! tool for every run under a bounded worker pool.

pub mod execute;
pub mod plan;
pub mod pool;
pub mod report;

pub use execute::{append_run_settings, execute, run_command};
pub use plan::{copy_tree, materialize, plan, plan_runs};
pub use pool::{LaunchEvent, Launcher};
