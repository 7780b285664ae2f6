use std::path::PathBuf;

use thiserror::Error;

/// Main error type for TuneBatch
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("Plan error: {0}")]
    Plan(#[from] PlanError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Errors raised while planning and materializing run directories.
///
/// Any of these aborts the whole batch before a subprocess is started.
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("The base directory '{}' does not exist.", .path.display())]
    BaseDirMissing { path: PathBuf },

    #[error("The base directory '{}' is not a directory.", .path.display())]
    BaseDirNotDirectory { path: PathBuf },

    #[error("Failed to copy '{}' to '{}': {message}", .from.display(), .to.display())]
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        message: String,
    },

    #[error("Destination '{}' is produced by more than one run", .path.display())]
    DuplicateDestination { path: PathBuf },
}

/// Errors raised while executing a single run.
///
/// These only affect the unit of work they occur in.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Failed to append run settings to '{}': {message}", .path.display())]
    ScenarioFileWrite { path: PathBuf, message: String },

    #[error("Failed to open log file '{}': {message}", .path.display())]
    LogFile { path: PathBuf, message: String },

    #[error("Failed to launch '{program}': {message}")]
    SpawnFailed { program: String, message: String },

    #[error("Tuning command exited with {}", describe_exit(.code))]
    NonZeroExit { code: Option<i32> },

    #[error("Worker pool error: {message}")]
    WorkerPool { message: String },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// Result type alias for TuneBatch operations
pub type LaunchResult<T> = Result<T, LaunchError>;

/// Macro for creating validation errors
#[macro_export]
macro_rules! validation_error {
    ($($arg:tt)*) => {
        $crate::LaunchError::Validation(format!($($arg)*))
    };
}

/// Macro for creating internal errors
#[macro_export]
macro_rules! internal_error {
    ($($arg:tt)*) => {
        $crate::LaunchError::Internal(format!($($arg)*))
    };
}

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::LaunchError::Config(format!($($arg)*))
    };
}
