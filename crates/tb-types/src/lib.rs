//! # tb-types
//!
//! Core types for TuneBatch: scenario templates, run descriptors, run and
//! batch lifecycle, launch configuration with the built-in presets, and the
//! error taxonomy shared by the launcher.

pub mod config;
pub mod errors;
pub mod run;
pub mod scenario;

pub use config::*;
pub use errors::*;
pub use run::*;
pub use scenario::*;
