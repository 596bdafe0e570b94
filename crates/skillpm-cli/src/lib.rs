//! Installer CLI for skillpm.
//!
//! Loads skills, validates them, resolves a selection and writes the
//! materialized bundle into a target directory.

pub mod cli;
pub mod config;
pub mod install;
pub mod service;

pub use cli::Cli;
pub use config::Config;
pub use install::{InstallError, InstallMode, InstallReport, Installer};
pub use service::{classify, usage_outcome, Outcome, SkillpmService};
