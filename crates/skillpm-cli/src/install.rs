//! Writes a materialized bundle into a target directory
//!
//! An install runs on a blocking worker in two phases.
//!
//! Staging copies every skill and the manifest into `.skillpm-staging`
//! inside the target. The deadline is checked before each file; a missed
//! deadline or a failed copy removes the staging directory.
//!
//! Commit only renames. An entry already present in the target is moved
//! aside into the staging directory before the staged copy takes its place.
//! If any rename fails, the completed steps are undone in reverse order and
//! the target is left as it was. The deadline no longer applies once commit
//! has started.
//!
//! [`Installer::install`] returns only after the worker has stopped, so
//! nothing lands in the target after an error is reported.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

use skillpm_skills::source::SKILL_FILE;
use skillpm_skills::Materialized;

/// Name of the manifest written into the target directory
pub const MANIFEST_FILE: &str = "skillpm-manifest.json";

const STAGING_DIR: &str = ".skillpm-staging";
const PREVIOUS_DIR: &str = ".previous";

/// What an install writes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InstallMode {
    /// Copy SKILL.md and references of each skill, plus the manifest
    #[default]
    Copy,
    /// Write the manifest only
    Manifest,
}

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("install into {target:?} timed out after {secs}s")]
    Timeout { target: PathBuf, secs: u64 },

    #[error("failed to encode manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("install worker stopped unexpectedly: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> InstallError + '_ {
    move |source| InstallError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Summary of a finished install
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub skills: Vec<String>,
    pub files: usize,
    pub manifest: PathBuf,
}

pub struct Installer {
    target: PathBuf,
    mode: InstallMode,
    timeout: Duration,
}

impl Installer {
    pub fn new(target: impl Into<PathBuf>, mode: InstallMode, timeout: Duration) -> Self {
        Self {
            target: target.into(),
            mode,
            timeout,
        }
    }

    /// Install `plan`, giving up if staging overruns the configured timeout
    pub async fn install(&self, plan: &Materialized<'_>) -> Result<InstallReport, InstallError> {
        info!(
            "Installing {} skills into {:?} ({:?} mode)",
            plan.len(),
            self.target,
            self.mode
        );

        let skills = match self.mode {
            InstallMode::Copy => plan
                .records
                .iter()
                .map(|r| SkillFiles {
                    name: r.name.clone(),
                    dir: r.dir.clone(),
                    references: r.references.clone(),
                })
                .collect(),
            InstallMode::Manifest => Vec::new(),
        };

        let job = InstallJob {
            target: self.target.clone(),
            skills,
            manifest: plan.manifest().to_json()?,
            deadline: Instant::now().checked_add(self.timeout),
            timeout: self.timeout,
        };

        let files = tokio::task::spawn_blocking(move || job.run()).await??;

        info!("Installed {} skills ({} files)", plan.len(), files);
        Ok(InstallReport {
            skills: plan.records.iter().map(|r| r.name.clone()).collect(),
            files,
            manifest: self.target.join(MANIFEST_FILE),
        })
    }
}

/// Files of one skill to copy
#[derive(Debug, Clone)]
struct SkillFiles {
    name: String,
    dir: PathBuf,
    references: Vec<PathBuf>,
}

/// Everything the worker needs, owned so it can leave the async task
#[derive(Debug)]
struct InstallJob {
    target: PathBuf,
    skills: Vec<SkillFiles>,
    manifest: String,
    /// `None` when the timeout is too large to represent
    deadline: Option<Instant>,
    timeout: Duration,
}

impl InstallJob {
    /// Stage, commit, and always clear the staging directory
    fn run(self) -> Result<usize, InstallError> {
        let staging = self.target.join(STAGING_DIR);
        remove_staging(&staging);

        let result = self.stage(&staging).and_then(|files| {
            let entries: Vec<&str> = self
                .skills
                .iter()
                .map(|s| s.name.as_str())
                .chain(std::iter::once(MANIFEST_FILE))
                .collect();
            commit(&self.target, &staging, &entries)?;
            Ok(files)
        });

        remove_staging(&staging);
        result
    }

    fn stage(&self, staging: &Path) -> Result<usize, InstallError> {
        self.check_deadline()?;
        fs::create_dir_all(staging).map_err(io_error(staging))?;

        let mut files = 0;
        for skill in &self.skills {
            let dest = staging.join(&skill.name);
            let wanted = std::iter::once(Path::new(SKILL_FILE))
                .chain(skill.references.iter().map(PathBuf::as_path));

            for rel in wanted {
                self.check_deadline()?;
                copy_file(&skill.dir.join(rel), &dest.join(rel))?;
                files += 1;
            }
            debug!("Staged skill '{}'", skill.name);
        }

        self.check_deadline()?;
        let manifest = staging.join(MANIFEST_FILE);
        fs::write(&manifest, &self.manifest).map_err(io_error(&manifest))?;

        Ok(files)
    }

    fn check_deadline(&self) -> Result<(), InstallError> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(InstallError::Timeout {
                target: self.target.clone(),
                secs: self.timeout.as_secs(),
            }),
            _ => Ok(()),
        }
    }
}

fn copy_file(from: &Path, to: &Path) -> Result<(), InstallError> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(io_error(parent))?;
    }
    fs::copy(from, to).map_err(io_error(from))?;
    Ok(())
}

fn remove_staging(staging: &Path) {
    match fs::remove_dir_all(staging) {
        Ok(()) => debug!("Removed staging directory {:?}", staging),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove staging directory {:?}: {}", staging, e),
    }
}

/// A completed commit step
#[derive(Debug)]
enum Step {
    /// An existing entry was moved into the backup area
    MovedAside { installed: PathBuf, backup: PathBuf },
    /// A staged entry was moved into the target
    Placed { installed: PathBuf },
}

/// Move each staged entry into `target`, undoing everything on failure
fn commit(target: &Path, staging: &Path, entries: &[&str]) -> Result<(), InstallError> {
    let previous = staging.join(PREVIOUS_DIR);
    let mut done = Vec::with_capacity(entries.len() * 2);

    for entry in entries {
        let outcome = commit_entry(
            &staging.join(entry),
            &target.join(entry),
            &previous.join(entry),
            &mut done,
        );

        if let Err(e) = outcome {
            warn!(
                "Commit failed at '{}', rolling back {} step(s): {}",
                entry,
                done.len(),
                e
            );
            rollback(done);
            return Err(e);
        }
    }

    Ok(())
}

fn commit_entry(
    staged: &Path,
    installed: &Path,
    backup: &Path,
    done: &mut Vec<Step>,
) -> Result<(), InstallError> {
    if fs::symlink_metadata(installed).is_ok() {
        if let Some(parent) = backup.parent() {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }
        fs::rename(installed, backup).map_err(io_error(installed))?;
        done.push(Step::MovedAside {
            installed: installed.to_path_buf(),
            backup: backup.to_path_buf(),
        });
    }

    fs::rename(staged, installed).map_err(io_error(staged))?;
    done.push(Step::Placed {
        installed: installed.to_path_buf(),
    });
    debug!("Committed {:?}", installed);
    Ok(())
}

fn rollback(done: Vec<Step>) {
    for step in done.into_iter().rev() {
        let outcome = match &step {
            Step::Placed { installed } => remove_entry(installed),
            Step::MovedAside { installed, backup } => fs::rename(backup, installed),
        };
        if let Err(e) = outcome {
            warn!("Rollback of {:?} failed: {}", step, e);
        }
    }
}

fn remove_entry(path: &Path) -> std::io::Result<()> {
    if fs::symlink_metadata(path)?.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}
