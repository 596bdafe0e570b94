//! Skill document sources
//!
//! A source directory holds one folder per skill, each with a SKILL.md.
//! Skills may also be grouped one level deeper by tier
//! (`skills/core/fp-composition/SKILL.md`).

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use skillpm_types::Tier;

use crate::error::LoadError;

/// File name of a skill document inside its directory
pub const SKILL_FILE: &str = "SKILL.md";

/// Raw text of one skill document and the directory it lives in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillDocument {
    /// Skill directory; references resolve relative to it
    pub dir: PathBuf,
    /// Full document text
    pub text: String,
}

impl SkillDocument {
    /// Build a document from in-memory text
    pub fn new(dir: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            text: text.into(),
        }
    }
}

/// Ordered list of directories to read skill documents from
#[derive(Debug, Clone, Default)]
pub struct SkillSources {
    directories: Vec<PathBuf>,
}

impl SkillSources {
    /// Create an empty source list
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a skills directory to scan
    pub fn add_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.directories.push(dir.into());
        self
    }

    /// Add personal skills directory: ~/.skillpm/skills/
    pub fn with_personal_skills(self) -> Self {
        if let Some(home) = dirs::home_dir() {
            self.add_directory(home.join(".skillpm").join("skills"))
        } else {
            warn!("Could not find home directory for personal skills");
            self
        }
    }

    /// Add project skills directory: ./skills/
    pub fn with_project_skills(self) -> Self {
        self.add_directory(PathBuf::from("skills"))
    }

    /// Configured directories, in scan order
    pub fn directories(&self) -> &[PathBuf] {
        &self.directories
    }

    /// Read every skill document from the configured directories.
    ///
    /// Directories are scanned in the order they were added; entries within
    /// a directory in sorted path order, so the resulting declaration order
    /// does not depend on the filesystem.
    pub fn read_documents(&self) -> Result<Vec<SkillDocument>, LoadError> {
        info!(
            "Reading skill documents from {} directories",
            self.directories.len()
        );

        let mut documents = Vec::new();

        for dir in &self.directories {
            if !dir.exists() {
                debug!("Skills directory does not exist: {:?}", dir);
                continue;
            }

            if !dir.is_dir() {
                warn!("Skills path is not a directory: {:?}", dir);
                continue;
            }

            scan_directory(dir, true, &mut documents)?;
        }

        info!("Read {} skill documents", documents.len());
        Ok(documents)
    }
}

/// Scan a single directory for skills
fn scan_directory(
    dir: &Path,
    allow_grouping: bool,
    documents: &mut Vec<SkillDocument>,
) -> Result<(), LoadError> {
    for path in sorted_subdirectories(dir)? {
        let skill_file = path.join(SKILL_FILE);

        if skill_file.is_file() {
            let text = fs::read_to_string(&skill_file).map_err(|source| LoadError::Io {
                path: skill_file.clone(),
                source,
            })?;
            debug!("Found skill document at {:?}", skill_file);
            documents.push(SkillDocument { dir: path, text });
        } else if allow_grouping && is_tier_group(&path) {
            scan_directory(&path, false, documents)?;
        } else {
            debug!("Skipping {:?}: no {}", path, SKILL_FILE);
        }
    }

    Ok(())
}

fn sorted_subdirectories(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let io_err = |source: std::io::Error| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_dir() {
            paths.push(path);
        }
    }

    paths.sort();
    Ok(paths)
}

fn is_tier_group(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.parse::<Tier>().is_ok())
}
