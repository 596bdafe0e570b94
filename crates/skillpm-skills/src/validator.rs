//! Registry integrity checks
//!
//! Validation never stops at the first problem: every duplicate pair and
//! every missing reference is collected and returned together.

use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use skillpm_types::SkillRecord;

use crate::error::ValidationError;
use crate::registry::SkillRegistry;

/// Validate `registry` against the filesystem.
///
/// A reference must name a regular file; a directory counts as missing.
pub fn validate(registry: &SkillRegistry) -> Result<(), Vec<ValidationError>> {
    validate_with(registry, Path::is_file)
}

/// Validate `registry`, asking `exists` whether each reference is present.
///
/// `exists` receives the reference joined onto the skill directory.
pub fn validate_with<F>(registry: &SkillRegistry, exists: F) -> Result<(), Vec<ValidationError>>
where
    F: Fn(&Path) -> bool,
{
    let mut errors = duplicate_names(registry.records());

    for record in registry.records() {
        for reference in &record.references {
            let full = record.dir.join(reference);
            if !exists(&full) {
                debug!("Skill '{}' is missing reference {:?}", record.name, full);
                errors.push(ValidationError::MissingReference {
                    skill: record.name.clone(),
                    path: reference.clone(),
                });
            }
        }
    }

    if errors.is_empty() {
        info!("Validated {} skills", registry.len());
        Ok(())
    } else {
        info!("Validation found {} error(s)", errors.len());
        Err(errors)
    }
}

/// One error per colliding pair, in declaration order
fn duplicate_names(records: &[SkillRecord]) -> Vec<ValidationError> {
    let mut groups: Vec<Vec<&SkillRecord>> = Vec::new();
    let mut slot: HashMap<&str, usize> = HashMap::new();

    for record in records {
        let i = *slot.entry(record.name.as_str()).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[i].push(record);
    }

    let mut errors = Vec::new();
    for group in groups.iter().filter(|g| g.len() > 1) {
        for (i, first) in group.iter().enumerate() {
            for second in &group[i + 1..] {
                errors.push(ValidationError::DuplicateName {
                    name: first.name.clone(),
                    first: first.dir.clone(),
                    second: second.dir.clone(),
                });
            }
        }
    }

    errors
}
