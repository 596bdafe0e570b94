//! Bundle materialization
//!
//! Converts a [`ResolvedBundle`] back into full records, re-checking each
//! name against the registry, and describes the result as an install
//! manifest. Writing anything to disk is left to the installer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info};

use skillpm_types::{ResolvedBundle, Selector, SkillRecord, Tier};

use crate::bundles::BundleCatalog;
use crate::error::{MaterializationError, Result};
use crate::registry::SkillRegistry;
use crate::resolver::Resolver;

/// Records ready for installation, in install order
#[derive(Debug, Clone)]
pub struct Materialized<'a> {
    /// Label of the resolved bundle, if one was named
    pub label: Option<String>,
    /// Full records, no name repeated
    pub records: Vec<&'a SkillRecord>,
}

/// Serializable description of an installed bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallManifest {
    /// Bundle label, if one was named
    pub bundle: Option<String>,
    /// When the manifest was produced
    pub generated_at: DateTime<Utc>,
    /// Skills in install order
    pub skills: Vec<ManifestEntry>,
}

/// One skill in an [`InstallManifest`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Skill name
    pub name: String,
    /// Skill tier
    pub tier: Tier,
    /// Activation description
    pub description: String,
    /// Directory the skill was loaded from
    pub source: PathBuf,
    /// Auxiliary resources relative to the skill directory
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<PathBuf>,
}

/// Look up every resolved name, preserving order and dropping repeats
pub fn materialize<'a>(
    resolved: &ResolvedBundle,
    registry: &'a SkillRegistry,
) -> std::result::Result<Materialized<'a>, MaterializationError> {
    let mut seen = HashSet::with_capacity(resolved.len());
    let mut records = Vec::with_capacity(resolved.len());

    for name in resolved.iter() {
        if !seen.insert(name) {
            debug!("Dropping repeated skill '{}'", name);
            continue;
        }

        let record = registry
            .lookup(name)
            .map_err(|_| MaterializationError::MissingSkill {
                name: name.to_string(),
            })?;
        records.push(record);
    }

    info!("Materialized {} skills", records.len());
    Ok(Materialized {
        label: resolved.label.clone(),
        records,
    })
}

/// Resolve `selector` and materialize the result in one step
pub fn plan<'a>(
    registry: &'a SkillRegistry,
    bundles: &BundleCatalog,
    selector: &Selector,
) -> Result<Materialized<'a>> {
    let resolver = Resolver::new(registry, bundles);
    let resolved = match selector {
        Selector::Bundle(id) => resolver.resolve_bundle(id)?,
        other => resolver.resolve(other)?,
    };
    Ok(materialize(&resolved, registry)?)
}

impl Materialized<'_> {
    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing was selected
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Describe the records as an install manifest
    pub fn manifest(&self) -> InstallManifest {
        InstallManifest {
            bundle: self.label.clone(),
            generated_at: Utc::now(),
            skills: self
                .records
                .iter()
                .map(|r| ManifestEntry {
                    name: r.name.clone(),
                    tier: r.tier,
                    description: r.description.clone(),
                    source: r.dir.clone(),
                    references: r.references.clone(),
                })
                .collect(),
        }
    }
}

impl InstallManifest {
    /// Pretty JSON rendering
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
