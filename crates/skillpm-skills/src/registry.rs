//! Skills registry: the immutable catalog of loaded skill records
//!
//! A registry is built once from a set of documents and never mutated
//! afterwards. Records keep their declaration order; lookups by name go
//! through an index that points at the first declaration of each name.

use std::collections::HashMap;
use tracing::{debug, info};

use skillpm_types::{SkillRecord, Tier};

use crate::error::{DocumentError, LoadError, NotFound};
use crate::parser::SkillParser;
use crate::source::{SkillDocument, SkillSources};

/// Read-only catalog of all loaded skills
#[derive(Debug, Clone, Default)]
pub struct SkillRegistry {
    /// Records in declaration order
    records: Vec<SkillRecord>,
    /// Name → position of its first declaration
    index: HashMap<String, usize>,
}

impl SkillRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every document and build a registry.
    ///
    /// All malformed documents are collected before failing, so one pass
    /// reports every broken skill. Duplicate names do not fail the load;
    /// they are reported by [`crate::validator::validate`].
    pub fn load<I>(documents: I) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = SkillDocument>,
    {
        let parser = SkillParser::new()?;
        let mut records = Vec::new();
        let mut failures = Vec::new();

        for document in documents {
            match parser.parse(&document.text, &document.dir) {
                Ok(mut record) => {
                    record.ordinal = records.len();
                    debug!(
                        "Loaded skill: {} ({}) at {:?}",
                        record.name, record.tier, record.dir
                    );
                    records.push(record);
                }
                Err(error) => {
                    debug!("Malformed skill at {:?}: {}", document.dir, error);
                    failures.push(DocumentError {
                        dir: document.dir,
                        error,
                    });
                }
            }
        }

        if !failures.is_empty() {
            return Err(LoadError::Malformed(failures));
        }

        let mut index = HashMap::with_capacity(records.len());
        for (position, record) in records.iter().enumerate() {
            index.entry(record.name.clone()).or_insert(position);
        }

        info!("Loaded {} skills", records.len());
        Ok(Self { records, index })
    }

    /// Read all documents from `sources` and build a registry
    pub fn discover(sources: &SkillSources) -> Result<Self, LoadError> {
        Self::load(sources.read_documents()?)
    }

    /// Get a skill by name
    pub fn get(&self, name: &str) -> Option<&SkillRecord> {
        self.index.get(name).map(|&i| &self.records[i])
    }

    /// Get a skill by name, failing with [`NotFound`]
    pub fn lookup(&self, name: &str) -> Result<&SkillRecord, NotFound> {
        self.get(name).ok_or_else(|| NotFound(name.to_string()))
    }

    /// Whether `record` is the first declaration of its name
    pub fn is_canonical(&self, record: &SkillRecord) -> bool {
        self.index.get(&record.name) == Some(&record.ordinal)
    }

    /// All records in declaration order, duplicates included
    pub fn records(&self) -> &[SkillRecord] {
        &self.records
    }

    /// Canonical records of one tier, in declaration order
    pub fn by_tier(&self, tier: Tier) -> impl Iterator<Item = &SkillRecord> {
        self.records
            .iter()
            .filter(move |r| r.tier == tier && self.is_canonical(r))
    }

    /// Get all distinct skill names in declaration order
    pub fn skill_names(&self) -> impl Iterator<Item = &str> {
        self.records
            .iter()
            .filter(|r| self.is_canonical(r))
            .map(|r| r.name.as_str())
    }

    /// Get number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Generate skills list for an agent system prompt
    /// Format:
    /// Available skills (use /{skill-name} to activate):
    /// - skill-name: Description of what this skill does and when to use it
    /// - another-skill: Another description...
    ///
    /// Skills are listed in install order: tier, then declaration.
    pub fn generate_system_prompt(&self) -> String {
        if self.records.is_empty() {
            return String::new();
        }

        let mut prompt = String::from("\n\nAvailable skills (use /{skill-name} to activate):\n");

        for tier in Tier::ALL {
            for record in self.by_tier(tier) {
                prompt.push_str(&record.to_summary());
                prompt.push('\n');
            }
        }

        prompt
    }
}
