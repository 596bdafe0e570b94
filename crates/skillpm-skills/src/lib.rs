//! `skillpm` Skills Engine
//!
//! Discovers, validates, tiers and bundles declarative skill documents for
//! installation into an agent runtime.
//!
//! ## Pipeline
//!
//! 1. [`SkillSources`] reads one SKILL.md per skill directory
//! 2. [`SkillRegistry::load`] parses every document into a [`SkillRecord`]
//! 3. [`validate`] checks name uniqueness and reference integrity
//! 4. [`Resolver`] expands a [`Selector`] into an ordered [`ResolvedBundle`]
//! 5. [`materialize`] turns the resolution back into full records
//!
//! The registry is immutable once loaded. [`SkillCatalog`] holds the current
//! snapshot and swaps in a freshly built one on reload.

#![deny(unsafe_code, dead_code, unused_imports, unused_variables, missing_docs)]

pub mod bundles;
pub mod catalog;
pub mod error;
pub mod materializer;
pub mod parser;
pub mod registry;
pub mod resolver;
pub mod source;
pub mod validator;

pub use bundles::BundleCatalog;
pub use catalog::SkillCatalog;
pub use error::{
    LoadError, MalformedSkill, MaterializationError, ResolutionError, SkillsError,
    ValidationError,
};
pub use materializer::{materialize, plan, InstallManifest, ManifestEntry, Materialized};
pub use registry::SkillRegistry;
pub use resolver::Resolver;
pub use skillpm_types::{BundleDef, ResolvedBundle, Selector, SkillRecord, Tier};
pub use source::{SkillDocument, SkillSources};
pub use validator::{validate, validate_with};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        BundleCatalog, Resolver, Selector, SkillCatalog, SkillRegistry, SkillSources, Tier,
    };
}
