//! Named bundle definitions
//!
//! Bundles are declared in TOML, one table per bundle id:
//!
//! ```toml
//! [full-core]
//! label = "Full Core"
//! select = { union = [{ tier = "foundation" }, { tier = "core" }] }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

use skillpm_types::{BundleDef, Selector, Tier};

use crate::error::LoadError;

/// Conventional bundle file name inside a skills directory
pub const BUNDLES_FILE: &str = "bundles.toml";

/// Bundle id → definition
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleCatalog {
    defs: BTreeMap<String, BundleDef>,
}

impl BundleCatalog {
    /// Empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock bundles: `essentials`, `full-core` and `complete`
    pub fn builtin() -> Self {
        Self::new()
            .with(
                "essentials",
                BundleDef::new("Essentials", Selector::Tier(Tier::Foundation)),
            )
            .with(
                "full-core",
                BundleDef::new(
                    "Full Core",
                    Selector::Union(vec![
                        Selector::Tier(Tier::Foundation),
                        Selector::Tier(Tier::Core),
                    ]),
                ),
            )
            .with(
                "complete",
                BundleDef::new("Complete", Selector::UpToTier(Tier::Utility)),
            )
    }

    /// Add or replace a definition
    pub fn with(mut self, id: impl Into<String>, def: BundleDef) -> Self {
        self.insert(id, def);
        self
    }

    /// Add or replace a definition in place
    pub fn insert(&mut self, id: impl Into<String>, def: BundleDef) {
        self.defs.insert(id.into(), def);
    }

    /// Overlay `other` on top of this catalog; entries in `other` win
    pub fn extend<I>(&mut self, other: I)
    where
        I: IntoIterator<Item = (String, BundleDef)>,
    {
        self.defs.extend(other);
    }

    /// Parse bundle definitions from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let defs: BTreeMap<String, BundleDef> = toml::from_str(text)?;
        Ok(Self { defs })
    }

    /// Read a bundle file
    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let catalog = Self::from_toml_str(&text).map_err(|e| LoadError::Bundles {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        debug!("Read {} bundle(s) from {:?}", catalog.len(), path);
        Ok(catalog)
    }

    /// Overlay `bundles.toml` from each skills directory that has one
    pub fn merge_from_dirs<'p, I>(&mut self, dirs: I) -> Result<(), LoadError>
    where
        I: IntoIterator<Item = &'p Path>,
    {
        for dir in dirs {
            let path = dir.join(BUNDLES_FILE);
            if path.is_file() {
                self.extend(Self::from_file(&path)?);
            }
        }
        Ok(())
    }

    /// Look up a definition
    pub fn get(&self, id: &str) -> Option<&BundleDef> {
        self.defs.get(id)
    }

    /// Definitions sorted by id
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BundleDef)> {
        self.defs.iter().map(|(id, def)| (id.as_str(), def))
    }

    /// Number of definitions
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Whether no bundles are defined
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

impl IntoIterator for BundleCatalog {
    type Item = (String, BundleDef);
    type IntoIter = std::collections::btree_map::IntoIter<String, BundleDef>;

    fn into_iter(self) -> Self::IntoIter {
        self.defs.into_iter()
    }
}
