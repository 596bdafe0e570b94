//! skillpm Types - Core types for the skillpm engine
//!
//! This module defines the data model shared by the parser, registry,
//! resolver, materializer and the installer CLI.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Tiers
// ============================================================================

/// Activation band of a skill. Lower ranks are installed first.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Foundation,
    Core,
    Advanced,
    #[default]
    Utility,
}

impl Tier {
    /// All tiers in rank order
    pub const ALL: [Tier; 4] = [Tier::Foundation, Tier::Core, Tier::Advanced, Tier::Utility];

    /// Numeric rank, foundation = 0
    pub fn rank(self) -> u8 {
        match self {
            Tier::Foundation => 0,
            Tier::Core => 1,
            Tier::Advanced => 2,
            Tier::Utility => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Foundation => "foundation",
            Tier::Core => "core",
            Tier::Advanced => "advanced",
            Tier::Utility => "utility",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the fixed tier names
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown tier '{0}' (expected foundation, core, advanced or utility)")]
pub struct UnknownTier(pub String);

impl FromStr for Tier {
    type Err = UnknownTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "foundation" => Ok(Tier::Foundation),
            "core" => Ok(Tier::Core),
            "advanced" => Ok(Tier::Advanced),
            "utility" => Ok(Tier::Utility),
            _ => Err(UnknownTier(s.to_string())),
        }
    }
}

// ============================================================================
// Skill records
// ============================================================================

/// A parsed skill document. Created once at load time, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillRecord {
    /// Kebab-case identifier, primary key in the registry
    pub name: String,
    /// Activation hint for the agent; opaque to the engine
    pub description: String,
    pub tier: Tier,
    /// Document text after the front-matter
    pub body: String,
    /// Auxiliary resources, relative to `dir`
    pub references: Vec<PathBuf>,
    /// Directory the skill was loaded from
    pub dir: PathBuf,
    /// Position in the load sequence
    pub ordinal: usize,
}

impl SkillRecord {
    /// Key used for canonical install order: tier rank, then declaration order
    pub fn order_key(&self) -> (u8, usize) {
        (self.tier.rank(), self.ordinal)
    }

    /// Generate a concise summary for an agent system prompt
    /// Format: "- {name}: {description}"
    pub fn to_summary(&self) -> String {
        format!("- {}: {}", self.name, self.description)
    }
}

// ============================================================================
// Bundles and selectors
// ============================================================================

/// Rule selecting a set of skills.
///
/// In TOML a selector is a single-key table, e.g.
/// `{ union = [{ tier = "foundation" }, { tier = "core" }] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selector {
    /// Explicit skill names
    Skills(Vec<String>),
    /// Every skill of exactly this tier
    Tier(Tier),
    /// Every skill whose tier rank is at most this tier's rank
    UpToTier(Tier),
    /// Union of sub-selectors, first occurrence wins
    Union(Vec<Selector>),
    /// Another named bundle
    Bundle(String),
}

impl Selector {
    pub fn skills<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selector::Skills(names.into_iter().map(Into::into).collect())
    }

    pub fn bundle(id: impl Into<String>) -> Self {
        Selector::Bundle(id.into())
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Skills(names) => write!(f, "skills[{}]", names.join(", ")),
            Selector::Tier(tier) => write!(f, "tier {}", tier),
            Selector::UpToTier(tier) => write!(f, "tiers <= {}", tier),
            Selector::Union(parts) => {
                f.write_str("union(")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" + ")?;
                    }
                    write!(f, "{}", part)?;
                }
                f.write_str(")")
            }
            Selector::Bundle(id) => write!(f, "bundle {}", id),
        }
    }
}

/// A named, installable set of skills
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleDef {
    /// Human readable name, e.g. "Full Core"
    pub label: String,
    pub select: Selector,
}

impl BundleDef {
    pub fn new(label: impl Into<String>, select: Selector) -> Self {
        Self {
            label: label.into(),
            select,
        }
    }
}

/// Ordered, duplicate-free skill names produced by the resolver
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedBundle {
    /// Label of the bundle that was resolved, if any
    pub label: Option<String>,
    pub names: Vec<String>,
}

impl ResolvedBundle {
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}
