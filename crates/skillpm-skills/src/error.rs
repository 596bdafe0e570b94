//! Error types for skill loading, validation, resolution and materialization

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Structural defect in a single skill document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedSkill {
    /// Document does not start with a `---` delimited front-matter block
    #[error("no YAML frontmatter block found")]
    MissingFrontmatter,

    /// Front-matter is not a valid YAML mapping
    #[error("invalid YAML frontmatter: {0}")]
    InvalidFrontmatter(String),

    /// A mandatory field is absent or blank
    #[error("missing required field '{field}'")]
    MissingField {
        /// Field name
        field: &'static str,
    },

    /// Name is not kebab-case
    #[error("invalid skill name '{name}': must match ^[a-z][a-z0-9-]*$")]
    InvalidName {
        /// Offending name
        name: String,
    },

    /// Declared tier is not one of the fixed tiers
    #[error("invalid tier '{tier}'")]
    InvalidTier {
        /// Offending tier value
        tier: String,
    },

    /// Reference path is absolute or escapes the skill directory
    #[error("invalid reference '{path}': must be a relative path inside the skill directory")]
    InvalidReference {
        /// Offending path as written
        path: String,
    },
}

/// A malformed document together with where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentError {
    /// Skill directory of the document
    pub dir: PathBuf,
    /// What was wrong with it
    pub error: MalformedSkill,
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.dir.display(), self.error)
    }
}

/// Failure to build a registry
#[derive(Debug, Error)]
pub enum LoadError {
    /// A skill source could not be read
    #[error("failed to read {path:?}: {source}")]
    Io {
        /// Path that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// One or more documents were malformed; every failure is listed
    #[error("{} malformed skill document(s): {}", .0.len(), join_errors(.0))]
    Malformed(Vec<DocumentError>),

    /// A bundle definition file could not be parsed
    #[error("invalid bundle file {path:?}: {message}")]
    Bundles {
        /// Bundle file path
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// Built-in pattern failed to compile
    #[error("pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

fn join_errors(errors: &[DocumentError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Post-load integrity defect
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Two records share a name
    #[error("duplicate skill name '{name}' declared in {first:?} and {second:?}")]
    DuplicateName {
        /// Colliding name
        name: String,
        /// Directory of the earlier declaration
        first: PathBuf,
        /// Directory of the later declaration
        second: PathBuf,
    },

    /// A declared reference does not exist
    #[error("skill '{skill}' references missing file {path:?}")]
    MissingReference {
        /// Skill declaring the reference
        skill: String,
        /// Reference path relative to the skill directory
        path: PathBuf,
    },
}

/// Selector could not be resolved
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// Explicit list names a skill that is not in the registry
    #[error("unknown skill '{name}'")]
    UnknownSkill {
        /// Requested name
        name: String,
    },

    /// Selector references a bundle that is not defined
    #[error("unknown bundle '{name}'")]
    UnknownBundle {
        /// Requested bundle id
        name: String,
    },

    /// Bundle definitions reference each other
    #[error("bundle cycle: {}", .path.join(" -> "))]
    Cycle {
        /// Bundle ids along the cycle, first id repeated at the end
        path: Vec<String>,
    },
}

/// Registry no longer matches a resolution
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MaterializationError {
    /// A resolved name has no record
    #[error("resolved skill '{name}' is missing from the registry")]
    MissingSkill {
        /// Missing name
        name: String,
    },
}

/// Lookup miss in the registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("skill '{0}' not found")]
pub struct NotFound(pub String);

/// Any error produced by this crate
#[derive(Debug, Error)]
pub enum SkillsError {
    /// Registry could not be built
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Registry failed validation
    #[error("{} validation error(s)", .0.len())]
    Validation(Vec<ValidationError>),

    /// Selector could not be resolved
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// Resolution could not be materialized
    #[error(transparent)]
    Materialization(#[from] MaterializationError),
}

impl From<Vec<ValidationError>> for SkillsError {
    fn from(errors: Vec<ValidationError>) -> Self {
        SkillsError::Validation(errors)
    }
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, SkillsError>;
