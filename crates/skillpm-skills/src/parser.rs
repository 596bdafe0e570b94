//! Skill document parsing
//!
//! Each skill is a folder containing SKILL.md with YAML frontmatter.
//! The raw frontmatter mapping never leaves this module: callers only
//! ever see a fully validated [`SkillRecord`].

use regex::Regex;
use serde::Deserialize;
use skillpm_types::{SkillRecord, Tier};
use std::path::{Component, Path, PathBuf};
use tracing::warn;

use crate::error::MalformedSkill;

/// Maximum name length agent loaders accept without truncation
const MAX_NAME_LENGTH: usize = 64;
/// Maximum description length agent loaders accept without truncation
const MAX_DESCRIPTION_LENGTH: usize = 1024;

const FRONTMATTER_PATTERN: &str =
    r"(?s)\A---[ \t]*\r?\n(?:(.*?)\r?\n)?---[ \t]*(?:\r?\n(.*))?\z";
const NAME_PATTERN: &str = r"^[a-z][a-z0-9-]*$";

#[derive(Debug, Default, Deserialize)]
struct RawFrontmatter {
    name: Option<String>,
    description: Option<String>,
    tier: Option<String>,
    #[serde(default)]
    references: Vec<String>,
}

/// Compiled parser for skill documents.
///
/// Parsing is a pure function of the document text and its directory.
#[derive(Debug, Clone)]
pub struct SkillParser {
    frontmatter_re: Regex,
    name_re: Regex,
}

impl SkillParser {
    /// Compile the parser patterns
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            frontmatter_re: Regex::new(FRONTMATTER_PATTERN)?,
            name_re: Regex::new(NAME_PATTERN)?,
        })
    }

    /// Parse one document into a record.
    ///
    /// The returned record has ordinal 0; the registry assigns the
    /// declaration position when it loads the document.
    pub fn parse(&self, text: &str, dir: &Path) -> Result<SkillRecord, MalformedSkill> {
        let (yaml, body) = self.split_frontmatter(text)?;

        let raw: RawFrontmatter = if yaml.trim().is_empty() {
            RawFrontmatter::default()
        } else {
            serde_yaml::from_str(yaml)
                .map_err(|e| MalformedSkill::InvalidFrontmatter(e.to_string()))?
        };

        let name = required(raw.name, "name")?;
        let description = required(raw.description, "description")?;

        if !self.name_re.is_match(&name) {
            return Err(MalformedSkill::InvalidName { name });
        }

        if name.len() > MAX_NAME_LENGTH {
            warn!(
                "Skill name '{}' exceeds {} characters (was {}), may be truncated",
                name,
                MAX_NAME_LENGTH,
                name.len()
            );
        }

        if description.len() > MAX_DESCRIPTION_LENGTH {
            warn!(
                "Skill '{}' description exceeds {} characters (was {}), may be truncated",
                name,
                MAX_DESCRIPTION_LENGTH,
                description.len()
            );
        }

        let tier = match raw.tier {
            Some(declared) => declared
                .parse::<Tier>()
                .map_err(|_| MalformedSkill::InvalidTier { tier: declared })?,
            None => grouping_tier(dir).unwrap_or_default(),
        };

        let references = raw
            .references
            .into_iter()
            .map(check_reference)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SkillRecord {
            name,
            description,
            tier,
            body: body.to_string(),
            references,
            dir: dir.to_path_buf(),
            ordinal: 0,
        })
    }

    fn split_frontmatter<'t>(&self, text: &'t str) -> Result<(&'t str, &'t str), MalformedSkill> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let captures = self
            .frontmatter_re
            .captures(text)
            .ok_or(MalformedSkill::MissingFrontmatter)?;

        let yaml = captures.get(1).map_or("", |m| m.as_str());
        let body = captures.get(2).map_or("", |m| m.as_str());

        Ok((yaml, body))
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, MalformedSkill> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(MalformedSkill::MissingField { field }),
    }
}

/// Tier implied by the grouping directory, e.g. `skills/core/fp-composition`
fn grouping_tier(dir: &Path) -> Option<Tier> {
    dir.parent()?.file_name()?.to_str()?.parse().ok()
}

fn check_reference(raw: String) -> Result<PathBuf, MalformedSkill> {
    let path = PathBuf::from(raw.trim());
    let escapes = path.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    // "." and "./" name the skill directory itself, not a file in it
    let names_file = path.components().any(|c| matches!(c, Component::Normal(_)));

    if escapes || !names_file {
        return Err(MalformedSkill::InvalidReference { path: raw });
    }

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> SkillParser {
        SkillParser::new().unwrap()
    }

    #[test]
    fn test_parse_skill_content() {
        let content = r#"---
name: fp-composition
description: Compose small pure functions. Use when building data pipelines.
tier: core
references:
  - references/patterns.md
---

# Composition

Prefer pipelines over nested calls.
"#;

        let record = parser()
            .parse(content, Path::new("skills/fp-composition"))
            .unwrap();
        assert_eq!(record.name, "fp-composition");
        assert_eq!(
            record.description,
            "Compose small pure functions. Use when building data pipelines."
        );
        assert_eq!(record.tier, Tier::Core);
        assert_eq!(record.references, vec![PathBuf::from("references/patterns.md")]);
        assert!(record.body.contains("# Composition"));
        assert_eq!(record.dir, PathBuf::from("skills/fp-composition"));
    }

    #[test]
    fn test_frontmatter_without_body() {
        let record = parser()
            .parse("---\nname: bare\ndescription: d\n---", Path::new("bare"))
            .unwrap();
        assert_eq!(record.name, "bare");
        assert!(record.body.is_empty());
    }

    #[test]
    fn test_missing_frontmatter() {
        let err = parser()
            .parse("# Just a heading\n", Path::new("x"))
            .unwrap_err();
        assert_eq!(err, MalformedSkill::MissingFrontmatter);
    }

    #[test]
    fn test_missing_fields() {
        let p = parser();

        let err = p
            .parse("---\ndescription: no name\n---\n", Path::new("x"))
            .unwrap_err();
        assert_eq!(err, MalformedSkill::MissingField { field: "name" });

        let err = p
            .parse("---\nname: no-desc\ndescription: \"  \"\n---\n", Path::new("x"))
            .unwrap_err();
        assert_eq!(
            err,
            MalformedSkill::MissingField {
                field: "description"
            }
        );
    }

    #[test]
    fn test_invalid_names() {
        let p = parser();
        for name in ["Invalid_Name", "1-leading-digit", "-dash", "snake_case"] {
            let doc = format!("---\nname: {}\ndescription: d\n---\n", name);
            let err = p.parse(&doc, Path::new("x")).unwrap_err();
            assert_eq!(
                err,
                MalformedSkill::InvalidName {
                    name: name.to_string()
                }
            );
        }
    }

    #[test]
    fn test_invalid_yaml() {
        let err = parser()
            .parse("---\nname: [unclosed\n---\n", Path::new("x"))
            .unwrap_err();
        assert!(matches!(err, MalformedSkill::InvalidFrontmatter(_)));
    }

    #[test]
    fn test_tier_defaults_and_grouping() {
        let p = parser();
        let doc = "---\nname: fp-tooling\ndescription: d\n---\n";

        let ungrouped = p.parse(doc, Path::new("skills/fp-tooling")).unwrap();
        assert_eq!(ungrouped.tier, Tier::Utility);

        let grouped = p
            .parse(doc, Path::new("skills/advanced/fp-tooling"))
            .unwrap();
        assert_eq!(grouped.tier, Tier::Advanced);

        let declared = "---\nname: fp-tooling\ndescription: d\ntier: foundation\n---\n";
        let overridden = p
            .parse(declared, Path::new("skills/advanced/fp-tooling"))
            .unwrap();
        assert_eq!(overridden.tier, Tier::Foundation);
    }

    #[test]
    fn test_invalid_tier() {
        let err = parser()
            .parse(
                "---\nname: x\ndescription: d\ntier: expert\n---\n",
                Path::new("x"),
            )
            .unwrap_err();
        assert_eq!(
            err,
            MalformedSkill::InvalidTier {
                tier: "expert".to_string()
            }
        );
    }

    #[test]
    fn test_references_must_stay_inside_skill_dir() {
        let p = parser();
        for bad in ["../secrets.md", "/etc/passwd", "refs/../../x.md", ".", "./", ""] {
            let doc = format!(
                "---\nname: x\ndescription: d\nreferences:\n  - \"{}\"\n---\n",
                bad
            );
            let err = p.parse(&doc, Path::new("x")).unwrap_err();
            assert_eq!(
                err,
                MalformedSkill::InvalidReference {
                    path: bad.to_string()
                }
            );
        }
    }

    #[test]
    fn test_empty_frontmatter_reports_missing_name() {
        let err = parser().parse("---\n---\n# Body\n", Path::new("x")).unwrap_err();
        assert_eq!(err, MalformedSkill::MissingField { field: "name" });
    }

    #[test]
    fn test_leading_byte_order_mark() {
        let record = parser()
            .parse("\u{feff}---\nname: bom\ndescription: d\n---\nbody", Path::new("x"))
            .unwrap();
        assert_eq!(record.name, "bom");
        assert_eq!(record.body, "body");
    }
}
