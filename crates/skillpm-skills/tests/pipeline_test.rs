//! End-to-end tests over a skills tree on disk

use skillpm_skills::{
    materialize, validate, BundleCatalog, Resolver, Selector, SkillRegistry, SkillSources, Tier,
    ValidationError,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_skill(root: &Path, rel: &str, front: &str) {
    let dir = root.join(rel);
    fs::create_dir_all(&dir).expect("create skill dir");
    fs::write(
        dir.join("SKILL.md"),
        format!("---\n{}\n---\n\n# {}\n\nGuidance.\n", front, rel),
    )
    .expect("write SKILL.md");
}

/// Layout mirrors a typical FP skills repository: tier grouping directories,
/// with `NN-` prefixes fixing declaration order inside a tier.
fn fp_tree() -> TempDir {
    let tmp = TempDir::new().expect("tempdir");
    let root = tmp.path();

    write_skill(
        root,
        "foundation/functional-coding",
        "name: functional-coding\ndescription: Core FP vocabulary",
    );
    write_skill(
        root,
        "core/01-fp-error-handling",
        "name: fp-error-handling\ndescription: Result types over exceptions",
    );
    write_skill(
        root,
        "core/02-fp-composition",
        "name: fp-composition\ndescription: Pipelines\nreferences:\n  - references/patterns.md",
    );
    write_skill(
        root,
        "core/03-fp-immutability",
        "name: fp-immutability\ndescription: Persistent data",
    );
    write_skill(
        root,
        "fp-cheatsheet",
        "name: fp-cheatsheet\ndescription: Cross-language table",
    );

    let refs = root.join("core/02-fp-composition/references");
    fs::create_dir_all(&refs).expect("create references dir");
    fs::write(refs.join("patterns.md"), "# Patterns\n").expect("write reference");

    tmp
}

fn load(tmp: &TempDir) -> SkillRegistry {
    SkillRegistry::discover(&SkillSources::new().add_directory(tmp.path())).expect("load")
}

#[test]
fn test_full_core_install_order() {
    let tmp = fp_tree();
    let registry = load(&tmp);
    assert_eq!(registry.len(), 5);
    assert_eq!(validate(&registry), Ok(()));

    assert_eq!(
        registry.get("fp-cheatsheet").map(|r| r.tier),
        Some(Tier::Utility)
    );

    let bundles = BundleCatalog::builtin();
    let resolved = Resolver::new(&registry, &bundles)
        .resolve_bundle("full-core")
        .expect("resolve");

    assert_eq!(
        resolved.names,
        vec![
            "functional-coding",
            "fp-error-handling",
            "fp-composition",
            "fp-immutability",
        ]
    );

    let out = materialize(&resolved, &registry).expect("materialize");
    assert_eq!(out.len(), resolved.len());
    for (record, name) in out.records.iter().zip(resolved.iter()) {
        assert_eq!(record.name, name);
    }
}

#[test]
fn test_missing_reference_on_disk() {
    let tmp = fp_tree();
    fs::remove_file(tmp.path().join("core/02-fp-composition/references/patterns.md"))
        .expect("remove reference");

    let registry = load(&tmp);
    let errors = validate(&registry).expect_err("missing reference");

    assert_eq!(
        errors,
        vec![ValidationError::MissingReference {
            skill: "fp-composition".into(),
            path: PathBuf::from("references/patterns.md"),
        }]
    );
}

#[test]
fn test_directory_reference_counts_as_missing() {
    let tmp = fp_tree();
    let refs = tmp.path().join("core/02-fp-composition/references");
    fs::remove_file(refs.join("patterns.md")).expect("remove reference");
    fs::create_dir_all(refs.join("patterns.md")).expect("directory in its place");

    let registry = load(&tmp);
    let errors = validate(&registry).expect_err("directory reference");

    assert_eq!(
        errors,
        vec![ValidationError::MissingReference {
            skill: "fp-composition".into(),
            path: PathBuf::from("references/patterns.md"),
        }]
    );
}

#[test]
fn test_duplicate_names_still_load() {
    let tmp = fp_tree();
    write_skill(
        tmp.path(),
        "advanced/fp-composition-v2",
        "name: fp-composition\ndescription: Second copy",
    );

    let registry = load(&tmp);
    assert_eq!(registry.len(), 6);

    let errors = validate(&registry).expect_err("duplicate");
    assert!(errors.iter().any(|e| matches!(
        e,
        ValidationError::DuplicateName { name, .. } if name == "fp-composition"
    )));
}

#[test]
fn test_unknown_skill_in_request() {
    let tmp = fp_tree();
    let registry = load(&tmp);
    let bundles = BundleCatalog::builtin();

    let result = Resolver::new(&registry, &bundles).resolve(&Selector::skills([
        "functional-coding",
        "fp-nonexistent",
    ]));

    assert!(result.is_err());
}
