//! Installer tests against real directories

use skillpm_cli::{InstallError, InstallMode, Installer};
use skillpm_skills::{plan, BundleCatalog, InstallManifest, Selector, SkillRegistry, SkillSources};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

fn write_skill(root: &Path, rel: &str, front: &str) {
    let dir = root.join(rel);
    fs::create_dir_all(&dir).expect("create skill dir");
    fs::write(dir.join("SKILL.md"), format!("---\n{}\n---\n# Skill\n", front)).expect("write");
}

fn skills_tree() -> TempDir {
    let tmp = TempDir::new().expect("tempdir");
    write_skill(
        tmp.path(),
        "foundation/functional-coding",
        "name: functional-coding\ndescription: Vocabulary",
    );
    write_skill(
        tmp.path(),
        "core/fp-composition",
        "name: fp-composition\ndescription: Pipelines\nreferences:\n  - references/patterns.md",
    );
    let refs = tmp.path().join("core/fp-composition/references");
    fs::create_dir_all(&refs).expect("refs dir");
    fs::write(refs.join("patterns.md"), "# Patterns\n").expect("write ref");
    tmp
}

fn registry(tmp: &TempDir) -> SkillRegistry {
    SkillRegistry::discover(&SkillSources::new().add_directory(tmp.path())).expect("load")
}

#[tokio::test]
async fn test_copy_install_writes_skills_and_manifest() {
    let skills = skills_tree();
    let target = TempDir::new().expect("target");
    let registry = registry(&skills);
    let materialized =
        plan(&registry, &BundleCatalog::builtin(), &Selector::bundle("full-core")).expect("plan");

    let installer = Installer::new(target.path(), InstallMode::Copy, Duration::from_secs(30));
    let report = installer.install(&materialized).await.expect("install");

    assert_eq!(report.skills, vec!["functional-coding", "fp-composition"]);
    assert_eq!(report.files, 3);
    assert!(target.path().join("functional-coding/SKILL.md").is_file());
    assert!(target
        .path()
        .join("fp-composition/references/patterns.md")
        .is_file());
    assert!(!target.path().join(".skillpm-staging").exists());

    let manifest: InstallManifest =
        serde_json::from_str(&fs::read_to_string(&report.manifest).expect("read manifest"))
            .expect("parse manifest");
    assert_eq!(manifest.bundle.as_deref(), Some("Full Core"));
    let names: Vec<_> = manifest.skills.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["functional-coding", "fp-composition"]);
}

#[tokio::test]
async fn test_reinstall_replaces_existing_skill() {
    let skills = skills_tree();
    let target = TempDir::new().expect("target");
    let stale = target.path().join("fp-composition");
    fs::create_dir_all(&stale).expect("stale dir");
    fs::write(stale.join("old.md"), "stale").expect("stale file");

    let registry = registry(&skills);
    let materialized = plan(
        &registry,
        &BundleCatalog::new(),
        &Selector::skills(["fp-composition"]),
    )
    .expect("plan");

    Installer::new(target.path(), InstallMode::Copy, Duration::from_secs(30))
        .install(&materialized)
        .await
        .expect("install");

    assert!(!stale.join("old.md").exists());
    assert!(stale.join("SKILL.md").is_file());
}

#[tokio::test]
async fn test_manifest_mode_copies_nothing() {
    let skills = skills_tree();
    let target = TempDir::new().expect("target");
    let registry = registry(&skills);
    let materialized =
        plan(&registry, &BundleCatalog::builtin(), &Selector::bundle("complete")).expect("plan");

    let report = Installer::new(target.path(), InstallMode::Manifest, Duration::from_secs(30))
        .install(&materialized)
        .await
        .expect("install");

    assert_eq!(report.files, 0);
    assert!(report.manifest.is_file());
    assert!(!target.path().join("functional-coding").exists());
}

#[tokio::test]
async fn test_missing_reference_fails_and_cleans_up() {
    let skills = skills_tree();
    fs::remove_file(skills.path().join("core/fp-composition/references/patterns.md"))
        .expect("remove ref");
    let target = TempDir::new().expect("target");
    let registry = registry(&skills);
    let materialized =
        plan(&registry, &BundleCatalog::builtin(), &Selector::bundle("full-core")).expect("plan");

    let err = Installer::new(target.path(), InstallMode::Copy, Duration::from_secs(30))
        .install(&materialized)
        .await
        .expect_err("missing reference");

    assert!(matches!(err, InstallError::Io { .. }));
    assert!(!target.path().join(".skillpm-staging").exists());
    assert!(!target.path().join("functional-coding").exists());
    assert!(!target.path().join("skillpm-manifest.json").exists());
}

#[tokio::test]
async fn test_zero_timeout_gives_up() {
    let skills = skills_tree();
    let target = TempDir::new().expect("target");
    let registry = registry(&skills);
    let materialized =
        plan(&registry, &BundleCatalog::builtin(), &Selector::bundle("full-core")).expect("plan");

    let err = Installer::new(target.path(), InstallMode::Copy, Duration::ZERO)
        .install(&materialized)
        .await
        .expect_err("timeout");

    assert!(matches!(err, InstallError::Timeout { .. }));
    assert!(!target.path().join("skillpm-manifest.json").exists());
    assert!(!target.path().join(".skillpm-staging").exists());
    assert!(!target.path().join("functional-coding").exists());
}

#[tokio::test]
async fn test_plain_file_in_the_way_is_replaced() {
    let skills = skills_tree();
    let target = TempDir::new().expect("target");
    fs::write(target.path().join("fp-composition"), "not a directory").expect("blocker");
    let registry = registry(&skills);
    let materialized =
        plan(&registry, &BundleCatalog::builtin(), &Selector::bundle("full-core")).expect("plan");

    Installer::new(target.path(), InstallMode::Copy, Duration::from_secs(30))
        .install(&materialized)
        .await
        .expect("install");

    assert!(target.path().join("functional-coding/SKILL.md").is_file());
    assert!(target.path().join("fp-composition/SKILL.md").is_file());
    assert!(target.path().join("skillpm-manifest.json").is_file());
}

#[tokio::test]
async fn test_failed_reinstall_keeps_previous_install() {
    let skills = skills_tree();
    let target = TempDir::new().expect("target");
    let registry = registry(&skills);
    let full_core =
        plan(&registry, &BundleCatalog::builtin(), &Selector::bundle("full-core")).expect("plan");
    let installer = Installer::new(target.path(), InstallMode::Copy, Duration::from_secs(30));
    installer.install(&full_core).await.expect("first install");
    let manifest_before =
        fs::read_to_string(target.path().join("skillpm-manifest.json")).expect("manifest");

    fs::remove_file(skills.path().join("core/fp-composition/references/patterns.md"))
        .expect("remove ref");
    installer
        .install(&full_core)
        .await
        .expect_err("missing reference");

    assert!(target
        .path()
        .join("fp-composition/references/patterns.md")
        .is_file());
    assert!(target.path().join("functional-coding/SKILL.md").is_file());
    let manifest_after =
        fs::read_to_string(target.path().join("skillpm-manifest.json")).expect("manifest");
    assert_eq!(manifest_before, manifest_after);
    assert!(!target.path().join(".skillpm-staging").exists());
}
