use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};

use skillpm_skills::{
    plan, validate, BundleCatalog, Resolver, Selector, SkillRegistry, SkillSources, SkillsError,
    Tier,
};

use crate::cli::{Cli, Commands, SelectArgs};
use crate::config::Config;
use crate::install::{InstallError, Installer};

/// Exit code classes reported to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success = 0,
    /// Bad usage or config, or skills that failed to load or validate
    Invalid = 1,
    /// Selection could not be resolved or materialized
    Unresolved = 2,
    /// Output could not be written
    WriteFailed = 3,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        ExitCode::from(outcome as u8)
    }
}

/// Classify an error from [`SkillpmService::run`]
pub fn classify(err: &anyhow::Error) -> Outcome {
    if let Some(skills) = err.downcast_ref::<SkillsError>() {
        return match skills {
            SkillsError::Load(_) | SkillsError::Validation(_) => Outcome::Invalid,
            SkillsError::Resolution(_) | SkillsError::Materialization(_) => Outcome::Unresolved,
        };
    }

    if err.downcast_ref::<InstallError>().is_some() {
        return Outcome::WriteFailed;
    }

    if err.downcast_ref::<SelectionMissing>().is_some() {
        return Outcome::Unresolved;
    }

    Outcome::Invalid
}

/// Exit class for a command line clap refused to parse.
///
/// `--help` and `--version` also arrive here and count as success.
pub fn usage_outcome(err: &clap::Error) -> Outcome {
    if err.use_stderr() {
        Outcome::Invalid
    } else {
        Outcome::Success
    }
}

#[derive(Debug, thiserror::Error)]
#[error("nothing selected: pass --bundle, --skill, --tier or --up-to")]
pub struct SelectionMissing;

/// Runs one CLI command against a freshly loaded catalog
pub struct SkillpmService {
    config: Config,
    skills_dirs: Vec<PathBuf>,
}

impl SkillpmService {
    /// Create a service; `skills_dirs` overrides the configured directories
    pub fn new(config: Config, skills_dirs: Vec<PathBuf>) -> Self {
        Self {
            config,
            skills_dirs,
        }
    }

    fn sources(&self) -> SkillSources {
        let dirs = if self.skills_dirs.is_empty() {
            self.config.skill_directories()
        } else {
            self.skills_dirs.clone()
        };

        if dirs.is_empty() {
            return SkillSources::new()
                .with_project_skills()
                .with_personal_skills();
        }

        dirs.into_iter()
            .fold(SkillSources::new(), |sources, dir| sources.add_directory(dir))
    }

    /// Load the registry and the bundle definitions
    fn load(&self) -> Result<(SkillRegistry, BundleCatalog)> {
        let sources = self.sources();
        let registry = SkillRegistry::discover(&sources).map_err(SkillsError::from)?;

        let mut bundles = BundleCatalog::builtin();
        bundles
            .merge_from_dirs(sources.directories().iter().map(PathBuf::as_path))
            .map_err(SkillsError::from)?;
        if let Some(path) = self.config.bundles_file() {
            bundles.extend(BundleCatalog::from_file(&path).map_err(SkillsError::from)?);
        }

        Ok((registry, bundles))
    }

    /// Run the parsed command
    pub async fn run(self, cli: Cli) -> Result<()> {
        info!("Starting skillpm");
        let (registry, bundles) = self.load()?;

        match cli.command {
            Commands::List { prompt } => {
                if prompt {
                    print!("{}", registry.generate_system_prompt());
                } else {
                    print_listing(&registry);
                }
            }
            Commands::Bundles => {
                for (id, def) in bundles.iter() {
                    println!("{:<16} {:<24} {}", id, def.label, def.select);
                }
            }
            Commands::Validate => {
                check(&registry)?;
                println!("{} skills OK", registry.len());
            }
            Commands::Resolve { select, json } => {
                check(&registry)?;
                let selector = selector(&select)?;
                let resolver = Resolver::new(&registry, &bundles);
                let resolved = match &selector {
                    Selector::Bundle(id) => resolver.resolve_bundle(id),
                    other => resolver.resolve(other),
                }
                .map_err(SkillsError::from)?;

                if json {
                    println!("{}", serde_json::to_string_pretty(&resolved)?);
                } else {
                    for (i, name) in resolved.iter().enumerate() {
                        println!("{:>3}. {}", i + 1, name);
                    }
                }
            }
            Commands::Install {
                select,
                target,
                mode,
                timeout_secs,
            } => {
                check(&registry)?;
                let selector = selector(&select)?;
                let materialized = plan(&registry, &bundles, &selector)?;

                let target = target
                    .or_else(|| self.config.install.target.as_deref().map(PathBuf::from))
                    .context("no install target: pass --target or set install.target")?;
                let installer = Installer::new(
                    target,
                    mode.unwrap_or(self.config.install.mode),
                    Duration::from_secs(timeout_secs.unwrap_or(self.config.install.timeout_secs)),
                );

                let report = installer.install(&materialized).await?;
                for name in &report.skills {
                    println!("installed {}", name);
                }
                println!("manifest: {}", report.manifest.display());
            }
        }

        Ok(())
    }
}

fn selector(select: &SelectArgs) -> Result<Selector> {
    match select.to_selector() {
        Some(selector) => Ok(selector),
        None => bail!(SelectionMissing),
    }
}

/// Validate and print every problem before failing
fn check(registry: &SkillRegistry) -> Result<()> {
    if let Err(errors) = validate(registry) {
        for e in &errors {
            error!("{}", e);
            eprintln!("invalid: {}", e);
        }
        return Err(SkillsError::from(errors).into());
    }
    Ok(())
}

fn print_listing(registry: &SkillRegistry) {
    for tier in Tier::ALL {
        let mut records = registry.by_tier(tier).peekable();
        if records.peek().is_none() {
            continue;
        }
        println!("{}:", tier);
        for record in records {
            println!("  {:<24} {}", record.name, record.description);
        }
    }
}
