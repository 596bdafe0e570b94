//! Command line definitions for the `skillpm` binary.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use skillpm_skills::{Selector, Tier};

use crate::install::InstallMode;

/// Install functional-programming skill bundles into an agent runtime.
#[derive(Parser, Debug)]
#[command(name = "skillpm", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file to use instead of ./skillpm.toml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Skills directory (repeatable); replaces the configured directories
    #[arg(short = 'd', long = "skills-dir", global = true)]
    pub skills_dirs: Vec<PathBuf>,

    /// Detailed output (-v for info, -vv for debug, -vvv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List loaded skills grouped by tier.
    #[command(alias = "ls")]
    List {
        /// Print the agent system prompt listing instead.
        #[arg(long)]
        prompt: bool,
    },

    /// List the defined bundles.
    Bundles,

    /// Check name uniqueness and reference integrity.
    Validate,

    /// Print the install order for a selection.
    Resolve {
        #[command(flatten)]
        select: SelectArgs,

        /// Print JSON instead of one name per line.
        #[arg(long)]
        json: bool,
    },

    /// Install a selection into a target directory.
    Install {
        #[command(flatten)]
        select: SelectArgs,

        /// Target directory (defaults to install.target from config).
        #[arg(short, long)]
        target: Option<PathBuf>,

        /// What to write.
        #[arg(short, long, value_enum)]
        mode: Option<InstallMode>,

        /// Give up after this many seconds.
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}

/// Selection flags. Several flags combine into a union.
#[derive(Args, Debug, Default, Clone)]
pub struct SelectArgs {
    /// Named bundle, e.g. full-core (repeatable).
    #[arg(short, long)]
    pub bundle: Vec<String>,

    /// Skill name (repeatable).
    #[arg(short, long = "skill")]
    pub skills: Vec<String>,

    /// Every skill of this tier (repeatable).
    #[arg(long)]
    pub tier: Vec<Tier>,

    /// Every skill up to and including this tier.
    #[arg(long = "up-to")]
    pub up_to: Option<Tier>,
}

impl SelectArgs {
    /// Combine the flags into one selector; `None` when nothing was given
    pub fn to_selector(&self) -> Option<Selector> {
        let mut parts: Vec<Selector> = self.bundle.iter().cloned().map(Selector::Bundle).collect();

        if !self.skills.is_empty() {
            parts.push(Selector::Skills(self.skills.clone()));
        }
        parts.extend(self.tier.iter().copied().map(Selector::Tier));
        parts.extend(self.up_to.map(Selector::UpToTier));

        match parts.len() {
            0 => None,
            1 => parts.pop(),
            _ => Some(Selector::Union(parts)),
        }
    }
}
