use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

use crate::install::InstallMode;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SkillsConfig {
    /// Skills directories, scanned in order. Empty means `./skills` and
    /// `~/.skillpm/skills`.
    #[serde(default)]
    pub directories: Vec<String>,
    /// Extra bundle definitions, applied after each directory's bundles.toml
    #[serde(default)]
    pub bundles_file: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InstallConfig {
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub mode: InstallMode,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            target: None,
            mode: InstallMode::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub skills: SkillsConfig,
    #[serde(default)]
    pub install: InstallConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Get the global config path: ~/.skillpm/skillpm.toml
    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".skillpm").join("skillpm.toml"))
    }

    /// Load configuration with layered approach:
    /// 1. Global config: ~/.skillpm/skillpm.toml (optional)
    /// 2. Local override: ./skillpm.toml (optional), or `explicit` when given
    /// 3. Environment variables with SKILLPM__ prefix
    /// 4. Convenience env vars (highest priority)
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        // Load .env file from current directory
        dotenvy::dotenv().ok();

        let mut config_builder = config::Config::builder();

        if let Some(global) = Self::global_config_path() {
            config_builder =
                config_builder.add_source(config::File::from(global).required(false));
        }

        config_builder = match explicit {
            Some(path) => config_builder.add_source(config::File::from(path)),
            None => config_builder.add_source(config::File::with_name("skillpm").required(false)),
        };

        config_builder = config_builder
            .add_source(config::Environment::with_prefix("SKILLPM").separator("__"));

        if let Ok(dir) = env::var("SKILLPM_SKILLS_DIR") {
            config_builder = config_builder.set_override("skills.directories", vec![dir])?;
        }

        if let Ok(level) = env::var("SKILLPM_LOG_LEVEL") {
            config_builder = config_builder.set_override("logging.level", level)?;
        }

        let config: Self = config_builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Configured skills directories with `~` expanded
    pub fn skill_directories(&self) -> Vec<PathBuf> {
        self.skills
            .directories
            .iter()
            .map(|dir| expand_home(dir))
            .collect()
    }

    pub fn bundles_file(&self) -> Option<PathBuf> {
        self.skills.bundles_file.as_deref().map(expand_home)
    }
}

/// Expand a leading tilde to the home directory
fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix('~'), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest.trim_start_matches('/')),
        _ => PathBuf::from(path),
    }
}
