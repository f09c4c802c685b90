//! Configuration file loading for friends.
//!
//! Discovers and loads `friends.toml` from the document root.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use serde::Deserialize;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "friends.toml";

/// Top-level configuration from friends.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FriendsConfig {
    pub analysis: AnalysisConfig,
    pub fix: FixConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Whether the friend-access rule runs at all.
    pub enabled: bool,

    /// Glob patterns over document paths to skip.
    pub exclude: Vec<String>,

    /// Worker threads for analysis; defaults to available parallelism.
    pub jobs: Option<usize>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            exclude: Vec::new(),
            jobs: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FixConfig {
    /// Whether to back up documents before rewriting them.
    pub backup: bool,

    /// Suffix for backup files.
    pub backup_suffix: String,
}

impl Default for FixConfig {
    fn default() -> Self {
        Self {
            backup: true,
            backup_suffix: ".friends.bak".to_string(),
        }
    }
}

/// Discover the friends.toml config file in `root`.
pub fn discover_config(root: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = root.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

pub fn load_config(path: &Utf8Path) -> anyhow::Result<FriendsConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

pub fn parse_config(contents: &str) -> anyhow::Result<FriendsConfig> {
    let config: FriendsConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load config from `root`, or return the default if there is none.
pub fn load_or_default(root: &Utf8Path) -> anyhow::Result<FriendsConfig> {
    match discover_config(root) {
        Some(path) => load_config(&path),
        None => Ok(FriendsConfig::default()),
    }
}

/// Effective settings after applying CLI arguments on top of the config file.
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub enabled: bool,

    /// Exclude patterns (from config file, extended by CLI).
    pub exclude: Vec<String>,

    pub jobs: usize,

    /// `None` disables backups.
    pub backup_suffix: Option<String>,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: FriendsConfig,
}

impl ConfigMerger {
    pub fn new(config: FriendsConfig) -> Self {
        Self { config }
    }

    /// CLI `exclude` extends the config list; CLI `jobs` overrides it.
    pub fn merge_check_args(self, cli_exclude: &[String], cli_jobs: Option<usize>) -> MergedConfig {
        let mut exclude = self.config.analysis.exclude.clone();
        for pattern in cli_exclude {
            if !exclude.contains(pattern) {
                exclude.push(pattern.clone());
            }
        }

        let jobs = cli_jobs
            .or(self.config.analysis.jobs)
            .unwrap_or_else(default_jobs)
            .max(1);

        MergedConfig {
            enabled: self.config.analysis.enabled,
            exclude,
            jobs,
            backup_suffix: self.backup_suffix(false),
        }
    }

    /// CLI `no_backup` wins over the config file.
    pub fn merge_fix_args(self, no_backup: bool) -> MergedConfig {
        MergedConfig {
            enabled: self.config.analysis.enabled,
            exclude: self.config.analysis.exclude.clone(),
            jobs: 1,
            backup_suffix: self.backup_suffix(no_backup),
        }
    }

    fn backup_suffix(&self, no_backup: bool) -> Option<String> {
        (self.config.fix.backup && !no_backup).then(|| self.config.fix.backup_suffix.clone())
    }
}

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
