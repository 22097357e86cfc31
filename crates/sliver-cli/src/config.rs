//! Locating and reading `Sliver.toml`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sliver::Config;

pub const CONFIG_FILE: &str = "Sliver.toml";

pub enum ConfigSource {
    /// Named with `--config`.
    Explicit(PathBuf),
    /// Found by searching upward from the working directory.
    Found(PathBuf),
    Default,
}

pub struct LoadedConfig {
    pub config: Config,
    pub source: ConfigSource,
}

/// Searches `start` and each of its ancestors for [`CONFIG_FILE`].
fn find_config(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}

fn read_config(path: &Path) -> Result<Config> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

/// Search order:
/// 1. the `--config` path, which must exist
/// 2. `Sliver.toml` in the working directory or above
/// 3. defaults
pub fn load(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        return Ok(LoadedConfig {
            config: read_config(path)?,
            source: ConfigSource::Explicit(path.to_path_buf()),
        });
    }
    if let Some(path) = std::env::current_dir().ok().as_deref().and_then(find_config) {
        return Ok(LoadedConfig {
            config: read_config(&path)?,
            source: ConfigSource::Found(path),
        });
    }
    Ok(LoadedConfig {
        config: Config::default(),
        source: ConfigSource::Default,
    })
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Explicit(path) | ConfigSource::Found(path) => {
                write!(f, "{}", path.display())
            }
            ConfigSource::Default => write!(f, "defaults"),
        }
    }
}
