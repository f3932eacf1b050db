use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tabsum_runtime_config::{CONFIG_FILE_NAME, TabsumConfig, apply_compat_fallbacks};
use tracing::debug;

/// Get the config directory path (~/.config/tabsum/)
pub fn config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .context("Could not determine home directory")?;
    Ok(PathBuf::from(home).join(".config").join("tabsum"))
}

/// Canonical config file path.
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

fn read_config_doc(path: &Path) -> Result<toml::Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config at {}", path.display()))?;
    let doc = toml::from_str::<toml::Value>(&content)
        .with_context(|| format!("Failed to parse config at {}", path.display()))?;
    Ok(doc)
}

/// Load config from `explicit` or the canonical path, returning defaults if
/// the file does not exist.
pub fn load_config(explicit: Option<&Path>) -> Result<TabsumConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => config_path()?,
    };
    if !path.exists() {
        if explicit.is_some() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        debug!("No config at {}, using defaults", path.display());
        return Ok(TabsumConfig::default());
    }

    let doc = read_config_doc(&path)?;
    let mut config = doc
        .try_into::<TabsumConfig>()
        .with_context(|| format!("Invalid config at {}", path.display()))?;
    if apply_compat_fallbacks(&mut config) {
        debug!("Applied compatibility fallbacks to {}", path.display());
    }
    Ok(config)
}

pub fn show_config(config: &TabsumConfig) -> Result<()> {
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    print!("{content}");
    Ok(())
}
