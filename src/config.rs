//! kmerge settings file handling

use crate::error::{KmergeError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// kmerge settings structure (~/.kube/kmerge.yaml)
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct KmergeConfig {
    /// Destination kubeconfig
    #[serde(default)]
    pub destination: Option<String>,
    /// Shell profile that receives the helper block
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub shell: Option<String>,
    #[serde(default)]
    pub kubectl: Option<String>,
    #[serde(default)]
    pub backup: bool,
    #[serde(default)]
    pub helpers: HelpersSection,
}

/// Context names used by the shell helper functions
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct HelpersSection {
    #[serde(default = "default_dev_context")]
    pub dev_context: String,
    #[serde(default = "default_prod_context")]
    pub prod_context: String,
}

impl Default for HelpersSection {
    fn default() -> Self {
        Self {
            dev_context: default_dev_context(),
            prod_context: default_prod_context(),
        }
    }
}

fn default_dev_context() -> String {
    "dev".to_string()
}

fn default_prod_context() -> String {
    "prod".to_string()
}

/// Get the default settings file path
pub fn config_path() -> Result<PathBuf> {
    let home = dirs_next::home_dir().ok_or(KmergeError::NoHomeDir)?;
    Ok(home.join(".kube").join("kmerge.yaml"))
}

/// Get the default kubeconfig path (~/.kube/config)
pub fn default_kubeconfig_path() -> Result<PathBuf> {
    Ok(dirs_next::home_dir()
        .ok_or(KmergeError::NoHomeDir)?
        .join(".kube")
        .join("config"))
}

/// Load settings from `path`, or from the default location when `None`.
///
/// A missing file yields defaults. A present but malformed file is an error.
pub fn load(path: Option<&Path>) -> Result<KmergeConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match config_path() {
            Ok(p) => p,
            // No home directory means no default settings file either
            Err(KmergeError::NoHomeDir) => return Ok(KmergeConfig::default()),
            Err(e) => return Err(e),
        },
    };

    if !path.exists() {
        tracing::debug!(path = %path.display(), "no settings file, using defaults");
        return Ok(KmergeConfig::default());
    }

    let content = fs::read_to_string(&path)?;
    if content.trim().is_empty() {
        return Ok(KmergeConfig::default());
    }
    serde_yaml_ng::from_str(&content).map_err(|e| KmergeError::InvalidConfig {
        path,
        message: e.to_string(),
    })
}

/// Expand ~ to home directory in path strings
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
