//! Install the kube-dev / kube-prod / kube-current helpers into a shell profile

use crate::error::{KmergeError, Result};
use colored::Colorize;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

pub const HELPERS_MARKER_START: &str = "# >>> kmerge kube helpers >>>";
pub const HELPERS_MARKER_END: &str = "# <<< kmerge kube helpers <<<";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
}

impl Shell {
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "bash" | "sh" => Ok(Shell::Bash),
            "zsh" => Ok(Shell::Zsh),
            "fish" => Ok(Shell::Fish),
            other => Err(KmergeError::UnsupportedShell(other.to_string())),
        }
    }

    /// Shell from `$SHELL`, defaulting to bash
    pub fn detect() -> Self {
        std::env::var("SHELL")
            .ok()
            .and_then(|s| s.rsplit('/').next().map(|s| s.to_string()))
            .and_then(|name| Self::from_name(&name).ok())
            .unwrap_or(Shell::Bash)
    }

    /// Default startup file for this shell under `home`
    pub fn profile_path(self, home: &Path) -> PathBuf {
        match self {
            Shell::Zsh => home.join(".zshrc"),
            Shell::Bash => {
                // Prefer .bashrc, fall back to .bash_profile
                let bashrc = home.join(".bashrc");
                let bash_profile = home.join(".bash_profile");
                if !bashrc.exists() && bash_profile.exists() {
                    bash_profile
                } else {
                    bashrc
                }
            }
            Shell::Fish => home.join(".config/fish/config.fish"),
        }
    }
}

/// Contexts the helper functions switch between
#[derive(Debug, Clone, Serialize)]
pub struct HelperContexts {
    pub dev: String,
    pub prod: String,
    /// Kubernetes CLI the helpers invoke
    pub cli: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProfileOutcome {
    Installed,
    AlreadyPresent,
}

/// The marker-delimited helper block for `shell`
pub fn helpers_block(shell: Shell, contexts: &HelperContexts) -> String {
    let dev = shell_words::quote(&contexts.dev);
    let prod = shell_words::quote(&contexts.prod);
    let cli = shell_words::quote(&contexts.cli);
    match shell {
        Shell::Fish => format!(
            r#"{marker_start}
# Kubernetes context helpers - added by kmerge
function kube-dev
    {cli} config use-context {dev}
end
function kube-prod
    {cli} config use-context {prod}
end
function kube-current
    {cli} config current-context
end
alias kd kube-dev
alias kp kube-prod
alias kc kube-current
{marker_end}"#,
            marker_start = HELPERS_MARKER_START,
            marker_end = HELPERS_MARKER_END,
        ),
        Shell::Bash | Shell::Zsh => format!(
            r#"{marker_start}
# Kubernetes context helpers - added by kmerge
kube-dev() {{ {cli} config use-context {dev}; }}
kube-prod() {{ {cli} config use-context {prod}; }}
kube-current() {{ {cli} config current-context; }}
alias kd='kube-dev'
alias kp='kube-prod'
alias kc='kube-current'
{marker_end}"#,
            marker_start = HELPERS_MARKER_START,
            marker_end = HELPERS_MARKER_END,
        ),
    }
}

/// Append the helper block to `path` unless its marker is already there
pub fn install_helpers(
    path: &Path,
    shell: Shell,
    contexts: &HelperContexts,
) -> Result<ProfileOutcome> {
    let wrap = |source: std::io::Error| KmergeError::ProfileWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(wrap)?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(wrap)?;
    let existing = fs::read_to_string(path).map_err(wrap)?;

    if existing.contains(HELPERS_MARKER_START) {
        info!(path = %path.display(), "helpers already installed");
        return Ok(ProfileOutcome::AlreadyPresent);
    }

    let block = helpers_block(shell, contexts);
    let addition = if existing.ends_with('\n') || existing.is_empty() {
        format!("{}\n", block)
    } else {
        format!("\n{}\n", block)
    };
    file.write_all(addition.as_bytes()).map_err(wrap)?;
    info!(path = %path.display(), "helpers installed");

    Ok(ProfileOutcome::Installed)
}

pub fn print_profile_outcome(path: &Path, outcome: ProfileOutcome) {
    match outcome {
        ProfileOutcome::Installed => {
            println!(
                "{} Helpers installed to {}",
                "✓".bright_green(),
                path.display().to_string().bright_white()
            );
            println!(
                "  Reload your shell or run: {}",
                format!("source {}", path.display()).bright_white()
            );
        }
        ProfileOutcome::AlreadyPresent => {
            println!(
                "{} Helpers already present in {}",
                "✓".bright_green(),
                path.display()
            );
        }
    }
}
