//! Invocations of the external Kubernetes CLI

use crate::error::{KmergeError, Result};
use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::Duration;
use tracing::debug;

/// The operations kmerge needs from a Kubernetes CLI
pub trait KubeCli {
    /// Client version line. Fails with `ToolNotAvailable` if the tool cannot run.
    fn version(&self) -> Result<String>;

    /// Merged and flattened view of `files`, in order, as kubeconfig text.
    fn view_flattened(&self, files: &[&Path]) -> Result<String>;

    /// Headerless `config get-contexts` table for the given kubeconfig.
    fn get_contexts(&self, kubeconfig: &Path) -> Result<String>;
}

/// `kubectl` (or a compatible program such as `oc`) found on PATH
#[derive(Debug, Clone)]
pub struct Kubectl {
    program: String,
}

impl Kubectl {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn resolve(&self) -> Result<PathBuf> {
        which::which(&self.program)
            .map_err(|_| KmergeError::ToolNotAvailable(self.program.clone()))
    }

    fn command(&self) -> Command {
        Command::new(&self.program)
    }
}

impl KubeCli for Kubectl {
    fn version(&self) -> Result<String> {
        let resolved = self.resolve()?;
        debug!(path = %resolved.display(), "resolved kubernetes CLI");

        let output = Command::new(&resolved)
            .args(["version", "--client"])
            .output()
            .map_err(|e| KmergeError::ToolNotAvailable(format!("{} ({})", self.program, e)))?;

        if !output.status.success() {
            return Err(KmergeError::ToolNotAvailable(format!(
                "{} ({})",
                self.program,
                stderr_of(&output)
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(first_line(&stdout).unwrap_or_else(|| "unknown".to_string()))
    }

    fn view_flattened(&self, files: &[&Path]) -> Result<String> {
        let joined = join_paths_for_env(files)
            .map_err(|e| KmergeError::MergeExecutionFailed(e.to_string()))?;

        let mut cmd = self.command();
        cmd.args(["config", "view", "--flatten"]).env("KUBECONFIG", &joined);
        debug!(kubeconfig = ?joined, "running {} config view --flatten", self.program);

        let output = run_with_spinner(&mut cmd, "Merging kubeconfigs...")
            .map_err(|e| KmergeError::MergeExecutionFailed(format!("{}: {}", self.program, e)))?;
        if !output.status.success() {
            return Err(KmergeError::MergeExecutionFailed(format!(
                "{} config view --flatten exited with {}: {}",
                self.program,
                output.status,
                stderr_of(&output)
            )));
        }

        String::from_utf8(output.stdout).map_err(|_| {
            KmergeError::MergeExecutionFailed("merged output is not valid UTF-8".to_string())
        })
    }

    fn get_contexts(&self, kubeconfig: &Path) -> Result<String> {
        let output = self
            .command()
            .args(["config", "get-contexts", "--no-headers"])
            .env("KUBECONFIG", kubeconfig)
            .output()
            .map_err(|e| KmergeError::ListingFailed(format!("{}: {}", self.program, e)))?;

        if !output.status.success() {
            return Err(KmergeError::ListingFailed(format!(
                "{} config get-contexts failed: {}",
                self.program,
                stderr_of(&output)
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Join paths for the KUBECONFIG environment variable using the platform separator
pub fn join_paths_for_env(
    paths: &[&Path],
) -> std::result::Result<OsString, std::env::JoinPathsError> {
    std::env::join_paths(paths.iter().copied())
}

/// Run a command, showing a spinner on interactive terminals
fn run_with_spinner(cmd: &mut Command, message: &str) -> std::io::Result<Output> {
    use indicatif::{ProgressBar, ProgressStyle};

    let spinner = if std::io::stderr().is_terminal() {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let output = cmd.output();

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    output
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

fn first_line(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}
