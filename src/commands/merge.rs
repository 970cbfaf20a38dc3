//! Merge the dev and prod kubeconfigs into the destination file

use crate::error::{KmergeError, Result};
use crate::kubeconfig::{self, KubeConfig, UnionCheck};
use crate::kubectl::KubeCli;
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Serialize)]
pub struct MergeReport {
    pub dev: PathBuf,
    pub prod: PathBuf,
    pub destination: PathBuf,
    pub backup: Option<PathBuf>,
    pub bytes: usize,
    /// `None` when the files could not be parsed for verification
    pub union: Option<UnionCheck>,
    pub warnings: Vec<String>,
}

/// Flatten `dev` and `prod` through the CLI and replace `destination` with the result.
///
/// Both sources are checked before the CLI is invoked. The destination is only
/// replaced once the CLI has produced non-empty output.
pub fn merge(
    cli: &dyn KubeCli,
    dev: &Path,
    prod: &Path,
    destination: &Path,
    backup: bool,
) -> Result<MergeReport> {
    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            KmergeError::MergeExecutionFailed(format!("cannot create {}: {}", parent.display(), e))
        })?;
    }

    for source in [dev, prod] {
        if !source.is_file() {
            return Err(KmergeError::SourceFileMissing(source.to_path_buf()));
        }
    }

    let text = cli.view_flattened(&[dev, prod])?;
    if text.trim().is_empty() {
        return Err(KmergeError::MergeExecutionFailed(
            "kubectl produced an empty configuration".to_string(),
        ));
    }

    let backup = if backup {
        kubeconfig::backup_existing(destination).map_err(|e| {
            KmergeError::MergeExecutionFailed(format!("cannot back up {}: {}", destination.display(), e))
        })?
    } else {
        None
    };

    kubeconfig::write_restricted(destination, text.as_bytes()).map_err(|e| {
        KmergeError::MergeExecutionFailed(format!("cannot write {}: {}", destination.display(), e))
    })?;
    info!(path = %destination.display(), bytes = text.len(), "wrote merged kubeconfig");

    let mut warnings = Vec::new();
    let union = match verify(dev, prod, &text) {
        Ok(check) => {
            for entry in &check.missing {
                warnings.push(format!(
                    "{} '{}' from the sources is missing in the merged config",
                    entry.kind.as_str(),
                    entry.name
                ));
            }
            for entry in &check.duplicates {
                warnings.push(format!(
                    "{} '{}' is defined in both files; the dev definition was kept",
                    entry.kind.as_str(),
                    entry.name
                ));
            }
            Some(check)
        }
        Err(e) => {
            warnings.push(format!("could not verify merged config: {}", e));
            None
        }
    };
    for w in &warnings {
        warn!("{}", w);
    }

    Ok(MergeReport {
        dev: dev.to_path_buf(),
        prod: prod.to_path_buf(),
        destination: destination.to_path_buf(),
        backup,
        bytes: text.len(),
        union,
        warnings,
    })
}

fn verify(dev: &Path, prod: &Path, merged: &str) -> Result<UnionCheck> {
    let dev = KubeConfig::load(dev)?;
    let prod = KubeConfig::load(prod)?;
    let merged = KubeConfig::parse(merged)?;
    Ok(kubeconfig::check_union(&dev, &prod, &merged))
}

pub fn print_merge_summary(report: &MergeReport) {
    println!(
        "{} Merged {} and {} into {}",
        "✓".bright_green(),
        report.dev.display(),
        report.prod.display(),
        report.destination.display().to_string().bright_white()
    );
    if let Some(backup) = &report.backup {
        println!("  Previous config saved to {}", backup.display());
    }
    if let Some(check) = &report.union {
        println!(
            "  {} contexts, {} clusters, {} users",
            check.contexts, check.clusters, check.users
        );
        if check.is_complete() {
            println!("  Every source entry is present in the merged config");
        }
    }
    for w in &report.warnings {
        println!("{} {}", "!".bright_yellow(), w);
    }
}
