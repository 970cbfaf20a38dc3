//! Prerequisite check: the Kubernetes CLI must be callable

use crate::error::Result;
use crate::kubectl::KubeCli;
use tracing::info;

/// Confirm the CLI runs and return its version line
pub fn check(cli: &dyn KubeCli) -> Result<String> {
    let version = cli.version()?;
    info!(version = %version, "kubernetes CLI available");
    Ok(version)
}
