//! List the contexts of the merged kubeconfig

use crate::error::Result;
use crate::kubectl::KubeCli;
use colored::Colorize;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextEntry {
    pub name: String,
    pub current: bool,
}

/// Parse headerless `kubectl config get-contexts` output.
///
/// A leading `*` marks the current context; the name is the first column
/// after it. Blank lines are skipped and order is preserved.
pub fn parse_contexts(table: &str) -> Vec<ContextEntry> {
    table
        .lines()
        .filter_map(|line| {
            let mut cols = line.split_whitespace().peekable();
            let current = cols.next_if_eq(&"*").is_some();
            cols.next().map(|name| ContextEntry {
                name: name.to_string(),
                current,
            })
        })
        .collect()
}

/// Query the CLI for the contexts in `kubeconfig`
pub fn list(cli: &dyn KubeCli, kubeconfig: &Path) -> Result<Vec<ContextEntry>> {
    let table = cli.get_contexts(kubeconfig)?;
    let contexts = parse_contexts(&table);
    debug!(count = contexts.len(), "parsed contexts");
    Ok(contexts)
}

pub fn print_contexts(contexts: &[ContextEntry]) {
    if contexts.is_empty() {
        println!("{} No contexts in merged config", "!".bright_yellow());
        return;
    }
    println!("Contexts:");
    for ctx in contexts {
        if ctx.current {
            println!("  {} {}", ctx.name.bright_green(), "(current)".bright_white());
        } else {
            println!("  {}", ctx.name);
        }
    }
}
