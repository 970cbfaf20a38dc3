//! kmerge - merge dev and prod kubeconfigs
//!
//! Flattens two kubeconfig files into the default kubeconfig, lists the
//! resulting contexts and installs context-switching helpers into the shell
//! profile.

mod cli;
mod commands;
mod config;
mod error;
mod kubeconfig;
mod kubectl;

use crate::cli::Cli;
use crate::commands::setup::{self, SetupOptions};
use crate::kubectl::Kubectl;

use clap::Parser;
use colored::Colorize;
use std::process::ExitCode;

/// Initialize tracing subscriber based on verbosity level
fn init_tracing(verbosity: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = match verbosity {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let settings = config::load(cli.config.as_deref())?;
    let opts = SetupOptions::resolve(&cli, &settings)?;
    tracing::debug!(?opts, "resolved options");

    let kubectl = Kubectl::new(opts.kubectl.clone());
    let report = setup::run(&opts, &kubectl);

    if cli.json {
        println!("{}", report.to_json()?);
    }
    Ok(ExitCode::from(report.exit_code()))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".bright_red().bold(), e);
            ExitCode::from(1)
        }
    }
}
