//! Command line interface definitions

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "kmerge",
    version,
    about = "Merge dev and prod kubeconfigs and install context helper functions",
    long_about = "kmerge flattens a development and a production kubeconfig into your default\n\
                  kubeconfig, lists the resulting contexts and adds kube-dev / kube-prod /\n\
                  kube-current helpers to your shell profile (once).\n\n\
                  Examples:\n  \
                  kmerge ~/dev.yaml ~/prod.yaml\n  \
                  kmerge dev.yaml prod.yaml --backup\n  \
                  kmerge dev.yaml prod.yaml --shell zsh --dev-context dev-admin\n  \
                  kmerge dev.yaml prod.yaml --kubeconfig /tmp/merged --no-profile --json"
)]
pub struct Cli {
    /// Development kubeconfig file
    #[arg(value_name = "DEV")]
    pub dev: PathBuf,

    /// Production kubeconfig file
    #[arg(value_name = "PROD")]
    pub prod: PathBuf,

    /// Destination kubeconfig (defaults to ~/.kube/config)
    #[arg(long, value_name = "PATH")]
    pub kubeconfig: Option<PathBuf>,

    /// Shell profile that receives the helper functions
    #[arg(long, value_name = "PATH")]
    pub profile: Option<PathBuf>,

    /// Shell flavour for the helper block: bash, zsh, fish (defaults to $SHELL)
    #[arg(long, value_name = "SHELL")]
    pub shell: Option<String>,

    /// Kubernetes CLI to invoke
    #[arg(long, value_name = "PROGRAM")]
    pub kubectl: Option<String>,

    /// Context that kube-dev switches to
    #[arg(long, value_name = "NAME")]
    pub dev_context: Option<String>,

    /// Context that kube-prod switches to
    #[arg(long, value_name = "NAME")]
    pub prod_context: Option<String>,

    /// Keep a copy of the previous destination as <PATH>.bak
    #[arg(long)]
    pub backup: bool,

    /// Do not touch the shell profile
    #[arg(long)]
    pub no_profile: bool,

    /// Settings file (defaults to ~/.kube/kmerge.yaml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print a JSON report instead of status lines
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
