//! The setup workflow: prerequisite check, merge, listing, profile helpers

use crate::cli::Cli;
use crate::commands::contexts::{self, ContextEntry};
use crate::commands::merge::{self, MergeReport};
use crate::commands::prereq;
use crate::commands::profile::{self, HelperContexts, ProfileOutcome, Shell};
use crate::config::{self, KmergeConfig};
use crate::error::{KmergeError, Result};
use crate::kubectl::KubeCli;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, error, warn};

/// Workflow stages. `Aborted` is only reachable from `CheckPrereq` and `Merge`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Start,
    CheckPrereq,
    Merge,
    ListContexts,
    Augment,
    Done,
    Aborted,
}

/// Fully resolved inputs for one run
#[derive(Debug, Clone)]
pub struct SetupOptions {
    pub dev: PathBuf,
    pub prod: PathBuf,
    pub destination: PathBuf,
    /// `None` skips the profile step
    pub profile: Option<PathBuf>,
    pub shell: Shell,
    pub helpers: HelperContexts,
    pub kubectl: String,
    pub backup: bool,
    /// Suppress status lines
    pub quiet: bool,
}

impl SetupOptions {
    /// Combine CLI flags with the settings file; flags win.
    pub fn resolve(cli: &Cli, cfg: &KmergeConfig) -> Result<Self> {
        let destination = match (&cli.kubeconfig, &cfg.destination) {
            (Some(p), _) => p.clone(),
            (None, Some(s)) => config::expand_home(s),
            (None, None) => config::default_kubeconfig_path()?,
        };

        let shell = match cli.shell.as_deref().or(cfg.shell.as_deref()) {
            Some(name) => Shell::from_name(name)?,
            None => Shell::detect(),
        };

        let profile = if cli.no_profile {
            None
        } else {
            Some(match (&cli.profile, &cfg.profile) {
                (Some(p), _) => p.clone(),
                (None, Some(s)) => config::expand_home(s),
                (None, None) => {
                    let home = dirs_next::home_dir().ok_or(KmergeError::NoHomeDir)?;
                    shell.profile_path(&home)
                }
            })
        };

        let kubectl = cli
            .kubectl
            .clone()
            .or_else(|| cfg.kubectl.clone())
            .unwrap_or_else(|| "kubectl".to_string());

        Ok(Self {
            dev: cli.dev.clone(),
            prod: cli.prod.clone(),
            destination,
            profile,
            shell,
            helpers: HelperContexts {
                dev: cli
                    .dev_context
                    .clone()
                    .unwrap_or_else(|| cfg.helpers.dev_context.clone()),
                prod: cli
                    .prod_context
                    .clone()
                    .unwrap_or_else(|| cfg.helpers.prod_context.clone()),
                cli: kubectl.clone(),
            },
            kubectl,
            backup: cli.backup || cfg.backup,
            quiet: cli.json,
        })
    }
}

/// Everything a run produced, in the order the stages ran
#[derive(Debug, Serialize)]
pub struct SetupReport {
    pub stage: Stage,
    pub kubectl_version: Option<String>,
    pub merge: Option<MergeReport>,
    pub contexts: Option<Vec<ContextEntry>>,
    pub profile: Option<ProfileOutcome>,
    /// Non-fatal step failures
    pub warnings: Vec<String>,
    /// The error that aborted the run
    pub error: Option<String>,
}

impl SetupReport {
    fn new() -> Self {
        Self {
            stage: Stage::Start,
            kubectl_version: None,
            merge: None,
            contexts: None,
            profile: None,
            warnings: Vec::new(),
            error: None,
        }
    }

    fn advance(&mut self, next: Stage) {
        debug!(from = ?self.stage, to = ?next, "stage transition");
        self.stage = next;
    }

    fn abort(&mut self, err: KmergeError) {
        error!(stage = ?self.stage, "{}", err);
        self.error = Some(err.to_string());
        self.advance(Stage::Aborted);
    }

    fn soft_fail(&mut self, err: KmergeError) {
        warn!(stage = ?self.stage, "{}", err);
        self.warnings.push(err.to_string());
    }

    /// 1 if a fatal step failed, 0 otherwise
    pub fn exit_code(&self) -> u8 {
        if self.stage == Stage::Aborted {
            1
        } else {
            0
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Run the whole workflow against `cli`
pub fn run(opts: &SetupOptions, cli: &dyn KubeCli) -> SetupReport {
    let mut report = SetupReport::new();

    report.advance(Stage::CheckPrereq);
    match prereq::check(cli) {
        Ok(version) => {
            if !opts.quiet {
                println!("{} {} ({})", "✓".bright_green(), opts.kubectl, version);
            }
            report.kubectl_version = Some(version);
        }
        Err(e) => {
            fail_line(opts, &e);
            report.abort(e);
            return report;
        }
    }

    report.advance(Stage::Merge);
    match merge::merge(cli, &opts.dev, &opts.prod, &opts.destination, opts.backup) {
        Ok(merged) => {
            if !opts.quiet {
                merge::print_merge_summary(&merged);
            }
            report.merge = Some(merged);
        }
        Err(e) => {
            fail_line(opts, &e);
            report.abort(e);
            return report;
        }
    }

    report.advance(Stage::ListContexts);
    match contexts::list(cli, &opts.destination) {
        Ok(list) => {
            if !opts.quiet {
                contexts::print_contexts(&list);
            }
            let current = list.iter().filter(|c| c.current).count();
            if current > 1 {
                warn!(count = current, "more than one context marked current");
                report
                    .warnings
                    .push("more than one context is marked current".to_string());
            }
            report.contexts = Some(list);
        }
        Err(e) => {
            fail_line(opts, &e);
            report.soft_fail(e);
        }
    }

    report.advance(Stage::Augment);
    if let Some(path) = &opts.profile {
        match profile::install_helpers(path, opts.shell, &opts.helpers) {
            Ok(outcome) => {
                if !opts.quiet {
                    profile::print_profile_outcome(path, outcome);
                }
                report.profile = Some(outcome);
            }
            Err(e) => {
                fail_line(opts, &e);
                report.soft_fail(e);
            }
        }
    } else {
        debug!("profile step disabled");
    }

    report.advance(Stage::Done);
    report
}

fn fail_line(opts: &SetupOptions, err: &KmergeError) {
    if !opts.quiet {
        eprintln!("{} {}", "✗".bright_red(), err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::profile::HELPERS_MARKER_START;
    use crate::commands::testing::{FakeCli, DEV_YAML, PROD_YAML};
    use clap::Parser;
    use std::fs;
    use std::path::Path;

    fn options(dir: &Path) -> SetupOptions {
        let dev = dir.join("dev.yaml");
        let prod = dir.join("prod.yaml");
        fs::write(&dev, DEV_YAML).unwrap();
        fs::write(&prod, PROD_YAML).unwrap();
        SetupOptions {
            dev,
            prod,
            destination: dir.join("home/.kube/config"),
            profile: Some(dir.join("home/.bashrc")),
            shell: Shell::Bash,
            helpers: HelperContexts {
                dev: "dev".into(),
                prod: "prod".into(),
                cli: "kubectl".into(),
            },
            kubectl: "kubectl".into(),
            backup: false,
            quiet: true,
        }
    }

    #[test]
    fn test_full_run() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path());
        let cli = FakeCli::default();

        let report = run(&opts, &cli);

        assert_eq!(report.stage, Stage::Done);
        assert_eq!(report.exit_code(), 0);
        assert!(report.warnings.is_empty());
        assert_eq!(report.profile, Some(ProfileOutcome::Installed));
        let contexts = report.contexts.unwrap();
        assert_eq!(contexts.len(), 2);
        assert!(contexts[0].current);
        assert!(opts.destination.exists());
        assert_eq!(
            *cli.calls.borrow(),
            vec!["version", "view", "get-contexts"]
        );
    }

    #[test]
    fn test_second_run_keeps_single_block() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path());

        run(&opts, &FakeCli::default());
        let report = run(&opts, &FakeCli::default());

        assert_eq!(report.profile, Some(ProfileOutcome::AlreadyPresent));
        let profile = fs::read_to_string(opts.profile.unwrap()).unwrap();
        assert_eq!(profile.matches(HELPERS_MARKER_START).count(), 1);
    }

    #[test]
    fn test_missing_tool_aborts_without_writes() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path());
        let cli = FakeCli {
            available: false,
            ..Default::default()
        };

        let report = run(&opts, &cli);

        assert_eq!(report.stage, Stage::Aborted);
        assert_eq!(report.exit_code(), 1);
        assert!(report.error.is_some());
        assert!(!dir.path().join("home").exists());
        assert_eq!(*cli.calls.borrow(), vec!["version"]);
    }

    #[test]
    fn test_missing_source_aborts_before_profile() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(dir.path());
        opts.prod = dir.path().join("missing.yaml");
        let cli = FakeCli::default();

        let report = run(&opts, &cli);

        assert_eq!(report.stage, Stage::Aborted);
        assert_eq!(report.exit_code(), 1);
        assert!(!cli.called("view"));
        assert!(!cli.called("get-contexts"));
        assert!(!opts.profile.unwrap().exists());
    }

    #[test]
    fn test_merge_failure_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path());
        let cli = FakeCli {
            merge_fails: true,
            ..Default::default()
        };

        let report = run(&opts, &cli);

        assert_eq!(report.exit_code(), 1);
        assert!(report.merge.is_none());
        assert!(!opts.destination.exists());
    }

    #[test]
    fn test_several_current_contexts_warn_once() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path());
        let cli = FakeCli {
            listing: Some("*  dev\n*  prod\n".to_string()),
            ..Default::default()
        };

        let report = run(&opts, &cli);

        assert_eq!(report.exit_code(), 0);
        assert_eq!(
            report.warnings,
            vec!["more than one context is marked current".to_string()]
        );
    }

    #[test]
    fn test_listing_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path());
        let cli = FakeCli {
            listing: None,
            ..Default::default()
        };

        let report = run(&opts, &cli);

        assert_eq!(report.stage, Stage::Done);
        assert_eq!(report.exit_code(), 0);
        assert!(report.contexts.is_none());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.profile, Some(ProfileOutcome::Installed));
    }

    #[cfg(unix)]
    #[test]
    fn test_profile_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(dir.path());
        // a directory cannot be opened for appending
        let blocked = dir.path().join("blocked");
        fs::create_dir_all(&blocked).unwrap();
        opts.profile = Some(blocked);

        let report = run(&opts, &FakeCli::default());

        assert_eq!(report.stage, Stage::Done);
        assert_eq!(report.exit_code(), 0);
        assert!(report.profile.is_none());
        assert!(report.warnings[0].contains("cannot update shell profile"));
    }

    #[test]
    fn test_no_profile_skips_augment() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(dir.path());
        opts.profile = None;

        let report = run(&opts, &FakeCli::default());

        assert_eq!(report.stage, Stage::Done);
        assert!(report.profile.is_none());
        assert!(!dir.path().join("home/.bashrc").exists());
    }

    #[test]
    fn test_report_json() {
        let dir = tempfile::tempdir().unwrap();
        let report = run(&options(dir.path()), &FakeCli::default());

        let v: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(v["stage"], "done");
        assert_eq!(v["profile"], "installed");
        assert_eq!(v["contexts"][0]["name"], "dev");
        assert_eq!(v["contexts"][0]["current"], true);
    }

    #[test]
    fn test_resolve_flags_override_settings() {
        let cli = Cli::parse_from([
            "kmerge",
            "dev.yaml",
            "prod.yaml",
            "--kubeconfig",
            "/tmp/merged",
            "--shell",
            "zsh",
            "--dev-context",
            "dev-admin",
            "--no-profile",
            "--json",
        ]);
        let cfg = KmergeConfig {
            destination: Some("/etc/other".into()),
            shell: Some("fish".into()),
            kubectl: Some("oc".into()),
            backup: true,
            ..Default::default()
        };

        let opts = SetupOptions::resolve(&cli, &cfg).unwrap();

        assert_eq!(opts.destination, PathBuf::from("/tmp/merged"));
        assert_eq!(opts.shell, Shell::Zsh);
        assert!(opts.profile.is_none());
        assert_eq!(opts.helpers.dev, "dev-admin");
        assert_eq!(opts.helpers.prod, "prod");
        assert_eq!(opts.kubectl, "oc");
        assert_eq!(opts.helpers.cli, "oc");
        assert!(opts.backup);
        assert!(opts.quiet);
    }

    #[test]
    fn test_resolve_rejects_unknown_shell() {
        let cli = Cli::parse_from([
            "kmerge",
            "dev.yaml",
            "prod.yaml",
            "--kubeconfig",
            "/tmp/merged",
            "--shell",
            "tcsh",
        ]);
        assert!(matches!(
            SetupOptions::resolve(&cli, &KmergeConfig::default()),
            Err(KmergeError::UnsupportedShell(_))
        ));
    }

    #[test]
    fn test_missing_argument_is_usage_error() {
        assert!(Cli::try_parse_from(["kmerge", "dev.yaml"]).is_err());
    }
}
