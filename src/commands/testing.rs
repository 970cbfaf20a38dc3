//! In-memory stand-in for kubectl used by command tests

use crate::error::{KmergeError, Result};
use crate::kubeconfig::{KubeConfig, NamedItem};
use crate::kubectl::KubeCli;
use std::cell::RefCell;
use std::collections::HashSet;
use std::path::Path;

pub const DEV_YAML: &str = r#"apiVersion: v1
kind: Config
clusters:
  - name: dev-cluster
    cluster:
      server: https://dev.example.com:6443
contexts:
  - name: dev
    context:
      cluster: dev-cluster
      user: dev-user
users:
  - name: dev-user
    user:
      token: dev-token
current-context: dev
"#;

pub const PROD_YAML: &str = r#"apiVersion: v1
kind: Config
clusters:
  - name: prod-cluster
    cluster:
      server: https://prod.example.com:6443
contexts:
  - name: prod
    context:
      cluster: prod-cluster
      user: prod-user
users:
  - name: prod-user
    user:
      token: prod-token
current-context: prod
"#;

pub const LISTING: &str = "*         dev    dev-cluster    dev-user\n          prod   prod-cluster   prod-user\n";

pub struct FakeCli {
    pub available: bool,
    pub merge_fails: bool,
    /// `None` makes listing fail
    pub listing: Option<String>,
    pub calls: RefCell<Vec<String>>,
}

impl Default for FakeCli {
    fn default() -> Self {
        Self {
            available: true,
            merge_fails: false,
            listing: Some(LISTING.to_string()),
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl FakeCli {
    pub fn called(&self, op: &str) -> bool {
        self.calls.borrow().iter().any(|c| c == op)
    }
}

impl KubeCli for FakeCli {
    fn version(&self) -> Result<String> {
        self.calls.borrow_mut().push("version".into());
        if self.available {
            Ok("Client Version: v1.30.1".into())
        } else {
            Err(KmergeError::ToolNotAvailable("kubectl".into()))
        }
    }

    fn view_flattened(&self, files: &[&Path]) -> Result<String> {
        self.calls.borrow_mut().push("view".into());
        if self.merge_fails {
            return Err(KmergeError::MergeExecutionFailed("exit status: 1".into()));
        }
        flatten(files)
    }

    fn get_contexts(&self, _kubeconfig: &Path) -> Result<String> {
        self.calls.borrow_mut().push("get-contexts".into());
        self.listing
            .clone()
            .ok_or_else(|| KmergeError::ListingFailed("exit status: 1".into()))
    }
}

/// First-wins merge by name, like kubectl's KUBECONFIG resolution
fn flatten(files: &[&Path]) -> Result<String> {
    let mut merged = KubeConfig {
        api_version: Some("v1".into()),
        kind: Some("Config".into()),
        ..Default::default()
    };
    for file in files {
        let cfg = KubeConfig::load(file)?;
        if merged.current_context.is_none() {
            merged.current_context = cfg.current_context;
        }
        extend_unique(&mut merged.clusters, cfg.clusters);
        extend_unique(&mut merged.contexts, cfg.contexts);
        extend_unique(&mut merged.users, cfg.users);
    }
    Ok(serde_yaml_ng::to_string(&merged)?)
}

fn extend_unique(into: &mut Vec<NamedItem>, items: Vec<NamedItem>) {
    let mut seen: HashSet<String> = into.iter().map(|i| i.name.clone()).collect();
    for item in items {
        if seen.insert(item.name.clone()) {
            into.push(item);
        }
    }
}
