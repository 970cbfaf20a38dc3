//! Kubeconfig document model, union checks and restricted file writes

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_yaml_ng::Value as Yaml;
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Kubeconfig file structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct KubeConfig {
    #[serde(rename = "apiVersion")]
    pub api_version: Option<String>,
    pub kind: Option<String>,
    #[serde(default)]
    pub clusters: Vec<NamedItem>,
    #[serde(default, rename = "current-context")]
    pub current_context: Option<String>,
    #[serde(default)]
    pub contexts: Vec<NamedItem>,
    #[serde(default)]
    pub users: Vec<NamedItem>,
}

/// Named item in kubeconfig (context, cluster, user)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NamedItem {
    pub name: String,
    #[serde(default, flatten)]
    pub rest: Yaml,
}

impl KubeConfig {
    /// Parse a kubeconfig document. An empty document is an empty config.
    pub fn parse(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml_ng::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::parse(&fs::read_to_string(path)?)
    }

    fn names(&self, kind: EntryKind) -> BTreeSet<&str> {
        let items = match kind {
            EntryKind::Context => &self.contexts,
            EntryKind::Cluster => &self.clusters,
            EntryKind::User => &self.users,
        };
        items.iter().map(|i| i.name.as_str()).collect()
    }
}

/// Section of a kubeconfig an entry lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Context,
    Cluster,
    User,
}

impl EntryKind {
    const ALL: [EntryKind; 3] = [EntryKind::Context, EntryKind::Cluster, EntryKind::User];

    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::Context => "context",
            EntryKind::Cluster => "cluster",
            EntryKind::User => "user",
        }
    }
}

/// A named entry reported by [`check_union`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub kind: EntryKind,
    pub name: String,
}

/// Outcome of comparing a merged kubeconfig against its two sources
#[derive(Debug, Clone, Default, Serialize)]
pub struct UnionCheck {
    /// Entries present in a source but absent from the merge
    pub missing: Vec<Entry>,
    /// Entries defined in both sources; kubectl keeps the first (dev) definition
    pub duplicates: Vec<Entry>,
    pub contexts: usize,
    pub clusters: usize,
    pub users: usize,
}

impl UnionCheck {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Check that `merged` holds every context, cluster and user of `dev` and `prod`
pub fn check_union(dev: &KubeConfig, prod: &KubeConfig, merged: &KubeConfig) -> UnionCheck {
    let mut check = UnionCheck {
        contexts: merged.contexts.len(),
        clusters: merged.clusters.len(),
        users: merged.users.len(),
        ..Default::default()
    };

    for kind in EntryKind::ALL {
        let dev_names = dev.names(kind);
        let prod_names = prod.names(kind);
        let merged_names = merged.names(kind);

        for name in dev_names.union(&prod_names) {
            if !merged_names.contains(name) {
                check.missing.push(Entry {
                    kind,
                    name: name.to_string(),
                });
            }
        }
        for name in dev_names.intersection(&prod_names) {
            check.duplicates.push(Entry {
                kind,
                name: name.to_string(),
            });
        }
    }

    check
}

/// Follow `path` if it is a symlink so the link itself survives a rename.
fn resolve_link(path: &Path) -> Result<PathBuf> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => match fs::canonicalize(path) {
            Ok(target) => Ok(target),
            // dangling link: write where it points
            Err(_) => {
                let target = fs::read_link(path)?;
                Ok(match path.parent() {
                    Some(parent) if target.is_relative() => parent.join(target),
                    _ => target,
                })
            }
        },
        _ => Ok(path.to_path_buf()),
    }
}

/// Replace `path` with `content` via a temp file in the same directory.
///
/// The file is created with mode 0600 on Unix. The previous content stays
/// untouched if any step before the final rename fails. A symlinked `path`
/// keeps its link; the file it points to is replaced.
pub fn write_restricted(path: &Path, content: &[u8]) -> Result<()> {
    let path = resolve_link(path)?;
    let path = path.as_path();
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o600))?;
    }

    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Copy an existing file to `<path>.bak`. Returns the backup path if one was made.
pub fn backup_existing(path: &Path) -> Result<Option<PathBuf>> {
    if !path.is_file() {
        return Ok(None);
    }
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    let backup = PathBuf::from(name);
    fs::copy(path, &backup)?;
    Ok(Some(backup))
}
