//! Repository settings

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::snapshot::SnapshotStore;
use crate::vcs::VcsRepository;

/// Where the snapshot lives and how the VCS is driven
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// VCS working directory
    pub path: PathBuf,
    /// Snapshot root, relative to `path`
    pub snapshot_dir: PathBuf,
    /// Version-control program to invoke
    pub vcs_program: String,
    /// Remote used by push/pull; the VCS default when unset
    pub remote: Option<String>,
    /// Branch used by push/pull; the VCS default when unset
    pub branch: Option<String>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("."),
            snapshot_dir: PathBuf::from("schemas"),
            vcs_program: "git".to_string(),
            remote: None,
            branch: None,
        }
    }
}

impl RepositoryConfig {
    /// Absolute-or-relative snapshot root (`path/snapshot_dir`)
    pub fn snapshot_root(&self) -> PathBuf {
        self.path.join(&self.snapshot_dir)
    }

    /// Snapshot store confined to the working directory
    pub fn snapshot_store(&self) -> SnapshotStore {
        SnapshotStore::new(self.snapshot_root()).within(&self.path)
    }

    /// Repository handle driving `vcs_program` in `path`
    pub fn vcs(&self) -> VcsRepository {
        VcsRepository::with_program(self.vcs_program.clone(), self.path.clone())
    }

    pub fn remote(&self) -> Option<&str> {
        self.remote.as_deref()
    }

    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_root_joins_path() {
        let config = RepositoryConfig {
            path: PathBuf::from("/srv/repo"),
            ..Default::default()
        };
        assert_eq!(config.snapshot_root(), PathBuf::from("/srv/repo/schemas"));
    }

    #[test]
    fn test_snapshot_store_refuses_escaping_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = RepositoryConfig {
            path: dir.path().join("repo"),
            snapshot_dir: PathBuf::from(".."),
            ..Default::default()
        };
        std::fs::create_dir_all(config.path.join(".git")).unwrap();

        let err = config.snapshot_store().write(&[]).unwrap_err();

        assert!(err.to_string().contains("not inside"));
        assert!(config.path.join(".git").exists());
    }

    #[test]
    fn test_default_program_is_git() {
        assert_eq!(RepositoryConfig::default().vcs_program, "git");
    }
}
