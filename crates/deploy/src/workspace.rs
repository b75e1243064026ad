//! The working directory a deployment is rooted in.

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::{DeployConfig, DeployError, DeployResult};

/// Working directory and manifest location of a deployment.
///
/// The manifest is a singleton per working directory: running two
/// deployments against the same workspace concurrently is not supported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentWorkspace {
    root: PathBuf,
    rollups_dir: PathBuf,
    manifest_path: PathBuf,
}

impl DeploymentWorkspace {
    /// Create a workspace rooted at `root`, which should be absolute since
    /// state paths are mounted into containers verbatim.
    pub fn new(root: impl Into<PathBuf>, config: &DeployConfig) -> Self {
        let root = root.into();
        Self {
            rollups_dir: root.join(&config.rollups_dir),
            manifest_path: root.join(&config.manifest_filename),
            root,
        }
    }

    /// Create a workspace rooted at the process working directory.
    pub fn current(config: &DeployConfig) -> anyhow::Result<Self> {
        let root = std::env::current_dir().context("Failed to resolve working directory")?;
        Ok(Self::new(root, config))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    /// Directory holding the validator state directories of `rollup`.
    pub fn rollup_dir(&self, rollup: &str) -> PathBuf {
        self.rollups_dir.join(rollup)
    }

    /// State directory of node `index` of `rollup`.
    pub fn validator_dir(&self, rollup: &str, index: usize) -> PathBuf {
        self.rollup_dir(rollup).join(format!("validator{}", index))
    }

    pub fn has_manifest(&self) -> bool {
        self.manifest_path.is_file()
    }

    /// Overwrite the manifest with `contents`.
    pub fn write_manifest(&self, contents: &str) -> DeployResult<()> {
        std::fs::write(&self.manifest_path, contents).map_err(|source| {
            DeployError::ManifestWrite {
                path: self.manifest_path.clone(),
                source,
            }
        })?;
        tracing::debug!(path = %self.manifest_path.display(), "Manifest written");
        Ok(())
    }
}
