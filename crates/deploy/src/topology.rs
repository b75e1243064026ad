//! Discovery of the validator state directories of a rollup.

use std::path::PathBuf;

use crate::{
    DeployResult, DeploymentWorkspace,
    services::{NODE_CONFIG_FILENAME, NodeConfig},
};

/// State directory of one node, `rollups/<rollup>/validator<index>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorStateDir {
    pub index: usize,
    pub path: PathBuf,
}

impl ValidatorStateDir {
    pub fn config_path(&self) -> PathBuf {
        self.path.join(NODE_CONFIG_FILENAME)
    }

    /// Load the node's `config.json`.
    pub fn load_config(&self) -> DeployResult<NodeConfig> {
        NodeConfig::load_from_file(&self.config_path())
    }
}

/// Enumerate `validator0`, `validator1`, ... until the first missing index.
///
/// Directories past a gap are ignored.
pub fn discover(workspace: &DeploymentWorkspace, rollup: &str) -> Vec<ValidatorStateDir> {
    let nodes: Vec<_> = (0..)
        .map(|index| ValidatorStateDir {
            index,
            path: workspace.validator_dir(rollup, index),
        })
        .take_while(|dir| dir.path.is_dir())
        .collect();

    tracing::debug!(rollup, count = nodes.len(), "Discovered validator state directories");

    nodes
}

/// Discover the topology and load every node config.
///
/// Any unreadable or malformed config aborts the whole load.
pub fn load_topology(
    workspace: &DeploymentWorkspace,
    rollup: &str,
) -> DeployResult<Vec<(ValidatorStateDir, NodeConfig)>> {
    discover(workspace, rollup)
        .into_iter()
        .map(|dir| {
            let config = dir.load_config()?;
            Ok((dir, config))
        })
        .collect()
}
