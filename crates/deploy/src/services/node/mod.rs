//! Validator node configuration and resolution.
//!
//! Each node keeps a `config.json` in its state directory. Resolution turns
//! that persisted config into the flags, endpoint and command the node runs
//! with inside the cluster.

mod cmd;

use std::{
    fmt,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

pub use cmd::{BLOCKTIME_FLAG, NodeCmdBuilder, PASSWORD_FLAG, REDACTED, redact_flags};

use crate::{DeployConfig, DeployError, DeployResult};

/// Name of the per-node configuration file.
pub const NODE_CONFIG_FILENAME: &str = "config.json";

/// Role a node plays in the deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum NodeRole {
    /// Node 0, which accepts transactions and anchors the manifest.
    Aggregator,
    /// Any node with index >= 1.
    Validator,
}

impl NodeRole {
    pub fn for_index(index: usize) -> Self {
        if index == 0 {
            Self::Aggregator
        } else {
            Self::Validator
        }
    }
}

/// Block time as persisted in `config.json`, either a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockTime {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for BlockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockTime::Number(n) => write!(f, "{}", n),
            BlockTime::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Persisted configuration of a single node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Address of the rollup contract.
    pub rollup_address: String,
    /// Endpoint of the bridge chain's execution node.
    pub eth_url: String,
    /// Password protecting the validator keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Block time, only honoured on validators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocktime: Option<BlockTime>,
}

impl NodeConfig {
    /// Load a node config from a `config.json` file.
    pub fn load_from_file(path: &Path) -> DeployResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|source| DeployError::ConfigUnreadable {
                path: path.to_path_buf(),
                source,
            })?;

        serde_json::from_str(&content).map_err(|source| DeployError::MalformedConfig {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// A node ready to be rendered into the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNode {
    pub index: usize,
    pub role: NodeRole,
    /// Host state directory mounted into the container.
    pub state_dir: PathBuf,
    /// Extra flags: password, then block time for validators.
    pub flags: Vec<String>,
    /// Endpoint rewritten for use inside the docker network.
    pub endpoint: String,
    pub rollup_address: String,
    /// Full container command.
    pub command: Vec<String>,
}

impl ResolvedNode {
    /// Flags with secrets masked, for display.
    pub fn redacted_flags(&self) -> Vec<String> {
        redact_flags(&self.flags)
    }
}

/// Rewrite the loopback hostname of `eth_url` to the bridge host reachable
/// from inside the docker network.
pub fn rewrite_endpoint(eth_url: &str, settings: &DeployConfig) -> String {
    eth_url.replace(&settings.loopback_host, &settings.bridge_eth_host)
}

/// Resolve node `index` from its persisted config.
///
/// A non-empty `cli_password` always wins over the node's own password; a
/// node with neither fails the whole deployment.
pub fn resolve(
    config: NodeConfig,
    index: usize,
    state_dir: PathBuf,
    cli_password: Option<&str>,
    settings: &DeployConfig,
) -> DeployResult<ResolvedNode> {
    let password = cli_password
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .or(config.password)
        .ok_or(DeployError::PasswordRequired { index })?;

    let role = NodeRole::for_index(index);
    let endpoint = rewrite_endpoint(&config.eth_url, settings);

    let builder = NodeCmdBuilder::new(role, endpoint.clone(), config.rollup_address.clone())
        .password(password)
        .blocktime(config.blocktime.map(|b| b.to_string()));

    let flags = builder.flags();
    let command = builder.build();

    Ok(ResolvedNode {
        index,
        role,
        state_dir,
        flags,
        endpoint,
        rollup_address: config.rollup_address,
        command,
    })
}
