//! Deployment configuration.
//!
//! Every name the generated manifest and the runtime commands depend on lives
//! here. Values are layered: built-in defaults, then an optional TOML file,
//! then `ARB_DEPLOY_*` environment variables.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

/// The default name for the configuration file, looked up in the working directory.
pub const CONFIG_FILENAME: &str = "ArbDeploy.toml";

/// Prefix of the environment variables overriding configuration keys.
pub const ENV_PREFIX: &str = "ARB_DEPLOY_";

/// Default name of the generated compose file.
pub const DEFAULT_MANIFEST_FILENAME: &str = "docker-compose.yml";

/// Default docker image shared by the aggregator and every validator.
pub const DEFAULT_IMAGE: &str = "arb-validator";

/// Default external docker network the deployment joins.
pub const DEFAULT_NETWORK: &str = "arb-network";

/// Hostname of the bridge chain's execution node inside the docker network.
pub const DEFAULT_BRIDGE_ETH_HOST: &str = "arb-bridge-eth-geth";

/// Default RPC/websocket port exposed by the aggregator.
pub const DEFAULT_AGGREGATOR_RPC_PORT: u16 = 1235;

/// Default HTTP port exposed by the aggregator.
pub const DEFAULT_AGGREGATOR_HTTP_PORT: u16 = 8547;

/// Configuration of the aggregator service (node 0).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Compose service name.
    pub service_name: String,
    /// Entrypoint binary inside the image.
    pub entrypoint: String,
    /// RPC/websocket port, published on the same host port.
    pub rpc_port: u16,
    /// HTTP port, published on the same host port.
    pub http_port: u16,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            service_name: "arb-tx-aggregator".to_string(),
            entrypoint: "/home/user/go/bin/arb-tx-aggregator".to_string(),
            rpc_port: DEFAULT_AGGREGATOR_RPC_PORT,
            http_port: DEFAULT_AGGREGATOR_HTTP_PORT,
        }
    }
}

/// External programs driven by the shell runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// The docker CLI.
    pub docker: String,
    /// The docker-compose CLI.
    pub compose: String,
    /// Command building the validator image.
    pub build_command: Vec<String>,
    /// Command creating the external docker network.
    pub create_network_command: Vec<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            docker: "docker".to_string(),
            compose: "docker-compose".to_string(),
            build_command: vec!["./scripts/arb_build_validator_docker".to_string()],
            create_network_command: vec!["./scripts/create-network".to_string()],
        }
    }
}

/// Full configuration of a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// File name of the generated manifest, relative to the working directory.
    pub manifest_filename: String,
    /// Directory holding `<rollup>/validator<i>` state directories.
    pub rollups_dir: PathBuf,
    /// Docker image for every node.
    pub image: String,
    /// Substring identifying validator containers during the halt sweep.
    pub container_pattern: String,
    /// External docker network.
    pub network: String,
    /// Hostname rewritten out of node endpoints.
    pub loopback_host: String,
    /// Hostname substituted for `loopback_host`.
    pub bridge_eth_host: String,
    /// Mount point of the node state directory inside the container.
    pub state_mount: String,
    /// Prefix of validator service names; the node index is appended.
    pub validator_service_prefix: String,
    /// Aggregator service settings.
    pub aggregator: AggregatorConfig,
    /// External programs.
    pub runtime: RuntimeConfig,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            manifest_filename: DEFAULT_MANIFEST_FILENAME.to_string(),
            rollups_dir: PathBuf::from("rollups"),
            image: DEFAULT_IMAGE.to_string(),
            container_pattern: DEFAULT_IMAGE.to_string(),
            network: DEFAULT_NETWORK.to_string(),
            loopback_host: "localhost".to_string(),
            bridge_eth_host: DEFAULT_BRIDGE_ETH_HOST.to_string(),
            state_mount: "/home/user/state".to_string(),
            validator_service_prefix: DEFAULT_IMAGE.to_string(),
            aggregator: AggregatorConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

impl DeployConfig {
    /// Load the layered configuration.
    ///
    /// With `path == None` the default [`CONFIG_FILENAME`] inside `workdir` is
    /// used when present. An explicit path must exist.
    pub fn load(workdir: &Path, path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Configuration file not found: {}", path.display());
                }
                Some(path.to_path_buf())
            }
            None => Some(workdir.join(CONFIG_FILENAME)).filter(|p| p.exists()),
        };

        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = &file {
            tracing::debug!(path = %file.display(), "Loading configuration file");
            figment = figment.merge(Toml::file(file));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        figment
            .extract()
            .context("Failed to load deployment configuration")
    }

    /// Save the configuration to a TOML file.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = self.to_toml()?;
        std::fs::write(path, content)
            .context(format!("Failed to write config to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// Serialize the configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize deployment config to TOML")
    }

    /// Compose service name of validator `index`.
    pub fn validator_service_name(&self, index: usize) -> String {
        format!("{}{}", self.validator_service_prefix, index)
    }
}
