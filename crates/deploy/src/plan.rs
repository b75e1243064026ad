//! The resolved topology of a deployment.

use comfy_table::Table;

use crate::{
    DeployConfig, DeployError, DeployResult, DeploymentWorkspace,
    manifest::{ComposeManifest, PortMapping, ServiceConfig},
    services::{NodeRole, ResolvedNode, resolve},
    topology::load_topology,
};

/// Every node of a rollup, resolved and ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentPlan {
    /// The rollup whose state directories were scanned.
    pub rollup: String,
    /// Rollup contract address, taken from node 0.
    pub rollup_address: String,
    /// Nodes in index order; node 0 is the aggregator.
    pub nodes: Vec<ResolvedNode>,
}

impl DeploymentPlan {
    /// Discover, load and resolve every node of `rollup`.
    ///
    /// Fails without side effects if any node config is unreadable, malformed
    /// or lacks a password, or if the rollup has no nodes at all.
    pub fn resolve(
        workspace: &DeploymentWorkspace,
        rollup: &str,
        cli_password: Option<&str>,
        settings: &DeployConfig,
    ) -> DeployResult<Self> {
        let topology = load_topology(workspace, rollup)?;

        let nodes = topology
            .into_iter()
            .map(|(dir, config)| resolve(config, dir.index, dir.path, cli_password, settings))
            .collect::<DeployResult<Vec<_>>>()?;

        let Some(aggregator) = nodes.first() else {
            return Err(DeployError::NoValidators {
                rollup: rollup.to_string(),
                path: workspace.validator_dir(rollup, 0),
            });
        };

        Ok(Self {
            rollup: rollup.to_string(),
            rollup_address: aggregator.rollup_address.clone(),
            nodes,
        })
    }

    pub fn validator_count(&self) -> usize {
        self.nodes.len()
    }

    /// Build the compose manifest: the aggregator followed by one service per validator.
    pub fn to_manifest(&self, settings: &DeployConfig) -> ComposeManifest {
        self.nodes
            .iter()
            .fold(ComposeManifest::new(&settings.network), |manifest, node| {
                manifest.service(Self::service_config(node, settings))
            })
    }

    fn service_config(node: &ResolvedNode, settings: &DeployConfig) -> ServiceConfig {
        match node.role {
            NodeRole::Aggregator => {
                let aggregator = &settings.aggregator;
                ServiceConfig::new(Self::service_name(node, settings), &settings.image)
                    .bind(&node.state_dir, &settings.state_mount)
                    .entrypoint(&aggregator.entrypoint)
                    .cmd(node.command.clone())
                    .ports([
                        PortMapping::same(aggregator.rpc_port),
                        PortMapping::same(aggregator.http_port),
                    ])
            }
            NodeRole::Validator => {
                ServiceConfig::new(Self::service_name(node, settings), &settings.image)
                    .bind(&node.state_dir, &settings.state_mount)
                    .cmd(node.command.clone())
            }
        }
    }

    /// Compose service name of `node`.
    fn service_name(node: &ResolvedNode, settings: &DeployConfig) -> String {
        match node.role {
            NodeRole::Aggregator => settings.aggregator.service_name.clone(),
            NodeRole::Validator => settings.validator_service_name(node.index),
        }
    }

    /// Table describing each node, with secrets redacted.
    pub fn summary_table(&self, settings: &DeployConfig) -> Table {
        let mut table = Table::new();
        table.set_header(vec!["Index", "Role", "Service", "State directory", "Flags"]);

        for node in &self.nodes {
            table.add_row(vec![
                node.index.to_string(),
                node.role.to_string(),
                Self::service_name(node, settings),
                node.state_dir.display().to_string(),
                node.redacted_flags().join(" "),
            ]);
        }

        table
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::services::{NodeCmdBuilder, NodeConfig};

    fn plan() -> DeploymentPlan {
        let settings = DeployConfig::default();
        let nodes = (0..3)
            .map(|i| {
                resolve(
                    NodeConfig {
                        rollup_address: "0xabc".to_string(),
                        eth_url: "ws://localhost:7546".to_string(),
                        password: Some(format!("secret{}", i)),
                        blocktime: None,
                    },
                    i,
                    PathBuf::from(format!("/work/rollups/r/validator{}", i)),
                    None,
                    &settings,
                )
                .unwrap()
            })
            .collect();

        DeploymentPlan {
            rollup: "r".to_string(),
            rollup_address: "0xabc".to_string(),
            nodes,
        }
    }

    #[test]
    fn test_manifest_services() {
        let settings = DeployConfig::default();
        let manifest = plan().to_manifest(&settings);

        let names: Vec<_> = manifest.services.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["arb-tx-aggregator", "arb-validator1", "arb-validator2"]);

        let aggregator = &manifest.services[0];
        assert_eq!(aggregator.port_mappings.len(), 2);
        assert!(aggregator.entrypoint.is_some());

        let validator = &manifest.services[2];
        assert!(validator.port_mappings.is_empty());
        assert_eq!(validator.entrypoint, None);
        assert_eq!(
            validator.cmd,
            NodeCmdBuilder::new(NodeRole::Validator, "ws://arb-bridge-eth-geth:7546", "0xabc")
                .password("secret2")
                .build()
        );
    }

    #[test]
    fn test_manifest_is_deterministic() {
        let settings = DeployConfig::default();
        let first = plan().to_manifest(&settings);
        let second = plan().to_manifest(&settings);
        assert_eq!(first, second);
        assert_eq!(first.render().unwrap(), second.render().unwrap());
    }

    #[test]
    fn test_summary_table_redacts_passwords() {
        let rendered = plan().summary_table(&DeployConfig::default()).to_string();
        assert!(rendered.contains("aggregator"));
        assert!(rendered.contains("Service"));
        assert!(rendered.contains("arb-tx-aggregator"));
        assert!(rendered.contains("arb-validator2"));
        assert!(rendered.contains("-password=***"));
        assert!(!rendered.contains("secret1"));
    }
}
