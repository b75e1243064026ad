//! Structured docker-compose manifest and its renderer.

use std::{collections::BTreeMap, fmt, path::PathBuf};

use serde::{Serialize, Serializer};

use crate::DeployResult;

/// Header written at the top of every generated manifest.
pub const MANIFEST_HEADER: &str = "# Machine generated by `arb-deploy`. Do not version control.";

/// Compose file format version.
const COMPOSE_VERSION: &str = "3";

/// A port mapping from container port to host port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortMapping {
    /// The port on the host.
    pub host_port: u16,
    /// The port inside the container.
    pub container_port: u16,
}

impl fmt::Display for PortMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host_port, self.container_port)
    }
}

impl Serialize for PortMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl PortMapping {
    /// Create a port mapping where container and host ports are the same.
    pub fn same(port: u16) -> Self {
        Self {
            host_port: port,
            container_port: port,
        }
    }
}

/// A host directory mounted into a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeBind {
    pub host_path: PathBuf,
    pub container_path: String,
}

impl fmt::Display for VolumeBind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host_path.display(), self.container_path)
    }
}

impl Serialize for VolumeBind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One service declaration of the manifest.
///
/// Fields serialize in declaration order; the name is the key of the
/// service in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceConfig {
    /// The compose service name.
    #[serde(skip)]
    pub name: String,
    /// Volume binds.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<VolumeBind>,
    /// The Docker image to use.
    pub image: String,
    /// The entrypoint for the container.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<String>,
    /// The command to run in the container.
    #[serde(rename = "command", skip_serializing_if = "Vec::is_empty")]
    pub cmd: Vec<String>,
    /// Port mappings from container to host.
    #[serde(rename = "ports", skip_serializing_if = "Vec::is_empty")]
    pub port_mappings: Vec<PortMapping>,
}

impl ServiceConfig {
    /// Create a new service declaration with the given name and image.
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            volumes: Vec::new(),
            image: image.into(),
            entrypoint: None,
            cmd: Vec::new(),
            port_mappings: Vec::new(),
        }
    }

    /// Set the entrypoint.
    pub fn entrypoint(mut self, entrypoint: impl Into<String>) -> Self {
        self.entrypoint = Some(entrypoint.into());
        self
    }

    /// Set the command.
    pub fn cmd(mut self, cmd: Vec<String>) -> Self {
        self.cmd = cmd;
        self
    }

    /// Add a port mapping.
    pub fn port(mut self, mapping: PortMapping) -> Self {
        self.port_mappings.push(mapping);
        self
    }

    /// Add multiple port mappings.
    pub fn ports(mut self, mappings: impl IntoIterator<Item = PortMapping>) -> Self {
        self.port_mappings.extend(mappings);
        self
    }

    /// Add a volume bind.
    pub fn bind(mut self, host_path: impl Into<PathBuf>, container_path: impl Into<String>) -> Self {
        self.volumes.push(VolumeBind {
            host_path: host_path.into(),
            container_path: container_path.into(),
        });
        self
    }
}

/// A complete compose manifest: one external network and ordered services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeManifest {
    /// Name of the pre-existing network used as the default network.
    pub network: String,
    /// Services in declaration order.
    pub services: Vec<ServiceConfig>,
}

impl ComposeManifest {
    pub fn new(network: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            services: Vec::new(),
        }
    }

    /// Append a service declaration.
    pub fn service(mut self, service: ServiceConfig) -> Self {
        self.services.push(service);
        self
    }

    /// Render the manifest as docker-compose YAML, preceded by [`MANIFEST_HEADER`].
    ///
    /// Output depends only on the manifest contents.
    pub fn render(&self) -> DeployResult<String> {
        let yaml = serde_yaml::to_string(self)?;
        Ok(format!("{}\n{}", MANIFEST_HEADER, yaml))
    }
}

#[derive(Serialize)]
struct ComposeDocument<'a> {
    version: &'static str,
    networks: BTreeMap<&'static str, ExternalNetwork<'a>>,
    services: Services<'a>,
}

#[derive(Serialize)]
struct ExternalNetwork<'a> {
    external: NetworkName<'a>,
}

#[derive(Serialize)]
struct NetworkName<'a> {
    name: &'a str,
}

/// Services keyed by name, in declaration order.
struct Services<'a>(&'a [ServiceConfig]);

impl Serialize for Services<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|service| (&service.name, service)))
    }
}

impl Serialize for ComposeManifest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let network = ExternalNetwork {
            external: NetworkName {
                name: &self.network,
            },
        };

        ComposeDocument {
            version: COMPOSE_VERSION,
            networks: BTreeMap::from([("default", network)]),
            services: Services(&self.services),
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use serde_yaml::Value;

    use super::*;

    fn sample() -> ComposeManifest {
        ComposeManifest::new("arb-network")
            .service(
                ServiceConfig::new("arb-tx-aggregator", "arb-validator")
                    .bind("/work/rollups/r/validator0", "/home/user/state")
                    .entrypoint("/home/user/go/bin/arb-tx-aggregator")
                    .cmd(vec!["-password=p0".into(), "state".into()])
                    .ports([PortMapping::same(1235), PortMapping::same(8547)]),
            )
            .service(
                ServiceConfig::new("arb-validator1", "arb-validator")
                    .bind("/work/rollups/r/validator1", "/home/user/state")
                    .cmd(vec!["validate".into(), "-password=it's".into()]),
            )
    }

    fn parse(manifest: &ComposeManifest) -> Value {
        let rendered = manifest.render().unwrap();
        serde_yaml::from_str(&rendered).unwrap()
    }

    fn command(doc: &Value, service: &str) -> Vec<String> {
        doc["services"][service]["command"]
            .as_sequence()
            .unwrap()
            .iter()
            .map(|token| token.as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_render_layout() {
        let rendered = sample().render().unwrap();
        assert!(rendered.starts_with(MANIFEST_HEADER));

        let doc: Value = serde_yaml::from_str(&rendered).unwrap();
        assert_eq!(doc["version"].as_str(), Some("3"));
        assert_eq!(doc["networks"]["default"]["external"]["name"].as_str(), Some("arb-network"));

        let names: Vec<_> = doc["services"]
            .as_mapping()
            .unwrap()
            .keys()
            .map(|k| k.as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["arb-tx-aggregator", "arb-validator1"]);

        let aggregator = &doc["services"]["arb-tx-aggregator"];
        assert_eq!(aggregator["image"].as_str(), Some("arb-validator"));
        assert_eq!(
            aggregator["entrypoint"].as_str(),
            Some("/home/user/go/bin/arb-tx-aggregator")
        );
        assert_eq!(aggregator["volumes"][0].as_str(), Some("/work/rollups/r/validator0:/home/user/state"));
        assert_eq!(aggregator["ports"][0].as_str(), Some("1235:1235"));
        assert_eq!(aggregator["ports"][1].as_str(), Some("8547:8547"));

        let validator = &doc["services"]["arb-validator1"];
        assert!(validator.get("entrypoint").is_none());
        assert!(validator.get("ports").is_none());
        assert_eq!(command(&doc, "arb-validator1"), vec!["validate", "-password=it's"]);
    }

    #[test]
    fn test_command_tokens_survive_rendering() {
        let tokens = vec![
            "validate".to_string(),
            "-password=line1\nline2".to_string(),
            "-password=x\n\ny".to_string(),
            "-password=with space 'and' \"quotes\"".to_string(),
            "-password=#not-a-comment: {}".to_string(),
            "true".to_string(),
            "0x10".to_string(),
        ];
        let manifest = ComposeManifest::new("arb-network")
            .service(ServiceConfig::new("arb-validator1", "arb-validator").cmd(tokens.clone()));

        assert_eq!(command(&parse(&manifest), "arb-validator1"), tokens);
    }

    #[test]
    fn test_render_is_deterministic() {
        assert_eq!(sample().render().unwrap(), sample().render().unwrap());
    }

    #[test]
    fn test_empty_manifest_has_network_only() {
        let doc = parse(&ComposeManifest::new("arb-network"));
        assert_eq!(doc["networks"]["default"]["external"]["name"].as_str(), Some("arb-network"));
        assert!(doc["services"].as_mapping().unwrap().is_empty());
    }
}
