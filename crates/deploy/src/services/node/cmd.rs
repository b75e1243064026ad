//! Command builder for aggregator and validator containers.

use super::NodeRole;

/// Flag carrying the validator key password.
pub const PASSWORD_FLAG: &str = "-password";
/// Flag carrying the validator block time.
pub const BLOCKTIME_FLAG: &str = "-blocktime";
/// Placeholder printed instead of secret flag values.
pub const REDACTED: &str = "***";

/// Positional argument naming the state directory mode.
const STATE_ARG: &str = "state";
/// Verb selecting the validator subcommand.
const VALIDATE_ARG: &str = "validate";

/// Builder for node container commands.
#[derive(Debug, Clone)]
pub struct NodeCmdBuilder {
    role: NodeRole,
    endpoint: String,
    rollup_address: String,
    password: Option<String>,
    blocktime: Option<String>,
}

impl NodeCmdBuilder {
    /// Create a new command builder.
    pub fn new(
        role: NodeRole,
        endpoint: impl Into<String>,
        rollup_address: impl Into<String>,
    ) -> Self {
        Self {
            role,
            endpoint: endpoint.into(),
            rollup_address: rollup_address.into(),
            password: None,
            blocktime: None,
        }
    }

    /// Set the key password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the block time. Ignored for the aggregator.
    pub fn blocktime(mut self, blocktime: Option<String>) -> Self {
        self.blocktime = blocktime;
        self
    }

    /// The extra flags, in order: password, then block time.
    pub fn flags(&self) -> Vec<String> {
        let mut flags = Vec::new();

        if let Some(password) = &self.password {
            flags.push(format!("{}={}", PASSWORD_FLAG, password));
        }

        if self.role == NodeRole::Validator
            && let Some(blocktime) = &self.blocktime
        {
            flags.push(format!("{}={}", BLOCKTIME_FLAG, blocktime));
        }

        flags
    }

    /// Build the container command as a vector of tokens.
    ///
    /// Flags precede the `state` positional argument since the node binaries
    /// stop parsing flags at the first positional argument.
    pub fn build(self) -> Vec<String> {
        let mut cmd = Vec::new();

        if self.role == NodeRole::Validator {
            cmd.push(VALIDATE_ARG.to_string());
        }

        cmd.extend(self.flags());
        cmd.push(STATE_ARG.to_string());
        cmd.push(self.endpoint);
        cmd.push(self.rollup_address);

        cmd
    }
}

/// Replace secret flag values with [`REDACTED`].
pub fn redact_flags(flags: &[String]) -> Vec<String> {
    let secret_prefix = format!("{}=", PASSWORD_FLAG);
    flags
        .iter()
        .map(|flag| {
            if flag.starts_with(&secret_prefix) {
                format!("{}{}", secret_prefix, REDACTED)
            } else {
                flag.clone()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregator_cmd() {
        let cmd = NodeCmdBuilder::new(NodeRole::Aggregator, "ws://arb-bridge-eth-geth:7546", "0xabc")
            .password("p0")
            .build();

        assert_eq!(
            cmd,
            vec!["-password=p0", "state", "ws://arb-bridge-eth-geth:7546", "0xabc"]
        );
    }

    #[test]
    fn test_validator_cmd() {
        let cmd = NodeCmdBuilder::new(NodeRole::Validator, "ws://arb-bridge-eth-geth:7546", "0xabc")
            .password("p1")
            .blocktime(Some("5".to_string()))
            .build();

        assert_eq!(
            cmd,
            vec![
                "validate",
                "-password=p1",
                "-blocktime=5",
                "state",
                "ws://arb-bridge-eth-geth:7546",
                "0xabc"
            ]
        );
    }

    #[test]
    fn test_aggregator_ignores_blocktime() {
        let builder = NodeCmdBuilder::new(NodeRole::Aggregator, "ws://host:1", "0xabc")
            .password("p0")
            .blocktime(Some("100".to_string()));

        assert!(
            !builder.flags().iter().any(|f| f.starts_with(BLOCKTIME_FLAG)),
            "Aggregator should never receive a block time flag"
        );
    }

    #[test]
    fn test_password_with_spaces_is_one_token() {
        let cmd = NodeCmdBuilder::new(NodeRole::Validator, "ws://host:1", "0xabc")
            .password("correct horse")
            .build();

        assert!(cmd.contains(&"-password=correct horse".to_string()));
    }

    #[test]
    fn test_redact_flags() {
        let flags = vec!["-password=hunter2".to_string(), "-blocktime=5".to_string()];
        assert_eq!(redact_flags(&flags), vec!["-password=***", "-blocktime=5"]);
    }
}
