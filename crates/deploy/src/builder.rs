//! Builder module for creating a [`Deployer`].
//!
//! [`DeployerBuilder`] gathers CLI options, validates that they are
//! consistent and wires the configuration, workspace and runtime together.

use anyhow::Result;

use crate::{
    DeployConfig, DeployMode, DeployOptions, Deployer, DeploymentWorkspace, RollupId,
    ShellRuntime,
};

/// Builder for creating a [`Deployer`].
///
/// # Example
///
/// ```no_run
/// use arbctl_deploy::DeployerBuilder;
///
/// # async fn example() -> anyhow::Result<()> {
/// let deployer = DeployerBuilder::new("mychain")
///     .password(Some("secret".to_string()))
///     .up_only(true)
///     .build()?;
/// deployer.deploy().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DeployerBuilder {
    /// The rollup to deploy (required).
    rollup: RollupId,
    /// Password overriding the per-node passwords.
    password: Option<String>,
    /// Whether to run runtime commands through sudo.
    sudo: bool,
    /// Only build the image.
    build_only: bool,
    /// Only bring the deployment up.
    up_only: bool,
    /// Deployment configuration, defaults if not provided.
    config: Option<DeployConfig>,
    /// Workspace, the process working directory if not provided.
    workspace: Option<DeploymentWorkspace>,
}

impl DeployerBuilder {
    /// Create a new [`DeployerBuilder`] for `rollup`.
    pub fn new(rollup: impl Into<RollupId>) -> Self {
        Self {
            rollup: rollup.into(),
            password: None,
            sudo: false,
            build_only: false,
            up_only: false,
            config: None,
            workspace: None,
        }
    }

    /// Set the password used for every node.
    pub fn password(mut self, password: Option<String>) -> Self {
        self.password = password;
        self
    }

    /// Run runtime commands through sudo.
    pub fn sudo(mut self, sudo: bool) -> Self {
        self.sudo = sudo;
        self
    }

    /// Only build the validator image.
    pub fn build_only(mut self, build_only: bool) -> Self {
        self.build_only = build_only;
        self
    }

    /// Only bring the deployment up.
    pub fn up_only(mut self, up_only: bool) -> Self {
        self.up_only = up_only;
        self
    }

    /// Set the deployment configuration.
    pub fn config(mut self, config: DeployConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the workspace the deployment is rooted in.
    pub fn workspace(mut self, workspace: DeploymentWorkspace) -> Self {
        self.workspace = Some(workspace);
        self
    }

    /// Build a deployer driving the docker CLIs.
    pub fn build(self) -> Result<Deployer<ShellRuntime>> {
        let runtime_config = self.config.clone().unwrap_or_default().runtime;
        let runtime = ShellRuntime::new(runtime_config, self.sudo);
        self.build_with_runtime(runtime)
    }

    /// Build a deployer using `runtime`.
    ///
    /// Fails before anything touches the runtime when both build-only and
    /// up-only are requested. Without an explicit workspace, the process
    /// working directory is used.
    pub fn build_with_runtime<R>(self, runtime: R) -> Result<Deployer<R>> {
        let mode = DeployMode::from_flags(self.build_only, self.up_only)?;
        let config = self.config.unwrap_or_default();
        let workspace = match self.workspace {
            Some(workspace) => workspace,
            None => DeploymentWorkspace::current(&config)?,
        };

        let options = DeployOptions {
            rollup: self.rollup,
            password: self.password,
            sudo: self.sudo,
            mode,
        };

        Ok(Deployer::new(runtime, workspace, config, options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DeployError, RecordingRuntime};

    #[test]
    fn test_conflicting_modes_rejected() {
        let err = DeployerBuilder::new("mychain")
            .build_only(true)
            .up_only(true)
            .build_with_runtime(RecordingRuntime::new())
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<DeployError>(),
            Some(DeployError::ConflictingModes)
        ));
    }

    #[test]
    fn test_builder_options() {
        let workspace = DeploymentWorkspace::new("/work", &DeployConfig::default());
        let deployer = DeployerBuilder::new("mychain")
            .password(Some("pw".to_string()))
            .sudo(true)
            .up_only(true)
            .workspace(workspace.clone())
            .build_with_runtime(RecordingRuntime::new())
            .unwrap();

        assert_eq!(deployer.options.rollup, RollupId::from("mychain"));
        assert_eq!(deployer.options.password.as_deref(), Some("pw"));
        assert!(deployer.options.sudo);
        assert_eq!(deployer.options.mode, DeployMode::UpOnly);
        assert_eq!(deployer.workspace, workspace);
    }
}
