use std::fmt;

use derive_more::{Deref, From};

use crate::{
    DeployConfig, DeployError, DeployResult, DeploymentPlan, DeploymentWorkspace,
    runtime::{CommandOutput, ContainerSummary, RuntimeAdapter, RuntimeCommand},
};

/// Identifier of a rollup, naming its directory under `rollups/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deref, From)]
pub struct RollupId(String);

impl From<&str> for RollupId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for RollupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which lifecycle phases a deployment runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum DeployMode {
    /// Build the image, then bring the deployment up.
    #[default]
    Full,
    /// Only build the image.
    BuildOnly,
    /// Only bring the deployment up.
    UpOnly,
}

impl DeployMode {
    /// Derive the mode from the `--build` and `--up` flags.
    pub fn from_flags(build_only: bool, up_only: bool) -> DeployResult<Self> {
        match (build_only, up_only) {
            (false, false) => Ok(Self::Full),
            (true, false) => Ok(Self::BuildOnly),
            (false, true) => Ok(Self::UpOnly),
            (true, true) => Err(DeployError::ConflictingModes),
        }
    }

    pub fn runs_build(&self) -> bool {
        matches!(self, Self::Full | Self::BuildOnly)
    }

    pub fn runs_up(&self) -> bool {
        matches!(self, Self::Full | Self::UpOnly)
    }
}

/// Options of a single deploy invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployOptions {
    pub rollup: RollupId,
    /// Password overriding every node's own password.
    pub password: Option<String>,
    /// Whether runtime commands run through `sudo`.
    pub sudo: bool,
    pub mode: DeployMode,
}

/// What the halt procedure managed to clean up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HaltReport {
    /// Whether a previous manifest was brought down successfully.
    pub compose_down: bool,
    /// Validator containers that were killed.
    pub killed: Vec<String>,
    /// Validator containers that were removed.
    pub removed: Vec<String>,
}

/// Orchestrates the halt, render, build and up cycle of a deployment.
#[derive(Debug)]
pub struct Deployer<R> {
    pub runtime: R,
    pub workspace: DeploymentWorkspace,
    pub config: DeployConfig,
    pub options: DeployOptions,
}

impl<R> Deployer<R> {
    pub fn new(
        runtime: R,
        workspace: DeploymentWorkspace,
        config: DeployConfig,
        options: DeployOptions,
    ) -> Self {
        Self {
            runtime,
            workspace,
            config,
            options,
        }
    }
}

impl<R: RuntimeAdapter> Deployer<R> {
    /// Create the external docker network the manifest refers to.
    ///
    /// A failing status is only logged since the network usually exists
    /// already.
    pub async fn ensure_network(&self) -> DeployResult<()> {
        let output = self.runtime.run(&RuntimeCommand::CreateNetwork).await?;
        if !output.success() {
            tracing::warn!(
                status = output.status,
                network = %self.config.network,
                "Network creation returned non-zero status, assuming it already exists"
            );
        }
        Ok(())
    }

    /// Stop any previous deployment. Safe to call when nothing is running.
    ///
    /// Brings down the deployment described by an existing manifest, then
    /// kills and removes every container matching the validator pattern
    /// whether or not a manifest was found. Failures are logged and never
    /// abort the procedure.
    pub async fn halt(&self) -> HaltReport {
        let mut report = HaltReport::default();

        if self.workspace.has_manifest() {
            let manifest = self.workspace.manifest_path().to_path_buf();
            tracing::info!(manifest = %manifest.display(), "Bringing down previous deployment");

            report.compose_down = self
                .best_effort(&RuntimeCommand::ComposeDown { manifest })
                .await
                .is_some();
        }

        match self.matching_containers(false).await {
            Ok(running) if !running.is_empty() => {
                tracing::info!(count = running.len(), "Killing validator containers");
                let kill = RuntimeCommand::Kill {
                    ids: running.clone(),
                };
                if self.best_effort(&kill).await.is_some() {
                    report.killed = running;
                }
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "Failed to list running containers"),
        }

        match self.matching_containers(true).await {
            Ok(all) if !all.is_empty() => {
                tracing::info!(count = all.len(), "Removing validator containers");
                let remove = RuntimeCommand::Remove { ids: all.clone() };
                if self.best_effort(&remove).await.is_some() {
                    report.removed = all;
                }
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "Failed to list containers"),
        }

        tracing::debug!(?report, "Halt completed");

        report
    }

    /// Resolve every node of the rollup without touching the runtime.
    pub fn plan(&self) -> DeployResult<DeploymentPlan> {
        DeploymentPlan::resolve(
            &self.workspace,
            &self.options.rollup,
            self.options.password.as_deref(),
            &self.config,
        )
    }

    /// Run the full deploy cycle.
    ///
    /// The previous deployment is always halted first. The manifest is only
    /// written once every node has resolved, and is fully overwritten.
    pub async fn deploy(&self) -> DeployResult<DeploymentPlan> {
        tracing::info!(
            rollup = %self.options.rollup,
            mode = %self.options.mode,
            sudo = self.options.sudo,
            "Starting deployment..."
        );

        self.halt().await;

        let plan = self.plan()?;
        let manifest = plan.to_manifest(&self.config);
        self.workspace.write_manifest(&manifest.render()?);

        tracing::info!(
            manifest = %self.workspace.manifest_path().display(),
            services = manifest.services.len(),
            "Manifest written"
        );

        if self.options.mode.runs_build() {
            tracing::info!("Building validator image...");
            let output = self.runtime.run(&RuntimeCommand::Build).await?;
            if !output.success() {
                return Err(DeployError::BuildFailed {
                    status: output.status,
                });
            }
        }

        if self.options.mode.runs_up() {
            tracing::info!(
                validators = plan.validator_count(),
                rollup_address = %plan.rollup_address,
                "Deploying {} validators for rollup {}",
                plan.validator_count(),
                plan.rollup_address
            );
            tracing::info!("\n{}", plan.summary_table(&self.config));

            let manifest = self.workspace.manifest_path().to_path_buf();
            self.run_checked(&RuntimeCommand::ComposeUp { manifest })
                .await?;
        }

        tracing::info!("✓ Deployment finished");

        Ok(plan)
    }

    /// Run a command, turning a non-zero status into an error.
    async fn run_checked(&self, command: &RuntimeCommand) -> DeployResult<CommandOutput> {
        let output = self.runtime.run(command).await?;
        if !output.success() {
            return Err(DeployError::CommandFailed {
                command: command.to_string(),
                status: output.status,
            });
        }
        Ok(output)
    }

    /// Run a command, logging instead of propagating any failure.
    async fn best_effort(&self, command: &RuntimeCommand) -> Option<CommandOutput> {
        match self.run_checked(command).await {
            Ok(output) => Some(output),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring failed cleanup command");
                None
            }
        }
    }

    /// IDs of containers matching the validator pattern.
    async fn matching_containers(&self, all: bool) -> DeployResult<Vec<String>> {
        let output = self
            .run_checked(&RuntimeCommand::ListContainers { all })
            .await?;

        Ok(ContainerSummary::parse_list(&output.stdout)
            .into_iter()
            .filter(|c| c.matches(&self.config.container_pattern))
            .map(|c| c.id)
            .collect())
    }
}
