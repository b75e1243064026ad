//! arbctl renders and launches a local validator cluster for a rollup.

mod cli;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use arbctl_deploy::{DeployConfig, DeployError, DeployerBuilder, DeploymentWorkspace};
use cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .with_writer(std::io::stderr)
        .init();

    let result = tokio::select! {
        result = run(cli) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, exiting");
            Err(DeployError::Interrupted.into())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(exit_code(&err))
        }
    }
}

/// Exit status of a failed run.
fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<DeployError>()
        .map_or(1, DeployError::exit_code)
}

async fn run(cli: Cli) -> Result<()> {
    let workdir = std::env::current_dir().context("Failed to resolve working directory")?;
    let config = DeployConfig::load(&workdir, cli.config.as_deref())?;

    if let Some(path) = &cli.save_config {
        config.save_to_file(path)?;
        return Ok(());
    }

    if cli.print_config {
        println!("{}", config.to_toml()?);
        return Ok(());
    }

    let workspace = DeploymentWorkspace::new(workdir, &config);

    tracing::info!(
        rollup = %cli.rollup,
        workspace = %workspace.root().display(),
        network = %config.network,
        "Preparing validator deployment..."
    );

    let deployer = DeployerBuilder::new(cli.rollup)
        .password(cli.password)
        .sudo(cli.sudo)
        .build_only(cli.build)
        .up_only(cli.up)
        .config(config)
        .workspace(workspace)
        .build()?;

    deployer.ensure_network().await?;
    deployer.deploy().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_of_deploy_errors() {
        let err = anyhow::Error::from(DeployError::BuildFailed { status: 2 });
        assert_eq!(exit_code(&err), 1);

        let err = anyhow::Error::from(DeployError::Interrupted).context("Deployment aborted");
        assert_eq!(exit_code(&err), 1);
    }

    #[test]
    fn test_exit_code_of_other_errors() {
        let err = anyhow::anyhow!("Failed to read config");
        assert_eq!(exit_code(&err), 1);
    }
}
