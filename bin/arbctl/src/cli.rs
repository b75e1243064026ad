use std::path::PathBuf;

use clap::Parser;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "arbctl")]
#[command(
    author,
    version,
    about = "Manage dockerized validator deployments of a rollup"
)]
pub struct Cli {
    /// The rollup to deploy, naming its directory under `rollups/`.
    pub rollup: String,

    /// Password protecting the validator keys.
    ///
    /// Overrides the password stored in every node's config.json.
    #[arg(short, long, env = "ARB_DEPLOY_PASSWORD")]
    pub password: Option<String>,

    /// Run docker and docker-compose with sudo.
    #[arg(short, long, env = "ARB_DEPLOY_SUDO")]
    pub sudo: bool,

    /// Only build the validator image.
    #[arg(long, conflicts_with = "up")]
    pub build: bool,

    /// Only bring the deployment up.
    #[arg(long)]
    pub up: bool,

    /// The verbosity level.
    #[arg(short, long, env = "ARB_DEPLOY_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    /// Path to a configuration file.
    ///
    /// If not provided, ArbDeploy.toml in the working directory is used when present.
    #[arg(long, alias = "conf", env = "ARB_DEPLOY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    pub print_config: bool,

    /// Write the effective configuration to a TOML file and exit.
    #[arg(long, value_name = "PATH", conflicts_with = "print_config")]
    pub save_config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["arbctl", "mychain"]).unwrap();
        assert_eq!(cli.rollup, "mychain");
        assert!(!cli.build && !cli.up && !cli.sudo);
        assert_eq!(cli.verbosity, LevelFilter::INFO);
    }

    #[test]
    fn test_short_flags() {
        let cli = Cli::try_parse_from(["arbctl", "-s", "-p", "secret", "mychain", "--up"]).unwrap();
        assert!(cli.sudo);
        assert!(cli.up);
        assert_eq!(cli.password.as_deref(), Some("secret"));
    }

    #[test]
    fn test_build_and_up_conflict() {
        assert!(Cli::try_parse_from(["arbctl", "mychain", "--build", "--up"]).is_err());
    }

    #[test]
    fn test_save_config_path() {
        let cli = Cli::try_parse_from(["arbctl", "mychain", "--save-config", "ArbDeploy.toml"])
            .unwrap();
        assert_eq!(cli.save_config, Some(PathBuf::from("ArbDeploy.toml")));
        assert!(
            Cli::try_parse_from(["arbctl", "mychain", "--save-config", "x.toml", "--print-config"])
                .is_err()
        );
    }

    #[test]
    fn test_rollup_required() {
        assert!(Cli::try_parse_from(["arbctl"]).is_err());
    }
}
