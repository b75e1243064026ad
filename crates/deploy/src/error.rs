//! Error types for deployments.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for deployment operations.
pub type DeployResult<T> = Result<T, DeployError>;

/// Errors raised while resolving, rendering or launching a deployment.
#[derive(Error, Debug)]
pub enum DeployError {
    /// A validator `config.json` could not be read.
    #[error("Failed to read validator config {}: {source}", .path.display())]
    ConfigUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A validator `config.json` is not valid JSON or lacks a required key.
    #[error("Malformed validator config {}: {source}", .path.display())]
    MalformedConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The rollup has no `validator0` directory.
    #[error("No validator state found for rollup {rollup} (expected {})", .path.display())]
    NoValidators { rollup: String, path: PathBuf },

    /// Neither the CLI nor the node config supplies a password.
    #[error(
        "Validator password required via --password flag or per-node config.json (missing for validator{index})"
    )]
    PasswordRequired { index: usize },

    /// The external image build returned a non-zero status.
    #[error("Validator image build failed with status {status}")]
    BuildFailed { status: i32 },

    /// A runtime command exited with a non-zero status.
    #[error("Command `{command}` failed with status {status}")]
    CommandFailed { command: String, status: i32 },

    /// A runtime command could not be started.
    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The manifest could not be serialized.
    #[error("Failed to render manifest: {0}")]
    ManifestRender(#[from] serde_yaml::Error),

    /// The manifest could not be persisted.
    #[error("Failed to write manifest {}: {source}", .path.display())]
    ManifestWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Build-only and up-only were both requested.
    #[error("--build and --up are mutually exclusive")]
    ConflictingModes,

    /// The operator interrupted the deployment.
    #[error("Interrupted")]
    Interrupted,
}

impl DeployError {
    /// Process exit status for this error. Every fatal error exits with 1.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::ConfigUnreadable { .. }
            | Self::MalformedConfig { .. }
            | Self::NoValidators { .. }
            | Self::PasswordRequired { .. }
            | Self::BuildFailed { .. }
            | Self::CommandFailed { .. }
            | Self::Spawn { .. }
            | Self::ManifestRender(_)
            | Self::ManifestWrite { .. }
            | Self::ConflictingModes
            | Self::Interrupted => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_is_one_for_fatal_errors() {
        let errors = [
            DeployError::Interrupted,
            DeployError::PasswordRequired { index: 0 },
            DeployError::BuildFailed { status: 2 },
            DeployError::CommandFailed {
                command: "compose up".to_string(),
                status: 130,
            },
        ];
        for err in errors {
            assert_eq!(err.exit_code(), 1, "{err}");
        }
    }

    #[test]
    fn test_password_required_message() {
        let err = DeployError::PasswordRequired { index: 2 };
        let msg = err.to_string();
        assert!(msg.contains("--password"));
        assert!(msg.contains("config.json"));
        assert!(msg.contains("validator2"));
    }

    #[test]
    fn test_malformed_config_names_file() {
        let source = serde_json::from_str::<serde_json::Value>("{ nope").unwrap_err();
        let err = DeployError::MalformedConfig {
            path: PathBuf::from("rollups/x/validator1/config.json"),
            source,
        };
        assert!(err.to_string().contains("rollups/x/validator1/config.json"));
    }
}
