//! Runtime adapter spawning the docker and docker-compose CLIs.

use std::process::Stdio;

use tokio::process::Command;

use super::{CommandOutput, PS_FORMAT, RuntimeAdapter, RuntimeCommand};
use crate::{DeployError, DeployResult, config::RuntimeConfig};

/// Runs runtime commands as child processes, optionally through `sudo`.
#[derive(Debug, Clone)]
pub struct ShellRuntime {
    config: RuntimeConfig,
    sudo: bool,
}

impl ShellRuntime {
    pub fn new(config: RuntimeConfig, sudo: bool) -> Self {
        Self { config, sudo }
    }

    /// The full argument vector for `command`, including any `sudo` prefix.
    pub fn argv(&self, command: &RuntimeCommand) -> Vec<String> {
        let docker = self.config.docker.clone();
        let compose = self.config.compose.clone();

        let args = match command {
            RuntimeCommand::CreateNetwork => self.config.create_network_command.clone(),
            RuntimeCommand::ComposeDown { manifest } => vec![
                compose,
                "-f".to_string(),
                manifest.display().to_string(),
                "down".to_string(),
                "-t".to_string(),
                "0".to_string(),
            ],
            RuntimeCommand::Build => self.config.build_command.clone(),
            RuntimeCommand::ComposeUp { manifest } => vec![
                compose,
                "-f".to_string(),
                manifest.display().to_string(),
                "up".to_string(),
            ],
            RuntimeCommand::ListContainers { all } => {
                let mut args = vec![docker, "ps".to_string()];
                if *all {
                    args.push("-a".to_string());
                }
                args.extend([
                    "--no-trunc".to_string(),
                    "--format".to_string(),
                    PS_FORMAT.to_string(),
                ]);
                args
            }
            RuntimeCommand::Kill { ids } => {
                let mut args = vec![docker, "kill".to_string()];
                args.extend(ids.iter().cloned());
                args
            }
            RuntimeCommand::Remove { ids } => {
                let mut args = vec![docker, "rm".to_string()];
                args.extend(ids.iter().cloned());
                args
            }
        };

        // The network script manages its own privileges.
        if self.sudo && !matches!(command, RuntimeCommand::CreateNetwork) {
            std::iter::once("sudo".to_string()).chain(args).collect()
        } else {
            args
        }
    }

    /// Whether the command's output is captured rather than streamed to the terminal.
    fn captures_output(command: &RuntimeCommand) -> bool {
        !matches!(
            command,
            RuntimeCommand::Build | RuntimeCommand::ComposeUp { .. } | RuntimeCommand::CreateNetwork
        )
    }
}

impl RuntimeAdapter for ShellRuntime {
    async fn run(&self, command: &RuntimeCommand) -> DeployResult<CommandOutput> {
        let argv = self.argv(command);
        let command_line = argv.join(" ");

        let Some((program, args)) = argv.split_first() else {
            return Err(DeployError::Spawn {
                command: command.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
            });
        };

        tracing::debug!(command = %command_line, "Running runtime command");

        let mut cmd = Command::new(program);
        cmd.args(args);

        let spawn_error = |source| DeployError::Spawn {
            command: command_line.clone(),
            source,
        };

        let output = if Self::captures_output(command) {
            let output = cmd
                .stdin(Stdio::null())
                .output()
                .await
                .map_err(spawn_error)?;

            if !output.status.success() {
                tracing::debug!(
                    command = %command_line,
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "Runtime command failed"
                );
            }

            CommandOutput {
                status: output.status.code().unwrap_or(1),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            }
        } else {
            let status = cmd.status().await.map_err(spawn_error)?;
            CommandOutput {
                status: status.code().unwrap_or(1),
                stdout: String::new(),
            }
        };

        tracing::trace!(command = %command_line, status = output.status, "Runtime command completed");

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_compose_down_argv() {
        let runtime = ShellRuntime::new(RuntimeConfig::default(), false);
        let argv = runtime.argv(&RuntimeCommand::ComposeDown {
            manifest: PathBuf::from("/work/docker-compose.yml"),
        });
        assert_eq!(
            argv,
            vec!["docker-compose", "-f", "/work/docker-compose.yml", "down", "-t", "0"]
        );
    }

    #[test]
    fn test_sudo_prefix() {
        let runtime = ShellRuntime::new(RuntimeConfig::default(), true);

        let kill = runtime.argv(&RuntimeCommand::Kill {
            ids: vec!["a".to_string(), "b".to_string()],
        });
        assert_eq!(kill, vec!["sudo", "docker", "kill", "a", "b"]);

        let network = runtime.argv(&RuntimeCommand::CreateNetwork);
        assert_eq!(network.first().map(String::as_str), Some("./scripts/create-network"));
    }

    #[test]
    fn test_list_all_argv() {
        let runtime = ShellRuntime::new(RuntimeConfig::default(), false);
        let argv = runtime.argv(&RuntimeCommand::ListContainers { all: true });
        assert_eq!(&argv[..3], &["docker", "ps", "-a"]);
        assert_eq!(argv.last().map(String::as_str), Some(PS_FORMAT));
    }

    #[tokio::test]
    async fn test_empty_command_is_spawn_error() {
        let config = RuntimeConfig {
            build_command: vec![],
            ..Default::default()
        };
        let runtime = ShellRuntime::new(config, false);
        let err = runtime.run(&RuntimeCommand::Build).await.unwrap_err();
        assert!(matches!(err, DeployError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_run_reports_status_and_output() {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .try_init()
            .ok();

        let config = RuntimeConfig {
            docker: "echo".to_string(),
            build_command: vec!["sh".to_string(), "-c".to_string(), "exit 3".to_string()],
            ..Default::default()
        };
        let runtime = ShellRuntime::new(config, false);

        let build = runtime.run(&RuntimeCommand::Build).await.unwrap();
        assert_eq!(build.status, 3);
        assert!(build.stdout.is_empty());

        let list = runtime
            .run(&RuntimeCommand::ListContainers { all: false })
            .await
            .unwrap();
        assert!(list.success());
        assert!(list.stdout.starts_with("ps --no-trunc --format"));
    }
}
