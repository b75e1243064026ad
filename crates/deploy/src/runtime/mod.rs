//! Container runtime boundary.
//!
//! Every interaction with docker goes through [`RuntimeAdapter`], which lets
//! the deployment controller be exercised against [`RecordingRuntime`]
//! without a real container runtime.

mod recording;
mod shell;

use std::{fmt, path::PathBuf};

pub use recording::{RecordedContainer, RecordingRuntime};
pub use shell::ShellRuntime;

use crate::DeployResult;

/// Commands the deployment issues against the container runtime.
#[derive(Debug, Clone, PartialEq, Eq, strum::EnumDiscriminants)]
#[strum_discriminants(name(RuntimeCommandKind), derive(Hash))]
pub enum RuntimeCommand {
    /// Create the external docker network.
    CreateNetwork,
    /// Stop the deployment described by `manifest` with no grace period.
    ComposeDown { manifest: PathBuf },
    /// Build the validator image.
    Build,
    /// Run the deployment described by `manifest` in the foreground.
    ComposeUp { manifest: PathBuf },
    /// List running containers, or all containers when `all` is set.
    ListContainers { all: bool },
    /// Kill containers.
    Kill { ids: Vec<String> },
    /// Remove containers.
    Remove { ids: Vec<String> },
}

impl fmt::Display for RuntimeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateNetwork => write!(f, "create-network"),
            Self::ComposeDown { manifest } => write!(f, "compose down ({})", manifest.display()),
            Self::Build => write!(f, "build"),
            Self::ComposeUp { manifest } => write!(f, "compose up ({})", manifest.display()),
            Self::ListContainers { all: true } => write!(f, "ps -a"),
            Self::ListContainers { all: false } => write!(f, "ps"),
            Self::Kill { ids } => write!(f, "kill {}", ids.join(" ")),
            Self::Remove { ids } => write!(f, "rm {}", ids.join(" ")),
        }
    }
}

/// Outcome of a runtime command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status; commands killed by a signal report 1.
    pub status: i32,
    /// Captured standard output, empty when output is streamed.
    pub stdout: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Executes runtime commands.
#[allow(async_fn_in_trait)]
pub trait RuntimeAdapter {
    /// Run `command` to completion.
    ///
    /// A non-zero exit status is reported in the output, not as an error;
    /// errors mean the command could not be run at all.
    async fn run(&self, command: &RuntimeCommand) -> DeployResult<CommandOutput>;
}

/// Format string passed to `docker ps` so its output can be parsed.
pub const PS_FORMAT: &str = "{{.ID}}\t{{.Image}}\t{{.Names}}";

/// A container as listed by the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSummary {
    pub id: String,
    pub image: String,
    pub name: String,
}

impl ContainerSummary {
    /// Parse `docker ps` output produced with [`PS_FORMAT`].
    pub fn parse_list(stdout: &str) -> Vec<Self> {
        stdout
            .lines()
            .filter_map(|line| {
                let mut fields = line.trim().split('\t');
                let id = fields.next().filter(|id| !id.is_empty())?;
                Some(Self {
                    id: id.to_string(),
                    image: fields.next().unwrap_or_default().to_string(),
                    name: fields.next().unwrap_or_default().to_string(),
                })
            })
            .collect()
    }

    /// Whether the image or name contains `pattern`.
    pub fn matches(&self, pattern: &str) -> bool {
        self.image.contains(pattern) || self.name.contains(pattern)
    }
}
