//! In-memory runtime adapter recording every command.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use super::{CommandOutput, RuntimeAdapter, RuntimeCommand, RuntimeCommandKind};
use crate::DeployResult;

/// A container tracked by [`RecordingRuntime`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedContainer {
    pub id: String,
    pub image: String,
    pub name: String,
    pub running: bool,
}

/// Runtime adapter that records commands and simulates a container table.
///
/// `Kill` stops the listed containers and `Remove` deletes them. Exit
/// statuses can be scripted per command kind; a command with a non-zero
/// scripted status has no effect.
#[derive(Debug, Default)]
pub struct RecordingRuntime {
    commands: Mutex<Vec<RuntimeCommand>>,
    containers: Mutex<Vec<RecordedContainer>>,
    statuses: Mutex<HashMap<RuntimeCommandKind, i32>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RecordingRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a container to the simulated table.
    pub fn with_container(
        self,
        id: impl Into<String>,
        image: impl Into<String>,
        name: impl Into<String>,
        running: bool,
    ) -> Self {
        lock(&self.containers).push(RecordedContainer {
            id: id.into(),
            image: image.into(),
            name: name.into(),
            running,
        });
        self
    }

    /// Make every command of `kind` exit with `status`.
    pub fn set_status(&self, kind: RuntimeCommandKind, status: i32) {
        lock(&self.statuses).insert(kind, status);
    }

    /// Commands run so far, in order.
    pub fn commands(&self) -> Vec<RuntimeCommand> {
        lock(&self.commands).clone()
    }

    /// Kinds of the commands run so far, in order.
    pub fn command_kinds(&self) -> Vec<RuntimeCommandKind> {
        lock(&self.commands)
            .iter()
            .map(RuntimeCommandKind::from)
            .collect()
    }

    /// Forget the recorded commands.
    pub fn clear_commands(&self) {
        lock(&self.commands).clear();
    }

    /// Current simulated container table.
    pub fn containers(&self) -> Vec<RecordedContainer> {
        lock(&self.containers).clone()
    }

    fn list(&self, all: bool) -> String {
        lock(&self.containers)
            .iter()
            .filter(|c| all || c.running)
            .map(|c| format!("{}\t{}\t{}\n", c.id, c.image, c.name))
            .collect()
    }
}

impl RuntimeAdapter for RecordingRuntime {
    async fn run(&self, command: &RuntimeCommand) -> DeployResult<CommandOutput> {
        lock(&self.commands).push(command.clone());

        let kind = RuntimeCommandKind::from(command);
        let status = lock(&self.statuses).get(&kind).copied().unwrap_or(0);
        if status != 0 {
            return Ok(CommandOutput {
                status,
                stdout: String::new(),
            });
        }

        let stdout = match command {
            RuntimeCommand::ListContainers { all } => self.list(*all),
            RuntimeCommand::Kill { ids } => {
                lock(&self.containers)
                    .iter_mut()
                    .filter(|c| ids.contains(&c.id))
                    .for_each(|c| c.running = false);
                String::new()
            }
            RuntimeCommand::Remove { ids } => {
                lock(&self.containers).retain(|c| !ids.contains(&c.id));
                String::new()
            }
            _ => String::new(),
        };

        Ok(CommandOutput { status, stdout })
    }
}
