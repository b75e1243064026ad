//! arbctl-deploy - Deployment library for local validator clusters.
//!
//! This crate discovers the validator state directories of a rollup, renders
//! a docker-compose manifest with one aggregator and one service per
//! validator, and drives the halt, build and up cycle against a container
//! runtime.

mod builder;
pub use builder::DeployerBuilder;

pub mod config;
pub use config::{AggregatorConfig, DeployConfig, RuntimeConfig};

mod deployer;
pub use deployer::{DeployMode, DeployOptions, Deployer, HaltReport, RollupId};

mod error;
pub use error::{DeployError, DeployResult};

pub mod manifest;
pub use manifest::{ComposeManifest, PortMapping, ServiceConfig};

mod plan;
pub use plan::DeploymentPlan;

pub mod runtime;
pub use runtime::{
    CommandOutput, RecordingRuntime, RuntimeAdapter, RuntimeCommand, RuntimeCommandKind,
    ShellRuntime,
};

pub mod services;

pub mod topology;
pub use topology::{ValidatorStateDir, discover};

mod workspace;
pub use workspace::DeploymentWorkspace;
