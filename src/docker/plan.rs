use serde::Serialize;
use std::fmt;
use thiserror::Error;

use super::command::Invocation;
use crate::config::target::{self, Target};
use crate::config::BuildArgs;

/// Phase of a deployment run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Cleanup,
    Build,
    Push,
    Run,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Cleanup => "cleanup",
            Stage::Build => "build",
            Stage::Push => "push",
            Stage::Run => "run",
        };
        f.write_str(name)
    }
}

/// How a failed step affects the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tolerance {
    /// Failure aborts the run
    Required,
    /// Failure is logged and ignored
    BestEffort,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub stage: Stage,
    pub tolerance: Tolerance,
    pub invocation: Invocation,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("--push requires a registry username (pass --username or set DOCKER_USERNAME)")]
    MissingUsername,
}

pub struct PlanOptions<'a> {
    pub docker_bin: &'a str,
    pub target: Target,
    pub build_args: &'a BuildArgs,
    pub push: bool,
    pub username: Option<&'a str>,
    pub registry: Option<&'a str>,
    pub pull: bool,
    pub no_cache: bool,
}

/// The full, ordered list of commands for one run.
#[derive(Debug, Clone)]
pub struct DeployPlan {
    pub target: Target,
    pub image_tag: String,
    /// Registry reference, present when pushing
    pub remote_tag: Option<String>,
    /// Container started by the run step, if any
    pub container: Option<String>,
    pub steps: Vec<Step>,
}

impl DeployPlan {
    /// Assemble the steps. Fails before anything runs when a push has no username.
    pub fn new(opts: PlanOptions<'_>) -> Result<Self, PlanError> {
        let remote_tag = if opts.push {
            let username = opts
                .username
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .ok_or(PlanError::MissingUsername)?;
            Some(remote_reference(opts.registry, username, opts.target))
        } else {
            None
        };

        let image_tag = opts.target.image_tag();
        let docker = opts.docker_bin;
        let mut steps = Vec::new();

        // Cleanup
        for action in ["kill", "rm"] {
            steps.push(Step {
                stage: Stage::Cleanup,
                tolerance: Tolerance::BestEffort,
                invocation: Invocation::new(docker, [action, target::CONTAINER_NAME]).quiet(),
            });
        }

        // Build
        let mut build = vec!["build".to_string()];
        if opts.pull {
            build.push("--pull".to_string());
        }
        if opts.no_cache {
            build.push("--no-cache".to_string());
        }
        build.extend([
            "-t".to_string(),
            image_tag.clone(),
            "-f".to_string(),
            target::DOCKERFILE.to_string(),
        ]);
        build.extend(opts.build_args.to_docker_args());
        build.push(target::BUILD_CONTEXT.to_string());
        steps.push(Step {
            stage: Stage::Build,
            tolerance: Tolerance::Required,
            invocation: Invocation::new(docker, build),
        });

        // Push
        if let Some(remote) = &remote_tag {
            steps.push(Step {
                stage: Stage::Push,
                tolerance: Tolerance::Required,
                invocation: Invocation::new(docker, ["tag", image_tag.as_str(), remote.as_str()]),
            });
            steps.push(Step {
                stage: Stage::Push,
                tolerance: Tolerance::Required,
                invocation: Invocation::new(docker, ["push", remote.as_str()]),
            });
        }

        // Run
        let container = if opts.target.runs_locally() {
            let ports = format!("{}:{}", target::HOST_PORT, target::CONTAINER_PORT);
            steps.push(Step {
                stage: Stage::Run,
                tolerance: Tolerance::Required,
                invocation: Invocation::new(
                    docker,
                    [
                        "run",
                        "-d",
                        "--name",
                        target::CONTAINER_NAME,
                        "-p",
                        ports.as_str(),
                        image_tag.as_str(),
                    ],
                ),
            });
            Some(target::CONTAINER_NAME.to_string())
        } else {
            None
        };

        Ok(Self {
            target: opts.target,
            image_tag,
            remote_tag,
            container,
            steps,
        })
    }
}

fn remote_reference(registry: Option<&str>, username: &str, target: Target) -> String {
    let repository = format!("{}/{}:latest", username, target.image_repository());
    match registry.map(|r| r.trim().trim_end_matches('/')).filter(|r| !r.is_empty()) {
        Some(registry) => format!("{}/{}", registry, repository),
        None => repository,
    }
}
