use colored::Colorize;
use serde::Serialize;

use super::command::{CommandRunner, RunError};
use super::plan::{DeployPlan, Stage, Tolerance};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StepOutcome {
    Succeeded,
    /// Best-effort step failed
    Tolerated { reason: String },
    Failed {
        reason: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        exit_code: Option<i32>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub stage: Stage,
    pub command: String,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

/// First required step that failed.
#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    pub stage: Stage,
    pub message: String,
    pub not_found: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub steps: Vec<StepReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
}

/// Run the plan's steps in order, stopping at the first required failure.
pub async fn execute(plan: &DeployPlan, runner: &dyn CommandRunner) -> Report {
    let mut steps = Vec::with_capacity(plan.steps.len());
    let mut failure = None;

    for step in &plan.steps {
        let command = step.invocation.display();
        eprintln!("\n{} {}", "=>".blue().bold(), command.dimmed());

        let outcome = match runner.run(&step.invocation).await {
            Ok(()) => {
                tracing::debug!("{} step succeeded: {}", step.stage, command);
                StepOutcome::Succeeded
            }
            Err(e) if step.tolerance == Tolerance::BestEffort => {
                tracing::info!("Ignoring {} failure: {}", step.stage, e);
                StepOutcome::Tolerated { reason: e.to_string() }
            }
            Err(e) => {
                tracing::debug!("{} step failed: {}", step.stage, e);
                failure = Some(Failure {
                    stage: step.stage,
                    message: e.to_string(),
                    not_found: matches!(e, RunError::NotFound { .. }),
                });
                StepOutcome::Failed {
                    reason: e.to_string(),
                    exit_code: e.exit_code(),
                }
            }
        };

        steps.push(StepReport {
            stage: step.stage,
            command,
            outcome,
        });
        if failure.is_some() {
            break;
        }
    }

    Report { steps, failure }
}
