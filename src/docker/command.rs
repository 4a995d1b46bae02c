use async_trait::async_trait;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

use crate::config::build_args::mask_assignment;

/// One external command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Discard the command's stderr (used for cleanup noise)
    pub quiet: bool,
}

impl Invocation {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            quiet: false,
        }
    }

    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    /// Printable command line with secret build arguments masked.
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.clone()];
        let mut after_build_arg = false;
        for arg in &self.args {
            if after_build_arg {
                parts.push(mask_assignment(arg));
            } else {
                parts.push(arg.clone());
            }
            after_build_arg = arg == "--build-arg";
        }
        parts.join(" ")
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("Command not found: {program}")]
    NotFound { program: String },

    #[error("Command `{program}` failed with {}", describe_exit(.code))]
    Failed { program: String, code: Option<i32> },

    #[error("Failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl RunError {
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            RunError::Failed { code, .. } => *code,
            _ => None,
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match *code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// Executes invocations. Swapped for a recording fake in tests.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> Result<(), RunError>;
}

/// Runs commands as child processes with inherited stdio.
#[derive(Debug, Default)]
pub struct ProcessRunner {
    /// Send child stdout to stderr, keeping our stdout for JSON output
    stdout_to_stderr: bool,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stdout_to_stderr(mut self, enabled: bool) -> Self {
        self.stdout_to_stderr = enabled;
        self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> Result<(), RunError> {
        let program = &invocation.program;
        let resolved = which::which(program).map_err(|_| RunError::NotFound {
            program: program.clone(),
        })?;
        tracing::debug!("Resolved {} to {}", program, resolved.display());

        let mut command = Command::new(&resolved);
        command.args(&invocation.args);
        if invocation.quiet {
            command.stderr(Stdio::null());
        }
        if self.stdout_to_stderr {
            command.stdout(Stdio::from(std::io::stderr()));
        }

        let status = command.status().await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                RunError::NotFound {
                    program: program.clone(),
                }
            } else {
                RunError::Spawn {
                    program: program.clone(),
                    source,
                }
            }
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(RunError::Failed {
                program: program.clone(),
                code: status.code(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_masks_secret_build_args() {
        let inv = Invocation::new(
            "docker",
            ["build", "--build-arg", "WEB_MAPS_API_KEY=secret", "--build-arg", "BASE_HREF=/", "."],
        );
        let shown = inv.display();
        assert!(!shown.contains("secret"));
        assert!(shown.contains("WEB_MAPS_API_KEY=********"));
        assert!(shown.contains("BASE_HREF=/"));
        assert!(shown.starts_with("docker build"));
    }

    #[test]
    fn test_failed_error_reports_exit_code() {
        let err = RunError::Failed {
            program: "docker".to_string(),
            code: Some(125),
        };
        assert_eq!(err.exit_code(), Some(125));
        assert!(err.to_string().contains("exit code 125"));
    }

    #[tokio::test]
    async fn test_missing_program_is_not_found() {
        let inv = Invocation::new("definitely-not-a-real-binary-8f3a", ["--version"]);
        let err = ProcessRunner::new().run(&inv).await.unwrap_err();
        assert!(matches!(err, RunError::NotFound { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_status_is_classified() {
        ProcessRunner::new()
            .run(&Invocation::new("true", Vec::<String>::new()))
            .await
            .unwrap();

        let err = ProcessRunner::new()
            .run(&Invocation::new("sh", ["-c", "exit 3"]).quiet())
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), Some(3));
    }
}
