use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use crate::config::{
    self, build_args, target, ArgSources, BuildArgs, EnvFileStatus, Resolved, Target,
};
use crate::docker::executor;
use crate::docker::{DeployPlan, PlanOptions, ProcessRunner, Tolerance};

#[derive(Args)]
pub struct DeployArgs {
    /// Deployment target
    #[arg(short, long, value_enum, default_value_t = Target::Local)]
    pub target: Target,

    /// Build argument override (format: KEY=VALUE, repeatable)
    #[arg(long, value_name = "KEY=VALUE")]
    pub build_arg: Vec<String>,

    /// Read build arguments from a .env-style file (KEY=VALUE lines)
    #[arg(long, env = "CHERRY_ENV_FILE", value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Base href for the web app
    #[arg(long)]
    pub base_href: Option<String>,

    /// API base URL
    #[arg(long)]
    pub web_api_base_url: Option<String>,

    /// WebSocket URL
    #[arg(long)]
    pub ws_url: Option<String>,

    /// Google Maps API key
    #[arg(long, env = "WEB_MAPS_API_KEY", hide_env_values = true)]
    pub web_maps_api_key: Option<String>,

    /// Tag and push the image to a registry after building
    #[arg(long)]
    pub push: bool,

    /// Registry username (required with --push)
    #[arg(short, long, env = "DOCKER_USERNAME")]
    pub username: Option<String>,

    /// Registry host to push to (defaults to Docker Hub)
    #[arg(long, env = "DOCKER_REGISTRY")]
    pub registry: Option<String>,

    /// Don't pull newer base images when building
    #[arg(long)]
    pub no_pull: bool,

    /// Don't use cache when building
    #[arg(long)]
    pub no_cache: bool,

    /// Docker executable to invoke
    #[arg(long, env = "CHERRY_DOCKER_BIN", default_value = "docker")]
    pub docker_bin: String,

    /// Print the commands that would run without running them
    #[arg(long)]
    pub dry_run: bool,

    /// Emit a structured JSON report to stdout (command output goes to stderr)
    #[arg(long)]
    pub json: bool,
}

impl DeployArgs {
    /// Dedicated flags mapped to their build argument names.
    fn flag_values(&self) -> Vec<(String, String)> {
        [
            ("BASE_HREF", &self.base_href),
            ("WEB_API_BASE_URL", &self.web_api_base_url),
            ("WS_URL", &self.ws_url),
            ("WEB_MAPS_API_KEY", &self.web_maps_api_key),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_ref().map(|v| (key.to_string(), v.clone())))
        .collect()
    }
}

// ---------------------------------------------------------------------------
// cherry-docker [--target ...]
// ---------------------------------------------------------------------------

pub async fn deploy(args: DeployArgs) -> Result<()> {
    let human = !args.json;

    let resolved = config::resolve(&ArgSources {
        target: args.target,
        env_file: args.env_file.as_deref(),
        flags: args.flag_values(),
        build_args: &args.build_arg,
    })
    .context("Failed to resolve build arguments")?;

    if human {
        print_configuration(args.target, &resolved);
    }
    for raw in &resolved.rejected {
        let shown = build_args::redact(raw);
        if human {
            println!(
                "{} Ignoring build argument '{}' (expected KEY=VALUE)",
                "!".yellow().bold(),
                shown
            );
        } else {
            tracing::warn!("Ignoring build argument '{}': expected KEY=VALUE", shown);
        }
    }
    if resolved
        .args
        .get("WEB_MAPS_API_KEY")
        .map_or(true, |v| v.trim().is_empty())
    {
        tracing::warn!("WEB_MAPS_API_KEY is not set; maps will not load in the built client");
    }

    let plan = DeployPlan::new(PlanOptions {
        docker_bin: &args.docker_bin,
        target: args.target,
        build_args: &resolved.args,
        push: args.push,
        username: args.username.as_deref(),
        registry: args.registry.as_deref(),
        pull: !args.no_pull,
        no_cache: args.no_cache,
    })?;

    if args.dry_run {
        if human {
            print_plan(&plan);
        } else {
            println!("{}", serde_json::to_string_pretty(&plan_json(&plan))?);
        }
        return Ok(());
    }

    let runner = ProcessRunner::new().stdout_to_stderr(args.json);
    let report = executor::execute(&plan, &runner).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    if let Some(failure) = &report.failure {
        if failure.not_found {
            anyhow::bail!(
                "{}\nIs Docker installed and on PATH? Use --docker-bin to point at it.",
                failure.message
            );
        }
        anyhow::bail!("The {} step failed: {}", failure.stage, failure.message);
    }

    if human {
        print_summary(&plan, &resolved.args);
    }

    Ok(())
}

fn print_configuration(target: Target, resolved: &Resolved) {
    println!(
        "{} Target: {} ({})",
        "=>".blue().bold(),
        target.to_string().cyan(),
        target.image_tag()
    );

    match &resolved.env_file {
        EnvFileStatus::NotRequested => {}
        EnvFileStatus::Missing(path) => println!(
            "{} Env file {} not found, using defaults and flags only",
            "!".yellow().bold(),
            path.display()
        ),
        EnvFileStatus::Loaded { path, entries, skipped } => {
            println!(
                "{} Loaded {} value(s) from {}",
                "=>".blue().bold(),
                entries,
                path.display()
            );
            if !skipped.is_empty() {
                println!(
                    "{} Skipped {} malformed line(s)",
                    "!".yellow().bold(),
                    skipped.len()
                );
            }
        }
    }

    println!("\n{}", "Build arguments:".bold());
    for (key, value) in resolved.args.masked() {
        println!("  {:<20} {}", key, value);
    }
}

fn print_plan(plan: &DeployPlan) {
    println!("\n{}", "Planned commands (dry run):".bold());
    for step in &plan.steps {
        let note = match step.tolerance {
            Tolerance::Required => String::new(),
            Tolerance::BestEffort => " (best effort)".dimmed().to_string(),
        };
        println!(
            "  [{}] {}{}",
            step.stage.to_string().cyan(),
            step.invocation.display(),
            note
        );
    }
}

fn plan_json(plan: &DeployPlan) -> serde_json::Value {
    let steps: Vec<serde_json::Value> = plan
        .steps
        .iter()
        .map(|step| {
            serde_json::json!({
                "stage": step.stage,
                "tolerance": step.tolerance,
                "command": step.invocation.display(),
            })
        })
        .collect();

    serde_json::json!({
        "target": plan.target,
        "image": plan.image_tag,
        "remote": plan.remote_tag,
        "container": plan.container,
        "steps": steps,
    })
}

fn print_summary(plan: &DeployPlan, args: &BuildArgs) {
    println!();
    if let Some(remote) = &plan.remote_tag {
        println!("{} Pushed image: {}", "✓".green().bold(), remote.cyan());
    }

    match &plan.container {
        Some(container) => {
            let base_href = args.get("BASE_HREF").unwrap_or("/");
            println!(
                "{} Container '{}' started successfully.",
                "✓".green().bold(),
                container.cyan()
            );
            println!("  Web app: http://localhost:{}{}", target::HOST_PORT, base_href);
            println!("  Logs:    docker logs {} -f", container);
            println!("  Stop:    docker kill {}", container);
        }
        None => {
            println!(
                "{} Built image for {}: {}",
                "✓".green().bold(),
                plan.target,
                plan.image_tag.cyan()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> DeployArgs {
        use clap::Parser;

        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            inner: DeployArgs,
        }

        let mut argv = vec!["cherry-docker"];
        argv.extend_from_slice(extra);
        Wrapper::try_parse_from(argv).unwrap().inner
    }

    #[test]
    fn test_flag_values_only_include_given_flags() {
        let parsed = args(&["--base-href", "/app/", "--ws-url", "wss://h/ws"]);
        let flags = parsed.flag_values();
        assert!(flags.contains(&("BASE_HREF".to_string(), "/app/".to_string())));
        assert!(flags.contains(&("WS_URL".to_string(), "wss://h/ws".to_string())));
        assert!(!flags.iter().any(|(k, _)| k == "WEB_API_BASE_URL"));
    }

    #[test]
    fn test_plan_json_lists_steps() {
        let build_args = BuildArgs::new();
        let plan = DeployPlan::new(PlanOptions {
            docker_bin: "docker",
            target: Target::K8s,
            build_args: &build_args,
            push: false,
            username: None,
            registry: None,
            pull: true,
            no_cache: false,
        })
        .unwrap();

        let json = plan_json(&plan);
        assert_eq!(json["target"], "k8s");
        assert_eq!(json["steps"][0]["tolerance"], "best-effort");
        assert_eq!(json["steps"][2]["stage"], "build");
        assert!(json["container"].is_null());
    }
}
