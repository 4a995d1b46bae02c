pub mod deploy;

use anyhow::Result;
use clap::Parser;

#[derive(Parser)]
#[command(name = "cherry-docker")]
#[command(author = "CherryRecorder Team")]
#[command(version)]
#[command(about = "Build, push and run the CherryRecorder web client with Docker", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    deploy: deploy::DeployArgs,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

impl Cli {
    /// Parse arguments; usage errors exit with status 1, help and version with 0.
    pub fn parse_or_exit() -> Self {
        match Self::try_parse() {
            Ok(cli) => cli,
            Err(e) => {
                let code = if e.use_stderr() { 1 } else { 0 };
                let _ = e.print();
                std::process::exit(code);
            }
        }
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub async fn execute(self) -> Result<()> {
        deploy::deploy(self.deploy).await
    }
}
