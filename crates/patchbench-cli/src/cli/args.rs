use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "patchbench",
    version,
    about = "Benchmark LLMs on the same code patch: test pass rate, token cost and security findings"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run every candidate model against the configured task
    Run(RunArgs),
    /// Write a sample patchbench.yaml
    Init(InitArgs),
    /// Print the code a raw model reply would contribute
    Extract(ExtractArgs),
    Version,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    #[arg(long, default_value = patchbench_core::config::DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Trials per candidate (overrides `iterations`)
    #[arg(long)]
    pub iterations: Option<u32>,

    /// Minimum passing tests for a successful trial (overrides `success_threshold`)
    #[arg(long)]
    pub threshold: Option<u32>,

    /// HTML report path (overrides `report.html_path`)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Also write a JSON report here (overrides `report.json_path`)
    #[arg(long)]
    pub json: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    #[arg(long, default_value = patchbench_core::config::DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

#[derive(Parser, Debug)]
pub struct ExtractArgs {
    /// File holding the reply; stdin when omitted
    pub file: Option<PathBuf>,
}
