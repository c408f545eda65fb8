//! CLI argument parsing with clap derive

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{self, AgentArgs};
use crate::domain::config::ConfabConfig;
use crate::infra::config::load_config_file;
use crate::output::OutputContext;

/// Boot a cluster agent and wait until the cluster has formed
#[derive(Parser)]
#[command(
    name = "confab",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// YAML configuration file (flags take precedence)
    #[arg(long, global = true, value_name = "FILE", env = "CONFAB_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the agent and wait for the expected members to join
    Start(AgentArgs),

    /// Stop the agent recorded in the pid file
    Stop(AgentArgs),
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if option resolution or the command fails.
    pub async fn run(self) -> Result<()> {
        let Cli {
            quiet,
            no_color,
            config,
            command,
        } = self;
        let ctx = OutputContext::new(no_color, quiet);
        let file = match &config {
            Some(path) => load_config_file(path)?,
            None => ConfabConfig::default(),
        };

        match command {
            Command::Start(args) => commands::start::run(&ctx, args.resolve(file)?).await,
            Command::Stop(args) => commands::stop::run(&ctx, args.resolve(file)?).await,
        }
    }
}
