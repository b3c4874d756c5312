//! Contains the burnwatch CLI.

use crate::{
    commands::{ResetCommand, RunCommand},
    flags::GlobalArgs,
};
use anyhow::Result;
use burnwatch_cli::{cli_styles, init_tracing_subscriber};
use clap::{Parser, Subcommand};

/// Subcommands of the CLI.
#[derive(Debug, Clone, Subcommand)]
pub(crate) enum Commands {
    /// Runs the indexer.
    Run(RunCommand),
    /// Deletes the leaderboards so the next run rebuilds them from the stored blocks.
    ResetLeaderboards(ResetCommand),
}

/// The burnwatch CLI.
#[derive(Parser, Clone, Debug)]
#[command(author, version, about, styles = cli_styles(), long_about = None)]
pub(crate) struct Cli {
    /// Global arguments for the CLI.
    #[command(flatten)]
    pub(crate) global: GlobalArgs,
    /// The subcommand to run.
    #[command(subcommand)]
    pub(crate) subcommand: Commands,
}

impl Cli {
    /// Runs the CLI.
    pub(crate) fn run(self) -> Result<()> {
        init_tracing_subscriber(&self.global.log)?;

        let rt = Self::tokio_runtime()?;
        match self.subcommand {
            Commands::Run(run) => rt.block_on(run.run(&self.global)),
            Commands::ResetLeaderboards(reset) => rt.block_on(reset.run()),
        }
    }

    /// Creates a new default tokio multi-thread [Runtime](tokio::runtime::Runtime) with all
    /// features enabled
    fn tokio_runtime() -> Result<tokio::runtime::Runtime, std::io::Error> {
        tokio::runtime::Builder::new_multi_thread().enable_all().build()
    }
}
