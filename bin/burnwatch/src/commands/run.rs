//! The `run` subcommand.

use crate::flags::{GlobalArgs, IndexerArgs};
use anyhow::{Context as _, Result};
use burnwatch_core::Metrics;
use burnwatch_service::IndexerService;
use clap::Args;
use tracing::info;

/// Runs the indexer until ctrl-c or a fatal error.
#[derive(Args, Debug, Clone)]
pub(crate) struct RunCommand {
    /// Indexer arguments.
    #[command(flatten)]
    pub(crate) indexer: IndexerArgs,
}

impl RunCommand {
    /// Runs the subcommand.
    pub(crate) async fn run(self, global: &GlobalArgs) -> Result<()> {
        if global.metrics.init().context("Failed to start the metrics server")? {
            Metrics::init();
        }

        let config = self.indexer.config()?;
        info!(
            target: "cli",
            rpc_url = %config.rpc_url,
            datadir = %config.datadir.display(),
            start_block = config.sync.start_block,
            "Starting burnwatch"
        );
        IndexerService::new(config).start().await.context("Indexer failed")
    }
}
