//! The `reset-leaderboards` subcommand.

use anyhow::{Context as _, Result};
use burnwatch_core::{BurnRecordsConfig, BurnRecordsEngine};
use burnwatch_storage::ChainDb;
use clap::Args;
use std::{path::PathBuf, sync::Arc};

/// Deletes every burn record and the leaderboards pointer.
///
/// Stored blocks are kept. The next `run` replays them to rebuild the leaderboards.
#[derive(Args, Debug, Clone)]
pub(crate) struct ResetCommand {
    /// Directory of the database.
    #[arg(long, env = "DATADIR")]
    pub(crate) datadir: PathBuf,
}

impl ResetCommand {
    /// Runs the subcommand.
    pub(crate) async fn run(self) -> Result<()> {
        let db = ChainDb::new(&self.datadir)
            .with_context(|| format!("Failed to open database at '{}'", self.datadir.display()))?;
        BurnRecordsEngine::new(Arc::new(db), BurnRecordsConfig::default())
            .reset()
            .await
            .context("Failed to reset the leaderboards")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burnwatch_core::test_utils::stored_block;
    use burnwatch_storage::{AnalysisStateStorage, BlockReader, BlockWriter, BurnRecordStorage};
    use burnwatch_types::{LEADERBOARDS_ANALYSIS_KEY, TimeFrame};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_reset_drops_leaderboards_and_keeps_blocks() {
        let dir = TempDir::new().unwrap();
        {
            let db = Arc::new(ChainDb::new(dir.path()).unwrap());
            for number in 1..=3 {
                db.store_block(&stored_block(number, 0, 1_000 + number * 12, number)).unwrap();
            }
            let config =
                BurnRecordsConfig { london_block: 1, merge_block: 1, ..Default::default() };
            BurnRecordsEngine::new(db.clone(), config).try_update().await.unwrap();
            assert!(db.analysis_state(LEADERBOARDS_ANALYSIS_KEY).unwrap().is_some());
        }

        ResetCommand { datadir: dir.path().to_path_buf() }.run().await.unwrap();

        let db = ChainDb::new(dir.path()).unwrap();
        assert!(db.analysis_state(LEADERBOARDS_ANALYSIS_KEY).unwrap().is_none());
        assert!(db.burn_records(TimeFrame::All).unwrap().is_empty());
        assert_eq!(db.latest_block().unwrap().unwrap().number, 3);
    }
}
