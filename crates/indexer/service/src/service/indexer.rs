use super::{IndexerConfig, ServiceError, spawn_and_wait};
use crate::{
    BlockSyncActor, CategoriesActor, HeadWatcher, IndexerListener, LeaderboardActor, rpc_heads,
};
use alloy_rpc_client::RpcClient;
use burnwatch_core::{
    AlloyChainClient, BlockSyncer, BurnRecordsEngine, CacheUpdater, ChangeNotifier,
};
use burnwatch_storage::ChainDb;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// The burnwatch indexer.
///
/// Runs four actors until one fails or the process receives ctrl-c:
/// - a [`HeadWatcher`] polling the chain head,
/// - a [`BlockSyncActor`] storing canonical blocks and rolling back reorgs,
/// - a [`LeaderboardActor`] re-ranking the burn records as blocks are stored,
/// - a [`CategoriesActor`] refreshing the burn by category on an interval.
#[derive(Debug)]
pub struct IndexerService {
    config: IndexerConfig,
    notifier: ChangeNotifier,
    cancellation: CancellationToken,
}

impl IndexerService {
    /// Creates a new [`IndexerService`].
    pub fn new(config: IndexerConfig) -> Self {
        Self { config, notifier: ChangeNotifier::default(), cancellation: CancellationToken::new() }
    }

    /// Returns the notifier every block and cache change is published on.
    pub const fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    /// Returns a token that stops the service when cancelled.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Opens the database, spawns the actors and waits for them to stop.
    ///
    /// Returns once every actor stopped: after a shutdown signal with `Ok`, or after the first
    /// actor failure with that failure.
    pub async fn start(self) -> Result<(), ServiceError> {
        let Self { config, notifier, cancellation } = self;

        let db = Arc::new(ChainDb::new(&config.datadir)?);
        info!(target: "indexer", datadir = %config.datadir.display(), "Opened database");

        let rpc = RpcClient::new_http(config.rpc_url.clone());
        let client = Arc::new(AlloyChainClient::new(rpc.clone(), config.retry));

        let engine = Arc::new(BurnRecordsEngine::new(db.clone(), config.burn_records));
        let cache = Arc::new(CacheUpdater::new(db.clone(), notifier.clone(), config.cache));

        let (head_tx, head_rx) = mpsc::channel(config.head_buffer);
        let (stored_tx, stored_rx) = watch::channel(None);

        let listener = IndexerListener::new(engine.clone(), notifier, stored_tx);
        let syncer =
            BlockSyncer::new(client, db, listener, Arc::new(config.schedule), config.sync);

        let heads = rpc_heads(rpc, config.poll_interval);
        let head_watcher = HeadWatcher::new(heads, head_tx, cancellation.child_token());
        let block_sync = BlockSyncActor::new(syncer, head_rx, cancellation.clone());
        let leaderboard =
            LeaderboardActor::new(engine, cache.clone(), stored_rx, cancellation.child_token());
        let categories =
            CategoriesActor::new(cache, config.categories_interval, cancellation.child_token());

        tokio::spawn(shutdown_on_signal(cancellation.clone()));
        info!(target: "indexer", rpc_url = %config.rpc_url, "Starting indexer");

        spawn_and_wait!(
            cancellation,
            actors = [head_watcher, block_sync, leaderboard, categories]
        )
        .map_err(ServiceError::Actor)?;

        info!(target: "indexer", "Indexer stopped");
        Ok(())
    }
}

/// Cancels `cancellation` on ctrl-c.
async fn shutdown_on_signal(cancellation: CancellationToken) {
    tokio::select! {
        _ = cancellation.cancelled() => {}
        signal = tokio::signal::ctrl_c() => match signal {
            Ok(()) => {
                info!(target: "indexer", "Received ctrl-c, shutting down");
                cancellation.cancel();
            }
            Err(err) => error!(target: "indexer", %err, "Failed to listen for ctrl-c"),
        },
    }
}
