use crate::IndexerActor;
use async_trait::async_trait;
use burnwatch_core::{BurnRecordsEngine, BurnRecordsSnapshot, CacheUpdater, UpdateOutcome};
use burnwatch_storage::{
    AnalysisStateStorage, BlockReader, BurnRecordStorage, ContractStorage, KeyValueStore,
};
use std::{convert::Infallible, sync::Arc};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Re-ranks the leaderboards whenever the stored height moves and caches the result.
///
/// Heights published while an update runs collapse into one pending change, so a burst of stored
/// blocks triggers a single update. Failures are logged and retried on the next change.
#[derive(Debug)]
pub struct LeaderboardActor<DB> {
    engine: Arc<BurnRecordsEngine<DB>>,
    cache: Arc<CacheUpdater<DB>>,
    stored_rx: watch::Receiver<Option<u64>>,
    cancellation: CancellationToken,
}

impl<DB> LeaderboardActor<DB>
where
    DB: BlockReader
        + BurnRecordStorage
        + AnalysisStateStorage
        + ContractStorage
        + KeyValueStore
        + Send
        + Sync
        + 'static,
{
    /// Creates a new [`LeaderboardActor`].
    pub const fn new(
        engine: Arc<BurnRecordsEngine<DB>>,
        cache: Arc<CacheUpdater<DB>>,
        stored_rx: watch::Receiver<Option<u64>>,
        cancellation: CancellationToken,
    ) -> Self {
        Self { engine, cache, stored_rx, cancellation }
    }

    async fn update(&self) {
        match self.engine.try_update().await {
            Ok(UpdateOutcome::Updated(snapshot)) => self.cache_snapshot(&snapshot),
            Ok(UpdateOutcome::UpToDate) => {}
            Ok(UpdateOutcome::Coalesced) => {
                debug!(target: "burn_records", "Leaderboards busy, skipping trigger");
            }
            Err(err) => warn!(target: "burn_records", %err, "Leaderboard update failed"),
        }
    }

    /// Caches the leaderboards left by the previous run, then ranks what was stored since.
    async fn warm_up(&self) {
        match self.engine.try_update().await {
            Ok(UpdateOutcome::Updated(snapshot)) => self.cache_snapshot(&snapshot),
            Ok(_) => {
                if let Some(snapshot) = self.engine.snapshot().await {
                    self.cache_snapshot(&snapshot);
                }
            }
            Err(err) => warn!(target: "burn_records", %err, "Initial leaderboard update failed"),
        }
    }

    fn cache_snapshot(&self, snapshot: &BurnRecordsSnapshot) {
        if let Err(err) = self.cache.write_burn_records(snapshot) {
            warn!(target: "cache", %err, "Failed to cache burn records");
        }
    }
}

#[async_trait]
impl<DB> IndexerActor for LeaderboardActor<DB>
where
    DB: BlockReader
        + BurnRecordStorage
        + AnalysisStateStorage
        + ContractStorage
        + KeyValueStore
        + Send
        + Sync
        + 'static,
{
    type Error = Infallible;

    async fn start(mut self) -> Result<(), Self::Error> {
        self.warm_up().await;
        loop {
            let changed = tokio::select! {
                biased;

                _ = self.cancellation.cancelled() => {
                    info!(target: "burn_records", "Received shutdown signal, stopping");
                    return Ok(());
                }
                changed = self.stored_rx.changed() => changed,
            };
            if changed.is_err() {
                info!(target: "burn_records", "Block sync stopped, stopping");
                return Ok(());
            }
            self.update().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burnwatch_core::{
        BURN_RECORDS_CACHE_KEY, BurnRecordsConfig, BurnRecordsView, CacheConfig, ChangeNotifier,
        test_utils::stored_block,
    };
    use burnwatch_storage::{BlockWriter, ChainDb};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_stored_height_triggers_cached_update() {
        let dir = TempDir::new().unwrap();
        let db = Arc::new(ChainDb::new(dir.path()).unwrap());
        let config = BurnRecordsConfig { london_block: 1, merge_block: 1, ..Default::default() };
        let engine = Arc::new(BurnRecordsEngine::new(db.clone(), config));
        let notifier = ChangeNotifier::default();
        let mut events = notifier.subscribe();
        let cache = Arc::new(CacheUpdater::new(db.clone(), notifier, CacheConfig::default()));
        let (stored_tx, stored_rx) = watch::channel(None);
        let cancellation = CancellationToken::new();

        let actor = LeaderboardActor::new(engine, cache, stored_rx, cancellation.clone());
        let task = tokio::spawn(actor.start());

        for number in 1..=4 {
            db.store_block(&stored_block(number, 0, 1_000 + number * 12, number * 10)).unwrap();
        }
        stored_tx.send_replace(Some(4));

        let view = loop {
            events.recv().await.unwrap();
            let view: BurnRecordsView =
                serde_json::from_value(db.get_value(BURN_RECORDS_CACHE_KEY).unwrap().unwrap())
                    .unwrap();
            if view.number == 4 {
                break view;
            }
        };
        assert_eq!(view.records["all"][0].block_number, 4);

        cancellation.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_warm_up_caches_previous_leaderboards() {
        let dir = TempDir::new().unwrap();
        let db = Arc::new(ChainDb::new(dir.path()).unwrap());
        for number in 1..=3 {
            db.store_block(&stored_block(number, 0, 1_000 + number * 12, number)).unwrap();
        }
        let engine = Arc::new(BurnRecordsEngine::new(db.clone(), BurnRecordsConfig::default()));
        engine.try_update().await.unwrap();

        let cache =
            Arc::new(CacheUpdater::new(db.clone(), ChangeNotifier::default(), Default::default()));
        let (stored_tx, stored_rx) = watch::channel(None);
        drop(stored_tx);
        let actor = LeaderboardActor::new(engine, cache, stored_rx, CancellationToken::new());
        actor.start().await.unwrap();

        let view: BurnRecordsView =
            serde_json::from_value(db.get_value(BURN_RECORDS_CACHE_KEY).unwrap().unwrap())
                .unwrap();
        assert_eq!(view.number, 3);
    }
}
