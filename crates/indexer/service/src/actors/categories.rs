use crate::IndexerActor;
use async_trait::async_trait;
use burnwatch_core::CacheUpdater;
use burnwatch_storage::{BlockReader, ContractStorage, KeyValueStore};
use std::{convert::Infallible, sync::Arc, time::Duration};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Refreshes the burn by category view on a fixed interval.
#[derive(Debug)]
pub struct CategoriesActor<DB> {
    cache: Arc<CacheUpdater<DB>>,
    interval: Duration,
    cancellation: CancellationToken,
}

impl<DB> CategoriesActor<DB>
where
    DB: BlockReader + ContractStorage + KeyValueStore + Send + Sync + 'static,
{
    /// Creates a new [`CategoriesActor`].
    pub const fn new(
        cache: Arc<CacheUpdater<DB>>,
        interval: Duration,
        cancellation: CancellationToken,
    ) -> Self {
        Self { cache, interval, cancellation }
    }
}

#[async_trait]
impl<DB> IndexerActor for CategoriesActor<DB>
where
    DB: BlockReader + ContractStorage + KeyValueStore + Send + Sync + 'static,
{
    type Error = Infallible;

    async fn start(self) -> Result<(), Self::Error> {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;

                _ = self.cancellation.cancelled() => {
                    info!(target: "cache", "Received shutdown signal, stopping");
                    return Ok(());
                }
                _ = ticker.tick() => {}
            }
            match self.cache.update_burn_categories().await {
                Ok(Some(view)) => {
                    info!(target: "cache", number = view.number, "Burn categories refreshed");
                }
                Ok(None) => {}
                Err(err) => warn!(target: "cache", %err, "Failed to refresh burn categories"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burnwatch_core::{
        BURN_CATEGORIES_CACHE_KEY, CacheConfig, ChangeNotifier, test_utils::stored_block,
    };
    use burnwatch_storage::{BlockWriter, ChainDb};
    use tempfile::TempDir;

    #[tokio::test(start_paused = true)]
    async fn test_refreshes_until_cancelled() {
        let dir = TempDir::new().unwrap();
        let db = Arc::new(ChainDb::new(dir.path()).unwrap());
        db.store_block(&stored_block(1, 0, 1_000, 5)).unwrap();
        let notifier = ChangeNotifier::default();
        let mut events = notifier.subscribe();
        let cache = Arc::new(CacheUpdater::new(db.clone(), notifier, CacheConfig::default()));
        let cancellation = CancellationToken::new();

        let actor = CategoriesActor::new(cache, Duration::from_secs(300), cancellation.clone());
        let task = tokio::spawn(actor.start());

        assert_eq!(events.recv().await.unwrap().key, BURN_CATEGORIES_CACHE_KEY);
        assert!(db.get_value(BURN_CATEGORIES_CACHE_KEY).unwrap().is_some());
        assert_eq!(events.recv().await.unwrap().key, BURN_CATEGORIES_CACHE_KEY);

        cancellation.cancel();
        task.await.unwrap().unwrap();
    }
}
