use super::*;
use crate::{
    ChainClientError, MockChainClient,
    test_utils::{ScriptedChain, scripted_hash, stored_block},
};
use alloy_primitives::U256;
use burnwatch_fees::BlobSchedule;
use burnwatch_storage::{BlockReader, BlockWriter, ChainDb};
use burnwatch_types::ExecutionBlock;
use mockall::predicate::eq;
use std::{sync::Arc, time::Duration};
use tempfile::TempDir;

fn config() -> SyncConfig {
    SyncConfig {
        start_block: 1,
        max_reorg_depth: 8,
        recent_blocks: 16,
        receipt_retries: 2,
        receipt_retry_delay: Duration::from_millis(1),
        show_progress: false,
        backfill: BackfillConfig { concurrency: 4, threshold: 1_000, safe_distance: 3 },
    }
}

fn open_db() -> (TempDir, Arc<ChainDb>) {
    let dir = TempDir::new().unwrap();
    let db = Arc::new(ChainDb::new(dir.path()).unwrap());
    (dir, db)
}

fn syncer<L: ChainListener>(
    chain: &Arc<ScriptedChain>,
    db: &Arc<ChainDb>,
    listener: L,
    config: SyncConfig,
) -> BlockSyncer<ScriptedChain, Arc<ChainDb>, L> {
    BlockSyncer::new(chain.clone(), db.clone(), listener, Arc::new(BlobSchedule::mainnet()), config)
}

fn assert_matches_chain(db: &ChainDb, chain: &ScriptedChain, to: u64) {
    assert_eq!(db.latest_block().unwrap().unwrap().number, to);
    for number in 1..=to {
        let stored = db.block_by_number(number).unwrap().unwrap();
        assert_eq!(stored.hash, chain.block(number).unwrap().hash, "block {number}");
    }
}

#[tokio::test]
async fn test_sync_to_stores_contiguous_chain() {
    let chain = Arc::new(ScriptedChain::new(1, 20));
    let (_dir, db) = open_db();

    let mut syncer = syncer(&chain, &db, (), config());
    assert_eq!(syncer.catch_up().await.unwrap(), 20);

    assert_matches_chain(&db, &chain, 20);
    let stored = db.block_by_number(7).unwrap().unwrap();
    assert_eq!(stored.base_fee_sum, U256::from(stored.base_fee_per_gas) * U256::from(50_000u64));
    assert_eq!(syncer.synced_height().unwrap(), Some(20));
}

#[tokio::test]
async fn test_live_reorg_rolls_back_one_block_and_refetches() {
    let chain = Arc::new(ScriptedChain::new(1, 10));
    let (_dir, db) = open_db();

    let mut listener = MockChainListener::new();
    listener.expect_on_block_stored().return_const(());
    listener.expect_on_rollback().with(eq(10)).times(1).returning(|_| Ok(()));

    let mut syncer = syncer(&chain, &db, listener, config());
    syncer.sync_to(10).await.unwrap();
    let stale_hash = db.block_by_number(10).unwrap().unwrap().hash;

    chain.reorg(10, 10, 1);
    let head = chain.head().unwrap();
    assert_ne!(head.hash, stale_hash);
    syncer.handle_new_head(head).await.unwrap();

    assert_eq!(db.block_by_number(10).unwrap().unwrap().hash, head.hash);
    assert_eq!(db.block_by_number(9).unwrap().unwrap().hash, scripted_hash(9, 0));
    assert_eq!(db.block_number_by_hash(&stale_hash).unwrap(), None);
}

#[tokio::test]
async fn test_parent_mismatch_walks_back_to_fork_point() {
    let chain = Arc::new(ScriptedChain::new(1, 10));
    let (_dir, db) = open_db();

    let mut listener = MockChainListener::new();
    listener.expect_on_block_stored().return_const(());
    listener.expect_on_rollback().with(eq(10)).times(1).returning(|_| Ok(()));
    listener.expect_on_rollback().with(eq(9)).times(1).returning(|_| Ok(()));

    let mut syncer = syncer(&chain, &db, listener, config());
    syncer.sync_to(10).await.unwrap();

    chain.reorg(9, 12, 1);
    syncer.sync_to(12).await.unwrap();

    assert_matches_chain(&db, &chain, 12);
    assert_eq!(db.block_by_number(8).unwrap().unwrap().hash, scripted_hash(8, 0));
    assert_eq!(db.block_by_number(9).unwrap().unwrap().hash, scripted_hash(9, 1));
}

#[tokio::test]
async fn test_startup_repair_rolls_back_offline_reorg() {
    let chain = Arc::new(ScriptedChain::new(1, 10));
    let (_dir, db) = open_db();
    syncer(&chain, &db, (), config()).sync_to(10).await.unwrap();

    chain.reorg(8, 11, 1);

    let mut restarted = syncer(&chain, &db, (), config());
    restarted.repair().await.unwrap();
    assert_eq!(db.latest_block().unwrap().unwrap().number, 7);

    restarted.catch_up().await.unwrap();
    assert_matches_chain(&db, &chain, 11);
}

#[tokio::test]
async fn test_repair_with_chain_behind_store_is_fatal() {
    let chain = Arc::new(ScriptedChain::new(1, 10));
    let (_dir, db) = open_db();
    syncer(&chain, &db, (), config()).sync_to(10).await.unwrap();

    chain.truncate(9);

    let err = syncer(&chain, &db, (), config()).repair().await.unwrap_err();
    assert!(matches!(err, SyncError::ChainBehindLocalStore { synced: 10, head: 8 }));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_target_below_synced_height_is_fatal() {
    let chain = Arc::new(ScriptedChain::new(1, 10));
    let (_dir, db) = open_db();
    let mut syncer = syncer(&chain, &db, (), config());
    syncer.sync_to(10).await.unwrap();

    let err = syncer.sync_to(5).await.unwrap_err();
    assert!(matches!(err, SyncError::ChainBehindLocalStore { synced: 10, head: 5 }));
    assert_eq!(db.latest_block().unwrap().unwrap().number, 10);
}

#[tokio::test]
async fn test_reorg_deeper_than_limit_is_fatal() {
    let chain = Arc::new(ScriptedChain::new(1, 10));
    let (_dir, db) = open_db();
    let mut syncer = syncer(&chain, &db, (), SyncConfig { max_reorg_depth: 2, ..config() });
    syncer.sync_to(10).await.unwrap();

    chain.reorg(5, 12, 1);
    let err = syncer.sync_to(12).await.unwrap_err();

    assert!(matches!(err, SyncError::ReorgTooDeep(2)));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_stale_head_is_skipped() {
    let chain = Arc::new(ScriptedChain::new(1, 10));
    let (_dir, db) = open_db();
    let mut syncer = syncer(&chain, &db, (), config());
    syncer.sync_to(10).await.unwrap();

    let stale = ExecutionBlock { hash: scripted_hash(9, 7), ..chain.block(9).unwrap() };
    syncer.handle_new_head(stale).await.unwrap();

    assert_matches_chain(&db, &chain, 10);
}

#[tokio::test]
async fn test_known_head_is_a_noop() {
    let chain = Arc::new(ScriptedChain::new(1, 10));
    let (_dir, db) = open_db();
    let mut syncer = syncer(&chain, &db, (), config());
    syncer.sync_to(10).await.unwrap();

    let requests = chain.block_requests();
    syncer.handle_new_head(chain.block(10).unwrap()).await.unwrap();
    syncer.handle_new_head(chain.block(4).unwrap()).await.unwrap();

    assert_eq!(chain.block_requests(), requests);
}

#[tokio::test]
async fn test_new_head_above_synced_height_syncs() {
    let chain = Arc::new(ScriptedChain::new(1, 5));
    let (_dir, db) = open_db();
    let mut syncer = syncer(&chain, &db, (), config());
    syncer.sync_to(5).await.unwrap();

    chain.extend(8, 0);
    syncer.handle_new_head(chain.head().unwrap()).await.unwrap();

    assert_matches_chain(&db, &chain, 8);
}

#[tokio::test]
async fn test_incomplete_receipts_refetch_block() {
    let chain = Arc::new(ScriptedChain::new(1, 5));
    let (_dir, db) = open_db();
    chain.withhold_receipts(3, 0);

    let mut syncer = syncer(&chain, &db, (), config());
    syncer.sync_to(5).await.unwrap();

    assert_matches_chain(&db, &chain, 5);
    assert_eq!(chain.block_requests(), 6);
}

#[tokio::test]
async fn test_backfill_stores_in_order() {
    let chain = Arc::new(ScriptedChain::new(1, 60));
    let (_dir, db) = open_db();
    let config = SyncConfig {
        backfill: BackfillConfig { concurrency: 4, threshold: 10, safe_distance: 3 },
        ..config()
    };

    let mut syncer = syncer(&chain, &db, (), config);
    syncer.sync_to(60).await.unwrap();

    assert_matches_chain(&db, &chain, 60);
}

#[tokio::test]
async fn test_missing_parent_is_fatal() {
    let chain = Arc::new(ScriptedChain::new(1, 10));
    let (_dir, db) = open_db();
    db.store_block(&stored_block(5, 0, 1_000, 1)).unwrap();

    let mut syncer = syncer(&chain, &db, (), config());
    let err = syncer.sync_block(3).await.unwrap_err();

    assert!(matches!(err, SyncError::MissingParent(3)));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_listener_failure_surfaces() {
    let chain = Arc::new(ScriptedChain::new(1, 10));
    let (_dir, db) = open_db();

    let mut listener = MockChainListener::new();
    listener.expect_on_block_stored().return_const(());
    listener.expect_on_rollback().returning(|_| Err("engine busy".into()));

    let mut syncer = syncer(&chain, &db, listener, config());
    syncer.sync_to(10).await.unwrap();

    let err = syncer.rollback(8).await.unwrap_err();
    assert!(matches!(err, SyncError::Listener(_)));
    assert!(!err.is_fatal());
    assert_eq!(db.latest_block().unwrap().unwrap().number, 7);
}

#[tokio::test]
async fn test_undecodable_block_is_fatal() {
    let mut client = MockChainClient::new();
    client
        .expect_block_by_number()
        .times(1)
        .returning(|_| Err(ChainClientError::Decode("missing base fee".to_string())));
    let (_dir, db) = open_db();

    let mut syncer = BlockSyncer::new(
        Arc::new(client),
        db.clone(),
        (),
        Arc::new(BlobSchedule::mainnet()),
        config(),
    );
    let err = syncer.sync_to(3).await.unwrap_err();

    assert!(matches!(err, SyncError::ChainClient(ChainClientError::Decode(_))));
    assert!(err.is_fatal());
    assert_eq!(db.latest_block().unwrap(), None);
}
