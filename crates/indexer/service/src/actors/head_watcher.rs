use crate::IndexerActor;
use alloy_eips::BlockNumberOrTag;
use alloy_primitives::B256;
use alloy_rpc_client::RpcClient;
use alloy_rpc_types_eth::Block;
use async_trait::async_trait;
use burnwatch_core::execution_block_from_rpc;
use burnwatch_types::ExecutionBlock;
use futures::{StreamExt, future, stream::BoxStream};
use std::{fmt, time::Duration};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Polls `eth_getBlockByNumber("latest")` every `interval`.
///
/// Failed polls are retried by the poller at the next interval. Heads that cannot be decoded are
/// logged and dropped.
pub fn rpc_heads(client: RpcClient, interval: Duration) -> BoxStream<'static, ExecutionBlock> {
    let params = (BlockNumberOrTag::Latest, false);
    client
        .prepare_static_poller::<_, Block>("eth_getBlockByNumber", params)
        .with_poll_interval(interval)
        .into_stream()
        .map(|block| match execution_block_from_rpc(&block) {
            Ok(head) => Some(head),
            Err(err) => {
                warn!(target: "head_watcher", %err, "Dropping undecodable head");
                None
            }
        })
        .filter_map(future::ready)
        .boxed()
}

/// Errors that stop the [`HeadWatcher`].
#[derive(Debug, Error)]
pub enum HeadWatcherError {
    /// The head stream ended.
    #[error("head stream ended")]
    StreamEnded,
    /// The block sync actor stopped listening.
    #[error("head channel closed")]
    ChannelClosed,
}

/// Forwards every new chain head to the block sync actor.
///
/// Consecutive polls returning the same head are forwarded once.
pub struct HeadWatcher {
    heads: BoxStream<'static, ExecutionBlock>,
    head_tx: mpsc::Sender<ExecutionBlock>,
    cancellation: CancellationToken,
}

impl fmt::Debug for HeadWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadWatcher")
            .field("head_tx", &self.head_tx)
            .field("cancellation", &self.cancellation)
            .finish_non_exhaustive()
    }
}

impl HeadWatcher {
    /// Creates a new [`HeadWatcher`].
    pub fn new(
        heads: BoxStream<'static, ExecutionBlock>,
        head_tx: mpsc::Sender<ExecutionBlock>,
        cancellation: CancellationToken,
    ) -> Self {
        Self { heads, head_tx, cancellation }
    }
}

#[async_trait]
impl IndexerActor for HeadWatcher {
    type Error = HeadWatcherError;

    async fn start(mut self) -> Result<(), Self::Error> {
        let mut last_hash: Option<B256> = None;
        loop {
            tokio::select! {
                biased;

                _ = self.cancellation.cancelled() => {
                    info!(target: "head_watcher", "Received shutdown signal, stopping");
                    return Ok(());
                }
                head = self.heads.next() => {
                    let Some(head) = head else {
                        return Err(HeadWatcherError::StreamEnded);
                    };
                    if last_hash == Some(head.hash) {
                        continue;
                    }
                    debug!(
                        target: "head_watcher",
                        block_number = head.number,
                        hash = %head.hash,
                        "New chain head"
                    );
                    last_hash = Some(head.hash);
                    self.head_tx.send(head).await.map_err(|_| HeadWatcherError::ChannelClosed)?;
                }
            }
        }
    }
}
