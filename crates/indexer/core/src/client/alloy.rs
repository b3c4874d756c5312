//! [`ChainClient`] over an alloy JSON-RPC provider.

use super::{ChainClient, ChainClientError, RetryConfig};
use alloy_eips::{BlockId, BlockNumberOrTag};
use alloy_primitives::{Address, B256, U256};
use alloy_provider::{Provider, RootProvider};
use alloy_rpc_client::RpcClient;
use alloy_rpc_types_eth::{Block, TransactionReceipt};
use async_trait::async_trait;
use burnwatch_types::{ExecutionBlock, ReceiptSummary};
use url::Url;

/// Converts an RPC block into an [`ExecutionBlock`].
///
/// # Errors
/// * [`ChainClientError::Decode`] if the block has no base fee, i.e. predates London.
pub fn execution_block_from_rpc(block: &Block) -> Result<ExecutionBlock, ChainClientError> {
    let header = &block.header.inner;
    let base_fee_per_gas = header.base_fee_per_gas.ok_or_else(|| {
        ChainClientError::Decode(format!("block {} has no base fee", header.number))
    })?;

    Ok(ExecutionBlock {
        number: header.number,
        hash: block.header.hash,
        parent_hash: header.parent_hash,
        timestamp: header.timestamp,
        base_fee_per_gas,
        gas_used: header.gas_used,
        transaction_count: block.transactions.len() as u64,
        blob_gas_used: header.blob_gas_used,
        excess_blob_gas: header.excess_blob_gas,
    })
}

/// Converts an RPC receipt into a [`ReceiptSummary`].
pub fn receipt_summary_from_rpc(receipt: &TransactionReceipt) -> ReceiptSummary {
    ReceiptSummary {
        transaction_hash: receipt.transaction_hash,
        to: receipt.to,
        contract_address: receipt.contract_address,
        gas_used: receipt.gas_used,
        effective_gas_price: receipt.effective_gas_price,
    }
}

/// A [`ChainClient`] backed by an alloy [`RootProvider`].
#[derive(Debug, Clone)]
pub struct AlloyChainClient {
    provider: RootProvider,
    retry: RetryConfig,
}

impl AlloyChainClient {
    /// Creates a client over an existing RPC client.
    pub fn new(client: RpcClient, retry: RetryConfig) -> Self {
        Self { provider: RootProvider::new(client), retry }
    }

    /// Creates a client talking JSON-RPC over HTTP to `url`.
    pub fn new_http(url: Url, retry: RetryConfig) -> Self {
        Self { provider: RootProvider::new_http(url), retry }
    }

    /// Returns the underlying provider.
    pub const fn provider(&self) -> &RootProvider {
        &self.provider
    }
}

#[async_trait]
impl ChainClient for AlloyChainClient {
    async fn block_by_number(
        &self,
        number: u64,
    ) -> Result<Option<ExecutionBlock>, ChainClientError> {
        let provider = &self.provider;
        let block = self
            .retry
            .run("block_by_number", move || async move {
                provider
                    .get_block_by_number(BlockNumberOrTag::Number(number))
                    .await
                    .map_err(ChainClientError::from)
            })
            .await?;

        block.as_ref().map(execution_block_from_rpc).transpose()
    }

    async fn latest_block(&self) -> Result<ExecutionBlock, ChainClientError> {
        let provider = &self.provider;
        let block = self
            .retry
            .run("latest_block", move || async move {
                provider
                    .get_block_by_number(BlockNumberOrTag::Latest)
                    .await
                    .map_err(ChainClientError::from)
            })
            .await?
            .ok_or_else(|| ChainClientError::Decode("node returned no latest block".to_string()))?;

        execution_block_from_rpc(&block)
    }

    async fn block_receipts(&self, hash: B256) -> Result<Vec<ReceiptSummary>, ChainClientError> {
        let provider = &self.provider;
        let receipts = self
            .retry
            .run("block_receipts", move || async move {
                provider
                    .get_block_receipts(BlockId::hash(hash))
                    .await
                    .map_err(ChainClientError::from)
            })
            .await?;

        Ok(receipts.unwrap_or_default().iter().map(receipt_summary_from_rpc).collect())
    }

    async fn balance(&self, address: Address) -> Result<U256, ChainClientError> {
        let provider = &self.provider;
        self.retry
            .run("balance", move || async move {
                provider.get_balance(address).await.map_err(ChainClientError::from)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, b256};
    use alloy_rpc_types_eth::{BlockTransactions, Header};
    use alloy_transport::mock::{Asserter, MockTransport};
    use serde_json::{Value, json};
    use std::time::Duration;

    fn client(asserter: &Asserter) -> AlloyChainClient {
        let transport = MockTransport::new(asserter.clone());
        let retry = RetryConfig {
            max_times: 2,
            min_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            request_timeout: Duration::from_secs(5),
        };
        AlloyChainClient::new(RpcClient::new(transport, true), retry)
    }

    fn rpc_block(number: u64, base_fee_per_gas: Option<u64>, transactions: usize) -> Block {
        Block {
            header: Header {
                hash: B256::with_last_byte(number as u8),
                inner: alloy_consensus::Header {
                    number,
                    parent_hash: B256::with_last_byte(number as u8 - 1),
                    timestamp: 1_700_000_000 + number * 12,
                    base_fee_per_gas,
                    gas_used: 21_000 * transactions as u64,
                    excess_blob_gas: Some(0),
                    blob_gas_used: Some(131_072),
                    ..Default::default()
                },
                total_difficulty: None,
                size: None,
            },
            uncles: vec![],
            transactions: BlockTransactions::Hashes(vec![B256::ZERO; transactions]),
            withdrawals: None,
        }
    }

    fn rpc_receipt(to: Option<Address>, contract_address: Option<Address>) -> Value {
        json!({
            "type": "0x2",
            "status": "0x1",
            "cumulativeGasUsed": "0x5208",
            "logs": [],
            "logsBloom": format!("0x{}", "0".repeat(512)),
            "transactionHash": "0x00000000000000000000000000000000000000000000000000000000000000aa",
            "transactionIndex": "0x0",
            "blockHash": "0x0000000000000000000000000000000000000000000000000000000000000005",
            "blockNumber": "0x5",
            "gasUsed": "0x5208",
            "effectiveGasPrice": "0x3b9aca00",
            "from": "0x0000000000000000000000000000000000000001",
            "to": to,
            "contractAddress": contract_address,
        })
    }

    #[tokio::test]
    async fn test_block_by_number_converts_header() {
        let asserter = Asserter::new();
        asserter.push_success(&rpc_block(5, Some(7), 3));

        let block = client(&asserter).block_by_number(5).await.unwrap().unwrap();
        assert_eq!(block.number, 5);
        assert_eq!(block.hash, B256::with_last_byte(5));
        assert_eq!(block.parent_hash, B256::with_last_byte(4));
        assert_eq!(block.base_fee_per_gas, 7);
        assert_eq!(block.gas_used, 63_000);
        assert_eq!(block.transaction_count, 3);
        assert_eq!(block.blob_gas_used, Some(131_072));
        assert_eq!(block.excess_blob_gas, Some(0));
    }

    #[tokio::test]
    async fn test_unknown_block_is_none() {
        let asserter = Asserter::new();
        asserter.push_success(&Option::<Block>::None);

        assert_eq!(client(&asserter).block_by_number(100).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_pre_london_block_is_a_decode_error() {
        let asserter = Asserter::new();
        asserter.push_success(&rpc_block(5, None, 0));

        let err = client(&asserter).block_by_number(5).await.unwrap_err();
        assert!(matches!(err, ChainClientError::Decode(_)));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let asserter = Asserter::new();
        asserter.push_failure_msg("upstream unavailable");
        asserter.push_failure_msg("upstream unavailable");
        asserter.push_success(&rpc_block(9, Some(1), 0));

        let block = client(&asserter).block_by_number(9).await.unwrap().unwrap();
        assert_eq!(block.number, 9);
    }

    #[tokio::test]
    async fn test_retry_budget_is_bounded() {
        let asserter = Asserter::new();
        for _ in 0..3 {
            asserter.push_failure_msg("upstream unavailable");
        }

        let err = client(&asserter).latest_block().await.unwrap_err();
        assert!(matches!(err, ChainClientError::Transport(_)));
    }

    #[tokio::test]
    async fn test_block_receipts_are_summarized() {
        let creation = address!("0x00000000000000000000000000000000000000cc");
        let target = address!("0x00000000000000000000000000000000000000dd");
        let asserter = Asserter::new();
        asserter.push_success(&json!([
            rpc_receipt(Some(target), None),
            rpc_receipt(None, Some(creation))
        ]));

        let receipts = client(&asserter)
            .block_receipts(b256!(
                "0x0000000000000000000000000000000000000000000000000000000000000005"
            ))
            .await
            .unwrap();

        assert_eq!(receipts.len(), 2);
        assert_eq!(receipts[0].to, Some(target));
        assert_eq!(receipts[0].gas_used, 21_000);
        assert_eq!(receipts[0].effective_gas_price, 1_000_000_000);
        assert_eq!(receipts[1].to, None);
        assert_eq!(receipts[1].contract_address, Some(creation));
    }

    #[tokio::test]
    async fn test_receipts_of_unknown_block_are_empty() {
        let asserter = Asserter::new();
        asserter.push_success(&Value::Null);

        let receipts = client(&asserter).block_receipts(B256::ZERO).await.unwrap();
        assert!(receipts.is_empty());
    }

    #[tokio::test]
    async fn test_balance() {
        let asserter = Asserter::new();
        asserter.push_success(&U256::from(1_000u64));

        let balance = client(&asserter).balance(Address::ZERO).await.unwrap();
        assert_eq!(balance, U256::from(1_000u64));
    }
}
