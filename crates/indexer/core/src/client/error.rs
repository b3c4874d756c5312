use alloy_transport::{RpcError, TransportError};
use std::time::Duration;
use thiserror::Error;

/// Errors returned by a [`ChainClient`](super::ChainClient).
#[derive(Debug, Error)]
pub enum ChainClientError {
    /// The RPC call failed.
    #[error("rpc error: {0}")]
    Transport(#[from] TransportError),

    /// The RPC call did not complete in time.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The node answered with something that is not a valid post-London block or receipt.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ChainClientError {
    /// Returns true for failures worth retrying.
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Transport(RpcError::DeserError { .. }) => false,
            Self::Transport(_) | Self::Timeout(_) => true,
            Self::Decode(_) => false,
        }
    }
}
