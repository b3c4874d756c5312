//! Core data types shared by the burnwatch indexer.
//!
//! Blocks as fetched from an execution node ([`ExecutionBlock`], [`ReceiptSummary`]), blocks as
//! persisted after fee analysis ([`StoredBlock`], [`ContractBaseFee`]), and the ranked
//! leaderboard model ([`TimeFrame`], [`BurnRecord`], [`AnalysisState`]).

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod block;
pub use block::{AnalyzedBlock, ExecutionBlock, ReceiptSummary, StoredBlock};

mod contract;
pub use contract::{ContractBaseFee, ContractEntry};

mod time_frame;
pub use time_frame::{ParseTimeFrameError, TimeFrame};

mod records;
pub use records::{AnalysisState, BurnRecord};

mod constants;
pub use constants::{
    ETH_TRANSFER_GAS, LEADERBOARDS_ANALYSIS_KEY, LONDON_HARD_FORK_BLOCK, MAX_RANK,
    MERGE_BLOCK,
};

mod range;
pub use range::block_range;
