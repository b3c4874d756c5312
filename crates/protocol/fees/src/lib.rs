//! Fee analysis for execution blocks.
//!
//! Everything in this crate is pure: it turns a block header and its receipts into the base fee
//! burn, priority tips, per-contract attribution and the EIP-4844 blob base fee. All arithmetic on
//! wei amounts is done in [`U256`](alloy_primitives::U256).

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod error;
pub use error::FeeError;

mod blob;
pub use blob::{BlobSchedule, BlobScheduleEntry, MIN_BLOB_BASE_FEE, fake_exponential};

mod segment;
pub use segment::{ReceiptSegments, segment_receipts};

mod analysis;
pub use analysis::{BlockFees, analyze_block, base_fee_sum, tips};
