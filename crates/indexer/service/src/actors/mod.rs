//! [IndexerActor] services for the indexer.
//!
//! ```mermaid
//! flowchart LR
//!   hw[HeadWatcher] -- heads --> bs[BlockSync]
//!   bs -- stored height --> lb[Leaderboard]
//!   lb -- snapshot --> cache[(key-value cache)]
//!   cat[Categories] --> cache
//! ```

mod traits;
pub use traits::IndexerActor;

mod head_watcher;
pub use head_watcher::{HeadWatcher, HeadWatcherError, rpc_heads};

mod block_sync;
pub use block_sync::BlockSyncActor;

mod leaderboard;
pub use leaderboard::LeaderboardActor;

mod categories;
pub use categories::CategoriesActor;
