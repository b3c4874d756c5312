//! Cached JSON views of the leaderboards and the burn by category.

mod config;
pub use config::CacheConfig;

mod error;
pub use error::CacheError;

mod views;
pub use views::{
    BURN_CATEGORIES_CACHE_KEY, BURN_RECORDS_CACHE_KEY, BurnCategoriesView, BurnCategoryView,
    BurnRecordView, BurnRecordsView,
};

mod updater;
pub use updater::CacheUpdater;
