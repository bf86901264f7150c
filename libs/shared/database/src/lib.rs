pub mod api;
pub mod offline_cache;

pub use api::{ApiClient, FileUpload};
pub use offline_cache::{CacheKey, CachedList, DataSource, Listing, OfflineCache};
