pub mod cache;
pub mod executor;
pub mod feed;
pub mod record;
pub mod sync;

pub use crate::fleet::cache::{FeedCache, MemoryCache};
pub use crate::fleet::executor::{FeedExecutor, FetchLiveFleet};
pub use crate::fleet::feed::{FeedConfig, FeedError, FetchQuery, FleetFeed};
pub use crate::fleet::record::{looks_like_registration, AircraftRecord};
pub use crate::fleet::sync::{sync_fleet, SyncError, SyncOptions, SyncSummary};
