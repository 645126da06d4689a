use std::time::Duration;

use log::warn;
use r2d2_redis::r2d2::Pool;
use r2d2_redis::redis::Commands;
use r2d2_redis::RedisConnectionManager;

use crate::fleet::{AircraftRecord, FeedCache};

/// Feed cache backed by a shared redis instance. Records are stored as
/// JSON under the fetch cache key, expired by redis via SETEX.
///
/// Backend failures are logged and degrade to a cache miss.
pub struct RedisCache {
    pool: Pool<RedisConnectionManager>,
}

impl RedisCache {
    pub fn connect(url: &str) -> anyhow::Result<RedisCache> {
        let manager = RedisConnectionManager::new(url)?;
        let pool = Pool::builder().build(manager)?;
        Ok(RedisCache { pool })
    }
}

impl FeedCache for RedisCache {
    fn get(&self, key: &str) -> Option<Vec<AircraftRecord>> {
        let mut conn = match self.pool.get() {
            Ok(conn) => conn,
            Err(error) => {
                warn!("Could not reach the feed cache: {}", error);
                return None;
            }
        };

        let payload: Option<String> = match conn.get(key) {
            Ok(payload) => payload,
            Err(error) => {
                warn!("Could not read cached feed results: {}", error);
                return None;
            }
        };

        payload.and_then(|json| serde_json::from_str(&json).ok())
    }

    fn set(&self, key: &str, records: &[AircraftRecord], ttl: Duration) {
        let mut conn = match self.pool.get() {
            Ok(conn) => conn,
            Err(error) => {
                warn!("Could not reach the feed cache: {}", error);
                return;
            }
        };

        let json = match serde_json::to_string(records) {
            Ok(json) => json,
            Err(error) => {
                warn!("Could not serialize feed results for caching: {}", error);
                return;
            }
        };

        let result: Result<(), _> = conn.set_ex(key, json, ttl.as_secs() as usize);
        if let Err(error) = result {
            warn!("Could not cache feed results: {}", error);
        }
    }
}
