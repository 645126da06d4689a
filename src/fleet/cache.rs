use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::fleet::record::AircraftRecord;

/// Key-value cache for feed results, with per-entry TTL.
///
/// Implementations must swallow backend failures: a broken cache is a
/// cache miss, never a fetch failure.
pub trait FeedCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Vec<AircraftRecord>>;
    fn set(&self, key: &str, records: &[AircraftRecord], ttl: Duration);
}

/// Process-local cache used by the CLI and by tests.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (Instant, Vec<AircraftRecord>)>>,
}

impl FeedCache for MemoryCache {
    fn get(&self, key: &str) -> Option<Vec<AircraftRecord>> {
        let mut entries = self.entries.lock().unwrap();

        if let Some((expires_at, records)) = entries.get(key) {
            if Instant::now() < *expires_at {
                return Some(records.clone());
            }
            entries.remove(key);
        }

        None
    }

    fn set(&self, key: &str, records: &[AircraftRecord], ttl: Duration) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(key.to_string(), (Instant::now() + ttl, records.to_vec()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(registration: &str) -> AircraftRecord {
        AircraftRecord {
            registration: registration.to_string(),
            ..AircraftRecord::default()
        }
    }

    #[test]
    fn test_set_then_get() {
        let cache = MemoryCache::default();
        cache.set("key", &[record("G-EZTH")], Duration::from_secs(60));

        let cached = cache.get("key").unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].registration, "G-EZTH");

        assert!(cache.get("other-key").is_none());
    }

    #[test]
    fn test_zero_ttl_expires_immediately() {
        let cache = MemoryCache::default();
        cache.set("key", &[record("G-EZTH")], Duration::from_secs(0));

        assert!(cache.get("key").is_none());
    }
}
