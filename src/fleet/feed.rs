use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use csv::StringRecord;
use thiserror::Error;

use crate::fleet::cache::FeedCache;
use crate::fleet::record::{AircraftRecord, FeedRow};

const USER_AGENT: &str = "PlaneSpotter/1.0 (+https://github.com/)";
const ACCEPT_CSV: &str = "text/csv,application/octet-stream";

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("aircraft feed request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("aircraft feed returned error status: {0}")]
    Status(reqwest::StatusCode),
    #[error("aircraft feed stream was unreadable: {0}")]
    Stream(#[from] csv::Error),
    #[error("could not read aircraft dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("aircraft feed is unavailable and no fallback dataset is bundled at {}", .0.display())]
    FallbackMissing(PathBuf),
}

#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub url: String,
    pub fallback_path: PathBuf,
    pub timeout: Duration,
    pub max_results: usize,
    pub cache_ttl: Duration,
}

/// Parameters of one fetch call.
///
/// Filters are case-insensitive substring matches; empty strings count
/// as "no filter". `limit` is clamped to the configured ceiling.
#[derive(Debug, Clone)]
pub struct FetchQuery {
    pub registration: Option<String>,
    pub country: Option<String>,
    pub limit: Option<usize>,
    pub url: Option<String>,
    pub use_cache: bool,
}

impl Default for FetchQuery {
    fn default() -> FetchQuery {
        FetchQuery {
            registration: None,
            country: None,
            limit: None,
            url: None,
            use_cache: true,
        }
    }
}

/// Fetches and parses the aircraft registration feed.
///
/// Cloning is cheap; clones share the cache and the HTTP client.
#[derive(Clone)]
pub struct FleetFeed {
    config: FeedConfig,
    cache: Arc<dyn FeedCache>,
    client: reqwest::blocking::Client,
}

impl FleetFeed {
    pub fn new(config: FeedConfig, cache: Arc<dyn FeedCache>) -> Result<FleetFeed, FeedError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(FleetFeed {
            config,
            cache,
            client,
        })
    }

    /// Fetch records from the remote feed.
    ///
    /// This never substitutes fallback data on failure; whether a
    /// fallback is appropriate is the caller's decision.
    pub fn fetch(&self, query: &FetchQuery) -> Result<Vec<AircraftRecord>, FeedError> {
        self.fetch_with(query, |url| {
            let response = self
                .client
                .get(url)
                .header(reqwest::header::ACCEPT, ACCEPT_CSV)
                .send()?;

            if !response.status().is_success() {
                return Err(FeedError::Status(response.status()));
            }

            Ok(Box::new(response) as Box<dyn Read>)
        })
    }

    /// Fetch records from the bundled fallback dataset, using the same
    /// parsing and filtering as the remote path. Bypasses the cache.
    pub fn fetch_fallback(&self, query: &FetchQuery) -> Result<Vec<AircraftRecord>, FeedError> {
        let path = &self.config.fallback_path;
        if !path.exists() {
            return Err(FeedError::FallbackMissing(path.clone()));
        }

        let limit = self.clamp_limit(query.limit);
        let file = File::open(path)?;
        read_records(
            file,
            normalize_filter(&query.registration).as_deref(),
            normalize_filter(&query.country).as_deref(),
            limit,
        )
    }

    fn fetch_with<F>(&self, query: &FetchQuery, open: F) -> Result<Vec<AircraftRecord>, FeedError>
    where
        F: FnOnce(&str) -> Result<Box<dyn Read>, FeedError>,
    {
        let limit = self.clamp_limit(query.limit);
        let registration_filter = normalize_filter(&query.registration);
        let country_filter = normalize_filter(&query.country);
        let url = query.url.as_deref().unwrap_or(&self.config.url);

        // Filtered queries always hit the source live.
        let cache_key = if query.use_cache
            && registration_filter.is_none()
            && country_filter.is_none()
        {
            Some(format!("aircraft-feed:{}:{}", limit, url))
        } else {
            None
        };

        if let Some(key) = &cache_key {
            if let Some(mut records) = self.cache.get(key) {
                records.truncate(limit);
                return Ok(records);
            }
        }

        let reader = open(url)?;
        let records = read_records(
            reader,
            registration_filter.as_deref(),
            country_filter.as_deref(),
            limit,
        )?;

        if let Some(key) = &cache_key {
            self.cache.set(key, &records, self.config.cache_ttl);
        }

        Ok(records)
    }

    fn clamp_limit(&self, limit: Option<usize>) -> usize {
        limit
            .unwrap_or(self.config.max_results)
            .min(self.config.max_results)
    }
}

fn normalize_filter(filter: &Option<String>) -> Option<String> {
    filter
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_lowercase)
}

/// Scan a CSV stream into normalized records, stopping as soon as
/// `limit` qualifying rows have been collected.
fn read_records<R: Read>(
    reader: R,
    registration_filter: Option<&str>,
    country_filter: Option<&str>,
    limit: usize,
) -> Result<Vec<AircraftRecord>, FeedError> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = StringRecord::from_byte_record_lossy(csv_reader.byte_headers()?.clone());

    let mut matches = Vec::new();
    for row in csv_reader.byte_records() {
        if matches.len() >= limit {
            break;
        }

        let row = StringRecord::from_byte_record_lossy(row?);
        let row: FeedRow = match row.deserialize(Some(&headers)) {
            Ok(row) => row,
            Err(_) => continue,
        };

        let record = AircraftRecord::from_row(&row);
        if !record.is_identified() {
            continue;
        }

        if let Some(filter) = registration_filter {
            if !record.registration.to_lowercase().contains(filter) {
                continue;
            }
        }

        if let Some(filter) = country_filter {
            if !record.country.to_lowercase().contains(filter) {
                continue;
            }
        }

        matches.push(record);
    }

    Ok(matches)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::io::Cursor;

    use crate::fleet::cache::MemoryCache;

    use super::*;

    const SAMPLE_CSV: &str = "\
icao24,registration,manufacturername,manufacturericao,model,typecode,icaoaircrafttype,operator,operatorcallsign,owner,serialnumber,built,registeredcountry,operatorcountry
4007f9,G-EZTH,Airbus,AIRBUS,A320-214,A320,L2J,EasyJet Airline,EASY,,3953,2009,United Kingdom,United Kingdom
a1b2c3,N12345,Boeing,BOEING,737-8AS,B738,L2J,Southwest Airlines,SOUTHWEST,,30241,2001,United States,United States
,,,,,,,,,,,,,
4ca7b6,EI-DCL,Boeing,BOEING,737-8AS,B738,L2J,Ryanair,RYANAIR,,33806,2004,Ireland,Ireland
";

    fn feed(config: FeedConfig) -> FleetFeed {
        FleetFeed::new(config, Arc::new(MemoryCache::default())).unwrap()
    }

    fn config() -> FeedConfig {
        FeedConfig {
            url: "http://feed.test/aircraft.csv".to_string(),
            fallback_path: PathBuf::from("data/aircraft_sample.csv"),
            timeout: Duration::from_secs(5),
            max_results: 100,
            cache_ttl: Duration::from_secs(300),
        }
    }

    fn fetch_counted(
        feed: &FleetFeed,
        query: &FetchQuery,
        reads: &Cell<usize>,
    ) -> Vec<AircraftRecord> {
        feed.fetch_with(query, |_url| {
            reads.set(reads.get() + 1);
            Ok(Box::new(Cursor::new(SAMPLE_CSV)) as Box<dyn Read>)
        })
        .unwrap()
    }

    #[test]
    fn test_unidentified_rows_are_dropped() {
        let records = read_records(Cursor::new(SAMPLE_CSV), None, None, 100).unwrap();

        let registrations: Vec<_> = records.iter().map(|r| r.registration.as_str()).collect();
        assert_eq!(registrations, vec!["G-EZTH", "N12345", "EI-DCL"]);
    }

    #[test]
    fn test_limit_short_circuits_on_earliest_rows() {
        let records = read_records(Cursor::new(SAMPLE_CSV), None, None, 1).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].registration, "G-EZTH");
    }

    #[test]
    fn test_zero_limit_returns_nothing() {
        let records = read_records(Cursor::new(SAMPLE_CSV), None, None, 0).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_filters_are_case_insensitive_substrings() {
        let records = read_records(Cursor::new(SAMPLE_CSV), Some("ei-"), None, 100).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].registration, "EI-DCL");

        let records = read_records(Cursor::new(SAMPLE_CSV), None, Some("united"), 100).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_limit_is_clamped_to_ceiling() {
        let feed = feed(FeedConfig {
            max_results: 2,
            ..config()
        });
        let reads = Cell::new(0);

        let records = fetch_counted(
            &feed,
            &FetchQuery {
                limit: Some(50),
                ..FetchQuery::default()
            },
            &reads,
        );

        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_unfiltered_fetch_hits_cache_within_ttl() {
        let feed = feed(config());
        let reads = Cell::new(0);
        let query = FetchQuery::default();

        let first = fetch_counted(&feed, &query, &reads);
        let second = fetch_counted(&feed, &query, &reads);

        assert_eq!(reads.get(), 1);
        assert_eq!(first, second);
    }

    #[test]
    fn test_cached_result_is_truncated_to_limit() {
        let feed = feed(config());
        let reads = Cell::new(0);

        fetch_counted(&feed, &FetchQuery::default(), &reads);
        let records = fetch_counted(
            &feed,
            &FetchQuery {
                limit: Some(1),
                ..FetchQuery::default()
            },
            &reads,
        );

        // Different limit means a different cache key, so the source is
        // read again and the result honors the smaller limit.
        assert_eq!(reads.get(), 2);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_filtered_fetch_bypasses_cache() {
        let feed = feed(config());
        let reads = Cell::new(0);
        let query = FetchQuery {
            registration: Some("G-".to_string()),
            ..FetchQuery::default()
        };

        fetch_counted(&feed, &query, &reads);
        fetch_counted(&feed, &query, &reads);

        assert_eq!(reads.get(), 2);
    }

    #[test]
    fn test_blank_filter_counts_as_absent() {
        let feed = feed(config());
        let reads = Cell::new(0);
        let query = FetchQuery {
            registration: Some("  ".to_string()),
            ..FetchQuery::default()
        };

        let records = fetch_counted(&feed, &query, &reads);
        fetch_counted(&feed, &query, &reads);

        assert_eq!(records.len(), 3);
        assert_eq!(reads.get(), 1);
    }

    #[test]
    fn test_use_cache_false_always_reads_source() {
        let feed = feed(config());
        let reads = Cell::new(0);
        let query = FetchQuery {
            use_cache: false,
            ..FetchQuery::default()
        };

        fetch_counted(&feed, &query, &reads);
        fetch_counted(&feed, &query, &reads);

        assert_eq!(reads.get(), 2);
    }

    #[test]
    fn test_expired_cache_entry_is_refetched() {
        let feed = feed(FeedConfig {
            cache_ttl: Duration::from_secs(0),
            ..config()
        });
        let reads = Cell::new(0);
        let query = FetchQuery::default();

        fetch_counted(&feed, &query, &reads);
        fetch_counted(&feed, &query, &reads);

        assert_eq!(reads.get(), 2);
    }

    #[test]
    fn test_fallback_missing_file() {
        let feed = feed(FeedConfig {
            fallback_path: PathBuf::from("/nonexistent/aircraft_sample.csv"),
            ..config()
        });

        let result = feed.fetch_fallback(&FetchQuery::default());
        assert!(matches!(result, Err(FeedError::FallbackMissing(_))));
    }

    #[test]
    fn test_fallback_reads_local_dataset() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE_CSV.as_bytes()).unwrap();

        let feed = feed(FeedConfig {
            fallback_path: file.path().to_path_buf(),
            ..config()
        });

        let records = feed.fetch_fallback(&FetchQuery::default()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].registration, "G-EZTH");
    }
}
