use std::collections::HashSet;

use log::{info, warn};
use serde::Serialize;
use thiserror::Error;

use crate::db::store::{
    self, Aircraft, AircraftStore, AIRLINE_MAX_LEN, COUNTRY_MAX_LEN, REGISTRATION_MAX_LEN,
    TYPE_MAX_LEN,
};
use crate::fleet::feed::{FeedError, FetchQuery, FleetFeed};
use crate::fleet::record::{first_non_empty, AircraftRecord};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error("aircraft store error: {0}")]
    Store(#[from] rusqlite::Error),
}

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub limit: Option<usize>,
    pub use_cache: bool,
    pub prune: bool,
}

impl Default for SyncOptions {
    fn default() -> SyncOptions {
        SyncOptions {
            limit: None,
            use_cache: false,
            prune: false,
        }
    }
}

/// Outcome of one reconciliation pass. `processed` counts every fetched
/// record, including duplicates and rows without a registration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncSummary {
    pub processed: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub removed: usize,
}

/// Populate the aircraft table from the live feed, falling back to the
/// bundled dataset when the feed is unavailable.
pub fn sync_fleet(
    store: &mut AircraftStore,
    feed: &FleetFeed,
    options: &SyncOptions,
) -> Result<SyncSummary, SyncError> {
    let records = fetch_with_fallback(feed, options)?;
    let summary = reconcile(store, &records, options.prune)?;

    info!("Aircraft database sync complete: {:?}", summary);

    Ok(summary)
}

fn fetch_with_fallback(
    feed: &FleetFeed,
    options: &SyncOptions,
) -> Result<Vec<AircraftRecord>, FeedError> {
    let query = FetchQuery {
        limit: options.limit,
        use_cache: options.use_cache,
        ..FetchQuery::default()
    };

    match feed.fetch(&query) {
        Ok(records) => Ok(records),
        Err(error) => {
            warn!("Falling back to bundled aircraft sample dataset: {}", error);
            feed.fetch_fallback(&query)
        }
    }
}

/// Merge a batch of feed records into the store.
///
/// The whole pass, pruning included, runs in one transaction: either
/// every write commits or none of them do.
pub fn reconcile(
    store: &mut AircraftStore,
    records: &[AircraftRecord],
    prune: bool,
) -> Result<SyncSummary, rusqlite::Error> {
    let mut summary = SyncSummary {
        processed: records.len(),
        ..SyncSummary::default()
    };
    let mut seen: HashSet<String> = HashSet::new();

    let tx = store.transaction()?;

    for record in records {
        let registration = cap(record.registration.trim(), REGISTRATION_MAX_LEN).to_uppercase();
        if registration.is_empty() || seen.contains(&registration) {
            summary.skipped += 1;
            continue;
        }
        seen.insert(registration.clone());

        let type_value = cap(
            &first_non_empty(&[&record.model, &record.type_code, &record.icao_aircraft_type]),
            TYPE_MAX_LEN,
        );
        let airline_value = cap(
            &first_non_empty(&[&record.operator, &record.owner]),
            AIRLINE_MAX_LEN,
        );
        let country_value = cap(record.country.trim(), COUNTRY_MAX_LEN);

        match store::get(&tx, &registration)? {
            None => {
                store::create(
                    &tx,
                    &Aircraft {
                        registration,
                        aircraft_type: type_value,
                        airline: airline_value,
                        country: country_value,
                    },
                )?;
                summary.created += 1;
            }
            Some(existing) => {
                let mut changes: Vec<(&str, &str)> = Vec::new();
                if existing.aircraft_type != type_value {
                    changes.push(("type", &type_value));
                }
                if existing.airline != airline_value {
                    changes.push(("airline", &airline_value));
                }
                if existing.country != country_value {
                    changes.push(("country", &country_value));
                }

                if !changes.is_empty() {
                    store::update(&tx, &registration, &changes)?;
                    summary.updated += 1;
                }
            }
        }
    }

    // An empty batch must never wipe the table.
    if prune && !seen.is_empty() {
        summary.removed = store::delete_missing(&tx, &seen)?;
    }

    tx.commit()?;

    Ok(summary)
}

fn cap(value: &str, max_len: usize) -> String {
    value.trim().chars().take(max_len).collect()
}
