use std::path::{Path, PathBuf};

use actix::prelude::*;
use anyhow::Result;
use chrono::{DateTime, Utc};
use log::error;

pub mod store;

use crate::db::store::{Aircraft, AircraftStore};
use crate::fleet::{sync_fleet, FleetFeed, SyncError, SyncOptions, SyncSummary};

/// Owns the SQLite aircraft store and the sync path. Runs on a
/// single-threaded `SyncArbiter`, so sync passes never overlap.
pub struct DbExecutor {
    store: AircraftStore,
    feed: FleetFeed,
    last_sync: Option<DateTime<Utc>>,
}

impl DbExecutor {
    pub fn open<P: AsRef<Path>>(path: P, feed: FleetFeed) -> rusqlite::Result<DbExecutor> {
        Ok(DbExecutor {
            store: AircraftStore::open(path)?,
            feed,
            last_sync: None,
        })
    }

    pub fn start(database: PathBuf, feed: FleetFeed) -> Addr<DbExecutor> {
        SyncArbiter::start(1, move || {
            DbExecutor::open(&database, feed.clone()).expect("could not open the aircraft database")
        })
    }
}

impl Actor for DbExecutor {
    type Context = SyncContext<Self>;
}

pub struct ListAircraft;

impl Message for ListAircraft {
    type Result = Result<Vec<Aircraft>>;
}

impl Handler<ListAircraft> for DbExecutor {
    type Result = Result<Vec<Aircraft>>;

    fn handle(&mut self, _msg: ListAircraft, _ctx: &mut Self::Context) -> Self::Result {
        Ok(self.store.all()?)
    }
}

pub struct GetAircraft {
    pub registration: String,
}

impl Message for GetAircraft {
    type Result = Result<Option<Aircraft>>;
}

impl Handler<GetAircraft> for DbExecutor {
    type Result = Result<Option<Aircraft>>;

    fn handle(&mut self, msg: GetAircraft, _ctx: &mut Self::Context) -> Self::Result {
        Ok(self.store.get(&msg.registration)?)
    }
}

pub struct ReadStats;

pub struct Stats {
    pub aircraft: Option<i64>,
    pub last_sync: Option<DateTime<Utc>>,
}

impl Message for ReadStats {
    type Result = Stats;
}

impl Handler<ReadStats> for DbExecutor {
    type Result = MessageResult<ReadStats>;

    fn handle(&mut self, _msg: ReadStats, _ctx: &mut Self::Context) -> Self::Result {
        let aircraft = match self.store.count() {
            Ok(count) => Some(count),
            Err(error) => {
                error!("Could not count aircraft records: {}", error);
                None
            }
        };

        MessageResult(Stats {
            aircraft,
            last_sync: self.last_sync,
        })
    }
}

pub struct SyncFleet {
    pub options: SyncOptions,
}

impl Message for SyncFleet {
    type Result = Result<SyncSummary, SyncError>;
}

impl Handler<SyncFleet> for DbExecutor {
    type Result = Result<SyncSummary, SyncError>;

    fn handle(&mut self, msg: SyncFleet, _ctx: &mut Self::Context) -> Self::Result {
        let summary = sync_fleet(&mut self.store, &self.feed, &msg.options)?;
        self.last_sync = Some(Utc::now());
        Ok(summary)
    }
}
