use actix::prelude::*;

use crate::fleet::feed::{FeedError, FetchQuery, FleetFeed};
use crate::fleet::record::AircraftRecord;

/// Serves live feed queries off the store executor's thread, so a slow
/// sync pass cannot block read requests.
pub struct FeedExecutor {
    feed: FleetFeed,
}

impl FeedExecutor {
    pub fn start(feed: FleetFeed) -> Addr<FeedExecutor> {
        SyncArbiter::start(1, move || FeedExecutor { feed: feed.clone() })
    }
}

impl Actor for FeedExecutor {
    type Context = SyncContext<Self>;
}

pub struct FetchLiveFleet(pub FetchQuery);

impl Message for FetchLiveFleet {
    type Result = Result<Vec<AircraftRecord>, FeedError>;
}

impl Handler<FetchLiveFleet> for FeedExecutor {
    type Result = Result<Vec<AircraftRecord>, FeedError>;

    fn handle(&mut self, msg: FetchLiveFleet, _ctx: &mut Self::Context) -> Self::Result {
        self.feed.fetch(&msg.0)
    }
}
