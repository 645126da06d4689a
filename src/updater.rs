use std::time::Duration;

use actix::prelude::*;
use log::{error, info};

use crate::db::{DbExecutor, SyncFleet};
use crate::fleet::SyncOptions;

/// Keeps the aircraft table in sync with the live feed: one pass on
/// startup, then one per interval.
pub struct FleetUpdater {
    db: Addr<DbExecutor>,
    interval: Duration,
}

impl FleetUpdater {
    pub fn new(db: Addr<DbExecutor>, interval: Duration) -> FleetUpdater {
        FleetUpdater { db, interval }
    }
}

impl Actor for FleetUpdater {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        ctx.notify(Update);

        ctx.run_interval(self.interval, |_act, ctx| {
            ctx.notify(Update);
        });
    }
}

struct Update;

impl Message for Update {
    type Result = ();
}

impl Handler<Update> for FleetUpdater {
    type Result = ();

    fn handle(&mut self, _msg: Update, ctx: &mut Self::Context) {
        info!("Downloading aircraft registration feed…");

        self.db
            .send(SyncFleet {
                options: SyncOptions::default(),
            })
            .into_actor(self)
            .map(|result, _act, _ctx| match result {
                Ok(Ok(summary)) => {
                    info!(
                        "Updated {} aircraft records in the database ({} created, {} updated, {} skipped)",
                        summary.processed, summary.created, summary.updated, summary.skipped
                    );
                }
                Ok(Err(error)) => {
                    error!("Aircraft database update failed: {}", error);
                }
                Err(error) => {
                    error!("Aircraft database update failed: {}", error);
                }
            })
            .wait(ctx);
    }
}
