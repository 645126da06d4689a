use actix::prelude::*;
use actix_web::{error, web, HttpResponse};
use serde::Serialize;
use systemstat::{self, Platform};

use crate::db::{DbExecutor, ReadStats};

#[derive(Serialize)]
struct Status {
    load: Option<(f32, f32, f32)>,
    aircraft: Option<i64>,
    last_sync: Option<i64>,
}

pub async fn get(db: web::Data<Addr<DbExecutor>>) -> actix_web::Result<HttpResponse> {
    let stats = db
        .send(ReadStats)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let sys = systemstat::System::new();

    Ok(HttpResponse::Ok().json(Status {
        load: sys
            .load_average()
            .ok()
            .map(|load| (load.one, load.five, load.fifteen)),
        aircraft: stats.aircraft,
        last_sync: stats.last_sync.map(|time| time.timestamp()),
    }))
}
