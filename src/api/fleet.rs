use actix::prelude::*;
use actix_web::{error, web, HttpResponse};
use serde::Deserialize;

use crate::db::{DbExecutor, SyncFleet};
use crate::fleet::{FeedExecutor, FetchLiveFleet, FetchQuery, SyncOptions};

#[derive(Debug, Deserialize)]
pub struct LiveQueryParams {
    registration: Option<String>,
    country: Option<String>,
    limit: Option<usize>,
    #[serde(default)]
    no_cache: bool,
}

pub async fn live(
    query: web::Query<LiveQueryParams>,
    feed: web::Data<Addr<FeedExecutor>>,
) -> actix_web::Result<HttpResponse> {
    let query = query.into_inner();

    let records = feed
        .send(FetchLiveFleet(FetchQuery {
            registration: query.registration,
            country: query.country,
            limit: query.limit,
            url: None,
            use_cache: !query.no_cache,
        }))
        .await
        .map_err(error::ErrorInternalServerError)??;

    Ok(HttpResponse::Ok().json(records))
}

#[derive(Debug, Deserialize)]
pub struct SyncQueryParams {
    limit: Option<usize>,
    #[serde(default)]
    use_cache: bool,
    #[serde(default)]
    prune: bool,
}

pub async fn sync(
    query: web::Query<SyncQueryParams>,
    db: web::Data<Addr<DbExecutor>>,
) -> actix_web::Result<HttpResponse> {
    let query = query.into_inner();

    let summary = db
        .send(SyncFleet {
            options: SyncOptions {
                limit: query.limit,
                use_cache: query.use_cache,
                prune: query.prune,
            },
        })
        .await
        .map_err(error::ErrorInternalServerError)??;

    Ok(HttpResponse::Ok().json(summary))
}
