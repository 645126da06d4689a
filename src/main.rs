use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use actix::prelude::*;
use actix_cors::Cors;
use actix_web::{App, HttpServer};
use clap::{value_t, App as Cli, Arg, ArgMatches, SubCommand};
use log::info;

mod api;
mod app;
mod db;
mod fleet;
mod redis;
mod updater;

use crate::db::store::AircraftStore;
use crate::db::DbExecutor;
use crate::fleet::{
    sync_fleet, FeedCache, FeedConfig, FeedExecutor, FleetFeed, MemoryCache, SyncOptions,
};
use crate::redis::RedisCache;
use crate::updater::FleetUpdater;

const DEFAULT_FEED_URL: &str =
    "https://opensky-network.org/datasets/metadata/aircraftDatabase.csv";

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let _sentry = sentry::init(sentry::ClientOptions {
        release: sentry::release_name!(),
        ..Default::default()
    });

    let matches = cli().get_matches();

    match matches.subcommand() {
        ("sync", Some(sync_matches)) => run_sync(&matches, sync_matches),
        _ => run_server(&matches),
    }
}

fn cli<'a, 'b>() -> Cli<'a, 'b> {
    Cli::new("planespotter-backend")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Plane spotting community backend")
        .arg(
            Arg::with_name("listen")
                .long("listen")
                .value_name("ADDR")
                .default_value("127.0.0.1:8080")
                .help("Address to bind the HTTP server to"),
        )
        .arg(
            Arg::with_name("database")
                .long("database")
                .value_name("PATH")
                .default_value("planespotter.db")
                .help("Path of the SQLite aircraft database"),
        )
        .arg(
            Arg::with_name("redis-url")
                .long("redis-url")
                .value_name("URL")
                .takes_value(true)
                .help("Redis instance for the feed cache (in-process cache when omitted)"),
        )
        .arg(
            Arg::with_name("feed-url")
                .long("feed-url")
                .value_name("URL")
                .default_value(DEFAULT_FEED_URL)
                .help("Aircraft registration feed to sync from"),
        )
        .arg(
            Arg::with_name("feed-timeout")
                .long("feed-timeout")
                .value_name("SECONDS")
                .default_value("30")
                .help("Timeout for feed requests"),
        )
        .arg(
            Arg::with_name("feed-max-results")
                .long("feed-max-results")
                .value_name("COUNT")
                .default_value("500")
                .help("Ceiling on the number of records returned per fetch"),
        )
        .arg(
            Arg::with_name("feed-cache-secs")
                .long("feed-cache-secs")
                .value_name("SECONDS")
                .default_value("300")
                .help("How long unfiltered feed results stay cached"),
        )
        .arg(
            Arg::with_name("fallback-dataset")
                .long("fallback-dataset")
                .value_name("PATH")
                .default_value("data/aircraft_sample.csv")
                .help("Bundled dataset used when the feed is unavailable"),
        )
        .arg(
            Arg::with_name("sync-interval")
                .long("sync-interval")
                .value_name("SECONDS")
                .default_value("10800")
                .help("Periodic feed sync interval (0 disables)"),
        )
        .subcommand(
            SubCommand::with_name("sync")
                .about("Sync the local aircraft database from the configured live feed")
                .arg(
                    Arg::with_name("limit")
                        .long("limit")
                        .value_name("COUNT")
                        .takes_value(true)
                        .help("Maximum number of aircraft records to import"),
                )
                .arg(
                    Arg::with_name("no-cache")
                        .long("no-cache")
                        .help("Bypass the feed cache when fetching records"),
                )
                .arg(
                    Arg::with_name("prune")
                        .long("prune")
                        .help("Remove aircraft that are missing from the latest feed snapshot"),
                ),
        )
}

fn build_feed(matches: &ArgMatches) -> anyhow::Result<FleetFeed> {
    let config = FeedConfig {
        url: matches.value_of("feed-url").unwrap().to_string(),
        fallback_path: PathBuf::from(matches.value_of("fallback-dataset").unwrap()),
        timeout: Duration::from_secs(
            value_t!(matches, "feed-timeout", u64).unwrap_or_else(|e| e.exit()),
        ),
        max_results: value_t!(matches, "feed-max-results", usize).unwrap_or_else(|e| e.exit()),
        cache_ttl: Duration::from_secs(
            value_t!(matches, "feed-cache-secs", u64).unwrap_or_else(|e| e.exit()),
        ),
    };

    let cache: Arc<dyn FeedCache> = match matches.value_of("redis-url") {
        Some(url) => Arc::new(RedisCache::connect(url)?),
        None => Arc::new(MemoryCache::default()),
    };

    Ok(FleetFeed::new(config, cache)?)
}

fn run_sync(matches: &ArgMatches, sync_matches: &ArgMatches) -> anyhow::Result<()> {
    let feed = build_feed(matches)?;
    let mut store = AircraftStore::open(matches.value_of("database").unwrap())?;

    let limit = if sync_matches.is_present("limit") {
        Some(value_t!(sync_matches, "limit", usize).unwrap_or_else(|e| e.exit()))
    } else {
        None
    };

    let options = SyncOptions {
        limit,
        use_cache: !sync_matches.is_present("no-cache"),
        prune: sync_matches.is_present("prune"),
    };

    let summary = sync_fleet(&mut store, &feed, &options)?;

    println!("Processed {} aircraft records.", summary.processed);
    println!(
        "Created: {}, Updated: {}, Skipped: {}, Removed: {}",
        summary.created, summary.updated, summary.skipped, summary.removed
    );

    Ok(())
}

fn run_server(matches: &ArgMatches) -> anyhow::Result<()> {
    let listen = matches.value_of("listen").unwrap().to_string();
    let database = PathBuf::from(matches.value_of("database").unwrap());
    let sync_interval = value_t!(matches, "sync-interval", u64).unwrap_or_else(|e| e.exit());
    let feed = build_feed(matches)?;

    // Surface database problems here instead of inside an executor thread.
    AircraftStore::open(&database)?;

    actix_web::rt::System::new("planespotter-backend").block_on(async move {
        let db = DbExecutor::start(database, feed.clone());
        let feed_executor = FeedExecutor::start(feed);

        if sync_interval > 0 {
            FleetUpdater::new(db.clone(), Duration::from_secs(sync_interval)).start();
        }

        let server = HttpServer::new(move || {
            App::new()
                .wrap(Cors::new().send_wildcard().finish())
                .data(db.clone())
                .data(feed_executor.clone())
                .configure(app::configure)
        })
        .bind(&listen)?;

        info!("Started http server: {}", listen);

        server.run().await
    })?;

    Ok(())
}
