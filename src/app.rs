use actix_web::web;

use crate::api;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/status", web::get().to(api::status::get))
        .route("/api/aircraft", web::get().to(api::aircraft::list))
        .route(
            "/api/aircraft/{registration}",
            web::get().to(api::aircraft::get),
        )
        .route("/api/fleet/live", web::get().to(api::fleet::live))
        .route("/api/fleet/sync", web::post().to(api::fleet::sync));
}
