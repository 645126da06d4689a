use actix::prelude::*;
use actix_web::{error, web, HttpResponse};

use crate::db::{DbExecutor, GetAircraft, ListAircraft};
use crate::fleet::looks_like_registration;

pub async fn list(db: web::Data<Addr<DbExecutor>>) -> actix_web::Result<HttpResponse> {
    let aircraft = db
        .send(ListAircraft)
        .await
        .map_err(error::ErrorInternalServerError)?
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(aircraft))
}

pub async fn get(
    registration: web::Path<String>,
    db: web::Data<Addr<DbExecutor>>,
) -> actix_web::Result<HttpResponse> {
    let registration = registration.trim().to_uppercase();
    if !looks_like_registration(&registration) {
        return Err(error::ErrorBadRequest("invalid registration"));
    }

    let aircraft = db
        .send(GetAircraft { registration })
        .await
        .map_err(error::ErrorInternalServerError)?
        .map_err(error::ErrorInternalServerError)?;

    match aircraft {
        Some(aircraft) => Ok(HttpResponse::Ok().json(aircraft)),
        None => Err(error::ErrorNotFound("unknown registration")),
    }
}
