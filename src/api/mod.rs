use actix_web::http::StatusCode;
use actix_web::ResponseError;

use crate::fleet::{FeedError, SyncError};

pub mod aircraft;
pub mod fleet;
pub mod status;

// A failing upstream feed is the gateway's problem, not the client's;
// everything else coming out of the executors is an internal error.

impl ResponseError for FeedError {
    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_GATEWAY
    }
}

impl ResponseError for SyncError {
    fn status_code(&self) -> StatusCode {
        match self {
            SyncError::Feed(_) => StatusCode::BAD_GATEWAY,
            SyncError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
