//! JSON error catchers so framework-level failures share the API error shape.

use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{Catcher, Request, catch, catchers};

use crate::error::ErrorResponse;

#[catch(default)]
pub fn json_catcher(status: Status, request: &Request<'_>) -> status::Custom<Json<ErrorResponse>> {
    log::debug!("{} {} caught {}", request.method(), request.uri(), status.code);
    status::Custom(status, Json(ErrorResponse::for_status(status)))
}

pub fn all() -> Vec<Catcher> {
    catchers![json_catcher]
}
